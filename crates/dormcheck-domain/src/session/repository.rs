use async_trait::async_trait;

use super::Session;
use crate::shared::{AccountId, DomainError};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace on account id
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    async fn find_by_account_id(&self, account_id: &AccountId)
        -> Result<Option<Session>, DomainError>;

    /// Every tracked session, ordered by account id. Rows that cannot be
    /// decoded are logged and left out.
    async fn find_all(&self) -> Result<Vec<Session>, DomainError>;
}
