use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};

use super::aggregate::SignTask;
use crate::shared::{AccountId, DomainError, OwnerId, TaskId};

#[async_trait]
pub trait SignTaskRepository: Send + Sync {
    /// Create or update, keyed by (owner, account, activity)
    async fn save(&self, task: &SignTask) -> Result<(), DomainError>;

    /// Persist only the execution state (status, retry count, error, executed_at)
    async fn update_execution(&self, task: &SignTask) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<SignTask>, DomainError>;

    async fn find_by_key(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<Option<SignTask>, DomainError>;

    async fn find_by_owner(&self, owner_id: OwnerId) -> Result<Vec<SignTask>, DomainError>;

    /// Tasks due at `now`, in a stable order (creation time, then id).
    /// A stored row that no longer maps to a valid task is logged and skipped.
    async fn find_due(
        &self,
        now: DateTime<Local>,
        cooldown: Duration,
    ) -> Result<Vec<SignTask>, DomainError>;

    /// Returns whether a row was removed
    async fn delete(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<bool, DomainError>;

    async fn exists_for_account(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
    ) -> Result<bool, DomainError>;

    /// Atomically reset retry count, status and last error on every task.
    /// Returns the number of rows touched.
    async fn reset_all(&self) -> Result<u64, DomainError>;
}
