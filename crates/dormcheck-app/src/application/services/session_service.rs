use std::sync::Arc;
use tracing::{info, warn};

use super::{AccountLocks, SessionAuthenticator};
use crate::application::dtos::SessionDto;
use dormcheck_domain::check_in::{SignInDomainService, SignInError};
use dormcheck_domain::platform::{Activity, PlatformClient};
use dormcheck_domain::session::{CookieSet, Session, SessionRepository};
use dormcheck_domain::{AccountId, DomainError};

/// Binding, refreshing and using stored platform sessions
pub struct SessionService {
    authenticator: Arc<SessionAuthenticator>,
    platform: Arc<dyn PlatformClient>,
    session_repo: Arc<dyn SessionRepository>,
    locks: Arc<AccountLocks>,
}

impl SessionService {
    pub fn new(
        authenticator: Arc<SessionAuthenticator>,
        platform: Arc<dyn PlatformClient>,
        session_repo: Arc<dyn SessionRepository>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            authenticator,
            platform,
            session_repo,
            locks,
        }
    }

    /// Log in with fresh credentials and store the resulting session
    pub async fn login_and_store(
        &self,
        account_id: &AccountId,
        secret: &str,
    ) -> Result<Session, DomainError> {
        let _guard = self.locks.lock(account_id).await;

        let cookies = self.authenticator.authenticate(account_id, secret).await?;
        let display_name = self.display_name(account_id, &cookies).await;

        let session = Session::new(account_id.clone(), secret.to_string(), cookies, display_name)?;
        self.session_repo.save(&session).await?;

        info!("[{}] Session stored for {}", account_id, session.display_name());
        Ok(session)
    }

    /// Log in again with the stored secret and replace the cookies.
    /// On failure the previous cookies are left untouched.
    pub async fn refresh(&self, account_id: &AccountId) -> Result<(), DomainError> {
        let _guard = self.locks.lock(account_id).await;

        let mut session = self
            .session_repo
            .find_by_account_id(account_id)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(account_id.to_string()))?;

        let cookies = self
            .authenticator
            .authenticate(account_id, session.secret())
            .await?;
        session.refresh(cookies)?;
        self.session_repo.save(&session).await
    }

    pub async fn list_activities(&self, account_id: &AccountId) -> Result<Vec<Activity>, SignInError> {
        let session = self.session_repo.find_by_account_id(account_id).await?;
        let session = SignInDomainService::require_usable_session(account_id, session)?;

        Ok(self.platform.list_activities(session.cookies()).await?)
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionDto>, DomainError> {
        let sessions = self.session_repo.find_all().await?;
        Ok(sessions.iter().map(SessionDto::from).collect())
    }

    /// Empty when the profile page cannot be read
    async fn display_name(&self, account_id: &AccountId, cookies: &CookieSet) -> String {
        match self.platform.fetch_display_name(cookies).await {
            Ok(Some(name)) => name,
            Ok(None) => String::new(),
            Err(e) => {
                warn!("[{}] Could not fetch display name: {}", account_id, e);
                String::new()
            }
        }
    }
}
