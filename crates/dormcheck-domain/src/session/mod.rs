mod cookie_set;
mod repository;
mod token_extractor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{AccountId, DomainError};

pub use cookie_set::CookieSet;
pub use repository::SessionRepository;
pub use token_extractor::SessionTokenExtractor;

/// Platform-side authenticated state for one account.
///
/// The secret is kept so the refresher can log in again without the owner.
/// Cookies are replaced on every successful login and never cleared on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    account_id: AccountId,
    #[serde(skip_serializing, default)]
    secret: String,
    cookies: CookieSet,
    last_login_at: DateTime<Utc>,
    display_name: String,
}

impl Session {
    /// Session from a fresh login
    pub fn new(
        account_id: AccountId,
        secret: String,
        cookies: CookieSet,
        display_name: String,
    ) -> Result<Self, DomainError> {
        if secret.is_empty() {
            return Err(DomainError::Validation(
                "Session secret cannot be empty".to_string(),
            ));
        }
        if cookies.is_empty() {
            return Err(DomainError::Validation(
                "Session cookies cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            account_id,
            secret,
            cookies,
            last_login_at: Utc::now(),
            display_name,
        })
    }

    /// Restore session from persistence
    pub fn restore(
        account_id: AccountId,
        secret: String,
        cookies: CookieSet,
        last_login_at: DateTime<Utc>,
        display_name: String,
    ) -> Self {
        Self {
            account_id,
            secret,
            cookies,
            last_login_at,
            display_name,
        }
    }

    /// Replace cookies after a successful re-login
    pub fn refresh(&mut self, cookies: CookieSet) -> Result<(), DomainError> {
        if cookies.is_empty() {
            return Err(DomainError::Validation(
                "Session cookies cannot be empty".to_string(),
            ));
        }

        self.cookies = cookies;
        self.last_login_at = Utc::now();
        Ok(())
    }

    /// Keep the old name when the profile lookup came back empty
    pub fn update_display_name(&mut self, name: &str) {
        if !name.is_empty() {
            self.display_name = name.to_string();
        }
    }

    /// A session with no cookies cannot authenticate anything
    pub fn is_usable(&self) -> bool {
        !self.cookies.is_empty()
    }

    // Getters
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn cookies(&self) -> &CookieSet {
        &self.cookies
    }

    pub fn last_login_at(&self) -> DateTime<Utc> {
        self.last_login_at
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}
