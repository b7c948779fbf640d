use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use tracing::warn;

use crate::persistence::RepositoryErrorMapper;
use crate::security::SecretCipher;
use dormcheck_domain::session::{CookieSet, Session, SessionRepository};
use dormcheck_domain::shared::{AccountId, DomainError};

#[derive(FromRow)]
struct SessionRow {
    account_id: String,
    secret: String,
    cookies: String,
    last_login_at: DateTime<Utc>,
    display_name: String,
}

impl SessionRow {
    fn into_session(self, cipher: &SecretCipher) -> Result<Session, DomainError> {
        // No plaintext fallback: a secret that does not open means a wrong master password
        let secret = cipher.open(&self.secret).map_err(|e| {
            DomainError::Decryption(format!(
                "Stored secret for account {} could not be decrypted: {}",
                self.account_id, e
            ))
        })?;

        let cookies = self
            .cookies
            .parse::<CookieSet>()
            .unwrap_or_default();

        Ok(Session::restore(
            AccountId::from_string(&self.account_id),
            secret,
            cookies,
            self.last_login_at,
            self.display_name,
        ))
    }
}

pub struct SqliteSessionRepository {
    pool: Arc<SqlitePool>,
    cipher: Arc<SecretCipher>,
}

impl SqliteSessionRepository {
    const SELECT_QUERY: &'static str =
        "SELECT account_id, secret, cookies, last_login_at, display_name FROM sessions";

    pub fn new(pool: Arc<SqlitePool>, cipher: Arc<SecretCipher>) -> Self {
        Self { pool, cipher }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let sealed = self
            .cipher
            .seal(session.secret())
            .map_err(|e| DomainError::Encryption(e.to_string()))?;

        let query = r#"
            INSERT INTO sessions (account_id, secret, cookies, last_login_at, display_name)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(account_id) DO UPDATE SET
                secret = excluded.secret,
                cookies = excluded.cookies,
                last_login_at = excluded.last_login_at,
                display_name = excluded.display_name
        "#;

        sqlx::query(query)
            .bind(session.account_id().as_str())
            .bind(sealed)
            .bind(session.cookies().to_string())
            .bind(session.last_login_at())
            .bind(session.display_name())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Save session"))?;

        Ok(())
    }

    async fn find_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Session>, DomainError> {
        let query = format!("{} WHERE account_id = ?1", Self::SELECT_QUERY);

        let row: Option<SessionRow> = sqlx::query_as(&query)
            .bind(account_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find session by account ID"))?;

        row.map(|r| r.into_session(&self.cipher)).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Session>, DomainError> {
        let query = format!("{} ORDER BY account_id", Self::SELECT_QUERY);

        let rows: Vec<SessionRow> = sqlx::query_as(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find all sessions"))?;

        // An unreadable row is skipped so the other accounts are still served
        let sessions = rows
            .into_iter()
            .filter_map(|row| match row.into_session(&self.cipher) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("Skipping session: {}", e);
                    None
                }
            })
            .collect();

        Ok(sessions)
    }
}
