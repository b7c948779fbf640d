use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::persistence::RepositoryErrorMapper;
use dormcheck_domain::shared::{AccountId, DomainError, OwnerId, TaskId};
use dormcheck_domain::task::{
    ExecutionState, GeoLocation, SignTask, SignTaskRepository, TaskDetails,
};

#[derive(FromRow)]
struct SignTaskRow {
    id: String,
    owner_id: i64,
    account_id: String,
    activity_id: String,
    display_name: String,
    activity_name: String,
    address: String,
    longitude: f64,
    latitude: f64,
    sign_time: String,
    notify_email: Option<String>,
    enabled: bool,
    exec_status: String,
    retry_count: i64,
    max_retry: i64,
    last_error: String,
    executed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl SignTaskRow {
    fn into_task(self) -> Result<SignTask, DomainError> {
        let corrupt = |what: &str, e: DomainError| {
            DomainError::DataIntegrity(format!("Task {} has invalid {}: {}", self.id, what, e))
        };

        let location = GeoLocation::new(self.address.clone(), self.longitude, self.latitude)
            .map_err(|e| corrupt("location", e))?;
        let sign_time = self.sign_time.parse().map_err(|e| corrupt("sign_time", e))?;
        let status = self.exec_status.parse().map_err(|e| corrupt("exec_status", e))?;

        let details = TaskDetails {
            display_name: self.display_name,
            activity_name: self.activity_name,
            location,
            sign_time,
            max_retry: self.max_retry.max(0) as u32,
            notify_email: self.notify_email,
        };
        let execution = ExecutionState {
            status,
            retry_count: self.retry_count.max(0) as u32,
            last_error: self.last_error,
            executed_at: self.executed_at,
        };

        Ok(SignTask::restore(
            TaskId::from_string(&self.id),
            OwnerId::new(self.owner_id),
            AccountId::from_string(&self.account_id),
            self.activity_id,
            details,
            self.enabled,
            execution,
            self.created_at,
        ))
    }
}

pub struct SqliteSignTaskRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteSignTaskRepository {
    const SELECT_QUERY: &'static str = r#"
        SELECT id, owner_id, account_id, activity_id, display_name, activity_name,
               address, longitude, latitude, sign_time, notify_email, enabled,
               exec_status, retry_count, max_retry, last_error, executed_at, created_at
        FROM sign_tasks
    "#;

    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn rows_into_tasks(rows: Vec<SignTaskRow>) -> Result<Vec<SignTask>, DomainError> {
        rows.into_iter().map(SignTaskRow::into_task).collect()
    }

    /// Like `rows_into_tasks`, but a row that fails to map is logged and
    /// dropped so the remaining tasks still run.
    fn rows_into_valid_tasks(rows: Vec<SignTaskRow>) -> Vec<SignTask> {
        rows.into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                match row.into_task() {
                    Ok(task) => Some(task),
                    Err(e) => {
                        warn!("Skipping task {}: {}", id, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl SignTaskRepository for SqliteSignTaskRepository {
    async fn save(&self, task: &SignTask) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO sign_tasks (
                id, owner_id, account_id, activity_id, display_name, activity_name,
                address, longitude, latitude, sign_time, notify_email, enabled,
                exec_status, retry_count, max_retry, last_error, executed_at, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ON CONFLICT(owner_id, account_id, activity_id) DO UPDATE SET
                display_name = excluded.display_name,
                activity_name = excluded.activity_name,
                address = excluded.address,
                longitude = excluded.longitude,
                latitude = excluded.latitude,
                sign_time = excluded.sign_time,
                notify_email = excluded.notify_email,
                enabled = excluded.enabled,
                exec_status = excluded.exec_status,
                retry_count = excluded.retry_count,
                max_retry = excluded.max_retry,
                last_error = excluded.last_error,
                executed_at = excluded.executed_at
        "#;

        let details = task.details();
        sqlx::query(query)
            .bind(task.id().as_str())
            .bind(task.owner_id().value())
            .bind(task.account_id().as_str())
            .bind(task.activity_id())
            .bind(&details.display_name)
            .bind(&details.activity_name)
            .bind(details.location.address())
            .bind(details.location.longitude())
            .bind(details.location.latitude())
            .bind(details.sign_time.to_string())
            .bind(details.notify_email.as_deref())
            .bind(task.is_enabled())
            .bind(task.status().as_str())
            .bind(task.retry_count() as i64)
            .bind(details.max_retry as i64)
            .bind(task.last_error())
            .bind(task.executed_at())
            .bind(task.created_at())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Save task"))?;

        Ok(())
    }

    async fn update_execution(&self, task: &SignTask) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sign_tasks
            SET exec_status = ?1, retry_count = ?2, last_error = ?3, executed_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(task.status().as_str())
        .bind(task.retry_count() as i64)
        .bind(task.last_error())
        .bind(task.executed_at())
        .bind(task.id().as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Update task execution"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task.id().to_string()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<SignTask>, DomainError> {
        let query = format!("{} WHERE id = ?1", Self::SELECT_QUERY);

        let row: Option<SignTaskRow> = sqlx::query_as(&query)
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find task by ID"))?;

        row.map(SignTaskRow::into_task).transpose()
    }

    async fn find_by_key(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<Option<SignTask>, DomainError> {
        let query = format!(
            "{} WHERE owner_id = ?1 AND account_id = ?2 AND activity_id = ?3",
            Self::SELECT_QUERY
        );

        let row: Option<SignTaskRow> = sqlx::query_as(&query)
            .bind(owner_id.value())
            .bind(account_id.as_str())
            .bind(activity_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find task by key"))?;

        row.map(SignTaskRow::into_task).transpose()
    }

    async fn find_by_owner(&self, owner_id: OwnerId) -> Result<Vec<SignTask>, DomainError> {
        let query = format!(
            "{} WHERE owner_id = ?1 ORDER BY created_at, id",
            Self::SELECT_QUERY
        );

        let rows: Vec<SignTaskRow> = sqlx::query_as(&query)
            .bind(owner_id.value())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find tasks by owner"))?;

        Self::rows_into_tasks(rows)
    }

    async fn find_due(
        &self,
        now: DateTime<Local>,
        cooldown: Duration,
    ) -> Result<Vec<SignTask>, DomainError> {
        let start = Instant::now();

        // Zero-padded HH:MM compares correctly as text
        let query = format!(
            r#"{}
            WHERE enabled = 1
              AND exec_status != 'success'
              AND retry_count < max_retry
              AND sign_time <= ?1
            ORDER BY created_at, id"#,
            Self::SELECT_QUERY
        );

        let rows: Vec<SignTaskRow> = sqlx::query_as(&query)
            .bind(now.format("%H:%M").to_string())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find due tasks"))?;

        let candidates = rows.len();
        let due: Vec<SignTask> = Self::rows_into_valid_tasks(rows)
            .into_iter()
            .filter(|task| task.is_due(&now, cooldown))
            .collect();

        debug!(
            "find_due: {} candidates, {} due, {:.2}ms",
            candidates,
            due.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(due)
    }

    async fn delete(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "DELETE FROM sign_tasks WHERE owner_id = ?1 AND account_id = ?2 AND activity_id = ?3",
        )
        .bind(owner_id.value())
        .bind(account_id.as_str())
        .bind(activity_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Delete task"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_for_account(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
    ) -> Result<bool, DomainError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sign_tasks WHERE owner_id = ?1 AND account_id = ?2)",
        )
        .bind(owner_id.value())
        .bind(account_id.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Check tasks for account"))?;

        Ok(exists != 0)
    }

    async fn reset_all(&self) -> Result<u64, DomainError> {
        // One statement, so the reset is atomic
        let result = sqlx::query(
            "UPDATE sign_tasks SET retry_count = 0, exec_status = 'pending', last_error = ''",
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Reset all tasks"))?;

        Ok(result.rows_affected())
    }
}
