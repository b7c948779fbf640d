use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{ExecStatus, GeoLocation, SignTime};
use crate::shared::{AccountId, DomainError, OwnerId, TaskId};

/// Fields the owner edits through save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetails {
    /// Display name of the account holder, used in notifications
    pub display_name: String,
    pub activity_name: String,
    pub location: GeoLocation,
    pub sign_time: SignTime,
    pub max_retry: u32,
    pub notify_email: Option<String>,
}

/// Fields written by the sign-in executor and the daily reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub status: ExecStatus,
    pub retry_count: u32,
    pub last_error: String,
    pub executed_at: Option<DateTime<Utc>>,
}

impl ExecutionState {
    pub fn fresh() -> Self {
        Self {
            status: ExecStatus::Pending,
            retry_count: 0,
            last_error: String::new(),
            executed_at: None,
        }
    }
}

/// A recurring daily sign-in intent for one (owner, account, activity) triple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTask {
    id: TaskId,
    owner_id: OwnerId,
    account_id: AccountId,
    activity_id: String,
    details: TaskDetails,
    enabled: bool,
    execution: ExecutionState,
    created_at: DateTime<Utc>,
}

impl SignTask {
    pub fn new(
        owner_id: OwnerId,
        account_id: AccountId,
        activity_id: impl Into<String>,
        details: TaskDetails,
    ) -> Result<Self, DomainError> {
        let activity_id = activity_id.into();
        if activity_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "Activity id cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: TaskId::new(),
            owner_id,
            account_id,
            activity_id: activity_id.trim().to_string(),
            details: Self::validate_details(details)?,
            enabled: true,
            execution: ExecutionState::fresh(),
            created_at: Utc::now(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: TaskId,
        owner_id: OwnerId,
        account_id: AccountId,
        activity_id: String,
        details: TaskDetails,
        enabled: bool,
        execution: ExecutionState,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            account_id,
            activity_id,
            details,
            enabled,
            execution,
            created_at,
        }
    }

    fn validate_details(mut details: TaskDetails) -> Result<TaskDetails, DomainError> {
        if details.max_retry == 0 {
            return Err(DomainError::Validation(
                "Max retry must be at least 1".to_string(),
            ));
        }

        details.notify_email = details
            .notify_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        if let Some(email) = &details.notify_email {
            if !email.contains('@') {
                return Err(DomainError::Validation(format!(
                    "Invalid notification email: {email}"
                )));
            }
        }

        Ok(details)
    }

    /// Owner edit: replace the details, re-enable, and make the task eligible again
    pub fn update_details(&mut self, details: TaskDetails) -> Result<(), DomainError> {
        self.details = Self::validate_details(details)?;
        self.enabled = true;
        self.execution = ExecutionState::fresh();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Eligibility that does not depend on the clock
    pub fn is_eligible(&self) -> bool {
        self.enabled
            && self.execution.status != ExecStatus::Success
            && self.execution.retry_count < self.details.max_retry
    }

    /// Whether the polling loop should run this task at `now`.
    ///
    /// The trigger is today's date in `now`'s zone combined with the sign
    /// time. A previous attempt blocks the task until `cooldown` has passed.
    pub fn is_due<Tz: TimeZone>(&self, now: &DateTime<Tz>, cooldown: Duration) -> bool {
        if !self.is_eligible() {
            return false;
        }

        let local_now = now.naive_local();
        if self.details.sign_time.on(local_now.date()) > local_now {
            return false;
        }

        match self.execution.executed_at {
            None => true,
            Some(executed_at) => now.with_timezone(&Utc) - executed_at >= cooldown,
        }
    }

    /// Record a successful attempt (including "already signed in")
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.record_attempt(at, ExecStatus::Success, String::new());
    }

    /// Record a failed attempt with the error shown to the owner
    pub fn record_failure(&mut self, at: DateTime<Utc>, error: impl Into<String>) {
        self.record_attempt(at, ExecStatus::Failed, error.into());
    }

    fn record_attempt(&mut self, at: DateTime<Utc>, status: ExecStatus, error: String) {
        self.execution.retry_count = self.execution.retry_count.saturating_add(1);
        self.execution.executed_at = Some(at);
        self.execution.status = status;
        self.execution.last_error = error;
    }

    /// Clear the day's failure state. `executed_at` and owner fields are kept.
    pub fn reset_daily(&mut self) {
        self.execution.retry_count = 0;
        self.execution.status = ExecStatus::Pending;
        self.execution.last_error.clear();
    }

    // Getters
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    pub fn details(&self) -> &TaskDetails {
        &self.details
    }

    pub fn display_name(&self) -> &str {
        &self.details.display_name
    }

    pub fn activity_name(&self) -> &str {
        &self.details.activity_name
    }

    pub fn location(&self) -> &GeoLocation {
        &self.details.location
    }

    pub fn sign_time(&self) -> SignTime {
        self.details.sign_time
    }

    pub fn max_retry(&self) -> u32 {
        self.details.max_retry
    }

    pub fn notify_email(&self) -> Option<&str> {
        self.details.notify_email.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn execution(&self) -> &ExecutionState {
        &self.execution
    }

    pub fn status(&self) -> ExecStatus {
        self.execution.status
    }

    pub fn retry_count(&self) -> u32 {
        self.execution.retry_count
    }

    pub fn last_error(&self) -> &str {
        &self.execution.last_error
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.execution.executed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
