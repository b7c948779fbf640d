use serde::{Deserialize, Serialize};

use dormcheck_domain::task::{GeoLocation, SignTask, SignTime, TaskDetails};
use dormcheck_domain::DomainError;

fn default_enabled() -> bool {
    true
}

fn default_max_retry() -> u32 {
    3
}

/// Owner's create-or-update request, keyed by (owner, account, activity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTaskInput {
    pub owner_id: i64,
    pub account_id: String,
    pub activity_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub activity_name: String,
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
    /// `HH:MM`
    pub sign_time: String,
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
    #[serde(default)]
    pub notify_email: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SaveTaskInput {
    pub fn to_details(&self) -> Result<TaskDetails, DomainError> {
        Ok(TaskDetails {
            display_name: self.display_name.trim().to_string(),
            activity_name: self.activity_name.trim().to_string(),
            location: GeoLocation::new(self.address.trim(), self.longitude, self.latitude)?,
            sign_time: self.sign_time.trim().parse::<SignTime>()?,
            max_retry: self.max_retry,
            notify_email: self.notify_email.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub owner_id: i64,
    pub account_id: String,
    pub activity_id: String,
    pub display_name: String,
    pub activity_name: String,
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
    pub sign_time: String,
    pub max_retry: u32,
    pub notify_email: Option<String>,
    pub enabled: bool,
    pub exec_status: String,
    pub retry_count: u32,
    pub last_error: String,
    pub executed_at: Option<String>,
    pub created_at: String,
}

impl From<&SignTask> for TaskDto {
    fn from(task: &SignTask) -> Self {
        let location = task.location();
        Self {
            id: task.id().to_string(),
            owner_id: task.owner_id().value(),
            account_id: task.account_id().to_string(),
            activity_id: task.activity_id().to_string(),
            display_name: task.display_name().to_string(),
            activity_name: task.activity_name().to_string(),
            address: location.address().to_string(),
            longitude: location.longitude(),
            latitude: location.latitude(),
            sign_time: task.sign_time().to_string(),
            max_retry: task.max_retry(),
            notify_email: task.notify_email().map(str::to_string),
            enabled: task.is_enabled(),
            exec_status: task.status().as_str().to_string(),
            retry_count: task.retry_count(),
            last_error: task.last_error().to_string(),
            executed_at: task.executed_at().map(|t| t.to_rfc3339()),
            created_at: task.created_at().to_rfc3339(),
        }
    }
}
