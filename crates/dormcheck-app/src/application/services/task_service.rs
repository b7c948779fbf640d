use std::sync::Arc;
use tracing::info;

use crate::application::dtos::{SaveTaskInput, TaskDto};
use dormcheck_domain::task::{SignTask, SignTaskRepository};
use dormcheck_domain::{AccountId, DomainError, OwnerId};

/// Owner-facing task management
pub struct TaskService {
    task_repo: Arc<dyn SignTaskRepository>,
}

impl TaskService {
    pub fn new(task_repo: Arc<dyn SignTaskRepository>) -> Self {
        Self { task_repo }
    }

    /// Create or update the task for (owner, account, activity).
    ///
    /// An update replaces the owner-editable fields and clears the execution
    /// state, so an edited task is eligible again the same day.
    pub async fn save_task(&self, input: SaveTaskInput) -> Result<TaskDto, DomainError> {
        let owner_id = OwnerId::new(input.owner_id);
        let account_id = AccountId::new(input.account_id.as_str())?;
        let details = input.to_details()?;

        let existing = self
            .task_repo
            .find_by_key(owner_id, &account_id, input.activity_id.trim())
            .await?;

        let task = match existing {
            Some(mut task) => {
                task.update_details(details)?;
                task.set_enabled(input.enabled);
                info!(
                    "Updating task {} ({} / activity {})",
                    task.id(),
                    account_id,
                    task.activity_id()
                );
                task
            }
            None => {
                let mut task = SignTask::new(owner_id, account_id, input.activity_id, details)?;
                task.set_enabled(input.enabled);
                info!(
                    "Creating task {} ({} / activity {})",
                    task.id(),
                    task.account_id(),
                    task.activity_id()
                );
                task
            }
        };

        self.task_repo.save(&task).await?;
        Ok(TaskDto::from(&task))
    }

    pub async fn delete_task(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<bool, DomainError> {
        let removed = self
            .task_repo
            .delete(owner_id, account_id, activity_id)
            .await?;
        if removed {
            info!("Deleted task {} / activity {}", account_id, activity_id);
        }
        Ok(removed)
    }

    pub async fn list_tasks(&self, owner_id: OwnerId) -> Result<Vec<TaskDto>, DomainError> {
        let tasks = self.task_repo.find_by_owner(owner_id).await?;
        Ok(tasks.iter().map(TaskDto::from).collect())
    }

    /// An account with tasks must not be unbound
    pub async fn has_tasks_for_account(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
    ) -> Result<bool, DomainError> {
        self.task_repo.exists_for_account(owner_id, account_id).await
    }
}
