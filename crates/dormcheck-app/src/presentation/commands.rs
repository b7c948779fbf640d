//! One-shot subcommands. Each prints its result as JSON on stdout.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

use crate::application::dtos::{SaveTaskInput, TaskDto};
use crate::presentation::cli::TaskCommand;
use crate::presentation::state::AppState;
use dormcheck_domain::{AccountId, DomainError, OwnerId};

pub const ACCOUNT_SECRET_ENV: &str = "DORMCHECK_ACCOUNT_SECRET";

/// One-line error for stderr, prefixed with the code of the first
/// `DomainError` in the cause chain
pub fn render_error(err: &anyhow::Error) -> String {
    match err.chain().find_map(|cause| cause.downcast_ref::<DomainError>()) {
        Some(domain) if err.chain().count() == 1 => domain.format_with_code(),
        Some(domain) => format!("[{}] {:#}", domain.code().code(), err),
        None => format!("{:#}", err),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_secret() -> Result<String> {
    if let Ok(secret) = std::env::var(ACCOUNT_SECRET_ENV) {
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    eprintln!("Platform password:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        bail!("No password given");
    }
    Ok(secret)
}

pub async fn bind(state: &AppState, account_id: &str) -> Result<()> {
    let account_id = AccountId::new(account_id)?;
    let secret = read_secret()?;

    let session = state
        .services
        .sessions
        .login_and_store(&account_id, &secret)
        .await
        .with_context(|| format!("Login failed for {account_id}"))?;

    print_json(&crate::application::dtos::SessionDto::from(&session))
}

pub async fn sessions(state: &AppState) -> Result<()> {
    let sessions = state.services.sessions.list_sessions().await?;
    print_json(&sessions)
}

pub async fn activities(state: &AppState, account_id: &str) -> Result<()> {
    let account_id = AccountId::new(account_id)?;
    let activities = state
        .services
        .sessions
        .list_activities(&account_id)
        .await
        .map_err(|e| {
            if e.is_precondition() {
                anyhow!("{e}. Run `dormcheck bind {account_id}` first")
            } else {
                anyhow!(e)
            }
        })?;
    print_json(&activities)
}

pub async fn tick(state: &AppState) -> Result<()> {
    let attempted = state.loops.polling.tick_at(Local::now()).await;
    info!("Manual tick attempted {} task(s)", attempted);
    print_json(&serde_json::json!({ "attempted": attempted }))
}

fn read_task_input(file: &Path) -> Result<SaveTaskInput> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid task file {}", file.display()))
}

pub async fn task(state: &AppState, command: TaskCommand) -> Result<()> {
    let tasks = &state.services.tasks;

    match command {
        TaskCommand::List { owner } => print_json(&tasks.list_tasks(OwnerId::new(owner)).await?),
        TaskCommand::Save { file } => {
            let input = read_task_input(&file)?;
            print_json(&tasks.save_task(input).await?)
        }
        TaskCommand::Delete {
            owner,
            account,
            activity,
        } => {
            let account_id = AccountId::new(account)?;
            let owner_id = OwnerId::new(owner);
            let removed = tasks.delete_task(owner_id, &account_id, &activity).await?;
            let remaining = tasks.has_tasks_for_account(owner_id, &account_id).await?;
            print_json(&serde_json::json!({
                "removed": removed,
                "account_has_tasks": remaining,
            }))
        }
        TaskCommand::Run {
            owner,
            account,
            activity,
        } => {
            let account_id = AccountId::new(account)?;
            let mut task = state
                .repositories
                .task
                .find_by_key(OwnerId::new(owner), &account_id, &activity)
                .await?
                .ok_or_else(|| anyhow!("No task for {account_id} / activity {activity}"))?;

            // The attempt is recorded on the task either way
            let outcome = state.services.executor.execute(&mut task).await;
            print_json(&TaskDto::from(&task))?;
            outcome.map_err(|e| anyhow!(e))
        }
    }
}
