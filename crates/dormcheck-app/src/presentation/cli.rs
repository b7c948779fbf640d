//! Command-line surface of the `dormcheck` binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DormCheck - scheduled dormitory sign-in daemon
#[derive(Debug, Parser)]
#[command(name = "dormcheck", version, about = "Scheduled dormitory sign-in daemon")]
pub struct Cli {
    /// Path to the JSON config file (overrides DORMCHECK_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Runs the daemon when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the polling, session refresh and daily reset loops until Ctrl-C
    Run,

    /// Log in to the platform and store the session.
    /// The password is read from DORMCHECK_ACCOUNT_SECRET or stdin.
    Bind {
        account_id: String,
    },

    /// List stored sessions
    Sessions,

    /// List the sign-in activities visible to an account
    Activities {
        account_id: String,
    },

    /// Manage sign-in tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Run one polling tick now and exit
    Tick,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List an owner's tasks
    List {
        #[arg(long)]
        owner: i64,
    },

    /// Create or update a task from a JSON file
    Save {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a task
    Delete {
        #[arg(long)]
        owner: i64,
        #[arg(long)]
        account: String,
        #[arg(long)]
        activity: String,
    },

    /// Submit one sign-in attempt for a task right away
    Run {
        #[arg(long)]
        owner: i64,
        #[arg(long)]
        account: String,
        #[arg(long)]
        activity: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_daemon() {
        let cli = Cli::try_parse_from(["dormcheck"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["dormcheck", "sessions", "--config", "/etc/dormcheck.json"])
            .unwrap();
        assert!(matches!(cli.command, Some(Command::Sessions)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dormcheck.json")));
    }

    #[test]
    fn test_task_delete_args() {
        let cli = Cli::try_parse_from([
            "dormcheck", "task", "delete", "--owner", "1", "--account", "2023001", "--activity",
            "42",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Task {
                command:
                    TaskCommand::Delete {
                        owner,
                        account,
                        activity,
                    },
            }) => {
                assert_eq!(owner, 1);
                assert_eq!(account, "2023001");
                assert_eq!(activity, "42");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_task_delete_requires_owner() {
        assert!(Cli::try_parse_from(["dormcheck", "task", "delete", "--account", "a"]).is_err());
    }
}
