use clap::{Args, Parser, Subcommand, ValueEnum};

use auditdesk_core::{AuditId, AuditStatus, CompanyId, Role, UserId};
use auditdesk_observability::LogFormat;

use crate::views::AuditField;

/// Top-level parser for the `auditdesk` binary.
#[derive(Debug, Parser)]
#[command(name = "auditdesk", version, about = "Terminal client for the IT-audit backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log line format on stderr: pretty, json
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Default log level implied by `--quiet`/`--verbose`.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and keep the session for later commands.
    Login(LoginArgs),
    /// Clear the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Company directory.
    Companies {
        #[command(subcommand)]
        action: CompanyCommands,
    },
    /// User accounts (admins only).
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Audits and their lifecycle.
    Audits {
        #[command(subcommand)]
        action: AuditCommands,
    },
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,
    /// Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
pub struct ListArgs {
    /// Case-insensitive text search.
    #[arg(short, long)]
    pub search: Option<String>,
    /// Sort in descending order.
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CompanyCommands {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        industry: Option<String>,
    },
    /// Delete a company (admins only).
    Delete { id: CompanyId },
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserCommands {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Delete an account (admins only).
    Delete { id: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuditSort {
    Name,
    Company,
    Status,
    Completion,
    Start,
    End,
}

impl From<AuditSort> for AuditField {
    fn from(sort: AuditSort) -> Self {
        match sort {
            AuditSort::Name => AuditField::Name,
            AuditSort::Company => AuditField::Company,
            AuditSort::Status => AuditField::Status,
            AuditSort::Completion => AuditField::Completion,
            AuditSort::Start => AuditField::StartDate,
            AuditSort::End => AuditField::EndDate,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct NoteArgs {
    pub id: AuditId,
    /// Message recorded in the audit history.
    #[arg(short, long)]
    pub content: String,
    /// Attachment reference; repeatable.
    #[arg(long = "file")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AuditCommands {
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Planned, "In Progress" or Completed.
        #[arg(long)]
        status: Option<AuditStatus>,
        #[arg(long)]
        company: Option<CompanyId>,
        #[arg(long, value_enum)]
        sort: Option<AuditSort>,
    },
    /// Details, permitted actions and question progress.
    Show { id: AuditId },
    Start { id: AuditId },
    /// Participant submission for expert review.
    Submit(NoteArgs),
    /// Expert feedback on a submission.
    Feedback(NoteArgs),
    Complete { id: AuditId },
    /// History entries, oldest first.
    Timeline { id: AuditId },
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn audit_list_parses_filters() {
        let cli = Cli::try_parse_from([
            "auditdesk", "audits", "list", "--status", "In Progress", "--company", "4", "--sort", "completion",
            "--desc",
        ])
        .unwrap();
        let Commands::Audits {
            action: AuditCommands::List { list, status, company, sort },
        } = cli.command
        else {
            panic!("expected audits list");
        };
        assert_eq!(status, Some(AuditStatus::InProgress));
        assert_eq!(company, Some(CompanyId::new(4)));
        assert_eq!(sort, Some(AuditSort::Completion));
        assert!(list.desc);
    }

    #[test]
    fn submit_collects_repeated_files() {
        let cli = Cli::try_parse_from([
            "auditdesk", "audits", "submit", "12", "-c", "Evidence attached", "--file", "a.pdf", "--file", "b.pdf",
        ])
        .unwrap();
        let Commands::Audits {
            action: AuditCommands::Submit(note),
        } = cli.command
        else {
            panic!("expected audits submit");
        };
        assert_eq!(note.id, AuditId::new(12));
        assert_eq!(note.files, vec!["a.pdf".to_string(), "b.pdf".to_string()]);
    }

    #[test]
    fn global_flags_set_the_log_level() {
        let cli = Cli::try_parse_from(["auditdesk", "whoami", "-v", "--format", "json"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(Cli::try_parse_from(["auditdesk", "-q", "-v", "whoami"]).is_err());
        assert!(Cli::try_parse_from(["auditdesk", "--log-format", "xml", "whoami"]).is_err());
    }

    #[test]
    fn delete_subcommands_take_an_id() {
        let cli = Cli::try_parse_from(["auditdesk", "companies", "delete", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Companies { action: CompanyCommands::Delete { id } } if id == CompanyId::new(7)
        ));

        let cli = Cli::try_parse_from(["auditdesk", "users", "delete", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Users { action: UserCommands::Delete { id } } if id == UserId::new(3)
        ));
        assert!(Cli::try_parse_from(["auditdesk", "users", "delete", "me"]).is_err());
    }
}
