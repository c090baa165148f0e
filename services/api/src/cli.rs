use crate::commands::{run_audit_sample, run_db_init, AuditSampleArgs, DbInitArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leadgen::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Generation Admin",
    about = "Serve the lead-generation admin API and run maintenance commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Contractor audit maintenance
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Database bootstrap
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Write a random sample of unaudited contractor identifiers to a file
    Sample(AuditSampleArgs),
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Create missing tables and optionally load the demo dataset
    Init(DbInitArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Audit {
            command: AuditCommand::Sample(args),
        } => run_audit_sample(args),
        Command::Db {
            command: DbCommand::Init(args),
        } => run_db_init(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_sample_accepts_repeated_exclusions() {
        let cli = Cli::try_parse_from([
            "leadgen-api",
            "audit",
            "sample",
            "--limit",
            "25",
            "--exclude",
            "LIC-1",
            "--exclude",
            "LIC-2",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Audit {
                command: AuditCommand::Sample(args),
            }) => {
                assert_eq!(args.limit, Some(25));
                assert_eq!(args.exclude, vec!["LIC-1", "LIC-2"]);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["leadgen-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
