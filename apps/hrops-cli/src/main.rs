//! HR Ops CLI - scoped access to the HR operations database

use clap::Parser;
use hrops_cli::{build_config, open_database, run, Cli};
use hrops_core::observability::init_tracing_with_writer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // Logs go to stderr so stdout stays valid JSON
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    init_tracing_with_writer(&config.logging, writer)?;

    let db = open_database(&config).await?;
    run(cli.command, db, &config, &mut std::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrops_cli::{Commands, TaskCommand};

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hrops", "tasks", "list", "--company", "42"]).unwrap();
        assert_eq!(cli.company, Some(42));
        assert_eq!(
            cli.command,
            Commands::Tasks {
                action: TaskCommand::List { limit: None }
            }
        );
    }

    #[test]
    fn test_database_flag_sets_url() {
        let cli =
            Cli::try_parse_from(["hrops", "--database", "/tmp/hr.sqlite", "health"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.database.url, "sqlite:///tmp/hr.sqlite");
    }
}
