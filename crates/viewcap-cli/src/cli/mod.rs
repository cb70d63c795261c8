//! CLI for the viewcap view recorder.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use viewcap_core::config;

use commands::{run_prune, run_record, run_referer, RecordArgs};

/// Top-level CLI for the viewcap view recorder.
#[derive(Debug, Parser)]
#[command(name = "viewcap")]
#[command(about = "viewcap: record content views once per session", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Record a view of a content item unless this session already counted it.
    Record {
        /// Content item identifier.
        content_id: String,

        /// Visitor session identifier.
        #[arg(long)]
        session: String,

        /// Client IP address.
        #[arg(long)]
        ip: Option<String>,

        /// User-Agent header value.
        #[arg(long)]
        user_agent: Option<String>,

        /// Referer header value (reduced to scheme://host before storing).
        #[arg(long)]
        referer: Option<String>,
    },

    /// Show the origin a referer header would be stored as.
    Referer {
        /// Raw referer header value.
        url: String,
    },

    /// Drop expired view markers from the session file.
    Prune,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Record {
                content_id,
                session,
                ip,
                user_agent,
                referer,
            } => {
                let args = RecordArgs {
                    content_id,
                    session,
                    ip,
                    user_agent,
                    referer,
                };
                run_record(&cfg, args).await?;
            }
            CliCommand::Referer { url } => run_referer(&url),
            CliCommand::Prune => run_prune(&cfg)?,
        }

        Ok(())
    }
}
