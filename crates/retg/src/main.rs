use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use retg_core::{
    config::{chats_path_from_env, Config},
    membership::{find_missing, MembersSnapshot, MembershipReport},
    tree::ChatTree,
};

/// Relays tagged messages between Telegram group chats.
#[derive(Parser, Debug)]
#[command(name = "retg", version)]
struct Cli {
    /// Chat hierarchy document (overrides RETG_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default).
    Run,
    /// Report users missing from ancestor chats.
    CheckMembership {
        /// JSON snapshot: chat id -> list of members.
        #[arg(long)]
        members: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(cli.config).await,
        Commands::CheckMembership { members } => check_membership(cli.config, &members),
    }
}

async fn run(chats_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    if let Some(path) = chats_path {
        cfg.chats_path = path;
    }
    retg_core::logging::init("retg", cfg.debug)?;

    let tree = Arc::new(ChatTree::load(&cfg.chats_path)?);
    info!(path = %cfg.chats_path.display(), "loaded chat hierarchy");

    retg_telegram::router::run(Arc::new(cfg), tree)
        .await
        .context("telegram bot failed")
}

fn check_membership(chats_path: Option<PathBuf>, members_path: &Path) -> anyhow::Result<()> {
    retg_core::logging::init("retg", false)?;

    let chats_path = chats_path.unwrap_or_else(chats_path_from_env);
    let tree = ChatTree::load(&chats_path)?;

    let raw = std::fs::read_to_string(members_path)
        .with_context(|| format!("failed to read {}", members_path.display()))?;
    let snapshot = MembersSnapshot::from_json(&raw)?;

    let missing = find_missing(&tree, &snapshot.user_ids());
    let report = MembershipReport::build(&missing);
    if report.is_empty() {
        info!("every member is present in all ancestor chats");
        return Ok(());
    }

    println!("{}", report.render(&tree, &snapshot.members_by_id()));
    Ok(())
}
