//! Command-line front end.
//!
//! Each subcommand lives in its own module with an `Args` struct and a
//! `cmd` entry point, dispatched from [`Cli::menu`].

pub mod init;
pub mod status;
pub mod task;
pub mod timer;
pub mod watch;

use crate::db::local::LocalStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init,
    #[command(about = "Create, list and delete tasks")]
    Task(task::TaskArgs),
    #[command(about = "Start, pause, resume, stop or show a task timer")]
    Timer(timer::TimerArgs),
    #[command(about = "Check connectivity to the data store")]
    Status(status::StatusArgs),
    #[command(about = "Live session: connectivity banner, change feed and timer commands from stdin")]
    Watch(watch::WatchArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init => init::cmd(),
            Commands::Task(args) => task::cmd(args),
            Commands::Timer(args) => timer::cmd(args).await,
            Commands::Status(args) => status::cmd(args).await,
            Commands::Watch(args) => watch::cmd(args).await,
        }
    }
}

pub(crate) fn open_store() -> Result<Arc<LocalStore>> {
    Ok(Arc::new(LocalStore::open()?))
}
