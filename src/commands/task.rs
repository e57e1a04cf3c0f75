use super::open_store;
use crate::db::tasks::{TaskFilter, Tasks};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::task::NewTask;
use crate::libs::view::View;
use crate::{msg_bail_anyhow, msg_info, msg_success};
use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    #[command(about = "Create a task")]
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        comment: String,
        /// Owner id; defaults to the configured user
        #[arg(short, long)]
        owner: Option<String>,
    },
    #[command(about = "List tasks")]
    List {
        /// Only tasks owned by the configured user
        #[arg(short, long)]
        mine: bool,
    },
    #[command(about = "Delete a task")]
    Delete { id: i64 },
}

pub fn cmd(args: TaskArgs) -> Result<()> {
    let tasks = Tasks::new(open_store()?);
    let user_id = Config::read()?.user.map(|u| u.user_id);

    match args.command {
        TaskCommand::Add { name, comment, owner } => {
            let owner = owner.or(user_id);
            let task = tasks.insert(&NewTask::new(&name, &comment, owner.as_deref()))?;
            msg_success!(Message::TaskCreated(task.id, task.name));
        }
        TaskCommand::List { mine } => {
            let list = tasks.fetch(list_filter(mine, user_id)?)?;
            if list.is_empty() {
                msg_info!(Message::NoTasksFound);
            } else {
                View::tasks(&list, Utc::now());
            }
        }
        TaskCommand::Delete { id } => {
            let task = tasks.delete(id)?;
            msg_success!(Message::TaskDeleted(task.id, task.name));
        }
    }

    Ok(())
}

fn list_filter(mine: bool, user_id: Option<String>) -> Result<TaskFilter> {
    match (mine, user_id) {
        (false, _) => Ok(TaskFilter::All),
        (true, Some(user_id)) => Ok(TaskFilter::ByOwner(user_id)),
        (true, None) => msg_bail_anyhow!(Message::NoUserConfigured),
    }
}
