use super::open_store;
use crate::db::tasks::Tasks;
use crate::libs::formatter::format_elapsed;
use crate::libs::messages::Message;
use crate::libs::task_timer::{TaskTimers, TimerOutcome};
use crate::libs::timer::TimerAction;
use crate::{msg_bail_anyhow, msg_info, msg_success, msg_warning};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct TimerArgs {
    #[command(subcommand)]
    command: TimerCommand,
}

#[derive(Debug, Subcommand)]
enum TimerCommand {
    #[command(about = "Start the timer of an idle task")]
    Start { id: i64 },
    #[command(about = "Pause a running timer")]
    Pause { id: i64 },
    #[command(about = "Resume a paused timer")]
    Resume { id: i64 },
    #[command(about = "Stop the timer and complete the task")]
    Stop { id: i64 },
    #[command(about = "Show the live elapsed time of a task")]
    Show { id: i64 },
}

pub async fn cmd(args: TimerArgs) -> Result<()> {
    let store = open_store()?;
    let tasks = Tasks::new(store.clone());
    let timers = TaskTimers::new(store);

    let (action, id) = match args.command {
        TimerCommand::Start { id } => (TimerAction::Start, id),
        TimerCommand::Pause { id } => (TimerAction::Pause, id),
        TimerCommand::Resume { id } => (TimerAction::Resume, id),
        TimerCommand::Stop { id } => (TimerAction::Stop, id),
        TimerCommand::Show { id } => return show(&tasks, &timers, id),
    };

    apply(&tasks, &timers, action, id).await
}

/// Loads the task and runs `action` against its persisted timer state.
pub async fn apply(tasks: &Tasks, timers: &TaskTimers, action: TimerAction, id: i64) -> Result<()> {
    let Some(task) = tasks.get(id)? else {
        msg_bail_anyhow!(Message::TaskNotFound(id));
    };

    match timers.apply(action, &task).await? {
        TimerOutcome::Applied(task) => {
            let elapsed = format_elapsed(timers.current_elapsed_time(&task));
            msg_success!(Message::TimerApplied(action.to_string(), task.name, elapsed));
        }
        TimerOutcome::Skipped => msg_warning!(Message::TimerBusy(task.id)),
        TimerOutcome::Unchanged => msg_warning!(Message::TimerNotApplicable(action.to_string(), task.timer.timer_status.to_string())),
    }

    Ok(())
}

pub fn show(tasks: &Tasks, timers: &TaskTimers, id: i64) -> Result<()> {
    let Some(task) = tasks.get(id)? else {
        msg_bail_anyhow!(Message::TaskNotFound(id));
    };

    let elapsed = format_elapsed(timers.current_elapsed_time(&task));
    msg_info!(Message::TimerElapsed(task.name, task.timer.timer_status.to_string(), elapsed));

    Ok(())
}
