use super::{open_store, status::probe_for, timer};
use crate::db::tasks::{TaskFilter, Tasks};
use crate::libs::config::Config;
use crate::libs::connection::ConnectionMonitor;
use crate::libs::messages::Message;
use crate::libs::realtime::{ChangeEvent, ChangeEventRegistry};
use crate::libs::shutdown;
use crate::libs::task::{NewTask, TASKS_TABLE};
use crate::libs::task_timer::TaskTimers;
use crate::libs::timer::TimerAction;
use crate::libs::view::View;
use crate::{msg_error, msg_info, msg_print, msg_success, msg_warning};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Table whose changes are printed
    #[arg(short, long, default_value = TASKS_TABLE)]
    table: String,
    /// Print changes for every owner, not just the configured user
    #[arg(short, long)]
    all: bool,
}

/// One line of session input.
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Timer(TimerAction, i64),
    Show(i64),
    Add(String),
    List,
    Status,
    Retry,
    Help,
    Quit,
}

impl SessionCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let id = || rest.parse::<i64>().ok();

        Some(match verb {
            "start" => SessionCommand::Timer(TimerAction::Start, id()?),
            "pause" => SessionCommand::Timer(TimerAction::Pause, id()?),
            "resume" => SessionCommand::Timer(TimerAction::Resume, id()?),
            "stop" => SessionCommand::Timer(TimerAction::Stop, id()?),
            "show" => SessionCommand::Show(id()?),
            "add" if !rest.is_empty() => SessionCommand::Add(rest.to_string()),
            "list" => SessionCommand::List,
            "status" => SessionCommand::Status,
            "retry" => SessionCommand::Retry,
            "help" => SessionCommand::Help,
            "quit" | "exit" => SessionCommand::Quit,
            _ => return None,
        })
    }
}

struct Session {
    tasks: Tasks,
    timers: TaskTimers,
    monitor: ConnectionMonitor,
    owner: Option<String>,
}

impl Session {
    async fn execute(&self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::Timer(action, id) => timer::apply(&self.tasks, &self.timers, action, id).await?,
            SessionCommand::Show(id) => timer::show(&self.tasks, &self.timers, id)?,
            SessionCommand::Add(name) => {
                let task = self.tasks.insert(&NewTask::new(&name, "", self.owner.as_deref()))?;
                msg_success!(Message::TaskCreated(task.id, task.name));
            }
            SessionCommand::List => {
                let filter = self.owner.clone().map_or(TaskFilter::All, TaskFilter::ByOwner);
                View::tasks(&self.tasks.fetch(filter)?, Utc::now());
            }
            SessionCommand::Status => {
                let state = serde_json::to_string_pretty(&self.monitor.snapshot())?;
                msg_print!(state);
            }
            SessionCommand::Retry => {
                let monitor = self.monitor.clone();
                tokio::spawn(async move {
                    if !monitor.reconnect().await && !monitor.snapshot().can_reconnect() {
                        msg_warning!(Message::ReconnectExhausted);
                    }
                });
            }
            SessionCommand::Help => msg_print!(Message::SessionHelp),
            SessionCommand::Quit => {}
        }

        Ok(())
    }
}

pub async fn cmd(args: WatchArgs) -> Result<()> {
    let config = Config::read()?;
    let store = open_store()?;

    let monitor = ConnectionMonitor::new(probe_for(&config)?, &config.realtime.clone().unwrap_or_default());
    let online = Arc::new(AtomicBool::new(true));
    let banner = monitor.subscribe(move |state| {
        if online.swap(state.is_connected, Ordering::SeqCst) == state.is_connected {
            return;
        }
        if state.is_connected {
            msg_success!(Message::BannerOnline);
        } else {
            msg_warning!(Message::BannerOffline(state.last_error.clone().unwrap_or_default()));
        }
    });
    monitor.start();

    let owner = config.user.map(|u| u.user_id);
    let filter_owner = owner.clone().filter(|_| !args.all);
    let registry = ChangeEventRegistry::new(store.clone());
    let listener = registry.register_listener(&args.table, move |event: &ChangeEvent| {
        if let Some(owner) = &filter_owner {
            if !event.owned_by("owner_id", owner) {
                return;
            }
        }
        let id = event.record_id().map_or_else(|| "?".to_string(), |id| id.to_string());
        msg_print!(Message::ChangeEventReceived(event.event_type.to_string(), event.table.clone(), id));
    });

    let session = Session {
        tasks: Tasks::new(store.clone()),
        timers: TaskTimers::new(store),
        monitor: monitor.clone(),
        owner,
    };

    msg_info!(Message::WatchStarted(args.table.clone()));
    let mut shutdown = shutdown::listen();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match SessionCommand::parse(&line) {
                    Some(SessionCommand::Quit) => break,
                    Some(command) => {
                        if let Err(e) = session.execute(command).await {
                            msg_error!(Message::SessionCommandFailed(e.to_string()));
                        }
                    }
                    None => msg_warning!(Message::SessionUnknownCommand(line.trim().to_string())),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    listener.unsubscribe();
    banner.unsubscribe();
    monitor.destroy();
    msg_info!(Message::WatchStopped);

    Ok(())
}
