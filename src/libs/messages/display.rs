//! Message text.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

const SESSION_HELP: &str = "Commands:
  start <id> | pause <id> | resume <id> | stop <id>   control a task timer
  show <id>                                           live elapsed time
  add <name>                                          create a task
  list                                                list tasks
  status                                              connection state as JSON
  retry                                               one reconnect attempt
  quit                                                leave the session";

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TASK MESSAGES ===
            Message::TaskCreated(id, name) => format!("Task #{} \"{}\" created", id, name),
            Message::TaskDeleted(id, name) => format!("Task #{} \"{}\" deleted", id, name),
            Message::TaskNotFound(id) => format!("Task #{} not found", id),
            Message::NoTasksFound => "No tasks found".to_string(),
            Message::NoUserConfigured => "No user configured; run `taskpulse init` and set up the User module".to_string(),

            // === TIMER MESSAGES ===
            Message::TimerApplied(action, name, elapsed) => format!("Timer {}: \"{}\" at {}", past_tense(action), name, elapsed),
            Message::TimerBusy(id) => format!("Another timer operation on task #{} is still running, skipped", id),
            Message::TimerNotApplicable(action, status) => format!("Cannot {} a timer that is {}", action, status),
            Message::TimerElapsed(name, status, elapsed) => format!("\"{}\" ({}): {}", name, status, elapsed),
            Message::TimerOperationSkipped(action, id) => format!("Skipping {} on task #{}: operation in flight", action, id),
            Message::TimerTransitionRejected(action, id, status) => format!("Ignoring {} on task #{}: timer is {}", action, id, status),
            Message::TimerInvariantViolated(id, reason) => format!("Task #{} has inconsistent timer state: {}", id, reason),
            Message::TimerPersistFailed(action, id, error) => format!("Failed to persist {} on task #{}: {}", action, id, error),
            Message::TimerRowUnreadable(id, error) => format!("Task #{} was updated but the stored row could not be read back: {}", id, error),

            // === CHANGE FEED MESSAGES ===
            Message::SubscriptionOpened(table, handle) => format!("Subscribed to '{}' changes ({})", table, handle),
            Message::SubscriptionFailed(table, error) => format!("Failed to subscribe to '{}' changes: {}", table, error),
            Message::SubscriptionClosed(table, handle) => format!("Closed '{}' subscription ({})", table, handle),
            Message::UnknownChangeEvent(table, kind) => format!("Dropping '{}' event of unknown type '{}'", table, kind),
            Message::ChangeEventReceived(kind, table, id) => format!("{} {} #{}", kind, table, id),

            // === CONNECTION MESSAGES ===
            Message::ConnectionMonitorStarted(secs) => format!("Connection monitor started, probing every {}s", secs),
            Message::ConnectionMonitorStopped => "Connection monitor stopped".to_string(),
            Message::ConnectionRestored => "Connection restored".to_string(),
            Message::ConnectionLost(error) => format!("Connection lost: {}", error),
            Message::ConnectionStillDown(error) => format!("Store still unreachable: {}", error),
            Message::ReconnectRefused(attempts, max) => format!("Reconnect refused ({}/{} attempts used or one in flight)", attempts, max),
            Message::ReconnectAttempt(attempt, max, delay) => format!("Reconnect attempt {}/{} in {} ms", attempt, max, delay),
            Message::ReconnectExhausted => "Reconnect attempts exhausted; restart to try again".to_string(),
            Message::StatusOnline => "Store is reachable".to_string(),
            Message::StatusOffline(error) => format!("Store is unreachable: {}", error),
            Message::StatusOfflineGaveUp(error, attempts) => format!("Store is unreachable after {} reconnect attempts: {}", attempts, error),
            Message::BannerOnline => "Back online".to_string(),
            Message::BannerOffline(error) => format!("Offline: {} (type 'retry' to reconnect)", error),

            // === WATCH SESSION MESSAGES ===
            Message::WatchStarted(table) => format!("Watching '{}'. Type 'help' for commands, Ctrl-C to quit.", table),
            Message::WatchStopped => "Watch stopped".to_string(),
            Message::SessionHelp => SESSION_HELP.to_string(),
            Message::SessionUnknownCommand(line) => format!("Unknown command: '{}'. Type 'help'.", line),
            Message::SessionCommandFailed(error) => error.clone(),
            Message::ReceivedSigterm => "Received SIGTERM, shutting down".to_string(),
            Message::ReceivedSigint => "Received SIGINT, shutting down".to_string(),
            Message::ReceivedCtrlC => "Received Ctrl-C, shutting down".to_string(),
            Message::SignalHandlerFailed(error) => format!("Failed to install signal handler: {}", error),
            Message::SignalHandlingNotSupported => "Signal handling is not supported on this platform".to_string(),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::ConfigModuleRealtime => "Realtime settings".to_string(),
            Message::ConfigModuleServer => "Server settings".to_string(),
            Message::ConfigModuleUser => "User settings".to_string(),
            Message::PromptSelectModules => "Select modules to configure".to_string(),
            Message::PromptProbeInterval => "Probe interval (seconds)".to_string(),
            Message::PromptBaseDelay => "Reconnect base delay (milliseconds)".to_string(),
            Message::PromptMaxReconnectAttempts => "Maximum reconnect attempts".to_string(),
            Message::PromptServerApiUrl => "Server API URL".to_string(),
            Message::PromptServerApiKey => "Server API key".to_string(),
            Message::PromptUserId => "Your user id".to_string(),

            // === MIGRATION MESSAGES ===
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
        };

        write!(f, "{}", text)
    }
}

fn past_tense(action: &str) -> &str {
    match action {
        "start" => "started",
        "pause" => "paused",
        "resume" => "resumed",
        "stop" => "stopped",
        other => other,
    }
}
