/// Every user-facing or logged message, with its interpolated values.
///
/// Text lives in `display.rs`; call sites only pick a variant.
#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskCreated(i64, String), // id, name
    TaskDeleted(i64, String), // id, name
    TaskNotFound(i64),
    NoUserConfigured,
    NoTasksFound,

    // === TIMER MESSAGES ===
    TimerApplied(String, String, String),        // action, task name, elapsed
    TimerBusy(i64),                              // task id
    TimerNotApplicable(String, String),          // action, timer status
    TimerElapsed(String, String, String),        // task name, timer status, elapsed
    TimerOperationSkipped(String, i64),          // action, task id
    TimerTransitionRejected(String, i64, String), // action, task id, timer status
    TimerInvariantViolated(i64, String),
    TimerPersistFailed(String, i64, String), // action, task id, error
    TimerRowUnreadable(i64, String),         // task id, error

    // === CHANGE FEED MESSAGES ===
    SubscriptionOpened(String, String), // table, handle
    SubscriptionFailed(String, String), // table, error
    SubscriptionClosed(String, String), // table, handle
    UnknownChangeEvent(String, String), // table, event type
    ChangeEventReceived(String, String, String), // event type, table, record id

    // === CONNECTION MESSAGES ===
    ConnectionMonitorStarted(u64), // probe interval, seconds
    ConnectionMonitorStopped,
    ConnectionRestored,
    ConnectionLost(String),
    ConnectionStillDown(String),
    ReconnectRefused(u32, u32),      // attempts, max
    ReconnectAttempt(u32, u32, u64), // attempt, max, delay ms
    ReconnectExhausted,
    StatusOnline,
    StatusOffline(String),
    StatusOfflineGaveUp(String, u32), // error, attempts
    BannerOnline,
    BannerOffline(String),

    // === WATCH SESSION MESSAGES ===
    WatchStarted(String),
    WatchStopped,
    SessionHelp,
    SessionUnknownCommand(String),
    SessionCommandFailed(String),
    ReceivedSigterm,
    ReceivedSigint,
    ReceivedCtrlC,
    SignalHandlerFailed(String),
    SignalHandlingNotSupported,

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleRealtime,
    ConfigModuleServer,
    ConfigModuleUser,
    PromptSelectModules,
    PromptProbeInterval,
    PromptBaseDelay,
    PromptMaxReconnectAttempts,
    PromptServerApiUrl,
    PromptServerApiKey,
    PromptUserId,

    // === MIGRATION MESSAGES ===
    RunningMigration(u32, String), // version, name
    MigrationFailed(u32, String),  // version, error
}
