use super::open_store;
use crate::api::RestStore;
use crate::db::store::Probe;
use crate::libs::config::Config;
use crate::libs::connection::{ConnectionMonitor, ConnectionState};
use crate::libs::messages::Message;
use crate::{msg_error, msg_print, msg_success};
use anyhow::Result;
use clap::Args;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Retry with backoff until connected or out of attempts
    #[arg(short, long)]
    retry: bool,
    /// Print the connection state as JSON
    #[arg(long)]
    json: bool,
}

pub async fn cmd(args: StatusArgs) -> Result<()> {
    let config = Config::read()?;
    let monitor = ConnectionMonitor::new(probe_for(&config)?, &config.realtime.unwrap_or_default());

    let mut connected = monitor.check_connection().await;
    if args.retry {
        while !connected && monitor.snapshot().can_reconnect() {
            connected = monitor.reconnect().await;
        }
    }

    let state = monitor.snapshot();
    if args.json {
        let json = serde_json::to_string_pretty(&state)?;
        msg_print!(json);
    } else {
        report(&state);
    }

    Ok(())
}

/// The store that connectivity checks run against: the configured server
/// when there is one, otherwise the local database.
pub(crate) fn probe_for(config: &Config) -> Result<Arc<dyn Probe>> {
    let probe: Arc<dyn Probe> = match &config.server {
        Some(server) => Arc::new(RestStore::new(server)?),
        None => open_store()?,
    };
    Ok(probe)
}

fn report(state: &ConnectionState) {
    if state.is_connected {
        msg_success!(Message::StatusOnline);
        return;
    }

    let reason = state.last_error.clone().unwrap_or_default();
    if state.can_reconnect() {
        msg_error!(Message::StatusOffline(reason));
    } else {
        msg_error!(Message::StatusOfflineGaveUp(reason, state.reconnect_attempts));
    }
}
