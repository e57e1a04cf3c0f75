//! Configuration management for taskpulse.
//!
//! Settings are stored as pretty-printed JSON (`config.json`) in the
//! platform data directory resolved by [`DataStorage`]. Every section is
//! optional so a fresh install runs against the local SQLite store with
//! default timings.
//!
//! ## Sections
//!
//! - **realtime**: probe interval, reconnect backoff and attempt budget
//! - **server**: hosted REST store endpoint and API key
//! - **user**: identity used to keep only the user's own change events
//!
//! ```rust,no_run
//! use taskpulse::libs::config::Config;
//!
//! let config = Config::read()?;
//! let realtime = config.realtime.unwrap_or_default();
//! println!("probing every {}s", realtime.probe_interval);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A section offered by the interactive setup.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Connection monitoring and reconnection timings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RealtimeConfig {
    /// Seconds between background connectivity probes.
    pub probe_interval: u64,

    /// Base reconnect delay in milliseconds. Attempt `n` waits `n * base_delay`.
    pub base_delay: u64,

    /// Consecutive failed reconnects after which manual retry is refused.
    pub max_reconnect_attempts: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig {
            probe_interval: 30,
            base_delay: 2000,
            max_reconnect_attempts: 5,
        }
    }
}

/// Hosted REST data store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Project URL, e.g. `https://project.example.co`. REST paths are appended to it.
    pub api_url: String,

    /// Key sent as both `apikey` and bearer token.
    pub api_key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserConfig {
    /// Matched against the `owner_id` column of incoming change events.
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime: Option<RealtimeConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,
}

impl Config {
    /// Loads `config.json`, or the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive setup wizard. Existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = [
            ConfigModule {
                key: "realtime".to_string(),
                name: "Realtime".to_string(),
            },
            ConfigModule {
                key: "server".to_string(),
                name: "Server".to_string(),
            },
            ConfigModule {
                key: "user".to_string(),
                name: "User".to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "realtime" => {
                    let default = config.realtime.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleRealtime);
                    config.realtime = Some(RealtimeConfig {
                        probe_interval: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptProbeInterval.to_string())
                            .default(default.probe_interval)
                            .interact_text()?,
                        base_delay: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBaseDelay.to_string())
                            .default(default.base_delay)
                            .interact_text()?,
                        max_reconnect_attempts: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptMaxReconnectAttempts.to_string())
                            .default(default.max_reconnect_attempts)
                            .interact_text()?,
                    });
                }
                "server" => {
                    let default = config.server.clone().unwrap_or(ServerConfig {
                        api_url: "".to_string(),
                        api_key: "".to_string(),
                    });
                    msg_print!(Message::ConfigModuleServer);
                    config.server = Some(ServerConfig {
                        api_url: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptServerApiUrl.to_string())
                            .default(default.api_url)
                            .interact_text()?,
                        api_key: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptServerApiKey.to_string())
                            .default(default.api_key)
                            .interact_text()?,
                    });
                }
                "user" => {
                    let default = config.user.clone().map(|u| u.user_id).unwrap_or_default();
                    msg_print!(Message::ConfigModuleUser);
                    config.user = Some(UserConfig {
                        user_id: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptUserId.to_string())
                            .default(default)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
