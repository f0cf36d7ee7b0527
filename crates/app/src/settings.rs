//! Handles settings for the application. Configuration is written in
//! `settings.toml`, with `SEMANAL__`-prefixed environment variables layered
//! on top.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        App {
            level: default_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SEMANAL").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
