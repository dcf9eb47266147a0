use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl Settings {
    /// Defaults, then `trivia.toml` if present, then `TRIVIA_*` variables
    /// (`TRIVIA_SERVER__PORT=9000`). A `.env` file is read first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        defaults()?
            .add_source(File::with_name("trivia").required(false))
            .add_source(
                Environment::with_prefix("TRIVIA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("database.path", "trivia.db")?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)
}
