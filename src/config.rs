use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub export: ExportConfig,
    pub benchmark: BenchmarkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub xml_path: String,
    pub entry_element: String,
    pub body_attribute: String,
    pub timestamp_attribute: String,
    pub default_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub enable_analytics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub records_path: String,
    pub dashboard_path: String,
    pub default_format: String,
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub lookups: usize,
    pub synthetic_records: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                xml_path: "modified_sms_v2.xml".to_string(),
                entry_element: "sms".to_string(),
                body_attribute: "body".to_string(),
                timestamp_attribute: "date".to_string(),
                default_currency: "RWF".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite:data/db.sqlite3".to_string(),
                max_connections: 4,
                connection_timeout_secs: 30,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8008,
                username: "admin".to_string(),
                password: "admin123".to_string(),
                enable_analytics: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            export: ExportConfig {
                records_path: "data/processed/transactions.json".to_string(),
                dashboard_path: "data/processed/dashboard.json".to_string(),
                default_format: "json".to_string(),
                recent_limit: 50,
            },
            benchmark: BenchmarkConfig {
                lookups: 1000,
                synthetic_records: 25,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("momo").required(false))
            // Add environment variables with prefix, e.g. MOMO_SERVER__PORT
            .add_source(
                Environment::with_prefix("MOMO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate source config
        if self.source.xml_path.trim().is_empty() {
            return Err(anyhow::anyhow!("source.xml_path cannot be empty"));
        }
        for (name, value) in [
            ("source.entry_element", &self.source.entry_element),
            ("source.body_attribute", &self.source.body_attribute),
            ("source.timestamp_attribute", &self.source.timestamp_attribute),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} cannot be empty", name));
            }
        }
        if self.source.default_currency.len() != 3
            || !self.source.default_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(anyhow::anyhow!(
                "Invalid default currency: {}. Must be a three-letter code",
                self.source.default_currency
            ));
        }

        // Validate database config
        if !self.database.url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!("Only SQLite databases are supported"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate server config
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port must be greater than 0"));
        }
        if self.server.username.is_empty() || self.server.password.is_empty() {
            return Err(anyhow::anyhow!("server credentials cannot be empty"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate export config
        let valid_formats = ["json", "csv"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format,
                valid_formats
            ));
        }
        if self.export.recent_limit == 0 {
            return Err(anyhow::anyhow!("recent_limit must be greater than 0"));
        }

        // Validate benchmark config
        if self.benchmark.lookups == 0 {
            return Err(anyhow::anyhow!("benchmark.lookups must be greater than 0"));
        }

        Ok(())
    }

    /// Get the source document path from environment or config
    pub fn get_xml_path(&self) -> String {
        std::env::var("MOMO_XML").unwrap_or_else(|_| self.source.xml_path.clone())
    }

    /// Get database URL from environment or config
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get Basic auth credentials from environment or config
    pub fn get_credentials(&self) -> (String, String) {
        (
            std::env::var("API_USER").unwrap_or_else(|_| self.server.username.clone()),
            std::env::var("API_PASS").unwrap_or_else(|_| self.server.password.clone()),
        )
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
