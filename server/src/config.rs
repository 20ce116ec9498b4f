//! Process configuration
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it.

use std::path::PathBuf;
use std::time::Duration;

use catalog_index::{CatalogSchema, IndexConfig};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "catalog-server")]
#[command(about = "HTTP service ranking catalog items against free-text queries")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Debug mode: serve immediately instead of waiting for the index
    #[arg(
        long,
        env = "DEBUG",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,

    /// Hugging Face access token for gated models
    #[arg(long, env = "HUGGINGFACE_TOKEN", hide_env_values = true)]
    pub huggingface_token: Option<String>,

    /// Embedding model identifier
    #[arg(long, env = "MODEL_NAME", default_value = catalog_index::config::DEFAULT_MODEL_ID)]
    pub model_name: String,

    /// Catalog CSV file
    #[arg(long, env = "CSV_PATH", default_value = catalog_index::config::DEFAULT_CATALOG_PATH)]
    pub csv_path: PathBuf,

    /// Catalog column holding item names
    #[arg(long, env = "NAME_COLUMN", default_value = "Nama")]
    pub name_column: String,

    /// Catalog column holding item descriptions
    #[arg(long, env = "DESCRIPTION_COLUMN", default_value = "DeskripsiObat")]
    pub description_column: String,

    /// Largest top-k a request may ask for
    #[arg(long, env = "MAX_TOP_K", default_value_t = 20)]
    pub max_top_k: usize,

    /// Top-k used when a request omits it or asks for an invalid value
    #[arg(long, env = "DEFAULT_TOP_K", default_value_t = 5)]
    pub default_top_k: usize,

    /// Start building the index at startup
    #[arg(
        long,
        env = "AUTO_INITIALIZE",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub auto_initialize: bool,

    /// Seconds to wait for the index before serving
    #[arg(long, env = "STARTUP_TIMEOUT", default_value_t = 600)]
    pub startup_timeout: u64,

    /// Log level (trace, debug, info, warning, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Records encoded per embedding call
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = 32)]
    pub batch_size: usize,

    /// Query embeddings kept in memory (0 disables caching)
    #[arg(long, env = "QUERY_CACHE_SIZE", default_value_t = 256)]
    pub query_cache_size: usize,

    /// Directory for downloaded model files
    #[arg(long, env = "MODEL_CACHE_DIR")]
    pub model_cache_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Index settings derived from this configuration
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            model_id: self.model_name.clone(),
            credential: self.huggingface_token.clone(),
            source: self.csv_path.clone(),
            schema: CatalogSchema {
                name_column: self.name_column.clone(),
                description_column: self.description_column.clone(),
                ..CatalogSchema::default()
            },
            batch_size: self.batch_size,
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k,
            query_cache_size: self.query_cache_size,
            ..IndexConfig::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout)
    }

    /// Default tracing directive for `LOG_LEVEL`
    pub fn log_filter(&self) -> String {
        let level = match self.log_level.to_ascii_lowercase().as_str() {
            "warning" => "warn",
            "critical" | "fatal" => "error",
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        format!("catalog_server={level},catalog_index={level},tower_http={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["catalog-server"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_flags() {
        let config = parse(&[
            "--port",
            "9000",
            "--debug",
            "True",
            "--auto-initialize",
            "false",
            "--max-top-k",
            "10",
            "--default-top-k",
            "3",
            "--csv-path",
            "/tmp/catalog.csv",
        ]);
        assert_eq!(config.port, 9000);
        assert!(config.debug);
        assert!(!config.auto_initialize);

        let index = config.index_config();
        assert_eq!(index.max_top_k, 10);
        assert_eq!(index.default_top_k, 3);
        assert_eq!(index.source, PathBuf::from("/tmp/catalog.csv"));
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_index_config_carries_schema_and_credential() {
        let config = parse(&[
            "--name-column",
            "title",
            "--description-column",
            "body",
            "--huggingface-token",
            "hf_abc",
        ]);
        let index = config.index_config();
        assert_eq!(index.schema.name_column, "title");
        assert_eq!(index.schema.description_column, "body");
        assert_eq!(index.schema.separator, " - ");
        assert_eq!(index.credential(), Some("hf_abc"));
    }

    #[test]
    fn test_bind_addr_and_timeout() {
        let config = parse(&["--host", "127.0.0.1", "--port", "8080", "--startup-timeout", "5"]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.startup_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_log_filter_maps_levels() {
        let config = parse(&["--log-level", "WARNING"]);
        assert_eq!(
            config.log_filter(),
            "catalog_server=warn,catalog_index=warn,tower_http=warn"
        );

        let config = parse(&["--log-level", "DEBUG"]);
        assert!(config.log_filter().starts_with("catalog_server=debug"));

        let config = parse(&["--log-level", "nonsense"]);
        assert!(config.log_filter().starts_with("catalog_server=info"));
    }
}
