use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub workflow: WorkflowConfig,

    pub extraction: ExtractionConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/casedesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub bind_address: String,

    pub cors_allowed_origins: Vec<String>,

    /// Marks the session cookie `Secure`. Enable only when the server is
    /// reached over HTTPS, otherwise browsers drop the cookie and the
    /// draft form loses its state on every request.
    pub secure_cookies: bool,

    /// Drafts are dropped after this long without a request.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6790,
            bind_address: "0.0.0.0".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
            secure_cookies: false,
            session_inactivity_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowProvider {
    Http,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub provider: WorkflowProvider,

    /// Endpoint that starts the case-lookup job. Required for `http`.
    pub endpoint: String,

    /// Sent as a bearer token when set.
    pub api_key: Option<String>,

    pub request_timeout_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            provider: WorkflowProvider::Local,
            endpoint: String::new(),
            api_key: None,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionBackend {
    #[default]
    Pdf,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub backend: ExtractionBackend,

    /// Upper bound for inline and fetched documents.
    pub max_pdf_bytes: usize,

    pub fetch_timeout_seconds: u64,

    /// Lets `pdf_url` point at loopback, private and link-local addresses.
    pub allow_private_hosts: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            backend: ExtractionBackend::Pdf,
            max_pdf_bytes: 20 * 1024 * 1024,
            fetch_timeout_seconds: 30,
            allow_private_hosts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("casedesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".casedesk").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` unless a file is already there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workflow.provider == WorkflowProvider::Http {
            let endpoint = self.workflow.endpoint.trim();
            if endpoint.is_empty() {
                anyhow::bail!("Workflow endpoint cannot be empty when provider is http");
            }
            url::Url::parse(endpoint)
                .with_context(|| format!("Invalid workflow endpoint: {endpoint}"))?;
        }

        if self.workflow.request_timeout_seconds == 0 {
            anyhow::bail!("Workflow request timeout must be > 0");
        }

        if self.extraction.max_pdf_bytes == 0 {
            anyhow::bail!("Extraction max_pdf_bytes must be > 0");
        }

        if self.extraction.fetch_timeout_seconds == 0 {
            anyhow::bail!("Extraction fetch timeout must be > 0");
        }

        if self.general.max_db_connections == 0
            || self.general.min_db_connections > self.general.max_db_connections
        {
            anyhow::bail!("Database pool bounds are invalid (min must be <= max, max > 0)");
        }

        if self.server.session_inactivity_minutes <= 0 {
            anyhow::bail!("Session inactivity must be > 0 minutes");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.workflow.provider, WorkflowProvider::Local);
        assert_eq!(config.extraction.backend, ExtractionBackend::Pdf);
        assert_eq!(config.general.max_db_connections, 5);
        assert!(!config.server.secure_cookies);
        assert!(!config.extraction.allow_private_hosts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[workflow]"));
        assert!(toml_str.contains("[extraction]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [workflow]
            provider = "http"
            endpoint = "https://workflow.example.com/start"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.workflow.provider, WorkflowProvider::Http);
        assert_eq!(config.server.port, 6790);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_provider_requires_endpoint() {
        let mut config = Config::default();
        config.workflow.provider = WorkflowProvider::Http;
        assert!(config.validate().is_err());

        config.workflow.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let toml_str = r#"
            [workflow]
            provider = "lambda"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let mut config = Config::default();
        config.extraction.max_pdf_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.min_db_connections = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("casedesk-config-{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.server.port = 7001;
        config.save_to_path(&path).unwrap();

        assert!(!Config::create_default_if_missing(&path).unwrap());
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.port, 7001);

        std::fs::remove_file(&path).ok();
    }
}
