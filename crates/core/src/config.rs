use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

/// Ten mebibytes, the largest accepted upload.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub model_gateway: ModelGatewayConfig,
    pub governance: GovernanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: u64,
    pub enable_cors: bool,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of fingerprints kept before the least recently used is evicted.
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelGatewayConfig {
    pub api_base: String,
    pub model: String,
    pub gemini_api_key: Option<Secret<String>>,
    /// Transport timeout for a single call. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GovernanceConfig {
    pub log_filter: String,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// Layers, lowest precedence first: built-in defaults, `config/default`,
    /// `config/{INTENTLENS_ENV}`, `config/local`, `APP__*` variables, and
    /// finally the bare `HOST`, `PORT` and `GEMINI_API_KEY` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("INTENTLENS_ENV").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("server.host", std::env::var("HOST").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option(
                "model_gateway.gemini_api_key",
                std::env::var("GEMINI_API_KEY").ok(),
            )?
            .build()?;

        s.try_deserialize()
    }

    /// Seed a builder with the built-in defaults.
    pub fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000u64)?
            .set_default("server.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
            .set_default("server.enable_cors", true)?
            .set_default("server.allowed_origins", vec!["*"])?
            .set_default("cache.capacity", 1024u64)?
            .set_default(
                "model_gateway.api_base",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("model_gateway.model", "gemini-flash-latest")?
            .set_default("governance.log_filter", "info,intentlens=debug")?
            .set_default("governance.json_logs", false)
    }

    /// Whether an inference credential is present.
    pub fn has_api_key(&self) -> bool {
        use secrecy::ExposeSecret;
        self.model_gateway
            .gemini_api_key
            .as_ref()
            .map(|key| !key.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                enable_cors: true,
                allowed_origins: vec!["*".into()],
            },
            cache: CacheConfig { capacity: 1024 },
            model_gateway: ModelGatewayConfig {
                api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
                model: "gemini-flash-latest".into(),
                gemini_api_key: None,
                request_timeout_secs: None,
            },
            governance: GovernanceConfig {
                log_filter: "info,intentlens=debug".into(),
                json_logs: false,
            },
        }
    }
}
