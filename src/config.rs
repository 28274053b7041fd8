use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret the identity provider must present on `/api/login`.
    pub shared_secret: Option<String>,
    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    pub session_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded bytes, created on startup if absent
    pub upload_dir: String,
    /// Maximum size of a single uploaded file in bytes
    pub max_upload_size: u64,
    /// Maximum number of files in one upload request
    pub max_upload_files: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            cookie_secure: false,
            session_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "./uploads".to_string(),
            max_upload_size: 50 * 1024 * 1024,
            max_upload_files: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let max_upload_files = std::env::var("MAX_UPLOAD_FILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let shared_secret = std::env::var("AUTH_SHARED_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let cookie_secure = env_flag("COOKIE_SECURE");
        let test_mode = env_flag("TEST_MODE");

        let config = Config {
            auth: AuthConfig {
                shared_secret,
                cookie_secure,
                session_ttl_secs,
            },
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                upload_dir,
                max_upload_size,
                max_upload_files,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.storage.upload_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "UPLOAD_DIR cannot be empty".to_string(),
            ));
        }

        if self.storage.max_upload_size == 0 || self.storage.max_upload_files == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE and MAX_UPLOAD_FILES must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.auth.shared_secret.is_none() {
            if !self.test_mode {
                return Err(ConfigError::ValidationError(
                    "AUTH_SHARED_SECRET is required unless TEST_MODE is enabled".to_string(),
                ));
            }
            tracing::warn!("AUTH_SHARED_SECRET is not set. /api/login accepts claims from any caller.");
        }

        Ok(())
    }

    /// Request body ceiling for an upload: every part at full size plus multipart overhead.
    pub fn upload_body_limit(&self) -> usize {
        let per_file = usize::try_from(self.storage.max_upload_size).unwrap_or(usize::MAX);
        per_file
            .saturating_mul(self.storage.max_upload_files)
            .saturating_add(1024 * 1024)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
