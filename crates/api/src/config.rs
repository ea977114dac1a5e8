use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// `DATABASE_URL` is read by the binary directly and is not part of this
/// struct, so tests can build a config without a database.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deadline for each individual store call in milliseconds (default: `10000`).
    pub store_timeout_ms: u64,
    /// Connection pool size (default: `20`).
    pub db_max_connections: u32,
    /// Database role assumed for access-scoped timeline reads.
    pub rls_role: String,
    /// Shared secret accepted in the `x-device-key` header. Device
    /// credentials are rejected when unset.
    pub device_api_key: Option<String>,
    /// Bearer token verification settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default          |
    /// |------------------------|------------------|
    /// | `HOST`                 | `0.0.0.0`        |
    /// | `PORT`                 | `3000`           |
    /// | `CORS_ORIGINS`         | `*`              |
    /// | `REQUEST_TIMEOUT_SECS` | `30`             |
    /// | `STORE_TIMEOUT_MS`     | `10000`          |
    /// | `DB_MAX_CONNECTIONS`   | `20`             |
    /// | `RLS_ROLE`             | `authenticated`  |
    /// | `DEVICE_API_KEY`       | unset            |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let store_timeout_ms: u64 = std::env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("STORE_TIMEOUT_MS must be a valid u64");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let rls_role = std::env::var("RLS_ROLE").unwrap_or_else(|_| "authenticated".into());

        let device_api_key = std::env::var("DEVICE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        if device_api_key.is_none() {
            tracing::warn!("DEVICE_API_KEY is not set; device ingestion is disabled");
        }

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_timeout_ms,
            db_max_connections,
            rls_role,
            device_api_key,
            jwt,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Whether CORS is configured to accept any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
