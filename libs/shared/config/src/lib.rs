use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth_jwt_secret: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            auth_jwt_secret: env::var("AUTH_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("AUTH_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty())
                .or_else(|| {
                    warn!("DATABASE_URL not set, falling back to in-memory store");
                    None
                }),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using default 3000");
                    3000
                }),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Bearer tokens cannot be validated without a signing secret.
    pub fn is_configured(&self) -> bool {
        !self.auth_jwt_secret.is_empty()
    }

    pub fn uses_database(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            auth_jwt_secret: "secret".to_string(),
            database_url: None,
            database_max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 8080,
            seed_demo_data: false,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_is_configured_requires_secret() {
        let mut config = config();
        assert!(config.is_configured());
        assert!(!config.uses_database());

        config.auth_jwt_secret.clear();
        assert!(!config.is_configured());
    }
}
