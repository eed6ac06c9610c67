use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// PostgreSQL connection URL; in-memory stores are used when absent.
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventsConfig {
    /// Bounded event queue capacity; overflow drops events.
    pub queue_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { queue_size: 1024 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 5 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Dev-only fallback; override in config for any real deployment.
            jwt_secret: "change-me".to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        match fs::read_to_string(&config_path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Failed to parse {}: {}, using defaults", config_path, e);
                    Self::default_config()
                }
            },
            Err(_) => {
                eprintln!("Config {} not found, using defaults", config_path);
                Self::default_config()
            }
        }
    }

    fn default_config() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "servhub.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            events: EventsConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            postgres_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let config = AppConfig::load("does-not-exist");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.events.queue_size, 1024);
        assert_eq!(config.cache.ttl_seconds, 5);
        assert!(config.postgres_url.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_section_defaults() {
        let yaml = r#"
log_level: debug
log_dir: ./logs
log_file: test.log
use_json: false
rotation: never
gateway:
  host: 127.0.0.1
  port: 9090
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.events.queue_size, 1024);
    }
}
