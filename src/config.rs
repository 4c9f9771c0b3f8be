use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Read configuration from the process environment, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = env_map
            .get("HOST")
            .map(|s| s.as_str())
            .unwrap_or("0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue("HOST".to_string(), "must be an IP address".to_string())
            })?;

        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("3000")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_url = env_map
            .get("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_URL".to_string()))?;

        Ok(Config {
            host,
            port,
            database_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "DATABASE_URL".to_string(),
            "sqlite:/tmp/circles.db".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.database_url, "sqlite:/tmp/circles.db");
    }

    #[test]
    fn test_port_override() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "8081".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn test_missing_database_url() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_blank_database_url_is_missing() {
        let mut env_map = setup_required_env();
        env_map.insert("DATABASE_URL".to_string(), "  ".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::MissingEnv(_))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_host() {
        let mut env_map = setup_required_env();
        env_map.insert("HOST".to_string(), "localhost:80".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "HOST"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
