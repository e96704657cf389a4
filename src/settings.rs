use serde::Deserialize;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3333;
const DEFAULT_POOL_SIZE: u32 = 10;

/// Runtime settings, layered from a `.env` file and the process environment.
/// Keys are the upper-case variable names: `DATABASE_URL`, `HOST`, `PORT`,
/// `DATABASE_POOL_SIZE`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_pool_size", rename = "database_pool_size")]
    pub pool_size: u32,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl Settings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Settings {
            database_url: database_url.into(),
            host: default_host(),
            port: default_port(),
            pool_size: default_pool_size(),
        }
    }

    pub fn load() -> Result<Self, ::config::ConfigError> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        Self::from_environment(None)
    }

    /// Reads settings from `source` when given, or from the process environment.
    fn from_environment(
        source: Option<::config::Map<String, String>>,
    ) -> Result<Self, ::config::ConfigError> {
        let cfg = ::config::Config::builder()
            .add_source(
                ::config::Environment::default()
                    .source(source)
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;

        if settings.pool_size == 0 {
            return Err(::config::ConfigError::Message(
                "DATABASE_POOL_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(vars: &[(&str, &str)]) -> Option<::config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let settings =
            Settings::from_environment(source(&[("DATABASE_URL", "postgres://localhost/books")]))
                .unwrap();

        assert_eq!(Settings::new("postgres://localhost/books"), settings);
        assert_eq!("127.0.0.1:3333", settings.bind_address());
    }

    #[test]
    fn overrides_are_read() {
        let settings = Settings::from_environment(source(&[
            ("DATABASE_URL", "postgres://db/books"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("DATABASE_POOL_SIZE", "4"),
        ]))
        .unwrap();

        assert_eq!("0.0.0.0:8080", settings.bind_address());
        assert_eq!(4, settings.pool_size);
    }

    #[test]
    fn database_url_is_required() {
        assert!(Settings::from_environment(source(&[("PORT", "8080")])).is_err());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(
            Settings::from_environment(source(&[("DATABASE_URL", "x"), ("PORT", "http")]))
                .is_err()
        );
        assert!(Settings::from_environment(source(&[
            ("DATABASE_URL", "x"),
            ("DATABASE_POOL_SIZE", "0")
        ]))
        .is_err());
    }
}
