use crate::auth::{MAX_PASSWORD_COST, MIN_PASSWORD_COST};
use crate::error::ConfigError;

/// Minimum signing secret length in bytes (HS256 key size)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Upper bound for any configured token lifetime: ten years, in seconds
pub const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 3600;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Authentication settings shared read-only by every request
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
    /// Honor a caller-requested access token lifetime within `max_access_token_expiry`
    #[serde(default)]
    pub allow_requested_expiry: bool,
    #[serde(default = "default_access_token_expiry")]
    pub max_access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds (1440 hours)
    /// bcrypt work factor
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

impl AuthSettings {
    /// Settings with the service defaults and the given signing secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: default_issuer(),
            access_token_expiry: default_access_token_expiry(),
            allow_requested_expiry: false,
            max_access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
            password_cost: default_password_cost(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "auth.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::MissingRequired("auth.issuer".to_string()));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.max_access_token_expiry < self.access_token_expiry {
            return Err(ConfigError::InvalidValue(
                "auth.max_access_token_expiry must not be below auth.access_token_expiry"
                    .to_string(),
            ));
        }
        if self.max_access_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(ConfigError::InvalidValue(format!(
                "auth.max_access_token_expiry must not exceed {} seconds",
                MAX_TOKEN_EXPIRY
            )));
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(ConfigError::InvalidValue(format!(
                "auth.refresh_token_expiry must not exceed {} seconds",
                MAX_TOKEN_EXPIRY
            )));
        }
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&self.password_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password_cost must be between {} and {}",
                MIN_PASSWORD_COST, MAX_PASSWORD_COST
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_access_token_expiry() -> i64 {
    3600
}

fn default_refresh_token_expiry() -> i64 {
    1440 * 3600
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Load settings from `configuration.*` (optional) and `APP_*` environment variables,
/// e.g. `APP_AUTH__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_defaults_are_valid() {
        let settings = AuthSettings::with_secret(SECRET);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.issuer, "chirpy");
        assert_eq!(settings.access_token_expiry, 3600);
        assert_eq!(settings.refresh_token_expiry, 5_184_000);
        assert!(!settings.allow_requested_expiry);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let settings = AuthSettings::with_secret("   ");
        assert!(matches!(settings.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_short_secret_rejected() {
        let settings = AuthSettings::with_secret("short");
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_non_positive_expiry_rejected() {
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.access_token_expiry = 0;
        assert!(settings.validate().is_err());

        let mut settings = AuthSettings::with_secret(SECRET);
        settings.refresh_token_expiry = -1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_max_expiry_below_default_rejected() {
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.max_access_token_expiry = 60;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_password_cost_bounds() {
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.password_cost = 3;
        assert!(settings.validate().is_err());

        settings.password_cost = MIN_PASSWORD_COST;
        assert!(settings.validate().is_ok());

        settings.password_cost = MAX_PASSWORD_COST + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_oversized_expiry_rejected() {
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.refresh_token_expiry = 10_000_000_000_000;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));

        let mut settings = AuthSettings::with_secret(SECRET);
        settings.max_access_token_expiry = MAX_TOKEN_EXPIRY + 1;
        assert!(settings.validate().is_err());

        let mut settings = AuthSettings::with_secret(SECRET);
        settings.refresh_token_expiry = MAX_TOKEN_EXPIRY;
        assert!(settings.validate().is_ok());
    }
}
