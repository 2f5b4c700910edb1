use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub progression: ProgressionSettings,
    pub leaderboard: LeaderboardSettings,
    pub metrics: MetricsConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Tuning knobs for XP, levels and daily challenges
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionSettings {
    /// XP needed to go from level n to n+1 is `n * base_xp_per_level`
    pub base_xp_per_level: u64,
    /// Bonus XP granted for every level gained
    pub level_up_bonus_xp: u64,
    pub daily_challenge_count: usize,
    pub challenge_retention_days: i64,
    /// Max XP events kept per user
    pub xp_event_limit: usize,
    pub passing_quiz_score: u64,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            base_xp_per_level: 100,
            level_up_bonus_xp: 50,
            daily_challenge_count: 3,
            challenge_retention_days: 7,
            xp_event_limit: 100,
            passing_quiz_score: 70,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardSettings {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Basic auth credentials for /metrics, formatted as `username:password`
    pub auth: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:8081".to_string(),
            },
            progression: ProgressionSettings::default(),
            leaderboard: LeaderboardSettings::default(),
            metrics: MetricsConfig {
                auth: "admin:changeme".to_string(),
            },
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (APP_SECTION__KEY)
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let defaults = Config::default();
        let progression = ProgressionSettings {
            base_xp_per_level: get_or(
                &settings,
                "progression.base_xp_per_level",
                defaults.progression.base_xp_per_level,
            )?,
            level_up_bonus_xp: get_or(
                &settings,
                "progression.level_up_bonus_xp",
                defaults.progression.level_up_bonus_xp,
            )?,
            daily_challenge_count: get_or(
                &settings,
                "progression.daily_challenge_count",
                defaults.progression.daily_challenge_count,
            )?,
            challenge_retention_days: get_or(
                &settings,
                "progression.challenge_retention_days",
                defaults.progression.challenge_retention_days,
            )?,
            xp_event_limit: get_or(
                &settings,
                "progression.xp_event_limit",
                defaults.progression.xp_event_limit,
            )?,
            passing_quiz_score: get_or(
                &settings,
                "progression.passing_quiz_score",
                defaults.progression.passing_quiz_score,
            )?,
        };

        if progression.base_xp_per_level == 0 {
            return Err(config::ConfigError::Message(
                "progression.base_xp_per_level must be greater than zero".to_string(),
            ));
        }

        let leaderboard = LeaderboardSettings {
            default_limit: get_or(
                &settings,
                "leaderboard.default_limit",
                defaults.leaderboard.default_limit,
            )?,
            max_limit: get_or(
                &settings,
                "leaderboard.max_limit",
                defaults.leaderboard.max_limit,
            )?,
        };

        let bind_addr = get_or(&settings, "server.bind_addr", defaults.server.bind_addr)?;

        let metrics_auth = match get_opt::<String>(&settings, "metrics.auth")? {
            Some(auth) => auth,
            None => env::var("METRICS_AUTH").unwrap_or_else(|_| {
                if env == "prod" {
                    tracing::warn!("Using default metrics credentials in production");
                }
                defaults.metrics.auth
            }),
        };

        let otlp_endpoint = get_opt::<String>(&settings, "telemetry.otlp_endpoint")?
            .or_else(|| env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok());

        let json_logs = get_or(&settings, "logging.json", defaults.logging.json)?;

        Ok(Config {
            server: ServerConfig { bind_addr },
            progression,
            leaderboard,
            metrics: MetricsConfig { auth: metrics_auth },
            telemetry: TelemetryConfig { otlp_endpoint },
            logging: LoggingConfig { json: json_logs },
        })
    }
}

/// Missing keys yield `None`; malformed values are errors
fn get_opt<T: serde::de::DeserializeOwned>(
    settings: &config::Config,
    key: &str,
) -> Result<Option<T>, config::ConfigError> {
    match settings.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn get_or<T: serde::de::DeserializeOwned>(
    settings: &config::Config,
    key: &str,
    default: T,
) -> Result<T, config::ConfigError> {
    Ok(get_opt(settings, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn load_falls_back_to_defaults() {
        env::remove_var("APP_PROGRESSION__BASE_XP_PER_LEVEL");
        env::remove_var("APP_SERVER__BIND_ADDR");

        let config = Config::load().expect("config should load without files");
        assert_eq!(config.progression.base_xp_per_level, 100);
        assert_eq!(config.progression.level_up_bonus_xp, 50);
        assert_eq!(config.leaderboard.default_limit, 10);
        assert_eq!(config.server.bind_addr, "0.0.0.0:8081");
    }

    #[test]
    #[serial]
    fn env_overrides_progression_settings() {
        env::set_var("APP_PROGRESSION__BASE_XP_PER_LEVEL", "250");
        let config = Config::load().expect("config should load");
        env::remove_var("APP_PROGRESSION__BASE_XP_PER_LEVEL");

        assert_eq!(config.progression.base_xp_per_level, 250);
    }

    #[test]
    #[serial]
    fn env_overrides_nested_sections() {
        env::set_var("APP_LEADERBOARD__MAX_LIMIT", "25");
        env::set_var("APP_LOGGING__JSON", "true");
        let config = Config::load().expect("config should load");
        env::remove_var("APP_LEADERBOARD__MAX_LIMIT");
        env::remove_var("APP_LOGGING__JSON");

        assert_eq!(config.leaderboard.max_limit, 25);
        assert!(config.logging.json);
    }

    #[test]
    #[serial]
    fn malformed_value_is_an_error() {
        env::set_var("APP_PROGRESSION__LEVEL_UP_BONUS_XP", "abc");
        let result = Config::load();
        env::remove_var("APP_PROGRESSION__LEVEL_UP_BONUS_XP");

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn zero_base_xp_is_rejected() {
        env::set_var("APP_PROGRESSION__BASE_XP_PER_LEVEL", "0");
        let result = Config::load();
        env::remove_var("APP_PROGRESSION__BASE_XP_PER_LEVEL");

        assert!(result.is_err());
    }
}
