use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::assignment::{AssignmentConfig, VehicleCapacity};
use crate::auth::JwtConfig;
use crate::earnings::{EarningsConfig, FeeSharePolicy};
use crate::payments::PaymentsConfig;
use crate::utils::time::parse_timezone;

/// Settings rejected by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} must be set in production")]
    MissingInProduction(&'static str),
}

/// Server configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | ledger and log directory |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development, staging or production |
/// | LOG_LEVEL | info | fallback when RUST_LOG is unset |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | unset | daily rolling log files |
/// | BUSINESS_TIMEZONE | Asia/Kolkata | dashboard periods, default partner zone |
/// | ASSIGNMENT_RADIUS_KM | 5.0 | candidate search radius |
/// | ACCEPTANCE_WINDOW_MS | 30000 | time to answer an offer |
/// | ASSIGNMENT_OFFER_ROUNDS | 3 | rounds before an order is flagged |
/// | LOCATION_LOOKUP_TIMEOUT_MS | 2000 | bound on each location lookup |
/// | VEHICLE_CAPACITY_{BICYCLE,SCOOTER,MOTORCYCLE,CAR} | 4/8/12/40 | max items per vehicle |
/// | FEE_SHARE_POLICY | percent:80 | `fixed:<amount>` or `percent:<pct>` |
/// | EARNINGS_ROLLOVER_CHECK_SECS | 300 | upper bound between rollover sweeps |
/// | RAZORPAY_WEBHOOK_SECRET | unset | callback signature key, required in production |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | grace period for background tasks |
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub business_timezone: Tz,
    pub jwt: JwtConfig,
    pub assignment: AssignmentConfig,
    pub earnings: EarningsConfig,
    pub payments: PaymentsConfig,
    pub shutdown_timeout_ms: u64,
}

/// Parse `key`, warning and falling back to `default` when it is malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Malformed environment value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the environment, defaulting unset values
    pub fn from_env() -> Self {
        let business_timezone = env_opt("BUSINESS_TIMEZONE")
            .and_then(|name| {
                let tz = parse_timezone(&name);
                if tz.is_none() {
                    tracing::warn!(timezone = %name, "Unknown BUSINESS_TIMEZONE, using Asia/Kolkata");
                }
                tz
            })
            .unwrap_or(chrono_tz::Asia::Kolkata);

        let fee_share = match env_opt("FEE_SHARE_POLICY") {
            Some(raw) => raw.parse::<FeeSharePolicy>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Malformed FEE_SHARE_POLICY, using percent:80");
                FeeSharePolicy::Percentage(rust_decimal::Decimal::from(80))
            }),
            None => FeeSharePolicy::Percentage(rust_decimal::Decimal::from(80)),
        };

        let default_capacity = VehicleCapacity::default();

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: env_opt("LOG_DIR"),
            business_timezone,
            jwt: JwtConfig::default(),
            assignment: AssignmentConfig {
                radius_km: env_or("ASSIGNMENT_RADIUS_KM", 5.0),
                acceptance_window: Duration::from_millis(env_or("ACCEPTANCE_WINDOW_MS", 30_000)),
                offer_rounds: env_or("ASSIGNMENT_OFFER_ROUNDS", 3),
                location_timeout: Duration::from_millis(env_or("LOCATION_LOOKUP_TIMEOUT_MS", 2_000)),
                capacity: VehicleCapacity {
                    bicycle: env_or("VEHICLE_CAPACITY_BICYCLE", default_capacity.bicycle),
                    scooter: env_or("VEHICLE_CAPACITY_SCOOTER", default_capacity.scooter),
                    motorcycle: env_or("VEHICLE_CAPACITY_MOTORCYCLE", default_capacity.motorcycle),
                    car: env_or("VEHICLE_CAPACITY_CAR", default_capacity.car),
                },
            },
            earnings: EarningsConfig {
                fee_share,
                rollover_check_interval: Duration::from_secs(env_or(
                    "EARNINGS_ROLLOVER_CHECK_SECS",
                    300,
                )),
            },
            payments: PaymentsConfig {
                webhook_secret: env_opt("RAZORPAY_WEBHOOK_SECRET"),
            },
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10_000),
        }
    }

    /// Override the working directory and port, for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the redb ledger file
    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("ledger.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.assignment.radius_km.is_finite() && self.assignment.radius_km > 0.0) {
            return Err(ConfigError::Invalid {
                key: "ASSIGNMENT_RADIUS_KM",
                reason: format!("must be positive, got {}", self.assignment.radius_km),
            });
        }
        if self.assignment.offer_rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "ASSIGNMENT_OFFER_ROUNDS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.assignment.acceptance_window.is_zero() {
            return Err(ConfigError::Invalid {
                key: "ACCEPTANCE_WINDOW_MS",
                reason: "must be positive".to_string(),
            });
        }
        if self.earnings.rollover_check_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "EARNINGS_ROLLOVER_CHECK_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if self.is_production() {
            if self.jwt.ephemeral {
                return Err(ConfigError::MissingInProduction("JWT_SECRET"));
            }
            // Unsigned payment callbacks would let anyone mark orders paid
            if self.payments.webhook_secret.is_none() {
                return Err(ConfigError::MissingInProduction("RAZORPAY_WEBHOOK_SECRET"));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
