use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approvals::ApprovalPolicy;
use crate::calendar::{EventShape, TrainingPlan};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub policy: PolicyConfig,
    pub approval: ApprovalConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyConfig {
    pub manager_threshold: Decimal,
    pub senior_threshold: Decimal,
    pub executive_threshold: Decimal,
    pub limited_cap: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalConfig {
    pub deadline_days: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingConfig {
    pub shape: TrainingShape,
    pub duration_hours: u32,
    /// Zero disables the reminder.
    pub reminder_minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingShape {
    Session,
    AllDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub limited_cap: Option<Decimal>,
    pub training_shape: Option<TrainingShape>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = ApprovalPolicy::default();
        Self {
            policy: PolicyConfig {
                manager_threshold: policy.manager_threshold,
                senior_threshold: policy.senior_threshold,
                executive_threshold: policy.executive_threshold,
                limited_cap: policy.limited_cap,
            },
            approval: ApprovalConfig { deadline_days: 7 },
            training: TrainingConfig {
                shape: TrainingShape::Session,
                duration_hours: 2,
                reminder_minutes: 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for TrainingShape {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "all_day" | "all-day" | "allday" => Ok(Self::AllDay),
            other => Err(ConfigError::Validation(format!(
                "unsupported training shape `{other}` (expected session|all_day)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quoteguard.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy {
            manager_threshold: self.policy.manager_threshold,
            senior_threshold: self.policy.senior_threshold,
            executive_threshold: self.policy.executive_threshold,
            limited_cap: self.policy.limited_cap,
        }
    }

    pub fn training_plan(&self) -> TrainingPlan {
        let shape = match self.training.shape {
            TrainingShape::Session => {
                EventShape::Session { duration_hours: self.training.duration_hours }
            }
            TrainingShape::AllDay => EventShape::AllDay,
        };
        let reminder_minutes =
            (self.training.reminder_minutes > 0).then_some(self.training.reminder_minutes);

        TrainingPlan { shape, reminder_minutes }
    }

    pub fn approval_deadline(&self) -> Duration {
        Duration::days(i64::from(self.approval.deadline_days))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(policy) = patch.policy {
            if let Some(manager_threshold) = policy.manager_threshold {
                self.policy.manager_threshold = manager_threshold;
            }
            if let Some(senior_threshold) = policy.senior_threshold {
                self.policy.senior_threshold = senior_threshold;
            }
            if let Some(executive_threshold) = policy.executive_threshold {
                self.policy.executive_threshold = executive_threshold;
            }
            if let Some(limited_cap) = policy.limited_cap {
                self.policy.limited_cap = limited_cap;
            }
        }

        if let Some(approval) = patch.approval {
            if let Some(deadline_days) = approval.deadline_days {
                self.approval.deadline_days = deadline_days;
            }
        }

        if let Some(training) = patch.training {
            if let Some(shape) = training.shape {
                self.training.shape = shape;
            }
            if let Some(duration_hours) = training.duration_hours {
                self.training.duration_hours = duration_hours;
            }
            if let Some(reminder_minutes) = training.reminder_minutes {
                self.training.reminder_minutes = reminder_minutes;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTEGUARD_POLICY_MANAGER_THRESHOLD") {
            self.policy.manager_threshold =
                parse_decimal("QUOTEGUARD_POLICY_MANAGER_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("QUOTEGUARD_POLICY_SENIOR_THRESHOLD") {
            self.policy.senior_threshold =
                parse_decimal("QUOTEGUARD_POLICY_SENIOR_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("QUOTEGUARD_POLICY_EXECUTIVE_THRESHOLD") {
            self.policy.executive_threshold =
                parse_decimal("QUOTEGUARD_POLICY_EXECUTIVE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("QUOTEGUARD_POLICY_LIMITED_CAP") {
            self.policy.limited_cap = parse_decimal("QUOTEGUARD_POLICY_LIMITED_CAP", &value)?;
        }

        if let Some(value) = read_env("QUOTEGUARD_APPROVAL_DEADLINE_DAYS") {
            self.approval.deadline_days = parse_u32("QUOTEGUARD_APPROVAL_DEADLINE_DAYS", &value)?;
        }

        if let Some(value) = read_env("QUOTEGUARD_TRAINING_SHAPE") {
            self.training.shape = value.parse()?;
        }
        if let Some(value) = read_env("QUOTEGUARD_TRAINING_DURATION_HOURS") {
            self.training.duration_hours =
                parse_u32("QUOTEGUARD_TRAINING_DURATION_HOURS", &value)?;
        }
        if let Some(value) = read_env("QUOTEGUARD_TRAINING_REMINDER_MINUTES") {
            self.training.reminder_minutes =
                parse_u32("QUOTEGUARD_TRAINING_REMINDER_MINUTES", &value)?;
        }

        let log_level =
            read_env("QUOTEGUARD_LOGGING_LEVEL").or_else(|| read_env("QUOTEGUARD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEGUARD_LOGGING_FORMAT").or_else(|| read_env("QUOTEGUARD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(limited_cap) = overrides.limited_cap {
            self.policy.limited_cap = limited_cap;
        }
        if let Some(training_shape) = overrides.training_shape {
            self.training.shape = training_shape;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_policy(&self.policy)?;
        validate_approval(&self.approval)?;
        validate_training(&self.training)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quoteguard.toml"), PathBuf::from("config/quoteguard.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigError> {
    if policy.manager_threshold <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "policy.manager_threshold must be greater than zero".to_string(),
        ));
    }

    if policy.senior_threshold <= policy.manager_threshold
        || policy.executive_threshold <= policy.senior_threshold
    {
        return Err(ConfigError::Validation(
            "policy thresholds must be strictly ascending (manager < senior < executive)"
                .to_string(),
        ));
    }

    if policy.limited_cap <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "policy.limited_cap must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_approval(approval: &ApprovalConfig) -> Result<(), ConfigError> {
    if approval.deadline_days == 0 || approval.deadline_days > 90 {
        return Err(ConfigError::Validation(
            "approval.deadline_days must be in range 1..=90".to_string(),
        ));
    }

    Ok(())
}

fn validate_training(training: &TrainingConfig) -> Result<(), ConfigError> {
    if training.duration_hours == 0 || training.duration_hours > 24 {
        return Err(ConfigError::Validation(
            "training.duration_hours must be in range 1..=24".to_string(),
        ));
    }

    if training.reminder_minutes > 1440 {
        return Err(ConfigError::Validation(
            "training.reminder_minutes must be at most 1440".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    policy: Option<PolicyPatch>,
    approval: Option<ApprovalPatch>,
    training: Option<TrainingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyPatch {
    manager_threshold: Option<Decimal>,
    senior_threshold: Option<Decimal>,
    executive_threshold: Option<Decimal>,
    limited_cap: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct ApprovalPatch {
    deadline_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingPatch {
    shape: Option<TrainingShape>,
    duration_hours: Option<u32>,
    reminder_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
