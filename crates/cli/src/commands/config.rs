use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quoteguard_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run(config_path: Option<&Path>) -> String {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields = [
        (
            "policy.manager_threshold",
            config.policy.manager_threshold.to_string(),
            "QUOTEGUARD_POLICY_MANAGER_THRESHOLD",
        ),
        (
            "policy.senior_threshold",
            config.policy.senior_threshold.to_string(),
            "QUOTEGUARD_POLICY_SENIOR_THRESHOLD",
        ),
        (
            "policy.executive_threshold",
            config.policy.executive_threshold.to_string(),
            "QUOTEGUARD_POLICY_EXECUTIVE_THRESHOLD",
        ),
        (
            "policy.limited_cap",
            config.policy.limited_cap.to_string(),
            "QUOTEGUARD_POLICY_LIMITED_CAP",
        ),
        (
            "approval.deadline_days",
            config.approval.deadline_days.to_string(),
            "QUOTEGUARD_APPROVAL_DEADLINE_DAYS",
        ),
        ("training.shape", format!("{:?}", config.training.shape), "QUOTEGUARD_TRAINING_SHAPE"),
        (
            "training.duration_hours",
            config.training.duration_hours.to_string(),
            "QUOTEGUARD_TRAINING_DURATION_HOURS",
        ),
        (
            "training.reminder_minutes",
            config.training.reminder_minutes.to_string(),
            "QUOTEGUARD_TRAINING_REMINDER_MINUTES",
        ),
        ("logging.level", config.logging.level.clone(), "QUOTEGUARD_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "QUOTEGUARD_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_key) in fields {
        lines.push(render_line(key_path, &value, source(key_path, env_key)));
    }

    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("quoteguard.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/quoteguard.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
