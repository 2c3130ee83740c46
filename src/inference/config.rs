//! Coach configuration loading and validation.
//!
//! Reads `_models/config.yaml` and resolves environment variables. Config is
//! the single source of truth for the generation endpoint, the chat history
//! window, the builder transition delay and the default form values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::errors::InferenceError;

// ─── Defaults ────────────────────────────────────────────────────────────────

/// Model key used when no config file exists.
pub const DEFAULT_MODEL_KEY: &str = "gemini-2.5-flash";

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variable consulted for the API key when no config file exists.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ─── Public Types ────────────────────────────────────────────────────────────

/// A single model endpoint's runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub display_name: String,
    /// Model id sent in the URL. Falls back to the config key.
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key. Usually `${GEMINI_API_KEY}` in the YAML.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Threshold applied to every harm category (`BLOCK_NONE`, `BLOCK_ONLY_HIGH`, ...).
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: String,
}

impl ModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_safety_threshold() -> String {
    "BLOCK_NONE".to_string()
}
fn default_history_window() -> usize {
    10
}
fn default_transition_delay_ms() -> u64 {
    1000
}

/// Top-level configuration (mirrors `_models/config.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct CoachConfig {
    pub active_model: String,
    pub models: HashMap<String, ModelConfig>,
    /// Number of most recent turns sent as chat context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Pause between the "initializing" notice and the switch into the builder.
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,
    /// Overrides for the builder form's starting values. Kept undecoded;
    /// the coach core owns the form shape.
    #[serde(default)]
    pub default_plan: Option<serde_yaml::Value>,
}

impl CoachConfig {
    /// Built-in configuration used when no config file can be found.
    pub fn builtin() -> Self {
        let mut models = HashMap::new();
        models.insert(
            DEFAULT_MODEL_KEY.to_string(),
            ModelConfig {
                display_name: "Gemini 2.5 Flash".to_string(),
                model_name: None,
                base_url: default_base_url(),
                api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
                temperature: None,
                request_timeout_secs: default_request_timeout_secs(),
                safety_threshold: default_safety_threshold(),
            },
        );
        Self {
            active_model: DEFAULT_MODEL_KEY.to_string(),
            models,
            history_window: default_history_window(),
            transition_delay_ms: default_transition_delay_ms(),
            default_plan: None,
        }
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Resolve the config path.
///
/// Checks `HYBRIDONE_PROJECT_ROOT` first, then searches upward from `start`
/// for `_models/config.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, InferenceError> {
    if let Ok(root) = std::env::var("HYBRIDONE_PROJECT_ROOT") {
        let candidate = PathBuf::from(&root).join("_models/config.yaml");
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join("_models/config.yaml");
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(InferenceError::ConfigError {
        reason: "could not find _models/config.yaml".into(),
    })
}

/// Load and parse the configuration file.
///
/// Performs environment-variable interpolation on string values matching
/// `${VAR_NAME}` or `${VAR_NAME:-default}`.
pub fn load_coach_config(path: &Path) -> Result<CoachConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    parse_coach_config(&raw)
}

/// Parse configuration YAML (after env interpolation) and validate it.
pub fn parse_coach_config(raw: &str) -> Result<CoachConfig, InferenceError> {
    let interpolated = interpolate_env_vars(raw);

    let config: CoachConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| InferenceError::ConfigError {
            reason: format!("failed to parse config: {e}"),
        })?;

    if config.history_window == 0 {
        return Err(InferenceError::ConfigError {
            reason: "history_window must be at least 1".into(),
        });
    }

    Ok(config)
}

/// Find and load the config, falling back to [`CoachConfig::builtin`] when
/// no file exists. A file that exists but fails to parse is still an error.
pub fn load_or_builtin(start: &Path) -> Result<CoachConfig, InferenceError> {
    match find_config_path(start) {
        Ok(path) => {
            let config = load_coach_config(&path)?;
            tracing::info!(path = %path.display(), active_model = %config.active_model, "loaded coach config");
            Ok(config)
        }
        Err(_) => {
            tracing::info!("no _models/config.yaml found, using built-in defaults");
            Ok(CoachConfig::builtin())
        }
    }
}

/// Resolve the active model configuration.
///
/// Returns `(model_key, ModelConfig)`. Connectivity is not checked here.
pub fn resolve_active_model(config: &CoachConfig) -> Result<(String, ModelConfig), InferenceError> {
    config
        .models
        .get(&config.active_model)
        .map(|model| (config.active_model.clone(), model.clone()))
        .ok_or_else(|| InferenceError::ConfigError {
            reason: format!("active model '{}' not found in config", config.active_model),
        })
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__COACH_TEST_NONEXISTENT__");
        let result = interpolate_env_vars("${__COACH_TEST_NONEXISTENT__:-fallback-key}");
        assert_eq!(result, "fallback-key");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__COACH_TEST_KEY__", "secret-123");
        let result = interpolate_env_vars("api_key: ${__COACH_TEST_KEY__:-none}");
        assert_eq!(result, "api_key: secret-123");
        std::env::remove_var("__COACH_TEST_KEY__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with no variables";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand_tilde("~/coach");
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("/coach"));
    }

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let yaml = r#"
            active_model: flash
            models:
              flash:
                display_name: "Flash"
                model_name: gemini-2.5-flash
                api_key: "abc"
        "#;
        let config = parse_coach_config(yaml).unwrap();
        assert_eq!(config.history_window, 10);
        assert_eq!(config.transition_delay(), Duration::from_millis(1000));
        assert!(config.default_plan.is_none());

        let (key, model) = resolve_active_model(&config).unwrap();
        assert_eq!(key, "flash");
        assert_eq!(model.base_url, DEFAULT_BASE_URL);
        assert_eq!(model.safety_threshold, "BLOCK_NONE");
        assert_eq!(model.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_config_with_default_plan() {
        let yaml = r#"
            active_model: flash
            history_window: 6
            transition_delay_ms: 0
            models:
              flash:
                display_name: "Flash"
            default_plan:
              goal: "Marathon"
              fitnessLevel: Advanced
              daysPerWeek: 5
              equipment: "Track"
              injuries: ""
        "#;
        let config = parse_coach_config(yaml).unwrap();
        assert_eq!(config.history_window, 6);
        assert_eq!(config.transition_delay(), Duration::ZERO);
        let plan = config.default_plan.unwrap();
        assert_eq!(plan["goal"].as_str(), Some("Marathon"));
        assert_eq!(plan["daysPerWeek"].as_u64(), Some(5));
    }

    #[test]
    fn test_parse_config_rejects_zero_history_window() {
        let yaml = r#"
            active_model: flash
            history_window: 0
            models:
              flash:
                display_name: "Flash"
        "#;
        let err = parse_coach_config(yaml).unwrap_err();
        assert!(err.to_string().contains("history_window"));
    }

    #[test]
    fn test_resolve_active_model_not_found() {
        let mut config = CoachConfig::builtin();
        config.active_model = "nonexistent".into();
        assert!(resolve_active_model(&config).is_err());
    }

    #[test]
    fn test_load_coach_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let models_dir = dir.path().join("_models");
        std::fs::create_dir_all(&models_dir).unwrap();
        std::fs::write(
            models_dir.join("config.yaml"),
            "active_model: flash\nmodels:\n  flash:\n    display_name: Flash\n",
        )
        .unwrap();

        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let path = find_config_path(&nested).unwrap();
        let config = load_coach_config(&path).unwrap();
        assert_eq!(config.active_model, "flash");
    }
}
