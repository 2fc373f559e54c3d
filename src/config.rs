//! Configuration parsing and management

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{CompanionError, ConfigError};
use crate::model::ResolvePolicy;

/// Config file name probed by [`Config::load`]
pub const CONFIG_FILE: &str = "companion.toml";

/// Explicit config file path
pub const CONFIG_ENV: &str = "COMPANION_CONFIG";

/// Overrides `model.models_dir`
pub const MODELS_DIR_ENV: &str = "COMPANION_MODELS_DIR";

/// Overrides `model.default_model`
pub const MODEL_ENV: &str = "COMPANION_MODEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub render: RenderConfig,
    pub animation: AnimationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CompanionError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, CompanionError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from the environment and default paths.
    ///
    /// `COMPANION_CONFIG` names the file explicitly; otherwise the first of
    /// [`Config::search_paths`] that exists is used. Environment overrides are
    /// applied on top either way.
    pub fn load() -> Result<Self, CompanionError> {
        Self::load_with(|key| std::env::var_os(key))
    }

    fn load_with(env: impl Fn(&str) -> Option<OsString>) -> Result<Self, CompanionError> {
        let explicit = env(CONFIG_ENV).map(PathBuf::from);
        let found = explicit.or_else(|| Self::search_paths().into_iter().find(|p| p.is_file()));

        let mut config = match found {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(env);
        Ok(config)
    }

    /// Candidate config files, in probe order
    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(CONFIG_FILE),
            Path::new("config").join(CONFIG_FILE),
            dirs_path().join(CONFIG_FILE),
        ]
    }

    /// Apply `COMPANION_MODELS_DIR` and `COMPANION_MODEL` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var_os(key));
    }

    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<OsString>) {
        if let Some(dir) = env(MODELS_DIR_ENV) {
            self.model.models_dir = PathBuf::from(dir);
            tracing::debug!("Models directory overridden: {}", self.model.models_dir.display());
        }
        if let Some(name) = env(MODEL_ENV) {
            let name = name.to_string_lossy().into_owned();
            tracing::debug!("Default model overridden: {}", name);
            self.model.default_model = Some(name);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CompanionError> {
        let rate = self.render.frame_rate;
        if !rate.is_finite() || rate <= 0.0 || rate > MAX_FRAME_RATE {
            return Err(invalid(
                "render.frame_rate",
                format!("Frame rate must be in (0, {}]", MAX_FRAME_RATE),
            ));
        }

        let durations = [
            ("animation.reversion_secs", self.animation.reversion_secs),
            ("animation.expression_secs", self.animation.expression_secs),
            (
                "animation.warning_threshold_secs",
                self.animation.warning_threshold_secs,
            ),
        ];
        for (field, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "Must be a finite, non-negative number of seconds"));
            }
        }

        if let Some(ref name) = self.model.default_model {
            if name.trim().is_empty() {
                return Err(invalid("model.default_model", "Model name must not be empty"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> CompanionError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
    .into()
}

/// Upper bound accepted for `render.frame_rate`
pub const MAX_FRAME_RATE: f64 = 240.0;

/// Model directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing one sub-directory per character model
    pub models_dir: PathBuf,
    /// Model loaded on startup (directory name under `models_dir`)
    pub default_model: Option<String>,
    /// How missing optional assets are treated
    pub resolution: ResolvePolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./models"),
            default_model: None,
            resolution: ResolvePolicy::Lenient,
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target frames per second
    pub frame_rate: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { frame_rate: 60.0 }
    }
}

/// Animation timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay before celebrating/confused fall back to idle
    pub reversion_secs: f64,
    /// Expression hold time when no duration is given
    pub expression_secs: f64,
    /// Remaining-time threshold below which a warning signal is honoured
    pub warning_threshold_secs: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            reversion_secs: 3.0,
            expression_secs: 0.5,
            warning_threshold_secs: 60.0,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("companion-avatar");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/companion-avatar");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/companion-avatar");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("companion-avatar");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.frame_rate, 60.0);
        assert_eq!(config.animation.reversion_secs, 3.0);
        assert_eq!(config.animation.expression_secs, 0.5);
        assert_eq!(config.model.resolution, ResolvePolicy::Lenient);
        assert!(config.model.default_model.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [model]
            models_dir = "/opt/models"
            default_model = "haru"
            resolution = "strict"

            [render]
            frame_rate = 30.0
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.model.models_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.model.default_model.as_deref(), Some("haru"));
        assert_eq!(config.model.resolution, ResolvePolicy::Strict);
        assert_eq!(config.render.frame_rate, 30.0);
        // Untouched sections keep their defaults
        assert_eq!(config.animation.warning_threshold_secs, 60.0);
    }

    #[test]
    fn test_rejects_bad_frame_rate() {
        let mut config = Config::default();
        config.render.frame_rate = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("render.frame_rate"));

        config.render.frame_rate = 500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_duration() {
        let mut config = Config::default();
        config.animation.expression_secs = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("animation.expression_secs"));
    }

    fn env_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| OsString::from(*v))
        }
    }

    #[test]
    fn test_env_overrides_model_settings() {
        let mut config = Config::default();
        config.apply_overrides(env_from(&[
            (MODELS_DIR_ENV, "/srv/avatars"),
            (MODEL_ENV, "hiyori"),
        ]));

        assert_eq!(config.model.models_dir, PathBuf::from("/srv/avatars"));
        assert_eq!(config.model.default_model.as_deref(), Some("hiyori"));
        // Unrelated settings are left alone
        assert_eq!(config.render.frame_rate, 60.0);
    }

    #[test]
    fn test_load_explicit_file_then_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[model]\nmodels_dir = \"/opt/models\"\ndefault_model = \"haru\"\n\n[render]\nframe_rate = 24.0\n",
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = Config::load_with(env_from(&[
            (CONFIG_ENV, path.as_str()),
            (MODELS_DIR_ENV, "/srv/avatars"),
        ]))
        .unwrap();

        assert_eq!(config.render.frame_rate, 24.0);
        assert_eq!(config.model.default_model.as_deref(), Some("haru"));
        assert_eq!(config.model.models_dir, PathBuf::from("/srv/avatars"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = Config::load_with(env_from(&[(CONFIG_ENV, "/nonexistent/companion.toml")]))
            .unwrap_err();
        assert!(matches!(err, CompanionError::Config(ConfigError::ReadFile(_))));
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_str("[render]\nframe_rate = \"fast\"").unwrap_err();
        assert!(matches!(
            err,
            CompanionError::Config(ConfigError::Parse(_))
        ));
    }
}
