use config::{Config, Environment, File as ConfigFile};
use glob::Pattern;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::naming::NamingMode;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_millis(30_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Name of the subdirectory that receives every non-principal item.
pub const EXTRAS_DIR_NAME: &str = "extras";

/// Configuration exactly as read from `Dewey.toml` and the environment,
/// before any validation.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub stale_time_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub naming_mode: Option<NamingMode>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    pub remove_empty_source: Option<bool>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub watch: WatchSettings,
    pub openai: Option<OpenAiSettings>,
}

/// Everything the registry, its directories and the polling loop need.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub stale_time: Duration,
    pub poll_interval: Duration,
    pub naming_mode: NamingMode,
    pub ignore_patterns: Vec<Pattern>,
    pub remove_empty_source: bool,
}

#[derive(Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

// Keeps the key out of `print-config` output and debug logs.
impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WatchSettings {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            stale_time: DEFAULT_STALE_TIME,
            poll_interval: DEFAULT_POLL_INTERVAL,
            naming_mode: NamingMode::default(),
            ignore_patterns: Vec::new(),
            remove_empty_source: true,
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_naming_mode(mut self, naming_mode: NamingMode) -> Self {
        self.naming_mode = naming_mode;
        self
    }

    pub fn with_ignore_patterns(mut self, ignore_patterns: Vec<Pattern>) -> Self {
        self.ignore_patterns = ignore_patterns;
        self
    }

    pub fn with_remove_empty_source(mut self, remove_empty_source: bool) -> Self {
        self.remove_empty_source = remove_empty_source;
        self
    }

    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
    }

    pub fn source_path(&self, directory: &str) -> PathBuf {
        self.input_dir.join(directory)
    }

    pub fn destination_path(&self, title: &str) -> PathBuf {
        self.output_dir.join(title)
    }
}

/// Load configuration from an optional `Dewey.toml` overlaid by environment
/// variables (`INPUT_DIR`, `OUTPUT_DIR`, `STALE_TIME_MS`, ...).
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Dewey").required(false))
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    let raw = builder.try_deserialize::<RawConfig>()?;
    AppConfig::from_raw(raw)
}

impl AppConfig {
    pub fn from_raw(raw: RawConfig) -> Result<AppConfig, Error> {
        let input_dir = required_dir(raw.input_dir.as_deref(), "INPUT_DIR")?;
        let output_dir = required_dir(raw.output_dir.as_deref(), "OUTPUT_DIR")?;

        if input_dir == output_dir {
            return Err(Error::Environment(
                "INPUT_DIR and OUTPUT_DIR cannot be the same".to_string(),
            ));
        }
        // Titles created in the output would be picked up as new input directories.
        if output_dir.starts_with(&input_dir) {
            return Err(Error::Environment(format!(
                "OUTPUT_DIR ({}) cannot be inside INPUT_DIR ({})",
                output_dir.display(),
                input_dir.display()
            )));
        }

        let poll_interval = raw
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(Error::Environment(
                "POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        let ignore_patterns = raw
            .ignore_patterns
            .iter()
            .map(|glob| {
                Pattern::new(glob).map_err(|e| {
                    Error::Environment(format!(
                        "Invalid glob pattern in IGNORE_PATTERNS '{}': {}",
                        glob, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let watch = WatchSettings {
            input_dir,
            output_dir,
            stale_time: raw
                .stale_time_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_STALE_TIME),
            poll_interval,
            naming_mode: raw.naming_mode.unwrap_or_default(),
            ignore_patterns,
            remove_empty_source: raw.remove_empty_source.unwrap_or(true),
        };

        let openai = raw
            .openai_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| OpenAiSettings {
                api_key,
                model: raw
                    .openai_model
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: raw
                    .openai_base_url
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            });

        Ok(AppConfig { watch, openai })
    }

    /// The oracle settings, required by anything that actually names directories.
    pub fn require_openai(&self) -> Result<&OpenAiSettings, Error> {
        self.openai
            .as_ref()
            .ok_or_else(|| Error::Environment("No value provided for OPENAI_API_KEY".to_string()))
    }
}

fn required_dir(value: Option<&str>, key: &str) -> Result<PathBuf, Error> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Environment(format!("No value provided for {}", key)))?;

    let path = Path::new(value);
    if !path.is_dir() {
        return Err(Error::Environment(format!(
            "{} is not an existing directory: {}",
            key, value
        )));
    }

    fs::canonicalize(path).map_err(|e| {
        Error::Environment(format!("Could not resolve {} ({}): {}", key, value, e))
    })
}
