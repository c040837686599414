//! Configuration loader using figment.
//!
//! Sources are layered, later ones winning: built-in defaults, the
//! `{stem}.{profile}.{ext}` variant of the chosen file, the file itself,
//! `TTSBOT_*` variables, then anything passed to [`ConfigLoader::merge`].
//!
//! The file is either given explicitly (through [`ConfigLoader::file`] or the
//! `TTSBOT_CONFIG` variable) or found by walking the search paths. TOML needs
//! the `toml-config` feature (default) and YAML needs `yaml-config`.
//!
//! # Environment Variable Mapping
//!
//! Variables use the `TTSBOT_` prefix with `__` as the nesting separator. The
//! first segment names a section by a short alias, since section names may
//! contain spaces:
//!
//! - `TTSBOT_MAIN__TOKEN=xxx` → `Main.token`
//! - `TTSBOT_WEBHOOKS__LOGS=https://…` → `Webhook URLs.logs`
//! - `TTSBOT_POSTGRES__PASSWORD=xxx` → `PostgreSQL Info.password`
//! - `TTSBOT_LIFECYCLE__SHUTDOWN_TIMEOUT_SECS=10` → `Lifecycle.shutdown_timeout_secs`
//!
//! # Example
//!
//! ```rust,ignore
//! use ttsbot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config.toml")
//!     .with_env()
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::TtsBotConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TTSBOT_";

/// Names a config file to load, bypassing the search.
pub const CONFIG_FILE_ENV: &str = "TTSBOT_CONFIG";

/// File stems tried in each search path, in order.
const FILE_STEMS: &[&str] = &["ttsbot", "config"];

/// Section aliases accepted as the first segment of an environment key.
const SECTION_ALIASES: &[(&str, &str)] = &[
    ("main", "Main"),
    ("activity", "Activity"),
    ("redis", "Redis Info"),
    ("postgres", "PostgreSQL Info"),
    ("webhooks", "Webhook URLs"),
    ("speech", "Speech Info"),
    ("lifecycle", "Lifecycle"),
    ("logging", "Logging"),
];

// =============================================================================
// File formats
// =============================================================================

/// A configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
}

impl FileFormat {
    /// Formats compiled into this build, in search order.
    pub const ENABLED: &'static [FileFormat] = &[
        #[cfg(feature = "toml-config")]
        FileFormat::Toml,
        #[cfg(feature = "yaml-config")]
        FileFormat::Yaml,
    ];

    /// Extensions recognised for this format; the first is canonical.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Toml => &["toml"],
            Self::Yaml => &["yaml", "yml"],
        }
    }

    /// Picks the enabled format matching a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ENABLED
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    fn merge_into(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(Yaml::file(path)),
            #[allow(unreachable_patterns)]
            _ => figment,
        }
    }
}

fn enabled_extensions() -> String {
    FileFormat::ENABLED
        .iter()
        .flat_map(|format| format.extensions())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the `{stem}.{profile}.{ext}` sibling of a config file.
fn profile_variant(path: &Path, profile: &Profile) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    Some(path.with_file_name(format!("{stem}.{profile}.{ext}")))
}

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `TTSBOT_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var("TTSBOT_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a lowercased, dot-separated environment key onto the document layout.
fn section_key(key: &str) -> String {
    let (head, rest) = key.split_once('.').unwrap_or((key, ""));
    let section = SECTION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == head)
        .map_or(head, |(_, section)| section);

    if rest.is_empty() {
        section.to_string()
    } else {
        format!("{section}.{rest}")
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Explicit file; skips the search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("profile", &self.profile)
            .field("search_paths", &self.search_paths)
            .field("load_env", &self.load_env)
            .field("config_file", &self.config_file)
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Creates a loader for the `TTSBOT_PROFILE` profile.
    ///
    /// `TTSBOT_CONFIG`, when set, preselects the file to load.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from),
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for config files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the working directory to the search.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<user config dir>/ttsbot` to the search.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("ttsbot")),
            None => self,
        }
    }

    /// Loads this file instead of searching. It must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `TTSBOT_*` variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Ignores `TTSBOT_*` variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers a complete configuration above every other source.
    pub fn merge(mut self, config: TtsBotConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads the configuration. Validation is a separate step.
    pub fn load(self) -> ConfigResult<TtsBotConfig> {
        let file = match &self.config_file {
            Some(path) => Some(Self::check_explicit(path)?),
            None => self.find_file(),
        };

        let mut figment = Figment::from(Serialized::defaults(TtsBotConfig::default()));
        match &file {
            Some((path, format)) => {
                if let Some(variant) = profile_variant(path, &self.profile)
                    && variant.exists()
                {
                    debug!(path = %variant.display(), "Loading profile-specific config");
                    figment = format.merge_into(figment, &variant);
                }
                info!(path = %path.display(), "Loading configuration file");
                figment = format.merge_into(figment, path);
            }
            None => {
                let paths = self.effective_search_paths();
                warn!(?paths, "No configuration file found, using defaults");
            }
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["PROFILE", "CONFIG"])
                    .split("__")
                    .map(|key| section_key(key.as_str()).into()),
            );
        }

        let config: TtsBotConfig = figment.merge(self.overrides).extract()?;

        debug!(
            profile = %self.profile,
            logging_level = %config.logging.level,
            channels = config.webhooks.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn check_explicit(path: &Path) -> ConfigResult<(PathBuf, FileFormat)> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let format = FileFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
            enabled: enabled_extensions(),
        })?;
        Ok((path.to_path_buf(), format))
    }

    fn effective_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("ttsbot")))
            .collect()
    }

    /// First existing `{stem}.{ext}` across search paths, stems, then formats.
    fn find_file(&self) -> Option<(PathBuf, FileFormat)> {
        self.effective_search_paths().into_iter().find_map(|dir| {
            FILE_STEMS.iter().find_map(|stem| {
                FileFormat::ENABLED.iter().find_map(|&format| {
                    format
                        .extensions()
                        .iter()
                        .map(|ext| dir.join(format!("{stem}.{ext}")))
                        .find(|candidate| candidate.is_file())
                        .map(|path| (path, format))
                })
            })
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_key_aliases() {
        assert_eq!(section_key("main.token"), "Main.token");
        assert_eq!(section_key("webhooks.logs"), "Webhook URLs.logs");
        assert_eq!(section_key("postgres.password"), "PostgreSQL Info.password");
        assert_eq!(section_key("logging"), "Logging");
        assert_eq!(section_key("unknown.key"), "unknown.key");
    }

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigLoader::new()
            .search_path("/nonexistent/ttsbot")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.lifecycle.default_prefix, "-");
        assert!(config.webhooks.is_empty());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/ttsbot.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_programmatic_merge() {
        let mut overrides = TtsBotConfig::default();
        overrides.main.token = "from-code".into();
        overrides.lifecycle.shutdown_timeout_secs = 9;

        let config = ConfigLoader::new()
            .search_path("/nonexistent/ttsbot")
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();

        assert_eq!(config.main.token, "from-code");
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 9);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = std::env::temp_dir().join("ttsbot-loader-unsupported.ini");
        std::fs::write(&path, "token = x").unwrap();

        let result = ConfigLoader::new().file(&path).without_env().load();
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_variant_layers_under_file() {
        let dir = std::env::temp_dir().join(format!("ttsbot-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("ttsbot.toml"),
            "[Main]\ntoken = \"base\"\n\n[Lifecycle]\ndefault_prefix = \"!\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("ttsbot.staging.toml"),
            "[Main]\ntoken = \"staging\"\n\n[Lifecycle]\nshutdown_timeout_secs = 12\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(&dir)
            .profile("staging")
            .without_env()
            .load();
        std::fs::remove_dir_all(&dir).ok();

        let config = config.unwrap();
        assert_eq!(config.main.token, "base");
        assert_eq!(config.lifecycle.default_prefix, "!");
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 12);
    }

    #[test]
    fn test_format_from_path() {
        #[cfg(feature = "toml-config")]
        assert_eq!(
            FileFormat::from_path(Path::new("a/ttsbot.TOML")),
            Some(FileFormat::Toml)
        );
        assert_eq!(FileFormat::from_path(Path::new("ttsbot")), None);
        assert_eq!(
            profile_variant(Path::new("/etc/ttsbot/config.toml"), &Profile::Production),
            Some(PathBuf::from("/etc/ttsbot/config.production.toml"))
        );
    }

    #[test]
    fn test_profile_parse() {
        assert!(matches!(Profile::parse("PROD"), Profile::Production));
        assert!(matches!(Profile::parse("dev"), Profile::Development));
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
