//! Profiler configuration.
//!
//! Settings live in memory on the [`Profiler`](crate::Profiler) and can be
//! changed at runtime. They can also be persisted as an INI file:
//!
//! ```ini
//! [profiler]
//! enabled = true
//! default_profile = Profile1
//!
//! [report]
//! separate_profiles = true
//! separate_chains = true
//! chain_totals_row = true
//! chain_megabyte_column = true
//! cache_object_header = true
//! ```
//!
//! Missing keys keep their defaults. Every setting is addressable by a
//! [`ConfigKey`] in `section.key` form, which is how the CLI reads and
//! writes individual values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use tracing::debug;

use crate::error::ConfigError;
use crate::naming::DEFAULT_PROFILE_NAME;

/// Directory name under the platform config directory.
const CONFIG_DIR_NAME: &str = "pmprof";

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Toggles that shape the text reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Blank line between rows of different profiles in counter/clock reports.
    pub separate_profiles: bool,

    /// Blank line after each chain when no totals row is printed.
    pub separate_chains: bool,

    /// Dashed line and totals row after each chain.
    pub chain_totals_row: bool,

    /// Extra `(MEGABYTES)` column next to the memory difference.
    pub chain_megabyte_column: bool,

    /// `(objectKey=...  ts=...)` header before each cache object.
    pub cache_object_header: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            separate_profiles: true,
            separate_chains: true,
            chain_totals_row: true,
            chain_megabyte_column: true,
            cache_object_header: true,
        }
    }
}

impl ReportOptions {
    /// Set the profile separator toggle.
    pub fn with_separate_profiles(mut self, enabled: bool) -> Self {
        self.separate_profiles = enabled;
        self
    }

    /// Set the chain separator toggle.
    pub fn with_separate_chains(mut self, enabled: bool) -> Self {
        self.separate_chains = enabled;
        self
    }

    /// Set the chain totals row toggle.
    pub fn with_chain_totals_row(mut self, enabled: bool) -> Self {
        self.chain_totals_row = enabled;
        self
    }

    /// Set the megabyte column toggle.
    pub fn with_chain_megabyte_column(mut self, enabled: bool) -> Self {
        self.chain_megabyte_column = enabled;
        self
    }

    /// Set the cache object header toggle.
    pub fn with_cache_object_header(mut self, enabled: bool) -> Self {
        self.cache_object_header = enabled;
        self
    }
}

/// Complete profiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Master switch. When off, mutations are ignored and reports say so.
    pub enabled: bool,

    /// Profile used when a call names neither a profile nor a sample object.
    pub default_profile_name: String,

    /// Report layout toggles.
    pub report: ReportOptions,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_profile_name: DEFAULT_PROFILE_NAME.to_string(),
            report: ReportOptions::default(),
        }
    }
}

impl ProfilerConfig {
    /// Set the master switch.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the default profile name.
    pub fn with_default_profile_name(mut self, name: impl Into<String>) -> Self {
        self.default_profile_name = name.into();
        self
    }

    /// Set the report toggles.
    pub fn with_report_options(mut self, report: ReportOptions) -> Self {
        self.report = report;
        self
    }

    /// Load from the default location, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save to the default location, creating its directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to an explicit path, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(io_error)?;

        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

/// Path of the configuration file (`<config dir>/pmprof/config.ini`).
///
/// Falls back to the current directory when the platform has no config
/// directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Every individually addressable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ProfilerEnabled,
    ProfilerDefaultProfile,
    ReportSeparateProfiles,
    ReportSeparateChains,
    ReportChainTotalsRow,
    ReportChainMegabyteColumn,
    ReportCacheObjectHeader,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ProfilerEnabled,
            ConfigKey::ProfilerDefaultProfile,
            ConfigKey::ReportSeparateProfiles,
            ConfigKey::ReportSeparateChains,
            ConfigKey::ReportChainTotalsRow,
            ConfigKey::ReportChainMegabyteColumn,
            ConfigKey::ReportCacheObjectHeader,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ProfilerEnabled | ConfigKey::ProfilerDefaultProfile => "profiler",
            _ => "report",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ProfilerEnabled => "enabled",
            ConfigKey::ProfilerDefaultProfile => "default_profile",
            ConfigKey::ReportSeparateProfiles => "separate_profiles",
            ConfigKey::ReportSeparateChains => "separate_chains",
            ConfigKey::ReportChainTotalsRow => "chain_totals_row",
            ConfigKey::ReportChainMegabyteColumn => "chain_megabyte_column",
            ConfigKey::ReportCacheObjectHeader => "cache_object_header",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as text.
    pub fn get(&self, config: &ProfilerConfig) -> String {
        match self {
            ConfigKey::ProfilerEnabled => config.enabled.to_string(),
            ConfigKey::ProfilerDefaultProfile => config.default_profile_name.clone(),
            ConfigKey::ReportSeparateProfiles => config.report.separate_profiles.to_string(),
            ConfigKey::ReportSeparateChains => config.report.separate_chains.to_string(),
            ConfigKey::ReportChainTotalsRow => config.report.chain_totals_row.to_string(),
            ConfigKey::ReportChainMegabyteColumn => {
                config.report.chain_megabyte_column.to_string()
            }
            ConfigKey::ReportCacheObjectHeader => config.report.cache_object_header.to_string(),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ProfilerConfig, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::ProfilerDefaultProfile => {
                let name = value.trim();
                if name.is_empty() {
                    return Err(self.invalid(value, "profile name must not be empty"));
                }
                config.default_profile_name = name.to_string();
            }
            ConfigKey::ProfilerEnabled => config.enabled = self.parse_bool(value)?,
            ConfigKey::ReportSeparateProfiles => {
                config.report.separate_profiles = self.parse_bool(value)?
            }
            ConfigKey::ReportSeparateChains => {
                config.report.separate_chains = self.parse_bool(value)?
            }
            ConfigKey::ReportChainTotalsRow => {
                config.report.chain_totals_row = self.parse_bool(value)?
            }
            ConfigKey::ReportChainMegabyteColumn => {
                config.report.chain_megabyte_column = self.parse_bool(value)?
            }
            ConfigKey::ReportCacheObjectHeader => {
                config.report.cache_object_header = self.parse_bool(value)?
            }
        }
        Ok(())
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
