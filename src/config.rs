use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::github::DEFAULT_API_URL;

static REPO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("repo pattern is valid")
});

/// Optional defaults read from `config.toml`. Every value can be given on the
/// command line instead.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub bugzilla: BugzillaSection,
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct BugzillaSection {
    pub url: Option<String>,
    pub user: Option<String>,
    pub product: Option<String>,
    pub component: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GithubSection {
    pub api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheSection {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub debug: bool,
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub dry_run: bool,
    pub bz_url: Option<String>,
    pub bz_user: Option<String>,
    pub bz_product: Option<String>,
    pub bz_component: Option<String>,
    pub github_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub debug: Option<bool>,
}

/// Settings for one migration run. Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub dry_run: bool,
    pub bz_url: String,
    pub bz_user: Option<String>,
    pub bz_product: String,
    pub bz_component: String,
    pub repo: String,
    pub github_url: String,
    pub cache_dir: PathBuf,
    pub debug: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found at {path}")]
    MissingConfigFile { path: PathBuf },
    #[error("failed to resolve config path: HOME is not set and XDG_CONFIG_HOME is unset")]
    MissingHomeDirectory,
    #[error("failed to read config file at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse TOML config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("the following required argument was not provided: {flag}")]
    Missing { flag: &'static str },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Loads the config file. An explicit path must exist; the default location
/// is optional.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    let path = match resolve_config_path() {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDirectory) => return Ok(FileConfig::default()),
        Err(err) => return Err(err),
    };
    match load_from(&path) {
        Err(ConfigError::MissingConfigFile { .. }) => Ok(FileConfig::default()),
        other => other,
    }
}

pub fn load_from(path: &Path) -> Result<FileConfig, ConfigError> {
    let path = path.to_path_buf();
    let raw = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingConfigFile { path: path.clone() }
        } else {
            ConfigError::ReadFailed {
                path: path.clone(),
                source,
            }
        }
    })?;

    toml::from_str::<FileConfig>(&raw).map_err(|source| ConfigError::ParseFailed { path, source })
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME");
    let home = std::env::var_os("HOME");
    resolve_config_path_from_env(xdg_config_home, home)
}

fn resolve_config_path_from_env(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = xdg_config_home.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir).join("ghi2bz").join("config.toml"));
    }

    let home = home
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("ghi2bz")
        .join("config.toml"))
}

impl MigrationConfig {
    pub fn resolve(
        repo: String,
        file: FileConfig,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let FileConfig {
            bugzilla,
            github,
            cache,
            logging,
        } = file;

        let cfg = Self {
            dry_run: overrides.dry_run,
            bz_url: overrides
                .bz_url
                .or(bugzilla.url)
                .ok_or(ConfigError::Missing { flag: "--bz_url" })?,
            bz_user: overrides.bz_user.or(bugzilla.user),
            bz_product: overrides
                .bz_product
                .or(bugzilla.product)
                .ok_or(ConfigError::Missing {
                    flag: "--bz_product",
                })?,
            bz_component: overrides
                .bz_component
                .or(bugzilla.component)
                .ok_or(ConfigError::Missing {
                    flag: "--bz_component",
                })?,
            repo,
            github_url: overrides
                .github_url
                .or(github.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cache_dir: overrides
                .cache_dir
                .or(cache.dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            debug: overrides.debug.unwrap_or(logging.debug),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bz_url.trim().is_empty() {
            return Err(ConfigError::Invalid("--bz_url must not be empty".into()));
        }
        if !self.bz_url.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "--bz_url must end with '/' (got '{}')",
                self.bz_url
            )));
        }
        if self.bz_product.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "--bz_product must not be empty".into(),
            ));
        }
        if self.bz_component.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "--bz_component must not be empty".into(),
            ));
        }
        if let Some(user) = &self.bz_user {
            if user.trim().is_empty() {
                return Err(ConfigError::Invalid("--bz_user must not be empty".into()));
            }
        }
        if !REPO_PATTERN.is_match(&self.repo) {
            return Err(ConfigError::Invalid(format!(
                "repo must be in the form owner/name (got '{}')",
                self.repo
            )));
        }
        if self.github_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "--github_url must not be empty".into(),
            ));
        }

        Ok(())
    }
}
