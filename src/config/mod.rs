use crate::catalog::DuplicateQuotePolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PROJECT_CONFIG_DIR: &str = ".pcmp";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub project_root: PathBuf,
    /// Directory holding the four table files.
    pub data_dir: PathBuf,
    pub log_level: String,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub duplicate_quotes: DuplicateQuotePolicy,
    pub json: bool,
    /// Config files that were skipped, reported once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub duplicate_quotes: Option<DuplicateQuotePolicy>,
}

impl FileConfig {
    /// Fill unset values from `other`.
    fn or(self, other: FileConfig) -> FileConfig {
        FileConfig {
            data_dir: self.data_dir.or(other.data_dir),
            log_level: self.log_level.or(other.log_level),
            log_file: self.log_file.or(other.log_file),
            duplicate_quotes: self.duplicate_quotes.or(other.duplicate_quotes),
        }
    }
}

/// Values read from the environment (`PCMP_*`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub duplicate_quotes: Option<DuplicateQuotePolicy>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// An unrecognised `PCMP_DUPLICATE_QUOTES` is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let duplicate_quotes = lookup("PCMP_DUPLICATE_QUOTES")
            .map(|v| v.parse::<DuplicateQuotePolicy>().map_err(anyhow::Error::msg))
            .transpose()
            .context("invalid PCMP_DUPLICATE_QUOTES")?;
        Ok(Self {
            data_dir: lookup("PCMP_DATA_DIR").map(PathBuf::from),
            log_level: lookup("PCMP_LOG"),
            duplicate_quotes,
        })
    }
}

impl AppConfig {
    pub fn from_cli(cli: &crate::Cli) -> Result<Self> {
        let project_root = std::env::current_dir().context("resolve current dir")?;
        let env = EnvConfig::from_env()?;
        let mut warnings = Vec::new();
        let project_cfg = load_project_config(&project_root, &mut warnings)?;
        let file_cfg = load_file_config(&mut warnings)?;
        let mut cfg = Self::resolve(cli, env, project_cfg, file_cfg, project_root);
        cfg.warnings = warnings;
        Ok(cfg)
    }

    /// Merge in priority order: CLI, environment, project config, global config, defaults.
    pub fn resolve(
        cli: &crate::Cli,
        env: EnvConfig,
        project_cfg: FileConfig,
        file_cfg: FileConfig,
        project_root: PathBuf,
    ) -> Self {
        let merged = project_cfg.or(file_cfg);

        // Relative paths are taken from the working directory.
        let data_dir = cli
            .data_dir
            .clone()
            .or(env.data_dir)
            .or(merged.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let data_dir = if data_dir.is_absolute() {
            data_dir
        } else {
            project_root.join(data_dir)
        };

        let log_level = cli
            .log_level
            .clone()
            .or(env.log_level)
            .or(merged.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let duplicate_quotes = cli
            .duplicate_quotes
            .or(env.duplicate_quotes)
            .or(merged.duplicate_quotes)
            .unwrap_or_default();

        Self {
            data_dir,
            log_level,
            log_file: cli.log_file.clone().or(merged.log_file),
            duplicate_quotes,
            json: cli.json,
            project_root,
            warnings: Vec::new(),
        }
    }
}

/// Load the global config. A file that fails to parse is skipped and noted
/// in `warnings`.
pub fn load_file_config(warnings: &mut Vec<String>) -> Result<FileConfig> {
    fn candidate_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Ok(p) = std::env::var("PCMP_CONFIG") {
            v.push(PathBuf::from(p));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            v.push(Path::new(&xdg_home).join("price-compare/config.toml"));
        } else if let Some(config_dir) = dirs::config_dir() {
            v.push(config_dir.join("price-compare/config.toml"));
        }
        v
    }

    for p in candidate_paths() {
        if p.exists() {
            let s = fs::read_to_string(&p)
                .with_context(|| format!("read config file: {}", p.display()))?;
            match toml::from_str::<FileConfig>(&s) {
                Ok(cfg) => {
                    info!(path=%p.display(), "loaded config file");
                    return Ok(cfg);
                }
                Err(e) => {
                    warnings.push(format!("skipping config file {}: {e}", p.display()));
                    continue;
                }
            }
        }
    }
    Ok(FileConfig::default())
}

/// Load project-specific configuration from .pcmp/config.toml
pub fn load_project_config(project_root: &Path, warnings: &mut Vec<String>) -> Result<FileConfig> {
    let project_config_path = project_root.join(PROJECT_CONFIG_DIR).join("config.toml");

    if project_config_path.exists() {
        let s = fs::read_to_string(&project_config_path).with_context(|| {
            format!(
                "read project config file: {}",
                project_config_path.display()
            )
        })?;
        match toml::from_str::<FileConfig>(&s) {
            Ok(cfg) => {
                info!(path=%project_config_path.display(), "loaded project config file");
                Ok(cfg)
            }
            Err(e) => {
                warnings.push(format!(
                    "skipping project config file {}: {e}",
                    project_config_path.display()
                ));
                Ok(FileConfig::default())
            }
        }
    } else {
        Ok(FileConfig::default())
    }
}
