//! Configuration file management for plankit.
//!
//! Provides a TOML-based config file at `~/.config/plankit/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use plankit_core::report::SinkConfig;
use plankit_store::StoreConfig;

/// Environment variable selecting the structured report sink.
pub const REPORT_SINK_ENV: &str = "PLANKIT_REPORT_SINK";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Plans directory, relative to the working directory unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plans_dir: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// `log`, `stderr`, or a file path for JSON lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the plankit config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/plankit` or
/// `~/.config/plankit`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("plankit");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("plankit")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns `Ok(None)` if it does not exist.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlankitConfig {
    pub store: StoreConfig,
    pub sink: SinkConfig,
}

impl PlankitConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Plans dir: `cli_plans_dir` > `PLANKIT_PLANS_DIR` > `store.plans_dir` > `tasks`
    /// - Report sink: `PLANKIT_REPORT_SINK` > `report.sink` > `log`
    pub fn resolve(cli_plans_dir: Option<&Path>) -> Result<Self> {
        let file_config = load_config()?.unwrap_or_default();

        let store = match cli_plans_dir {
            Some(dir) => StoreConfig::new(dir),
            None => StoreConfig::from_env_or(
                file_config
                    .store
                    .plans_dir
                    .unwrap_or_else(|| StoreConfig::DEFAULT_DIR.to_owned()),
            ),
        };

        let sink = if let Ok(sink) = std::env::var(REPORT_SINK_ENV) {
            sink.parse()
                .with_context(|| format!("{REPORT_SINK_ENV} env var is not a valid sink"))?
        } else if let Some(sink) = file_config.report.sink {
            sink.parse()
                .context("invalid report.sink in config file")?
        } else {
            SinkConfig::default()
        };

        Ok(Self { store, sink })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point `XDG_CONFIG_HOME` at a fresh temp dir and clear plankit vars.
    /// The returned dir must outlive the test body.
    fn isolated_env() -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(StoreConfig::ENV_VAR) };
        unsafe { std::env::remove_var(REPORT_SINK_ENV) };
        tmp
    }

    fn write_config(contents: &str) {
        std::fs::create_dir_all(config_dir()).unwrap();
        std::fs::write(config_path(), contents).unwrap();
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let _tmp = isolated_env();

        let config = PlankitConfig::resolve(None).unwrap();
        assert_eq!(config.store.plans_dir, PathBuf::from("tasks"));
        assert_eq!(config.sink, SinkConfig::Log);
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        write_config("[store]\nplans_dir = \"plans\"\n\n[report]\nsink = \"stderr\"\n");

        let config = PlankitConfig::resolve(None).unwrap();
        assert_eq!(config.store.plans_dir, PathBuf::from("plans"));
        assert_eq!(config.sink, SinkConfig::Stderr);
    }

    #[test]
    fn resolve_env_var_overrides_config_file() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        write_config("[store]\nplans_dir = \"plans\"\n");
        unsafe { std::env::set_var(StoreConfig::ENV_VAR, "from-env") };
        unsafe { std::env::set_var(REPORT_SINK_ENV, "/tmp/reports.jsonl") };

        let config = PlankitConfig::resolve(None).unwrap();

        unsafe { std::env::remove_var(StoreConfig::ENV_VAR) };
        unsafe { std::env::remove_var(REPORT_SINK_ENV) };

        assert_eq!(config.store.plans_dir, PathBuf::from("from-env"));
        assert_eq!(
            config.sink,
            SinkConfig::File(PathBuf::from("/tmp/reports.jsonl"))
        );
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        write_config("[store]\nplans_dir = \"plans\"\n");
        unsafe { std::env::set_var(StoreConfig::ENV_VAR, "from-env") };

        let config = PlankitConfig::resolve(Some(Path::new("from-cli"))).unwrap();

        unsafe { std::env::remove_var(StoreConfig::ENV_VAR) };

        assert_eq!(config.store.plans_dir, PathBuf::from("from-cli"));
    }

    #[test]
    fn resolve_rejects_malformed_config_file() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        write_config("[store\n");

        let err = PlankitConfig::resolve(None).unwrap_err();
        assert!(
            format!("{err:#}").contains("failed to parse config file"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn save_then_load_roundtrip() {
        let _lock = lock_env();
        let _tmp = isolated_env();

        let original = ConfigFile {
            store: StoreSection {
                plans_dir: Some("plans".to_owned()),
            },
            report: ReportSection {
                sink: Some("log".to_owned()),
            },
        };
        let path = save_config(&original).unwrap();
        assert!(path.ends_with("plankit/config.toml"));

        let loaded = load_config().unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let _tmp = isolated_env();

        let path = save_config(&ConfigFile::default()).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }
}
