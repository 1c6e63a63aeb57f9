use crate::storage::FileStore;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable that overrides the default data directory
pub(crate) const DATA_DIR_ENV: &str = "DAYBOOK_DATA_DIR";

/// Environment variable holding the `env_logger` filter
pub(crate) const LOG_ENV: &str = "DAYBOOK_LOG";

pub(crate) const DEFAULT_LOG_FILTER: &str = "info";

static LOG_FILE: &str = "daybook.log";

/// Where the program keeps its state and its log
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
}

impl Config {
    /// Determines the data directory from, in order of preference, the
    /// command line, the `DAYBOOK_DATA_DIR` environment variable, and the
    /// platform's per-user data directory
    pub(crate) fn resolve(cli_dir: Option<PathBuf>) -> Result<Config, ConfigError> {
        resolve_data_dir(
            cli_dir,
            std::env::var_os(DATA_DIR_ENV),
            dirs::data_dir(),
        )
        .map(|data_dir| Config { data_dir })
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub(crate) fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

fn resolve_data_dir(
    cli_dir: Option<PathBuf>,
    env_dir: Option<OsString>,
    platform_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = cli_dir {
        return Ok(dir);
    }
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform_dir
        .map(|d| d.join(env!("CARGO_PKG_NAME")))
        .ok_or(ConfigError::NoDataDir)
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("could not determine a data directory; pass --data-dir or set DAYBOOK_DATA_DIR")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wins() {
        assert_eq!(
            resolve_data_dir(
                Some(PathBuf::from("/cli")),
                Some(OsString::from("/env")),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Ok(PathBuf::from("/cli"))
        );
    }

    #[test]
    fn test_env_over_platform() {
        assert_eq!(
            resolve_data_dir(
                None,
                Some(OsString::from("/env")),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Ok(PathBuf::from("/env"))
        );
    }

    #[test]
    fn test_empty_env_ignored() {
        assert_eq!(
            resolve_data_dir(
                None,
                Some(OsString::new()),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Ok(PathBuf::from("/home/me/.local/share/daybook"))
        );
    }

    #[test]
    fn test_nowhere() {
        assert_eq!(
            resolve_data_dir(None, None, None),
            Err(ConfigError::NoDataDir)
        );
    }

    #[test]
    fn test_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data"),
        };
        assert_eq!(config.log_path(), PathBuf::from("/data/daybook.log"));
        assert_eq!(config.store().dir(), PathBuf::from("/data"));
    }
}
