mod app;
mod calendar;
mod config;
mod datekey;
mod help;
mod jumpto;
mod medicine;
mod records;
mod storage;
mod theme;
mod webapps;
use crate::app::App;
use crate::config::{Config, DEFAULT_LOG_FILTER, LOG_ENV};
use crate::datekey::DateKey;
use crate::medicine::MedicineApp;
use crate::webapps::WebAppsApp;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run {
        mode: Mode,
        data_dir: Option<PathBuf>,
    },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut mode = None;
        let mut data_dir = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('d') | Arg::Long("data-dir") => {
                    data_dir = Some(PathBuf::from(parser.value()?));
                }
                Arg::Value(value) if mode.is_none() => mode = Some(value.parse()?),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run {
            mode: mode.unwrap_or_default(),
            data_dir,
        })
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run { mode, data_dir } => {
                let config = Config::resolve(data_dir)?;
                fs::create_dir_all(&config.data_dir).with_context(|| {
                    format!(
                        "failed to create data directory {}",
                        config.data_dir.display()
                    )
                })?;
                init_logging(&config.log_path())?;
                let today = DateKey::today().context("failed to determine local date")?;
                let store = config.store();
                log::info!(
                    "starting {mode} on {today} with data in {}",
                    store.dir().display()
                );
                with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    match mode {
                        Mode::Pills => {
                            App::new(MedicineApp::new(store, today)).run(&mut terminal)?;
                        }
                        Mode::Apps => {
                            App::new(WebAppsApp::new(store, today)).run(&mut terminal)?;
                        }
                    }
                    log::info!("exiting");
                    Ok(())
                })
            }
            Command::Help => {
                println!("Usage: daybook [OPTIONS] [pills|apps]");
                println!();
                println!("Terminal medicine tracker and web-app bookmark manager");
                println!();
                println!("Modes:");
                println!("  pills             Daily medicine log with a history calendar (default)");
                println!("  apps              Searchable list of your web apps with a date filter");
                println!();
                println!("Options:");
                println!("  -d, --data-dir DIR");
                println!("                    Keep state and the log file in DIR [env: DAYBOOK_DATA_DIR]");
                println!("  -h, --help        Display this help message and exit");
                println!("  -V, --version     Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Which screen to run
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Pills,
    Apps,
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Mode, ParseModeError> {
        match s {
            "pills" => Ok(Mode::Pills),
            "apps" => Ok(Mode::Apps),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Pills => write!(f, "pills"),
            Mode::Apps => write!(f, "apps"),
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown mode {0:?}; expected \"pills\" or \"apps\"")]
struct ParseModeError(String);

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

/// Sends log records to `path`, since the terminal belongs to the UI
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let env = env_logger::Env::new().filter_or(LOG_ENV, DEFAULT_LOG_FILTER);
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_iter(
            std::iter::once("daybook").chain(args.iter().copied()),
        ))
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(
            parse(&[]).unwrap(),
            Command::Run {
                mode: Mode::Pills,
                data_dir: None
            }
        );
    }

    #[test]
    fn test_apps_with_data_dir() {
        assert_eq!(
            parse(&["-d", "/tmp/daybook", "apps"]).unwrap(),
            Command::Run {
                mode: Mode::Apps,
                data_dir: Some(PathBuf::from("/tmp/daybook"))
            }
        );
        assert_eq!(
            parse(&["pills", "--data-dir=/x"]).unwrap(),
            Command::Run {
                mode: Mode::Pills,
                data_dir: Some(PathBuf::from("/x"))
            }
        );
    }

    #[test]
    fn test_bad_mode() {
        assert!(parse(&["calendar"]).is_err());
        assert!(parse(&["apps", "pills"]).is_err());
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["apps", "--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Apps.to_string(), "apps");
        assert_eq!("pills".parse::<Mode>(), Ok(Mode::Pills));
    }
}
