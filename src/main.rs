mod activity;
mod app;
mod config;
mod fetch;
mod heatmap;
mod help;
mod labels;
mod size;
mod theme;
use crate::app::{utc_today, App};
use crate::config::{default_log_path, CliArgs, Settings};
use crate::fetch::{FetchCache, HttpSource};
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives
static LOG_ENV: &str = "LEETHEAT_LOG";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(CliArgs),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut args = CliArgs::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("config") => {
                    args.config = Some(parser.value()?.into());
                }
                Arg::Short('g') | Arg::Long("graph") => {
                    args.graph = Some(parser.value()?.parse()?);
                }
                Arg::Short('y') | Arg::Long("yearly") => {
                    args.graph = Some(activity::GraphMode::Yearly);
                }
                Arg::Short('t') | Arg::Long("title") => args.show_title = true,
                Arg::Short('s') | Arg::Long("size") => {
                    args.size = Some(parser.value()?.parse()?);
                }
                Arg::Long("start-date") => args.start_date = Some(parser.value()?.string()?),
                Arg::Short('u') | Arg::Long("ui") => args.ui = Some(parser.value()?.string()?),
                Arg::Long("endpoint") => args.endpoint = Some(parser.value()?.string()?),
                Arg::Long("log-file") => args.log_file = Some(parser.value()?.into()),
                Arg::Value(value) if args.username.is_none() => {
                    args.username = Some(value.string()?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(args))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(args) => {
                let settings = Settings::load(args)?;
                setup_logging(settings.log_file.as_deref(), default_log_path())?;
                let today = utc_today();
                info!(
                    username = %settings.widget.username,
                    graph = %settings.widget.graph,
                    size = %settings.widget.size,
                    %today,
                    "starting"
                );
                let source = HttpSource::new(&settings.endpoint, settings.timeout)
                    .context("failed to set up HTTP client")?;
                let cache = FetchCache::new(source).stale_after(settings.stale_after);
                let app = App::new(settings.widget, cache, utc_today);
                with_terminal(|terminal| {
                    app.run(terminal).context("terminal I/O failed")?;
                    Ok(())
                })
            }
            Command::Help => {
                println!("Usage: leetheat [<options>] [USERNAME]");
                println!();
                println!("Show a LeetCode user's daily submission counts as a terminal heat-map");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>       Read settings from the given TOML file");
                println!("      --endpoint <URL>      Base URL of the submission data service");
                println!("  -g, --graph <MODE>        \"default\" or \"yearly\"");
                println!("      --log-file <PATH>     Write logs to the given file");
                println!("  -s, --size <SIZE>         small, medium, large, xl, or WIDTHxHEIGHT");
                println!("      --start-date <DATE>   First day of the yearly view (YYYY-MM-DD)");
                println!("  -t, --title               Show a heading above the heat-map");
                println!("  -u, --ui <THEME>          Color theme");
                println!("  -y, --yearly              Same as --graph yearly");
                println!("  -h, --help                Display this help message and exit");
                println!("  -V, --version             Show the program version and exit");
                println!();
                println!("Themes:");
                let names = theme::ThemeName::ALL
                    .into_iter()
                    .map(theme::ThemeName::token)
                    .collect::<Vec<_>>();
                println!("  {}", names.join(", "));
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

/// Installs the tracing subscriber.  Failing to open a log file the user
/// asked for is an error.  Failing to open the default log file only
/// discards log output.
fn setup_logging(explicit: Option<&Path>, default: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = explicit {
        return init_logging(path);
    }
    if let Some(path) = default {
        if init_logging(&path).is_err() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(log_filter()?)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}

fn log_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")
}

/// Sends tracing output to `path`, as the terminal is occupied by the UI
fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter()?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
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
    use crate::activity::GraphMode;
    use crate::size::Size;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        let argv = std::iter::once("leetheat")
            .chain(args.iter().copied())
            .map(OsString::from);
        Command::from_parser(Parser::from_iter(argv))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(CliArgs::default()));
    }

    #[test]
    fn test_all_options() {
        let cmd = parse(&[
            "-c",
            "/tmp/lh.toml",
            "--graph",
            "yearly",
            "-t",
            "--size=400x120",
            "--start-date",
            "2023-03-15",
            "-u",
            "matrix",
            "--endpoint",
            "http://localhost:1234",
            "--log-file",
            "/tmp/lh.log",
            "alice",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(CliArgs {
                username: Some(String::from("alice")),
                graph: Some(GraphMode::Yearly),
                show_title: true,
                size: Some(Size::Explicit {
                    width: 400,
                    height: 120
                }),
                start_date: Some(String::from("2023-03-15")),
                ui: Some(String::from("matrix")),
                endpoint: Some(String::from("http://localhost:1234")),
                log_file: Some("/tmp/lh.log".into()),
                config: Some("/tmp/lh.toml".into()),
            })
        );
    }

    #[test]
    fn test_yearly_flag() {
        let Command::Run(args) = parse(&["-y", "bob"]).unwrap() else {
            panic!("expected a run command");
        };
        assert_eq!(args.graph, Some(GraphMode::Yearly));
        assert_eq!(args.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["alice", "--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_bad_values() {
        assert!(parse(&["--graph", "weekly"]).is_err());
        assert!(parse(&["--size", "huge"]).is_err());
        assert!(parse(&["alice", "bob"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }

    /// A path whose parent is a regular file, so no log file can be created
    /// there
    fn unwritable_log_path(name: &str) -> PathBuf {
        let blocker = std::env::temp_dir().join(format!(
            "leetheat-test-{}-{name}",
            std::process::id()
        ));
        fs::write(&blocker, b"").unwrap();
        blocker.join("logs").join("leetheat.log")
    }

    #[test]
    fn test_default_log_path_failure_is_not_fatal() {
        let path = unwritable_log_path("default");
        assert!(setup_logging(None, Some(path.clone())).is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_log_path_failure_is_fatal() {
        let path = unwritable_log_path("explicit");
        let e = setup_logging(Some(&path), None).unwrap_err();
        assert!(e.to_string().starts_with("failed to create log directory"));
    }

    #[test]
    fn test_no_log_path() {
        assert!(setup_logging(None, None).is_ok());
    }
}
