use crate::activity::GraphMode;
use crate::fetch::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::labels::LabelOverrides;
use crate::size::Size;
use crate::theme::ColorOverrides;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the directory under the platform config and cache directories
pub(crate) static APP_DIR: &str = "leetheat";

static CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of the TOML configuration file.  Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct ConfigFile {
    username: Option<String>,
    graph: Option<GraphMode>,
    show_title: Option<bool>,
    size: Option<Size>,
    start_date: Option<String>,
    ui: Option<String>,
    colors: ColorOverrides,
    labels: LabelOverrides,
    endpoint: Option<String>,
    stale_after_secs: Option<u64>,
    timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn from_toml(src: &str) -> Result<ConfigFile, toml::de::Error> {
        toml::from_str(src)
    }

    /// Reads the file at `path` if given, which must then exist.  Otherwise
    /// reads the file in the default location if there is one there.
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<ConfigFile> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(ConfigFile::default()),
            },
        };
        let src = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ConfigFile::from_toml(&src)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR).join(CONFIG_FILE_NAME))
}

pub(crate) fn default_log_path() -> Option<PathBuf> {
    Some(dirs::cache_dir()?.join(APP_DIR).join("leetheat.log"))
}

/// Values given on the command line; these take precedence over the
/// configuration file
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct CliArgs {
    pub(crate) username: Option<String>,
    pub(crate) graph: Option<GraphMode>,
    pub(crate) show_title: bool,
    pub(crate) size: Option<Size>,
    pub(crate) start_date: Option<String>,
    pub(crate) ui: Option<String>,
    pub(crate) endpoint: Option<String>,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
}

/// Everything that determines what the heat-map shows and how it looks
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct WidgetOptions {
    pub(crate) username: String,
    pub(crate) graph: GraphMode,
    pub(crate) show_title: bool,
    pub(crate) size: Size,
    pub(crate) start_date: Option<String>,
    pub(crate) ui: String,
    pub(crate) colors: ColorOverrides,
    pub(crate) labels: LabelOverrides,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Settings {
    pub(crate) widget: WidgetOptions,
    pub(crate) endpoint: String,
    pub(crate) timeout: Duration,
    pub(crate) stale_after: Duration,
    pub(crate) log_file: Option<PathBuf>,
}

impl Settings {
    pub(crate) fn load(cli: CliArgs) -> anyhow::Result<Settings> {
        let file = ConfigFile::load(cli.config.as_deref())?;
        Ok(Settings::new(cli, file))
    }

    pub(crate) fn new(cli: CliArgs, file: ConfigFile) -> Settings {
        let widget = WidgetOptions {
            username: cli.username.or(file.username).unwrap_or_default(),
            graph: cli.graph.or(file.graph).unwrap_or_default(),
            show_title: cli.show_title || file.show_title.unwrap_or(false),
            size: cli.size.or(file.size).unwrap_or_default(),
            start_date: cli.start_date.or(file.start_date),
            ui: cli
                .ui
                .or(file.ui)
                .unwrap_or_else(|| String::from("default")),
            colors: file.colors,
            labels: file.labels,
        };
        Settings {
            widget,
            endpoint: cli
                .endpoint
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            timeout: file
                .timeout_secs
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            stale_after: file
                .stale_after_secs
                .map_or(Duration::ZERO, Duration::from_secs),
            log_file: cli.log_file.or(file.log_file),
        }
    }
}
