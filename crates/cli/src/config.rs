use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use etcetera::BaseStrategy;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use indexmap::IndexMap;
use prettytable::{format::consts::FORMAT_CLEAN, Cell, Row, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr};

/// Prefix of the environment variables overriding the config file.
pub(crate) const ENV_PREFIX: &str = "TOURNAMENT_";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/";
const APP_DIR: &str = "tournament";

/// Default path of the config file.
pub(crate) fn default_config_path() -> eyre::Result<PathBuf> {
    let strategy = etcetera::choose_base_strategy()?;
    Ok(strategy.config_dir().join(APP_DIR).join("config.toml"))
}

fn default_session_path() -> eyre::Result<PathBuf> {
    let strategy = etcetera::choose_base_strategy()?;
    Ok(strategy.data_dir().join(APP_DIR).join("session.json"))
}

fn expand_path(path: &str) -> eyre::Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::full(path)?.into_owned()))
}

/// Options overriding the config from the command line.
#[derive(Debug, Default, clap::Args, Serialize)]
pub(crate) struct Overrides {
    /// Base URL of the tournament API.
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    /// Output format.
    #[arg(long, short, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputFormat>,
}

/// Config.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    base_url: String,
    #[serde_as(as = "DisplayFromStr")]
    timeout: humantime::Duration,
    #[serde_as(as = "DisplayFromStr")]
    poll_interval: humantime::Duration,
    row_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_file: Option<String>,
    output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: tournament_client::sender::DEFAULT_TIMEOUT.into(),
            poll_interval: tournament_sdk::polling::DEFAULT_POLL_INTERVAL.into(),
            row_height: 1.0,
            session_file: None,
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Merge the defaults, the config file at `path`, the environment and
    /// the command line overrides, in this order.
    pub(crate) fn load(path: &Path, overrides: &Overrides) -> eyre::Result<Self> {
        let config = Self::figment(path, overrides).extract()?;
        tracing::debug!(?config, path = %path.display(), "loaded config");
        Ok(config)
    }

    fn figment(path: &Path, overrides: &Overrides) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed(ENV_PREFIX).ignore(&["config", "password", "investor_password"]),
            )
            .merge(Serialized::defaults(overrides))
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn timeout(&self) -> Duration {
        *self.timeout
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        *self.poll_interval
    }

    pub(crate) fn row_height(&self) -> f64 {
        self.row_height
    }

    pub(crate) fn session_file(&self) -> eyre::Result<PathBuf> {
        match self.session_file.as_deref() {
            Some(path) => expand_path(path),
            None => default_session_path(),
        }
    }

    pub(crate) fn output(&self) -> OutputFormat {
        self.output
    }

    /// Render as TOML.
    pub(crate) fn to_toml(&self) -> eyre::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Resolve the config path given on the command line.
pub(crate) fn resolve_config_path(path: Option<&str>) -> eyre::Result<PathBuf> {
    match path {
        Some(path) => expand_path(path),
        None => default_config_path(),
    }
}

/// Output format.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum OutputFormat {
    /// Human readable tables.
    #[default]
    Table,
    /// JSON.
    Json,
}

/// Display options.
#[derive(Debug, Clone, Default)]
pub(crate) struct DisplayOptions {
    projection: IndexMap<String, String>,
}

impl DisplayOptions {
    /// Only show the given `(key, title)` columns, in order.
    pub(crate) fn table_projection(
        columns: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Self {
        Self {
            projection: columns
                .into_iter()
                .map(|(key, title)| (key.to_string(), title.to_string()))
                .collect(),
        }
    }

    fn columns(&self, items: &[Map<String, Value>]) -> IndexMap<String, String> {
        if !self.projection.is_empty() {
            return self.projection.clone();
        }
        items
            .first()
            .map(|item| {
                item.keys()
                    .map(|key| (key.clone(), key.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn project(&self, item: Map<String, Value>) -> Map<String, Value> {
        if self.projection.is_empty() {
            return item;
        }
        self.projection
            .keys()
            .map(|key| (key.clone(), item.get(key).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

fn to_object(item: impl Serialize) -> eyre::Result<Map<String, Value>> {
    match serde_json::to_value(item)? {
        Value::Object(map) => Ok(map),
        value => eyre::bail!("expected an object, found `{value}`"),
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
    }
}

impl OutputFormat {
    /// Returns whether the output is JSON.
    pub(crate) fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    /// Display a list of objects.
    pub(crate) fn display_many(
        &self,
        items: impl IntoIterator<Item = impl Serialize>,
        options: DisplayOptions,
    ) -> eyre::Result<String> {
        let items = items
            .into_iter()
            .map(to_object)
            .collect::<eyre::Result<Vec<_>>>()?;
        match self {
            Self::Json => {
                let items = items
                    .into_iter()
                    .map(|item| Value::Object(options.project(item)))
                    .collect::<Vec<_>>();
                Ok(serde_json::to_string_pretty(&items)?)
            }
            Self::Table => {
                let columns = options.columns(&items);
                let mut table = Table::new();
                table.set_format(*FORMAT_CLEAN);
                table.set_titles(Row::new(columns.values().map(|title| Cell::new(title)).collect()));
                for item in &items {
                    table.add_row(Row::new(
                        columns
                            .keys()
                            .map(|key| Cell::new(&cell_text(item.get(key))))
                            .collect(),
                    ));
                }
                Ok(table.to_string())
            }
        }
    }

    /// Display a single object.
    pub(crate) fn display_one(
        &self,
        item: impl Serialize,
        options: DisplayOptions,
    ) -> eyre::Result<String> {
        let item = to_object(item)?;
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(&options.project(item))?),
            Self::Table => {
                let columns = options.columns(std::slice::from_ref(&item));
                let mut table = Table::new();
                table.set_format(*FORMAT_CLEAN);
                for (key, title) in columns {
                    table.add_row(Row::new(vec![
                        Cell::new(&title),
                        Cell::new(&cell_text(item.get(&key))),
                    ]));
                }
                Ok(table.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use serde_json::json;

    use super::*;

    #[test]
    fn file_env_and_overrides_are_merged_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                base_url = "https://file.example/"
                poll_interval = "30s"
                row_height = 2.5
                output = "json"
                "#,
            )?;
            jail.set_env("TOURNAMENT_BASE_URL", "https://env.example/");
            jail.set_env("TOURNAMENT_TIMEOUT", "5s");

            let path = jail.directory().join("config.toml");
            let config = Config::figment(&path, &Overrides::default()).extract::<Config>()?;
            assert_eq!(config.base_url(), "https://env.example/");
            assert_eq!(config.timeout(), Duration::from_secs(5));
            assert_eq!(config.poll_interval(), Duration::from_secs(30));
            assert_eq!(config.row_height(), 2.5);
            assert_eq!(config.output(), OutputFormat::Json);

            let overrides = Overrides {
                base_url: Some("https://cli.example/".to_string()),
                output: Some(OutputFormat::Table),
            };
            let config = Config::figment(&path, &overrides).extract::<Config>()?;
            assert_eq!(config.base_url(), "https://cli.example/");
            assert_eq!(config.output(), OutputFormat::Table);
            Ok(())
        });
    }

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("missing.toml");
            let config = Config::figment(&path, &Overrides::default()).extract::<Config>()?;
            assert_eq!(config.base_url(), DEFAULT_BASE_URL);
            assert_eq!(config.timeout(), Duration::from_secs(15));
            assert_eq!(config.poll_interval(), Duration::from_secs(60));
            assert_eq!(config.output(), OutputFormat::Table);
            Ok(())
        });
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        Jail::expect_with(|jail| {
            let rendered = Config::default().to_toml().map_err(|err| err.to_string())?;
            jail.create_file("config.toml", &rendered)?;
            let path = jail.directory().join("config.toml");
            let config = Config::figment(&path, &Overrides::default()).extract::<Config>()?;
            assert_eq!(config.poll_interval(), Duration::from_secs(60));
            Ok(())
        });
    }

    #[test]
    fn projection_selects_and_orders_columns() -> eyre::Result<()> {
        let items = [
            json!({"username": "alice", "rank": 1, "extra": true}),
            json!({"username": "bob", "rank": 2, "extra": false}),
        ];
        let options = DisplayOptions::table_projection([("rank", "Rank"), ("username", "User")]);

        let out = OutputFormat::Json.display_many(&items, options.clone())?;
        let value: Value = serde_json::from_str(&out)?;
        assert_eq!(value, json!([{"rank": 1, "username": "alice"}, {"rank": 2, "username": "bob"}]));

        let out = OutputFormat::Table.display_many(&items, options)?;
        assert!(out.contains("Rank"));
        assert!(out.contains("alice"));
        assert!(!out.contains("extra"));
        Ok(())
    }
}
