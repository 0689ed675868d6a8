//! Loader for relay configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults (room 11, `https://chat.stackoverflow.com`, 15 s timeout)
//! 2. YAML files and inline YAML snippets, in the order they were added
//! 3. `RELAY__`-prefixed environment variables, `__` separating nested keys
//!    (`RELAY__WEBHOOK_URL`, `RELAY__HTTP__TIMEOUT_SECS`)
//!
//! String values then get `${VAR}` expansion. If no webhook is configured at
//! all, `SLACK_WEBHOOK` from the environment is used.
use config::{Config, ConfigError, Environment, File, FileFormat};
use relay_common::RelayError;
use relay_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "RELAY";
const WEBHOOK_FALLBACK_ENV: &str = "SLACK_WEBHOOK";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Incoming-webhook URL. Treated as a secret: never logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Chat room whose transcript is relayed.
    #[serde(default = "default_room")]
    pub room: u32,
    /// Scheme + host of the chat server.
    #[serde(default = "default_chat_base")]
    pub chat_base: String,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
        }
    }
}

fn default_room() -> u32 {
    11
}
fn default_chat_base() -> String {
    "https://chat.stackoverflow.com".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

impl RelayConfig {
    /// The configured webhook as a parsed URL.
    ///
    /// Fails with [`RelayError::Config`] when nothing is configured, when a
    /// `${VAR}` placeholder was left unresolved, or when the value does not
    /// parse. The error text never includes the URL itself.
    ///
    /// ```
    /// use relay_config::RelayConfigLoader;
    ///
    /// let cfg = RelayConfigLoader::new()
    ///     .with_yaml_str("webhook_url: https://hooks.slack.com/services/T0/B0/x")
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(cfg.webhook_url().unwrap().host_str(), Some("hooks.slack.com"));
    /// ```
    pub fn webhook_url(&self) -> relay_common::Result<Url> {
        let raw = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RelayError::Config(format!(
                    "webhook_url is not set (configure webhook_url, {ENV_PREFIX}__WEBHOOK_URL or {WEBHOOK_FALLBACK_ENV})"
                ))
            })?;
        if raw.contains("${") {
            return Err(RelayError::Config(
                "webhook_url references an unset environment variable".into(),
            ));
        }
        let url = Url::parse(raw)
            .map_err(|e| RelayError::Config(format!("webhook_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::Config(format!(
                "webhook_url must be http(s), got scheme {:?}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

enum Source {
    File { path: PathBuf, required: bool },
    Inline(String),
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
#[derive(Default)]
pub struct RelayConfigLoader {
    sources: Vec<Source>,
}

impl RelayConfigLoader {
    /// Start with no files: defaults + `RELAY__` env overrides only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a YAML file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Attach a YAML file that is skipped when missing, so headless
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use relay_config::RelayConfigLoader;
    ///
    /// let cfg = RelayConfigLoader::new()
    ///     .with_yaml_str("room: 17\nhttp:\n  timeout_secs: 30\n")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.room, 17);
    /// assert_eq!(cfg.http.timeout_secs, 30);
    /// assert_eq!(cfg.chat_base, "https://chat.stackoverflow.com");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.sources.push(Source::Inline(yaml.to_string()));
        self
    }

    /// Merge every source, expand `${VAR}` placeholders and deserialize into
    /// a typed [`RelayConfig`].
    pub fn load(self) -> Result<RelayConfig, ConfigError> {
        let mut builder = Config::builder();
        for source in self.sources {
            builder = match source {
                Source::File { path, required } => builder.add_source(
                    File::from(path)
                        .format(FileFormat::Yaml)
                        .required(required),
                ),
                Source::Inline(yaml) => {
                    builder.add_source(File::from_str(&yaml, FileFormat::Yaml))
                }
            };
        }
        // added last so the environment wins over files
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        let mut typed: RelayConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.webhook_url.is_none() {
            typed.webhook_url = std::env::var(WEBHOOK_FALLBACK_ENV).ok();
        }

        Ok(typed)
    }
}
