// src/config/beat.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::providers::hacker_news::{StoryFeed, DEFAULT_API_BASE_URL};

pub const ENV_CONFIG_PATH: &str = "HACKERBEAT_CONFIG";
const ENV_PERIOD: &str = "HACKERBEAT_PERIOD";
const ENV_TIMEOUT: &str = "HACKERBEAT_TIMEOUT";
const ENV_NUMBER_OF_STORIES: &str = "HACKERBEAT_NUMBER_OF_STORIES";
const ENV_API_BASE_URL: &str = "HACKERBEAT_API_BASE_URL";

/// Where published events go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputConfig {
    #[default]
    Stdout,
    Webhook { url: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// How often the ranked list is polled.
    #[serde(deserialize_with = "duration_value::deserialize")]
    pub period: Duration,
    /// How long one cycle waits for item lookups.
    #[serde(deserialize_with = "duration_value::deserialize")]
    pub timeout: Duration,
    pub number_of_stories: usize,
    pub api_base_url: String,
    pub feed: StoryFeed,
    #[serde(deserialize_with = "duration_value::deserialize_opt")]
    pub request_timeout: Option<Duration>,
    pub run_on_start: bool,
    /// Value of the `type` field on every event.
    pub beat_name: String,
    pub output: OutputConfig,
    pub monitoring_addr: Option<SocketAddr>,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            timeout: Duration::from_secs(10),
            number_of_stories: 10,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            feed: StoryFeed::Top,
            request_timeout: None,
            run_on_start: false,
            beat_name: "hackerbeat".to_string(),
            output: OutputConfig::Stdout,
            monitoring_addr: None,
        }
    }
}

impl BeatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            bail!("period must be greater than zero");
        }
        if self.timeout.is_zero() {
            bail!("timeout must be greater than zero");
        }
        if self.beat_name.trim().is_empty() {
            bail!("beat_name must not be empty");
        }
        Ok(())
    }

    /// Override fields from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PERIOD) {
            self.period = parse_duration(&v).with_context(|| format!("{ENV_PERIOD}={v}"))?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT) {
            self.timeout = parse_duration(&v).with_context(|| format!("{ENV_TIMEOUT}={v}"))?;
        }
        if let Some(v) = lookup(ENV_NUMBER_OF_STORIES) {
            self.number_of_stories = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_NUMBER_OF_STORIES}={v}"))?;
        }
        if let Some(v) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = v.trim().to_string();
        }
        Ok(self)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<BeatConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks, then apply env overrides:
/// 1) $HACKERBEAT_CONFIG
/// 2) config/hackerbeat.toml
/// 3) config/hackerbeat.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<BeatConfig> {
    let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else if Path::new("config/hackerbeat.toml").exists() {
        load_config_from(Path::new("config/hackerbeat.toml"))?
    } else if Path::new("config/hackerbeat.json").exists() {
        load_config_from(Path::new("config/hackerbeat.json"))?
    } else {
        BeatConfig::default()
    };

    let cfg = base.apply_overrides(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<BeatConfig> {
    match hint_ext {
        "json" => serde_json::from_str(s).context("parsing json config"),
        "toml" => toml::from_str(s).context("parsing toml config"),
        _ => toml::from_str(s)
            .or_else(|_| serde_json::from_str(s))
            .map_err(|_| anyhow!("unsupported config format")),
    }
}

/// Accepts `"90s"`, `"1m 30s"`, `"500ms"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).context("failed to parse duration")
}

mod duration_value {
    use serde::{de, Deserialize, Deserializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    fn convert<E: de::Error>(raw: Raw) -> Result<Duration, E> {
        match raw {
            Raw::Secs(s) => Ok(Duration::from_secs(s)),
            Raw::Text(t) => super::parse_duration(&t).map_err(|e| E::custom(format!("{e:#}"))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        convert(Raw::deserialize(d)?)
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<Raw>::deserialize(d)?
            .map(convert::<D::Error>)
            .transpose()
    }
}
