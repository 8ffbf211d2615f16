// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::{
    collections::HashSet,
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Pipeline configuration, loaded from a JSON document.
///
/// Downstream tooling keeps its own keys in the same file; unknown keys are
/// ignored here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postal codes the study area covers. Entries may be JSON strings or
    /// numbers; both normalize to strings.
    #[serde(deserialize_with = "zip_code_set")]
    pub zip_codes: HashSet<String>,
    /// First vintage to process, inclusive.
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    /// Last vintage to process, inclusive.
    #[serde(default = "default_end_year")]
    pub end_year: i32,
    /// Where downloaded detail archives are cached.
    #[serde(default = "default_zips_dir")]
    pub zips_dir: PathBuf,
    /// Where derived outputs land.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_start_year() -> i32 {
    2012
}

fn default_end_year() -> i32 {
    2018
}

fn default_zips_dir() -> PathBuf {
    PathBuf::from("data/zips")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("data/out")
}

impl Config {
    /// The vintages this run covers.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

fn zip_code_set<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Ok(s.trim().to_string()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "zip code must be a string or number, got {}",
                other
            ))),
        })
        .collect()
}

/// Load and validate the configuration at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
    let config: Config =
        serde_json::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
    if config.start_year > config.end_year {
        bail!(
            "config year range {}..={} is empty",
            config.start_year,
            config.end_year
        );
    }
    if config.zip_codes.is_empty() {
        warn!("config lists no zip codes; the normalized output will be empty");
    }
    Ok(config)
}
