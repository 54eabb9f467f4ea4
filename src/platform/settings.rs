use serde::Deserialize;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;

fn default_refresh_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub account_id: String,
    pub snapshot: PathBuf,
    pub log_level: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default)]
    pub expand_all: bool,
}

#[derive(Debug)]
pub struct Config {}

impl Config {
    pub fn read_config_file(path: &str) -> Result<Settings> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Settings> {
        let settings: Settings = serde_json::from_str(contents)?;
        if settings.refresh_secs == 0 {
            bail!("refresh_secs must be greater than zero");
        }
        Ok(settings)
    }
}
