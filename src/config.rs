use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::metrics::{CategoryLabels, DEFAULT_MONTH_WINDOW};

#[derive(Debug, Clone, Deserialize)]
pub enum SimpleOutputFormat {
    #[serde(rename = "polars_print")]
    PolarsPrint,
    #[serde(rename = "csv_print")]
    CsvPrint,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutputFormat {
    Simple(SimpleOutputFormat),
    #[serde(rename_all = "camelCase")]
    CsvFile { csv_output: PathBuf },
    #[serde(rename_all = "camelCase")]
    VisualFile { visual_output: PathBuf },
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Simple(SimpleOutputFormat::PolarsPrint)
    }
}

fn default_month_window() -> usize {
    DEFAULT_MONTH_WINDOW
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub resolution_date: Option<NaiveDate>,
    #[serde(default = "default_month_window")]
    pub month_window: usize,
    #[serde(default)]
    pub category_labels: CategoryLabels,
    #[serde(default)]
    pub output_format: OutputFormat,
}

pub fn parse_config(contents: &str) -> Result<Config> {
    serde_json::from_str(contents).with_context(|| "parsing config JSON")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading config from {path:?}"))?;
    parse_config(&contents)
}
