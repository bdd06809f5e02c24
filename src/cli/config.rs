use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::driver::appium::DriverConfig;
use crate::picker::filter::{BlockList, CoordinateWindow, TextRules};
use crate::picker::flow::PickerFlow;
use crate::picker::reconstruct::{DEFAULT_CLUSTER_THRESHOLD, ListReconstructor};
use crate::picker::select::SelectionEngine;
use crate::picker::verify::{DEFAULT_ATTEMPTS, DEFAULT_BACKOFF};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "picker-select",
    version,
    about = "Reconstruct, pick and verify dropdown entries through the accessibility tree"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: picker-select.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Replay a captured JSON screen snapshot instead of a live session
    #[arg(long, global = true)]
    pub snapshot: Option<String>,

    /// Appium server endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Append decision trace events to this JSONL file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the entries reconstructed from the current screen
    Reconstruct {
        /// Row separation threshold in vertical units
        #[arg(long)]
        threshold: Option<i32>,
    },

    /// Open a dropdown, select an entry and verify the result
    Select {
        /// Title text of the field being filled
        #[arg(long)]
        field: String,

        /// Text of the button that opens the dropdown
        #[arg(long)]
        open: Option<String>,

        /// Select this index instead of a random sibling
        #[arg(long)]
        index: Option<usize>,

        #[arg(long = "exclude-index")]
        exclude_index: Vec<usize>,

        #[arg(long = "exclude-name")]
        exclude_name: Vec<String>,

        /// Label that closes the read-back section (default: verify.section_exit)
        #[arg(long)]
        section_exit: Option<String>,

        /// Seed for reproducible random selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pick a source and then a different target
    Pair {
        #[arg(long)]
        source_field: String,

        #[arg(long)]
        source_open: Option<String>,

        #[arg(long)]
        target_field: String,

        #[arg(long)]
        target_open: Option<String>,

        #[arg(long)]
        seed: Option<u64>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `picker-select.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    #[serde(default)]
    pub window: CoordinateWindow,

    #[serde(default)]
    pub block_list: BlockList,

    #[serde(default = "default_threshold")]
    pub cluster_threshold: i32,

    /// Wait after a selection click
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait after tapping the dropdown open
    #[serde(default = "default_settle_ms")]
    pub open_settle_ms: u64,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            window: CoordinateWindow::default(),
            block_list: BlockList::default(),
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
            settle_ms: default_settle_ms(),
            open_settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Label ending the read-back section; empty scans to the end of screen
    #[serde(default)]
    pub section_exit: String,

    #[serde(default)]
    pub rules: TextRules,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
            section_exit: String::new(),
            rules: TextRules::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_threshold() -> i32 { DEFAULT_CLUSTER_THRESHOLD }
fn default_settle_ms() -> u64 { 1000 }
fn default_attempts() -> u32 { DEFAULT_ATTEMPTS }
fn default_backoff_ms() -> u64 { DEFAULT_BACKOFF.as_millis() as u64 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("picker-select.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Apply global CLI overrides on top of the file config.
pub fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(endpoint) = &cli.endpoint {
        config.driver.endpoint = endpoint.clone();
    }
    if let Some(trace) = &cli.trace {
        config.trace.path = Some(trace.clone());
    }
    config
}

// ============================================================================
// Config Builders
// ============================================================================

pub fn build_reconstructor(config: &PickerConfig, threshold: Option<i32>) -> ListReconstructor {
    ListReconstructor::new(config.window, config.block_list.clone())
        .with_threshold(threshold.unwrap_or(config.cluster_threshold))
}

pub fn build_engine(config: &PickerConfig, seed: Option<u64>) -> SelectionEngine {
    let settle = Duration::from_millis(config.settle_ms);
    match seed {
        Some(seed) => SelectionEngine::with_seed(settle, seed),
        None => SelectionEngine::new(settle),
    }
}

pub fn build_flow(config: &AppConfig, seed: Option<u64>) -> PickerFlow {
    let mut flow = PickerFlow::new(
        build_reconstructor(&config.picker, None),
        build_engine(&config.picker, seed),
        config.verify.rules.clone(),
    );
    flow.verify_attempts = config.verify.attempts;
    flow.verify_backoff = Duration::from_millis(config.verify.backoff_ms);
    flow.open_settle = Duration::from_millis(config.picker.open_settle_ms);
    flow
}
