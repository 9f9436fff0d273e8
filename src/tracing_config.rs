//! Tracing configuration for debugging lowering runs.
//!
//! Supports three output formats controlled by `BINDC_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical indented output via `tracing-tree`
//! - `json`: one JSON object per span or event
//!
//! ## Quick start
//!
//! ```bash
//! # Per-class phases and analyzer summaries as a tree
//! BINDC_LOG=debug BINDC_LOG_FORMAT=tree cargo test -p bindc
//!
//! # Every translated node
//! BINDC_LOG="bindc_lower::translate=trace" cargo test -p bindc
//! ```
//!
//! The subscriber is only initialised when `BINDC_LOG` (or `RUST_LOG`) is
//! set, so there is zero overhead in normal use.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_VAR: &str = "BINDC_LOG";
const FORMAT_VAR: &str = "BINDC_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Standard flat text lines.
    #[default]
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a format name; anything unrecognized is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        std::env::var(FORMAT_VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// `BINDC_LOG` takes precedence over `RUST_LOG`; both use the `RUST_LOG`
/// directive syntax.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var(LOG_VAR) {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `BINDC_LOG` nor `RUST_LOG` is set, or when a
/// global subscriber is already installed. All output goes to stderr.
pub fn init_tracing() {
    if std::env::var(LOG_VAR).is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }

    let filter = build_filter();
    let installed = match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init().is_ok()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init().is_ok()
        }
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    };
    if !installed {
        tracing::debug!("tracing subscriber already installed");
    }
}
