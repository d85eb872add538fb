//! Configuration module for pipestore
//!
//! A pipeline configuration lists the nodes to create, in order, with their
//! settings. Files are TOML, or JSON when the extension is `.json`.
//!
//! # Example
//!
//! ```toml
//! name = "energy-scan"
//!
//! [logging]
//! filter = "info,pipestore=trace"
//!
//! [[nodes]]
//! name = "reader"
//! type = "cursor_source"
//! stream = "events"
//! segments = ["run1.json", "run2.json"]
//! outputs = [{ name = "energy", type = "float" }]
//!
//! [[nodes]]
//! name = "h_energy"
//! type = "histogram_fill"
//! input = "reader/energy"
//! bins = 50
//! low = 0.0
//! high = 100.0
//!
//! [[nodes]]
//! name = "writer"
//! type = "store_writer"
//! file = "scan.store"
//! title = "Energy scan"
//!
//! [nodes.content]
//! hist = ["h_energy"]
//! ```

pub mod content;

pub use content::ContentSpec;

use crate::error::{PipeStoreError, Result, ResultExt};
use crate::logging::LoggingConfig;
use crate::records::ColumnDef;
use crate::store::{validate_file_name, AutoRegistration};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "pipestore";

/// Extension that selects the JSON format
pub const JSON_EXTENSION: &str = "json";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

// ==================== Node Configuration ====================

/// One node of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name, unique among its siblings
    pub name: String,

    /// Path of the parent node, which must be defined earlier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(flatten)]
    pub spec: NodeSpec,
}

/// Node type and its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    /// Serves records of a segmented stream
    CursorSource {
        stream: String,
        segments: Vec<PathBuf>,
        /// One output terminal per column
        outputs: Vec<ColumnDef>,
    },
    /// Fills a histogram named after the node
    HistogramFill {
        input: String,
        bins: usize,
        low: f64,
        high: f64,
        #[serde(default)]
        title: String,
    },
    /// Writes artifacts of other nodes to a store file
    StoreWriter {
        file: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: ContentSpec,
        #[serde(default)]
        auto_registration: AutoRegistration,
    },
}

impl NodeSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeSpec::CursorSource { .. } => "cursor_source",
            NodeSpec::HistogramFill { .. } => "histogram_fill",
            NodeSpec::StoreWriter { .. } => "store_writer",
        }
    }
}

// ==================== Pipeline Configuration ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, used in log output
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

fn default_pipeline_name() -> String {
    "pipeline".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            logging: LoggingConfig::default(),
            nodes: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipeStoreError::Config(format!("Failed to read pipeline config {:?}: {}", path, e))
        })?;

        let config = if is_json(path) {
            serde_json::from_str(&content).map_err(PipeStoreError::from)
        } else {
            Self::from_toml_str(&content)
        }
        .with_context(|| format!("Failed to parse pipeline config {:?}", path))?;
        tracing::debug!("Loaded pipeline config {:?}", path);
        Ok(config)
    }

    /// Save to a file, in the format chosen by its extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content).map_err(|e| {
            PipeStoreError::Config(format!("Failed to write pipeline config {:?}: {}", path, e))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check settings that do not need the graph: names, segment lists and binning.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() || node.name.contains('/') {
                return Err(PipeStoreError::Config(format!(
                    "\"{}\" is not a valid node name",
                    node.name
                )));
            }
            let key = (node.parent.clone().unwrap_or_default(), node.name.clone());
            if !seen.insert(key) {
                return Err(PipeStoreError::Config(format!(
                    "Duplicate node name \"{}\"",
                    node.name
                )));
            }

            match &node.spec {
                NodeSpec::CursorSource {
                    segments, outputs, ..
                } => {
                    if segments.is_empty() {
                        return Err(PipeStoreError::Config(format!(
                            "Node \"{}\" has no segments",
                            node.name
                        )));
                    }
                    if outputs.is_empty() {
                        tracing::warn!("Cursor source \"{}\" declares no outputs", node.name);
                    }
                }
                NodeSpec::HistogramFill {
                    bins, low, high, ..
                } => {
                    if *bins == 0 || !(low < high) {
                        return Err(PipeStoreError::Config(format!(
                            "Node \"{}\" has invalid binning: {} bins over [{}, {})",
                            node.name, bins, low, high
                        )));
                    }
                }
                NodeSpec::StoreWriter { file, .. } => {
                    if file.is_empty() {
                        return Err(PipeStoreError::Config(format!(
                            "Node \"{}\" has no output file",
                            node.name
                        )));
                    }
                    if validate_file_name(file).is_err() {
                        return Err(PipeStoreError::Config(format!(
                            "Node \"{}\" writes to \"{}\", which is not a plain file name",
                            node.name, file
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(JSON_EXTENSION))
        .unwrap_or(false)
}
