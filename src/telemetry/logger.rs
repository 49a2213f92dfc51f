//! JSONL node snapshot logger with file rotation

use chrono::{Local, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::node::Node;

const FILE_PREFIX: &str = "nodes_";
const FILE_EXTENSION: &str = "jsonl";

/// One logged line
#[derive(Debug, Serialize)]
struct NodeRecord<'a> {
    /// UTC time the record was written (RFC 3339)
    logged_at: String,
    battery_ok: bool,
    #[serde(flatten)]
    node: &'a Node,
}

/// Writes node snapshots to rotating JSON Lines files
#[derive(Debug)]
pub struct NodeLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_sequence: u32,
}

impl NodeLogger {
    /// Create a logger writing into `log_dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)?;

        info!("Node telemetry logging to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_sequence: 0,
        })
    }

    /// Create a logger from configuration
    ///
    /// # Returns
    ///
    /// * `Result<Option<NodeLogger>>` - `None` when telemetry is disabled
    pub fn from_config(config: &TelemetryConfig) -> Result<Option<Self>> {
        if !config.enabled {
            debug!("Node telemetry disabled");
            return Ok(None);
        }

        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep).map(Some)
    }

    /// Append a snapshot of `node`
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be serialized or written
    pub fn record(&mut self, node: &Node) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = NodeRecord {
            logged_at: Utc::now().to_rfc3339(),
            battery_ok: node.is_battery_ok(),
            node,
        };
        let line = serde_json::to_string(&record)?;

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;

        Ok(())
    }

    /// Directory the logger writes into
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_sequence,
            FILE_EXTENSION
        );
        self.file_sequence = self.file_sequence.wrapping_add(1);

        let path = self.log_dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names sort chronologically
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        Ok(())
    }

    fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
                .unwrap_or(false);
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}
