use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use common::{PublishError, SignalSet};

use crate::git::GitSync;
use crate::images::ChartAssets;

/// Writes the signal set to its destination with an atomic replace.
///
/// Readers polling the destination never observe a partial file: the JSON is
/// written to a temp file in the same directory and renamed into place. On
/// any failure the previously published artifact is left untouched.
pub struct Publisher {
    destination: PathBuf,
    charts: Option<ChartAssets>,
    git: Option<GitSync>,
}

impl Publisher {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            charts: None,
            git: None,
        }
    }

    /// Enable image staging: assets land on disk before the JSON that
    /// references them.
    pub fn with_charts(mut self, charts: ChartAssets) -> Self {
        self.charts = Some(charts);
        self
    }

    /// Enable git sync of the destination after each successful replace.
    pub fn with_git_sync(mut self) -> Self {
        self.git = Some(GitSync::new(self.destination.clone()));
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn publish(&self, mut set: SignalSet) -> Result<(), PublishError> {
        // Images first: the artifact must never reference a not-yet-existing
        // file.
        if let Some(charts) = &self.charts {
            charts.stage(&mut set)?;
        }

        self.raise_timestamps(&mut set);

        let bytes = serde_json::to_vec_pretty(&set)?;
        self.replace_atomically(&bytes)?;

        info!(
            destination = %self.destination.display(),
            signals = set.signals.len(),
            "Published signal set"
        );

        // Best-effort: the artifact on disk is already valid, so a failed
        // push only delays the remote copy until the next cycle.
        if let Some(git) = &self.git {
            git.sync();
        }

        Ok(())
    }

    /// Record timestamps never go backwards across published versions of the
    /// same symbol. The previous artifact is advisory only: if it is missing
    /// or does not parse, it is ignored.
    fn raise_timestamps(&self, set: &mut SignalSet) {
        let Some(previous) = self.load_previous() else {
            return;
        };

        for record in &mut set.signals {
            if let Some(prev) = previous.record(&record.symbol) {
                if prev.timestamp > record.timestamp {
                    warn!(
                        symbol = %record.symbol,
                        "Raising record timestamp to previously published value"
                    );
                    record.timestamp = prev.timestamp;
                }
            }
        }
    }

    fn load_previous(&self) -> Option<SignalSet> {
        let bytes = std::fs::read(&self.destination).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(set) => Some(set),
            Err(e) => {
                debug!(error = %e, "Previous artifact unparseable, ignoring");
                None
            }
        }
    }

    fn replace_atomically(&self, bytes: &[u8]) -> Result<(), PublishError> {
        let tmp = temp_path(&self.destination);

        let result = write_then_rename(&tmp, &self.destination, bytes);
        if result.is_err() {
            // The destination is untouched; only the temp file needs cleanup.
            let _ = std::fs::remove_file(&tmp);
        }
        result.map_err(PublishError::Io)
    }
}

fn write_then_rename(tmp: &Path, dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp, dest)
}

/// Temp file next to the destination so the rename stays on one filesystem.
fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("signals.json");
    dest.with_file_name(format!(".{name}.tmp"))
}
