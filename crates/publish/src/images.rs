use std::path::{Path, PathBuf};

use tracing::debug;

use common::{PublishError, SignalSet};

/// Stages per-symbol chart assets into the publish directory.
///
/// Assets follow a fixed naming scheme, `<symbol>.png`, in both directories.
/// Staging runs before the JSON replace so a published `chart` reference
/// always points at a file that exists. Symbols without an asset simply get
/// no reference.
pub struct ChartAssets {
    source_dir: PathBuf,
    publish_dir: PathBuf,
}

impl ChartAssets {
    pub fn new(source_dir: impl Into<PathBuf>, publish_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            publish_dir: publish_dir.into(),
        }
    }

    /// Copy available assets into the publish directory and attach `chart`
    /// references to the matching records.
    pub fn stage(&self, set: &mut SignalSet) -> Result<(), PublishError> {
        std::fs::create_dir_all(&self.publish_dir)?;

        for record in &mut set.signals {
            let name = format!("{}.png", record.symbol);
            let asset = self.source_dir.join(&name);
            if !asset.is_file() {
                debug!(symbol = %record.symbol, "No chart asset for symbol, skipping");
                continue;
            }

            let target = self.publish_dir.join(&name);
            copy_atomically(&asset, &target)?;
            record.chart = Some(target.display().to_string());
        }

        Ok(())
    }
}

/// Same temp-then-rename discipline as the artifact itself, so a reader never
/// sees a half-copied image at the stable path.
fn copy_atomically(source: &Path, target: &Path) -> std::io::Result<()> {
    let tmp = target.with_extension("png.tmp");
    let result = std::fs::copy(source, &tmp).and_then(|_| std::fs::rename(&tmp, target));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}
