use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, error, info};

/// Pushes the published artifact to the repository remote so static hosting
/// picks it up.
///
/// Sync failures never propagate: the local artifact is already valid and the
/// next cycle pushes again.
pub struct GitSync {
    target: PathBuf,
}

impl GitSync {
    pub fn new(target: PathBuf) -> Self {
        Self { target }
    }

    pub fn sync(&self) {
        match self.try_sync() {
            Ok(true) => info!(target = %self.target.display(), "Artifact pushed to remote"),
            Ok(false) => debug!("Artifact unchanged, nothing to push"),
            Err(e) => error!(error = %e, "Git sync failed"),
        }
    }

    fn try_sync(&self) -> std::io::Result<bool> {
        let status = run_git(&["status", "--porcelain", &self.target_str()])?;
        if status.trim().is_empty() {
            return Ok(false);
        }

        run_git(&["add", &self.target_str()])?;
        // Commit may legitimately find nothing staged worth committing
        let _ = run_git(&["commit", "-m", "auto update signals"]);
        run_git(&["push", "origin", "main"])?;
        Ok(true)
    }

    fn target_str(&self) -> String {
        self.target.display().to_string()
    }
}

fn run_git(args: &[&str]) -> std::io::Result<String> {
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or(""),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
