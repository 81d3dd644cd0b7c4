use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;

use tracing::{info, warn};

use crate::app::{ArtifactDelivery, ArtifactSink, DownloadDirectorySink, ReportViewer};
use crate::domain::{Artifact, GenerationError};

/// Stores reports in a directory and hands them to the platform's document opener.
pub struct SystemReportViewer {
    store: DownloadDirectorySink,
}

impl SystemReportViewer {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: DownloadDirectorySink::new(report_dir),
        }
    }
}

impl ReportViewer for SystemReportViewer {
    fn open(
        &self,
        artifact: &Artifact,
        file_name: &str,
    ) -> Result<ArtifactDelivery, GenerationError> {
        let mut delivery = self.store.save(artifact, file_name)?;
        let opener = opener_command(&delivery.path).spawn().map_err(|error| {
            GenerationError::delivery(format!(
                "report saved to {} but could not be opened: {error}",
                delivery.path.display()
            ))
        })?;
        reap_in_background(opener);
        info!(path = %delivery.path.display(), "report opened in viewer");
        delivery.opened_in_viewer = true;
        Ok(delivery)
    }
}

/// Waits for the opener off the submission thread so it does not linger as a zombie.
fn reap_in_background(mut opener: Child) {
    let spawned = thread::Builder::new()
        .name("synthgen-report-opener".to_string())
        .spawn(move || match opener.wait() {
            Ok(status) if !status.success() => {
                warn!(%status, "report opener exited unsuccessfully");
            }
            Ok(_) => {}
            Err(error) => warn!("could not wait for report opener: {error}"),
        });
    if let Err(error) = spawned {
        warn!("could not start report opener reaper: {error}");
    }
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
