use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::domain::{Artifact, GenerationError};

const FALLBACK_FILE_NAME: &str = "artifact.bin";

/// Where a delivered artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDelivery {
    pub file_name: String,
    pub path: PathBuf,
    pub opened_in_viewer: bool,
}

pub trait ArtifactSink: Send + Sync {
    fn save(&self, artifact: &Artifact, file_name: &str)
    -> Result<ArtifactDelivery, GenerationError>;
}

pub trait ReportViewer: Send + Sync {
    fn open(&self, artifact: &Artifact, file_name: &str)
    -> Result<ArtifactDelivery, GenerationError>;
}

/// Saves artifacts into a directory through a partial file that is renamed
/// into place once fully written.
#[derive(Debug, Clone)]
pub struct DownloadDirectorySink {
    directory: PathBuf,
}

impl DownloadDirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ArtifactSink for DownloadDirectorySink {
    fn save(
        &self,
        artifact: &Artifact,
        file_name: &str,
    ) -> Result<ArtifactDelivery, GenerationError> {
        let file_name = sanitize_file_name(file_name);
        fs::create_dir_all(&self.directory).map_err(|error| {
            GenerationError::delivery(format!(
                "could not create {}: {error}",
                self.directory.display()
            ))
        })?;

        let mut transfer = PartialTransfer::acquire(&self.directory, &file_name)?;
        let outcome = transfer.write(&artifact.bytes).and_then(|()| {
            let destination = free_destination(&self.directory, &file_name);
            transfer.commit(&destination).map(|()| destination)
        });
        transfer.release();
        let destination = outcome?;

        debug!(path = %destination.display(), bytes = artifact.len(), "artifact saved");
        Ok(ArtifactDelivery {
            file_name: display_name(&destination, file_name),
            path: destination,
            opened_in_viewer: false,
        })
    }
}

/// Temporary file backing one transfer. Removed on release unless it was
/// committed to its destination.
struct PartialTransfer {
    path: PathBuf,
    committed: bool,
}

impl PartialTransfer {
    fn acquire(directory: &Path, file_name: &str) -> Result<Self, GenerationError> {
        static NEXT_TRANSFER: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_TRANSFER.fetch_add(1, Ordering::Relaxed);
        let path = directory.join(format!(".{file_name}.{}-{id}.partial", std::process::id()));

        fs::File::create(&path).map_err(|error| {
            GenerationError::delivery(format!("could not create {}: {error}", path.display()))
        })?;
        Ok(Self {
            path,
            committed: false,
        })
    }

    fn write(&self, bytes: &[u8]) -> Result<(), GenerationError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|error| {
                GenerationError::delivery(format!(
                    "could not open {}: {error}",
                    self.path.display()
                ))
            })?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|error| {
                GenerationError::delivery(format!(
                    "could not write {}: {error}",
                    self.path.display()
                ))
            })
    }

    fn commit(&mut self, destination: &Path) -> Result<(), GenerationError> {
        fs::rename(&self.path, destination).map_err(|error| {
            GenerationError::delivery(format!(
                "could not save {}: {error}",
                destination.display()
            ))
        })?;
        self.committed = true;
        Ok(())
    }

    fn release(self) {
        if self.committed {
            return;
        }
        if let Err(error) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "could not remove partial artifact: {error}");
        }
    }
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, ... that does not exist yet
/// in `directory`. Earlier downloads are never overwritten.
fn free_destination(directory: &Path, file_name: &str) -> PathBuf {
    let candidate = directory.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (file_name, None),
    };
    let mut copy = 1u32;
    loop {
        let numbered = match extension {
            Some(extension) => format!("{stem} ({copy}).{extension}"),
            None => format!("{stem} ({copy})"),
        };
        let candidate = directory.join(numbered);
        if !candidate.exists() {
            return candidate;
        }
        copy = copy.saturating_add(1);
    }
}

fn display_name(path: &Path, fallback: String) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .unwrap_or(fallback)
}

/// Keeps only the final path component so a backend-chosen name cannot escape
/// the download directory.
pub fn sanitize_file_name(file_name: &str) -> String {
    Path::new(file_name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{
        ArtifactSink, DownloadDirectorySink, PartialTransfer, free_destination, sanitize_file_name,
    };
    use crate::domain::{Artifact, GenerationError};

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after UNIX_EPOCH")
            .as_nanos();
        std::env::temp_dir().join(format!("synthgen-{label}-{nanos}"))
    }

    fn entries(dir: &PathBuf) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("scratch dir should be readable")
            .map(|entry| {
                entry
                    .expect("dir entry should be readable")
                    .file_name()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn save_writes_final_file_and_leaves_no_partial_behind() {
        let dir = scratch_dir("save");
        let sink = DownloadDirectorySink::new(&dir);

        let delivery = sink
            .save(
                &Artifact::new(b"id,name\n1,Ada\n".to_vec(), None),
                "synthetic_data.csv",
            )
            .expect("save should succeed");

        assert_eq!(delivery.path, dir.join("synthetic_data.csv"));
        assert!(!delivery.opened_in_viewer);
        assert_eq!(
            fs::read(&delivery.path).expect("artifact should exist"),
            b"id,name\n1,Ada\n"
        );
        assert_eq!(entries(&dir), vec!["synthetic_data.csv".to_string()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn second_save_with_same_name_keeps_the_first_file() {
        let dir = scratch_dir("no-overwrite");
        let sink = DownloadDirectorySink::new(&dir);

        let first = sink
            .save(&Artifact::new(b"FIRST".to_vec(), None), "synthetic_data.csv")
            .expect("first save should succeed");
        let second = sink
            .save(&Artifact::new(b"SECOND".to_vec(), None), "synthetic_data.csv")
            .expect("second save should succeed");
        let third = sink
            .save(&Artifact::new(b"THIRD".to_vec(), None), "synthetic_data.csv")
            .expect("third save should succeed");

        assert_ne!(first.path, second.path);
        assert_eq!(second.file_name, "synthetic_data (1).csv");
        assert_eq!(third.file_name, "synthetic_data (2).csv");
        assert_eq!(fs::read(&first.path).expect("first file should remain"), b"FIRST");
        assert_eq!(fs::read(&second.path).expect("second file should exist"), b"SECOND");
        assert_eq!(
            entries(&dir),
            vec![
                "synthetic_data (1).csv".to_string(),
                "synthetic_data (2).csv".to_string(),
                "synthetic_data.csv".to_string(),
            ]
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn numbered_copies_work_for_names_without_extension() {
        let dir = scratch_dir("no-extension");
        fs::create_dir_all(&dir).expect("scratch dir should be created");
        fs::write(dir.join("report"), b"x").expect("existing file should be written");

        assert_eq!(free_destination(&dir, "report"), dir.join("report (1)"));
        assert_eq!(free_destination(&dir, "fresh.csv"), dir.join("fresh.csv"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_commit_releases_partial_file() {
        let dir = scratch_dir("commit-fail");
        let blocked = dir.join("synthetic_data.csv");
        fs::create_dir_all(&blocked).expect("blocking dir should be created");
        fs::write(blocked.join("occupied"), b"x").expect("blocking file should be written");

        let mut transfer =
            PartialTransfer::acquire(&dir, "synthetic_data.csv").expect("partial should be created");
        transfer.write(b"data").expect("partial should be writable");
        let error = transfer
            .commit(&blocked)
            .expect_err("renaming onto a non-empty directory should fail");
        transfer.release();

        assert!(matches!(error, GenerationError::Delivery { .. }));
        assert_eq!(entries(&dir), vec!["synthetic_data.csv".to_string()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sanitize_file_name_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("report.html"), "report.html");
        assert_eq!(sanitize_file_name(".."), "artifact.bin");
        assert_eq!(sanitize_file_name("  "), "artifact.bin");
    }
}
