use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::GenerationError;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Lowercased text after the last dot of the final path component. A bare
/// `.csv` counts as a csv file.
fn lowercase_extension(name: &Path) -> Option<String> {
    let file_name = name.file_name()?.to_str()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    Some(extension.to_ascii_lowercase())
}

pub fn has_allowed_extension(name: impl AsRef<Path>, allowed: &[&str]) -> bool {
    lowercase_extension(name.as_ref())
        .is_some_and(|ext| allowed.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
}

pub fn media_type_for_name(name: impl AsRef<Path>) -> &'static str {
    let extension = lowercase_extension(name.as_ref());
    match extension.as_deref() {
        Some("csv") => "text/csv",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("json") => "application/json",
        _ => DEFAULT_MEDIA_TYPE,
    }
}

/// A file chosen by the user. Content is shared immutably between the intake
/// widget and any submission built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    content: Arc<[u8]>,
    media_type: String,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Arc<[u8]>>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            media_type: media_type.into(),
        }
    }

    pub fn from_bytes(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type_for_name(&name);
        Self::new(name, content, media_type)
    }

    pub fn read_from_path(path: &Path) -> Result<Self, GenerationError> {
        let name = display_file_name(path);
        let content = fs::read(path).map_err(|error| {
            GenerationError::validation(format!("Could not read {name}: {error}"))
        })?;
        Ok(Self::from_bytes(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn stem(&self) -> Option<&str> {
        let name = Path::new(&self.name).file_name()?.to_str()?;
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        Some(stem).filter(|stem| !stem.is_empty())
    }
}

pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
