use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{
    FormId, GenerationError, GenerationMode, SelectedFile, Severity, display_file_name,
    has_allowed_extension,
};

use super::NotificationCenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeGesture {
    Chooser,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Accepted { name: String, replaced: bool },
    Rejected { message: String },
    Ignored,
}

/// File chooser and drop target for one form.
pub struct FileIntake {
    mode: GenerationMode,
    form: FormId,
    notifications: NotificationCenter,
    selected: Option<SelectedFile>,
    drag_active: bool,
}

impl FileIntake {
    pub fn new(mode: GenerationMode, form: FormId, notifications: NotificationCenter) -> Self {
        Self {
            mode,
            form,
            notifications,
            selected: None,
            drag_active: false,
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn selection_label(&self) -> Option<String> {
        self.selected
            .as_ref()
            .map(|file| format!("Selected: {}", file.name()))
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    pub fn choose(&mut self, file: SelectedFile) -> IntakeOutcome {
        self.receive(file, IntakeGesture::Chooser)
    }

    pub fn choose_path(&mut self, path: &Path) -> IntakeOutcome {
        self.receive_path(path, IntakeGesture::Chooser)
    }

    /// Only the first dropped file is considered.
    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> IntakeOutcome {
        self.drag_active = false;
        match files.into_iter().next() {
            Some(file) => self.receive(file, IntakeGesture::Drop),
            None => IntakeOutcome::Ignored,
        }
    }

    pub fn drop_paths(&mut self, paths: &[PathBuf]) -> IntakeOutcome {
        self.drag_active = false;
        match paths.first() {
            Some(path) => self.receive_path(path, IntakeGesture::Drop),
            None => IntakeOutcome::Ignored,
        }
    }

    fn receive_path(&mut self, path: &Path, gesture: IntakeGesture) -> IntakeOutcome {
        let name = display_file_name(path);
        if !has_allowed_extension(&name, self.mode.allowed_extensions()) {
            return self.reject(&name, self.mode.invalid_file_type_message().to_string(), gesture);
        }

        match SelectedFile::read_from_path(path) {
            Ok(file) => self.accept(file, gesture),
            Err(GenerationError::Validation { message }) => self.reject(&name, message, gesture),
            Err(error) => self.reject(&name, error.to_string(), gesture),
        }
    }

    fn receive(&mut self, file: SelectedFile, gesture: IntakeGesture) -> IntakeOutcome {
        if !has_allowed_extension(file.name(), self.mode.allowed_extensions()) {
            let name = file.name().to_string();
            return self.reject(&name, self.mode.invalid_file_type_message().to_string(), gesture);
        }
        self.accept(file, gesture)
    }

    fn accept(&mut self, file: SelectedFile, gesture: IntakeGesture) -> IntakeOutcome {
        let name = file.name().to_string();
        let replaced = self.selected.replace(file).is_some();
        debug!(form = %self.form, file = %name, ?gesture, replaced, "file selected");
        IntakeOutcome::Accepted { name, replaced }
    }

    fn reject(&mut self, name: &str, message: String, gesture: IntakeGesture) -> IntakeOutcome {
        warn!(form = %self.form, file = %name, ?gesture, "file rejected: {message}");
        self.notifications
            .notify(&self.form, message.clone(), Severity::Error);
        IntakeOutcome::Rejected { message }
    }
}
