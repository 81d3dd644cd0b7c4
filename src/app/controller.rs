use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    Artifact, FormId, GenerationError, GenerationMode, GenerationPayload, GenerationRequest,
    OutputFormat, RowCount, SelectedFile, Severity, SubmissionState,
};
use crate::infra::backend::GenerationBackend;
use crate::infra::config::{debug_prompt_log_enabled, ENV_DEBUG_PROMPT_LOG};

use super::{
    ArtifactDelivery, ArtifactSink, BusyStateBoard, FileIntake, FormSubmission, IntakeOutcome,
    NotificationCenter, ReportViewer, build_generation_request,
};

const DEBUG_PROMPT_PREVIEW_CHARS: usize = 120;

/// Presentation surfaces shared by every form, addressed by `FormId`.
#[derive(Debug, Clone, Default)]
pub struct PresentationSurfaces {
    pub notifications: NotificationCenter,
    pub busy: BusyStateBoard,
}

impl PresentationSurfaces {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where successful artifacts go: downloads for generated data, the viewer for reports.
#[derive(Clone)]
pub struct ArtifactTargets {
    pub downloads: Arc<dyn ArtifactSink>,
    pub viewer: Arc<dyn ReportViewer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Validation failed; the backend was never contacted.
    Rejected { error: GenerationError },
    Succeeded {
        delivery: ArtifactDelivery,
        rows: Option<RowCount>,
    },
    Failed { error: GenerationError },
}

impl SubmissionOutcome {
    pub fn terminal_state(&self) -> SubmissionState {
        match self {
            Self::Rejected { .. } => SubmissionState::Idle,
            Self::Succeeded { .. } => SubmissionState::Succeeded,
            Self::Failed { .. } => SubmissionState::Failed,
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            Self::Rejected { error } | Self::Failed { error } => Some(error),
            Self::Succeeded { .. } => None,
        }
    }

    pub fn delivery(&self) -> Option<&ArtifactDelivery> {
        match self {
            Self::Succeeded { delivery, .. } => Some(delivery),
            Self::Rejected { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

type StateObserver = Box<dyn Fn(SubmissionState) + Send>;

/// Drives one form from submission to artifact delivery.
pub struct GenerationController {
    mode: GenerationMode,
    form: FormId,
    surfaces: PresentationSurfaces,
    backend: Arc<dyn GenerationBackend>,
    targets: ArtifactTargets,
    intake: Option<FileIntake>,
    state: SubmissionState,
    observer: Option<StateObserver>,
}

impl GenerationController {
    pub fn new(
        mode: GenerationMode,
        form: FormId,
        surfaces: PresentationSurfaces,
        backend: Arc<dyn GenerationBackend>,
        targets: ArtifactTargets,
    ) -> Self {
        surfaces
            .busy
            .register(&form, mode.resting_label(), mode.busy_label());
        let intake = mode
            .requires_file()
            .then(|| FileIntake::new(mode, form.clone(), surfaces.notifications.clone()));

        Self {
            mode,
            form,
            surfaces,
            backend,
            targets,
            intake,
            state: SubmissionState::Idle,
            observer: None,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn form(&self) -> &FormId {
        &self.form
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn surfaces(&self) -> &PresentationSurfaces {
        &self.surfaces
    }

    pub fn intake(&self) -> Option<&FileIntake> {
        self.intake.as_ref()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.intake.as_ref().and_then(FileIntake::selected)
    }

    pub fn set_state_observer(&mut self, observer: impl Fn(SubmissionState) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn choose_file(&mut self, file: SelectedFile) -> IntakeOutcome {
        self.with_intake(|intake| intake.choose(file))
    }

    pub fn choose_path(&mut self, path: &Path) -> IntakeOutcome {
        self.with_intake(|intake| intake.choose_path(path))
    }

    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> IntakeOutcome {
        self.with_intake(|intake| intake.drop_files(files))
    }

    pub fn drop_paths(&mut self, paths: &[PathBuf]) -> IntakeOutcome {
        self.with_intake(|intake| intake.drop_paths(paths))
    }

    pub fn drag_enter(&mut self) {
        if let Some(intake) = self.intake.as_mut() {
            intake.drag_enter();
        }
    }

    pub fn drag_leave(&mut self) {
        if let Some(intake) = self.intake.as_mut() {
            intake.drag_leave();
        }
    }

    pub fn submit(&mut self, submission: FormSubmission) -> SubmissionOutcome {
        self.transition(SubmissionState::Validating);
        let request = match self.validate(submission) {
            Ok(request) => request,
            Err(error) => return self.reject(error),
        };

        self.surfaces.notifications.clear(&self.form);
        let busy = match self.surfaces.busy.engage(&self.form) {
            Ok(guard) => guard,
            Err(error) => return self.reject(error),
        };
        self.transition(SubmissionState::InFlight);
        log_dispatch(&self.form, &request);

        let outcome = match self
            .backend
            .dispatch(&request)
            .and_then(|artifact| self.deliver(&request, &artifact))
        {
            Ok(delivery) => {
                self.surfaces.notifications.notify(
                    &self.form,
                    request.success_message(),
                    Severity::Success,
                );
                self.transition(SubmissionState::Succeeded);
                SubmissionOutcome::Succeeded {
                    delivery,
                    rows: request.row_count(),
                }
            }
            Err(error) => {
                warn!(form = %self.form, mode = %self.mode, "generation failed: {error}");
                self.notify_error(&error);
                self.transition(SubmissionState::Failed);
                SubmissionOutcome::Failed { error }
            }
        };

        busy.release();
        self.transition(SubmissionState::Idle);
        outcome
    }

    /// Reports a failure that escaped the normal submission path and returns the form to Idle.
    pub fn recover_from(&mut self, error: GenerationError) -> SubmissionOutcome {
        warn!(form = %self.form, mode = %self.mode, "submission aborted: {error}");
        self.notify_error(&error);
        self.transition(SubmissionState::Idle);
        SubmissionOutcome::Failed { error }
    }

    fn validate(&self, submission: FormSubmission) -> Result<GenerationRequest, GenerationError> {
        if submission.mode() != self.mode {
            return Err(GenerationError::validation(format!(
                "{} form cannot submit a {} request",
                self.mode,
                submission.mode()
            )));
        }
        build_generation_request(submission, self.selected_file())
    }

    fn deliver(
        &self,
        request: &GenerationRequest,
        artifact: &Artifact,
    ) -> Result<ArtifactDelivery, GenerationError> {
        let file_name = request.artifact_file_name();
        match request.payload {
            GenerationPayload::Eda { .. } => self.targets.viewer.open(artifact, &file_name),
            _ => self.targets.downloads.save(artifact, &file_name),
        }
    }

    fn reject(&mut self, error: GenerationError) -> SubmissionOutcome {
        debug!(form = %self.form, "submission rejected: {error}");
        self.notify_error(&error);
        self.transition(SubmissionState::Idle);
        SubmissionOutcome::Rejected { error }
    }

    fn notify_error(&self, error: &GenerationError) {
        self.surfaces.notifications.notify(
            &self.form,
            error.user_message(self.mode),
            Severity::Error,
        );
    }

    fn with_intake(&mut self, action: impl FnOnce(&mut FileIntake) -> IntakeOutcome) -> IntakeOutcome {
        match self.intake.as_mut() {
            Some(intake) => action(intake),
            None => IntakeOutcome::Ignored,
        }
    }

    fn transition(&mut self, next: SubmissionState) {
        debug!(form = %self.form, from = ?self.state, to = ?next, "submission state changed");
        self.state = next;
        if let Some(observer) = self.observer.as_ref() {
            observer(next);
        }
    }
}

fn log_dispatch(form: &FormId, request: &GenerationRequest) {
    let GenerationPayload::Prompt { prompt, .. } = &request.payload else {
        info!(
            form = %form,
            mode = %request.mode(),
            rows = ?request.row_count(),
            format = request.output_format().map(OutputFormat::as_str),
            "submitting request"
        );
        return;
    };

    let prompt_chars = prompt.chars().count();
    if debug_prompt_log_enabled() {
        info!(
            form = %form,
            prompt_chars,
            prompt_preview = %prompt_preview(prompt, DEBUG_PROMPT_PREVIEW_CHARS),
            "submitting prompt request ({ENV_DEBUG_PROMPT_LOG} enabled)"
        );
    } else {
        info!(form = %form, prompt_chars, "submitting prompt request");
    }
}

pub(crate) fn prompt_preview(prompt: &str, max_chars: usize) -> String {
    let mut chars = prompt.chars();
    let mut preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        preview.push_str("...");
    }
    preview
}
