use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use tracing::{debug, error};

use crate::domain::{FormId, GenerationError, GenerationMode, SelectedFile, SubmissionState};

use super::{FormSubmission, GenerationController, IntakeOutcome, SubmissionOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormUpdate {
    Submission {
        job_id: u64,
        state: SubmissionState,
        outcome: Option<SubmissionOutcome>,
    },
    Intake {
        outcome: IntakeOutcome,
        selection_label: Option<String>,
    },
}

impl FormUpdate {
    fn state(job_id: u64, state: SubmissionState) -> Self {
        Self::Submission {
            job_id,
            state,
            outcome: None,
        }
    }

    fn finished(job_id: u64, outcome: SubmissionOutcome) -> Self {
        Self::Submission {
            job_id,
            state: outcome.terminal_state(),
            outcome: Some(outcome),
        }
    }
}

/// Runs one form's controller on its own thread so that separate forms can
/// have requests outstanding at the same time. A form accepts a new submission
/// only after its previous one has finished.
pub struct FormWorker {
    form: FormId,
    mode: GenerationMode,
    next_job_id: AtomicU64,
    command_tx: mpsc::Sender<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
    worker_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl FormWorker {
    pub fn spawn(mut controller: GenerationController) -> Result<Self, GenerationError> {
        let form = controller.form().clone();
        let mode = controller.mode();
        let shared = Arc::new(Mutex::new(SharedState::default()));
        let (command_tx, command_rx) = mpsc::channel();

        let observer_shared = Arc::clone(&shared);
        controller.set_state_observer(move |state| {
            let mut shared = observer_shared
                .lock()
                .expect("form worker state lock poisoned");
            shared.state = state;
            if state == SubmissionState::InFlight
                && let Some(job_id) = shared.active_job
            {
                shared.updates.push_back(FormUpdate::state(job_id, state));
            }
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("synthgen-form-{form}"))
            .spawn(move || worker_loop(controller, command_rx, worker_shared))
            .map_err(|error| {
                GenerationError::internal(format!("failed to start form worker thread: {error}"))
            })?;

        Ok(Self {
            form,
            mode,
            next_job_id: AtomicU64::new(1),
            command_tx,
            shared,
            worker_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn form(&self) -> &FormId {
        &self.form
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Queues a submission. Refused while the form's previous submission is unfinished.
    pub fn submit(&self, submission: FormSubmission) -> Result<u64, GenerationError> {
        let job_id = {
            let mut shared = self.shared.lock().expect("form worker state lock poisoned");
            if shared.active_job.is_some() {
                return Err(GenerationError::SubmissionBusy);
            }
            let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
            shared.active_job = Some(job_id);
            job_id
        };

        if let Err(error) = self.send(WorkerMessage::Submit { job_id, submission }) {
            self.shared
                .lock()
                .expect("form worker state lock poisoned")
                .active_job = None;
            return Err(error);
        }
        Ok(job_id)
    }

    pub fn choose_file(&self, file: SelectedFile) -> Result<(), GenerationError> {
        self.send(WorkerMessage::Intake(IntakeCommand::ChooseFile(file)))
    }

    pub fn choose_path(&self, path: PathBuf) -> Result<(), GenerationError> {
        self.send(WorkerMessage::Intake(IntakeCommand::ChoosePath(path)))
    }

    pub fn drop_files(&self, files: Vec<SelectedFile>) -> Result<(), GenerationError> {
        self.send(WorkerMessage::Intake(IntakeCommand::DropFiles(files)))
    }

    pub fn drop_paths(&self, paths: Vec<PathBuf>) -> Result<(), GenerationError> {
        self.send(WorkerMessage::Intake(IntakeCommand::DropPaths(paths)))
    }

    pub fn drag_enter(&self) -> Result<(), GenerationError> {
        self.send(WorkerMessage::DragEnter)
    }

    pub fn drag_leave(&self) -> Result<(), GenerationError> {
        self.send(WorkerMessage::DragLeave)
    }

    pub fn state(&self) -> SubmissionState {
        self.shared
            .lock()
            .expect("form worker state lock poisoned")
            .state
    }

    pub fn has_active_submission(&self) -> bool {
        self.shared
            .lock()
            .expect("form worker state lock poisoned")
            .active_job
            .is_some()
    }

    pub fn drain_updates(&self) -> Vec<FormUpdate> {
        let mut shared = self.shared.lock().expect("form worker state lock poisoned");
        shared.updates.drain(..).collect()
    }

    fn send(&self, message: WorkerMessage) -> Result<(), GenerationError> {
        self.command_tx.send(message).map_err(|error| {
            GenerationError::internal(format!(
                "failed to send command to form worker '{}': {error}",
                self.form
            ))
        })
    }
}

impl Drop for FormWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WorkerMessage::Shutdown);

        if let Some(handle) = self
            .worker_handle
            .lock()
            .expect("form worker handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct SharedState {
    state: SubmissionState,
    active_job: Option<u64>,
    updates: VecDeque<FormUpdate>,
}

enum IntakeCommand {
    ChooseFile(SelectedFile),
    ChoosePath(PathBuf),
    DropFiles(Vec<SelectedFile>),
    DropPaths(Vec<PathBuf>),
}

enum WorkerMessage {
    Submit {
        job_id: u64,
        submission: FormSubmission,
    },
    Intake(IntakeCommand),
    DragEnter,
    DragLeave,
    Shutdown,
}

fn worker_loop(
    mut controller: GenerationController,
    command_rx: mpsc::Receiver<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
) {
    while let Ok(message) = command_rx.recv() {
        match message {
            WorkerMessage::Submit { job_id, submission } => {
                debug!(form = %controller.form(), job_id, "form worker picked up submission");
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| controller.submit(submission)))
                        .unwrap_or_else(|_| {
                            error!(form = %controller.form(), job_id, "submission panicked");
                            controller.recover_from(GenerationError::internal(
                                "the submission stopped unexpectedly",
                            ))
                        });

                let mut shared = shared.lock().expect("form worker state lock poisoned");
                shared.active_job = None;
                shared
                    .updates
                    .push_back(FormUpdate::finished(job_id, outcome));
            }
            WorkerMessage::Intake(command) => {
                let outcome = match command {
                    IntakeCommand::ChooseFile(file) => controller.choose_file(file),
                    IntakeCommand::ChoosePath(path) => controller.choose_path(&path),
                    IntakeCommand::DropFiles(files) => controller.drop_files(files),
                    IntakeCommand::DropPaths(paths) => controller.drop_paths(&paths),
                };
                let selection_label = controller.intake().and_then(|intake| intake.selection_label());

                shared
                    .lock()
                    .expect("form worker state lock poisoned")
                    .updates
                    .push_back(FormUpdate::Intake {
                        outcome,
                        selection_label,
                    });
            }
            WorkerMessage::DragEnter => controller.drag_enter(),
            WorkerMessage::DragLeave => controller.drag_leave(),
            WorkerMessage::Shutdown => break,
        }
    }
}
