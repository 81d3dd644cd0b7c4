use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use synthgen::app::{
    ArtifactDelivery, ArtifactSink, ArtifactTargets, FormSubmission, FormUpdate, FormWorker,
    GenerationController, IntakeOutcome, PresentationSurfaces, ReportViewer, SubmissionOutcome,
};
use synthgen::domain::{
    Artifact, FormId, GenerationError, GenerationMode, GenerationRequest, SelectedFile,
    SubmissionState,
};
use synthgen::infra::backend::GenerationBackend;

const WAIT_LIMIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Gate {
    in_flight: usize,
    open: bool,
}

/// Holds every dispatch until the test opens the gate.
#[derive(Default)]
struct GatedBackend {
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl GatedBackend {
    fn wait_for_in_flight(&self, expected: usize) -> bool {
        let deadline = Instant::now() + WAIT_LIMIT;
        let mut gate = self.gate.lock().expect("gate mutex poisoned");
        while gate.in_flight < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            gate = self
                .changed
                .wait_timeout(gate, remaining)
                .expect("gate mutex poisoned")
                .0;
        }
        true
    }

    fn open(&self) {
        self.gate.lock().expect("gate mutex poisoned").open = true;
        self.changed.notify_all();
    }
}

impl GenerationBackend for GatedBackend {
    fn backend_id(&self) -> &str {
        "gated"
    }

    fn dispatch(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError> {
        let mut gate = self.gate.lock().expect("gate mutex poisoned");
        gate.in_flight += 1;
        self.changed.notify_all();
        while !gate.open {
            gate = self.changed.wait(gate).expect("gate mutex poisoned");
        }
        gate.in_flight -= 1;

        match request.mode() {
            GenerationMode::Schema => Err(GenerationError::Service {
                status: 422,
                message: Some("Schema field 'email' has unknown type".to_string()),
            }),
            _ => Ok(Artifact::new(b"id\n1\n".to_vec(), Some("text/csv".to_string()))),
        }
    }
}

#[derive(Default)]
struct MemoryTargets {
    saved: Mutex<Vec<String>>,
}

impl ArtifactSink for MemoryTargets {
    fn save(&self, _artifact: &Artifact, file_name: &str) -> Result<ArtifactDelivery, GenerationError> {
        self.saved
            .lock()
            .expect("targets mutex poisoned")
            .push(file_name.to_string());
        Ok(ArtifactDelivery {
            file_name: file_name.to_string(),
            path: format!("/downloads/{file_name}").into(),
            opened_in_viewer: false,
        })
    }
}

impl ReportViewer for MemoryTargets {
    fn open(&self, _artifact: &Artifact, file_name: &str) -> Result<ArtifactDelivery, GenerationError> {
        Ok(ArtifactDelivery {
            file_name: file_name.to_string(),
            path: format!("/reports/{file_name}").into(),
            opened_in_viewer: true,
        })
    }
}

fn spawn_worker(
    mode: GenerationMode,
    surfaces: &PresentationSurfaces,
    backend: Arc<dyn GenerationBackend>,
    targets: Arc<MemoryTargets>,
) -> FormWorker {
    let controller = GenerationController::new(
        mode,
        FormId::new(format!("{mode}-alert")),
        surfaces.clone(),
        backend,
        ArtifactTargets {
            downloads: targets.clone(),
            viewer: targets,
        },
    );
    FormWorker::spawn(controller).expect("form worker should start")
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_LIMIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn finished_outcome(updates: &[FormUpdate], expected_job: u64) -> Option<SubmissionOutcome> {
    updates.iter().find_map(|update| match update {
        FormUpdate::Submission {
            job_id,
            outcome: Some(outcome),
            ..
        } if *job_id == expected_job => Some(outcome.clone()),
        _ => None,
    })
}

fn prompt_submission() -> FormSubmission {
    FormSubmission::Prompt {
        prompt: "support tickets".to_string(),
        rows: "40".to_string(),
        format: "csv".to_string(),
    }
}

fn schema_submission() -> FormSubmission {
    FormSubmission::Schema {
        schema_text: r#"{"email": "email"}"#.to_string(),
        rows: "40".to_string(),
        format: "csv".to_string(),
    }
}

#[test]
fn separate_forms_run_in_flight_at_the_same_time() {
    let surfaces = PresentationSurfaces::new();
    let backend = Arc::new(GatedBackend::default());
    let targets = Arc::new(MemoryTargets::default());
    let prompt = spawn_worker(GenerationMode::Prompt, &surfaces, backend.clone(), targets.clone());
    let schema = spawn_worker(GenerationMode::Schema, &surfaces, backend.clone(), targets.clone());

    let prompt_job = prompt.submit(prompt_submission()).expect("prompt should queue");
    let schema_job = schema.submit(schema_submission()).expect("schema should queue");

    let both_in_flight = backend.wait_for_in_flight(2);
    if !both_in_flight {
        backend.open();
    }
    assert!(
        both_in_flight,
        "both forms should reach the backend before either finishes"
    );
    assert!(surfaces.busy.is_busy(prompt.form()));
    assert!(surfaces.busy.is_busy(schema.form()));
    assert_eq!(
        surfaces
            .busy
            .state(prompt.form())
            .map(|state| state.label),
        Some("Generating...".to_string())
    );
    assert_eq!(prompt.state(), SubmissionState::InFlight);

    backend.open();
    assert!(wait_until(|| !prompt.has_active_submission() && !schema.has_active_submission()));

    let prompt_updates = prompt.drain_updates();
    assert_eq!(
        prompt_updates.first(),
        Some(&FormUpdate::Submission {
            job_id: prompt_job,
            state: SubmissionState::InFlight,
            outcome: None,
        })
    );
    let prompt_outcome =
        finished_outcome(&prompt_updates, prompt_job).expect("prompt job should finish");
    assert!(prompt_outcome.is_success());

    let schema_outcome = finished_outcome(&schema.drain_updates(), schema_job)
        .expect("schema job should finish");
    assert_eq!(schema_outcome.terminal_state(), SubmissionState::Failed);

    // Each form reports on its own channel.
    assert_eq!(
        surfaces
            .notifications
            .latest(prompt.form())
            .map(|record| record.message),
        Some("✅ Successfully generated 40 rows!".to_string())
    );
    assert_eq!(
        surfaces
            .notifications
            .latest(schema.form())
            .map(|record| record.message),
        Some("❌ Error: Schema field 'email' has unknown type".to_string())
    );
    assert!(!surfaces.busy.is_busy(prompt.form()));
    assert!(!surfaces.busy.is_busy(schema.form()));
    assert_eq!(
        *targets.saved.lock().expect("targets mutex poisoned"),
        vec!["synthetic_data.csv".to_string()]
    );
}

#[test]
fn form_refuses_second_submission_while_first_is_unfinished() {
    let surfaces = PresentationSurfaces::new();
    let backend = Arc::new(GatedBackend::default());
    let prompt = spawn_worker(
        GenerationMode::Prompt,
        &surfaces,
        backend.clone(),
        Arc::new(MemoryTargets::default()),
    );

    prompt.submit(prompt_submission()).expect("first submission should queue");
    let reached_backend = backend.wait_for_in_flight(1);
    if !reached_backend {
        backend.open();
    }
    assert!(reached_backend);

    assert_eq!(
        prompt.submit(prompt_submission()),
        Err(GenerationError::SubmissionBusy)
    );

    backend.open();
    assert!(wait_until(|| !prompt.has_active_submission()));
    assert!(prompt.submit(prompt_submission()).is_ok());
    assert!(wait_until(|| !prompt.has_active_submission()));
}

#[test]
fn worker_reports_intake_results_with_selection_label() {
    let surfaces = PresentationSurfaces::new();
    let eda = spawn_worker(
        GenerationMode::Eda,
        &surfaces,
        Arc::new(GatedBackend::default()),
        Arc::new(MemoryTargets::default()),
    );

    eda.choose_file(SelectedFile::from_bytes("sales.csv", b"a\n1\n".to_vec()))
        .expect("worker should accept intake");
    eda.drop_files(vec![SelectedFile::from_bytes("slides.pdf", b"%PDF".to_vec())])
        .expect("worker should accept intake");

    let mut updates = Vec::new();
    assert!(wait_until(|| {
        updates.extend(eda.drain_updates());
        updates.len() >= 2
    }));

    assert_eq!(
        updates[0],
        FormUpdate::Intake {
            outcome: IntakeOutcome::Accepted {
                name: "sales.csv".to_string(),
                replaced: false,
            },
            selection_label: Some("Selected: sales.csv".to_string()),
        }
    );
    assert_eq!(
        updates[1],
        FormUpdate::Intake {
            outcome: IntakeOutcome::Rejected {
                message: "Invalid file type. Please upload CSV or Excel files.".to_string(),
            },
            selection_label: Some("Selected: sales.csv".to_string()),
        }
    );
}

#[test]
fn rejected_submission_finishes_without_reaching_backend() {
    let surfaces = PresentationSurfaces::new();
    let backend = Arc::new(GatedBackend::default());
    let timeseries = spawn_worker(
        GenerationMode::TimeSeries,
        &surfaces,
        backend.clone(),
        Arc::new(MemoryTargets::default()),
    );

    let job = timeseries
        .submit(FormSubmission::TimeSeries {
            rows: "100".to_string(),
        })
        .expect("submission should queue");

    let mut updates = Vec::new();
    assert!(wait_until(|| {
        updates.extend(timeseries.drain_updates());
        finished_outcome(&updates, job).is_some()
    }));
    let outcome = finished_outcome(&updates, job).expect("job should finish");

    assert!(matches!(outcome, SubmissionOutcome::Rejected { .. }));
    assert_eq!(
        surfaces
            .notifications
            .latest(timeseries.form())
            .map(|record| record.message),
        Some("Please select a CSV file to upload".to_string())
    );
    assert_eq!(backend.gate.lock().expect("gate mutex poisoned").in_flight, 0);
}
