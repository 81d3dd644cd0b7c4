mod artifact_delivery;
mod busy_state;
mod controller;
mod file_intake;
mod form_submission;
mod form_worker;
mod notification_channel;

pub use artifact_delivery::{
    ArtifactDelivery, ArtifactSink, DownloadDirectorySink, ReportViewer, sanitize_file_name,
};
pub use busy_state::{BusyGuard, BusyState, BusyStateBoard};
pub use controller::{ArtifactTargets, GenerationController, PresentationSurfaces, SubmissionOutcome};
pub use file_intake::{FileIntake, IntakeGesture, IntakeOutcome};
pub use form_submission::{
    FormSubmission, INVALID_SCHEMA_MESSAGE, build_generation_request, parse_schema_text,
};
pub use form_worker::{FormUpdate, FormWorker};
pub use notification_channel::NotificationCenter;
