mod errors;
mod generation_contract;
mod notification;
mod selected_file;

pub use errors::GenerationError;
pub use generation_contract::{
    Artifact, GenerationMode, GenerationPayload, GenerationRequest, OutputFormat,
    ROW_COUNT_MAX, ROW_COUNT_MIN, ROW_COUNT_RANGE_MESSAGE, RowCount, SubmissionState,
};
pub use notification::{FormId, NOTIFICATION_VISIBILITY, NotificationRecord, Severity};
pub use selected_file::{
    SelectedFile, display_file_name, has_allowed_extension, media_type_for_name,
};
