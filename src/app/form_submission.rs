use crate::domain::{
    GenerationError, GenerationMode, GenerationPayload, GenerationRequest, OutputFormat, RowCount,
    SelectedFile,
};

pub const INVALID_SCHEMA_MESSAGE: &str = "Invalid JSON format. Please check your schema.";

/// Raw field values of one form at the moment the user submits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Prompt {
        prompt: String,
        rows: String,
        format: String,
    },
    File {
        rows: String,
        format: String,
        preserve_stats: bool,
    },
    Schema {
        schema_text: String,
        rows: String,
        format: String,
    },
    TimeSeries {
        rows: String,
    },
    Eda,
}

impl FormSubmission {
    pub fn mode(&self) -> GenerationMode {
        match self {
            Self::Prompt { .. } => GenerationMode::Prompt,
            Self::File { .. } => GenerationMode::File,
            Self::Schema { .. } => GenerationMode::Schema,
            Self::TimeSeries { .. } => GenerationMode::TimeSeries,
            Self::Eda => GenerationMode::Eda,
        }
    }
}

/// Runs the form checks in order (required input, row count, schema parse) and
/// stops at the first failure.
pub fn build_generation_request(
    submission: FormSubmission,
    selected: Option<&SelectedFile>,
) -> Result<GenerationRequest, GenerationError> {
    let mode = submission.mode();
    let payload = match submission {
        FormSubmission::Prompt {
            prompt,
            rows,
            format,
        } => {
            let prompt = require_text(&prompt, mode)?;
            let rows = RowCount::parse(&rows)?;
            GenerationPayload::Prompt {
                prompt,
                rows,
                format: OutputFormat::new(format)?,
            }
        }
        FormSubmission::File {
            rows,
            format,
            preserve_stats,
        } => {
            let file = require_file(selected, mode)?;
            let rows = RowCount::parse(&rows)?;
            GenerationPayload::File {
                file,
                rows,
                format: OutputFormat::new(format)?,
                preserve_stats,
            }
        }
        FormSubmission::Schema {
            schema_text,
            rows,
            format,
        } => {
            let schema_text = require_text(&schema_text, mode)?;
            let rows = RowCount::parse(&rows)?;
            let schema = parse_schema_text(&schema_text)?;
            GenerationPayload::Schema {
                schema,
                rows,
                format: OutputFormat::new(format)?,
            }
        }
        FormSubmission::TimeSeries { rows } => {
            let file = require_file(selected, mode)?;
            let rows = RowCount::parse(&rows)?;
            GenerationPayload::TimeSeries { file, rows }
        }
        FormSubmission::Eda => GenerationPayload::Eda {
            file: require_file(selected, mode)?,
        },
    };
    Ok(GenerationRequest::new(payload))
}

pub fn parse_schema_text(schema_text: &str) -> Result<serde_json::Value, GenerationError> {
    serde_json::from_str(schema_text)
        .map_err(|_| GenerationError::validation(INVALID_SCHEMA_MESSAGE))
}

fn require_text(text: &str, mode: GenerationMode) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::validation(mode.missing_input_message()));
    }
    Ok(trimmed.to_string())
}

fn require_file(
    selected: Option<&SelectedFile>,
    mode: GenerationMode,
) -> Result<SelectedFile, GenerationError> {
    selected
        .cloned()
        .ok_or_else(|| GenerationError::validation(mode.missing_input_message()))
}
