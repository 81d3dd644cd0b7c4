use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GenerationError, SelectedFile};

pub const ROW_COUNT_MIN: u32 = 1;
pub const ROW_COUNT_MAX: u32 = 100_000;
pub const ROW_COUNT_RANGE_MESSAGE: &str = "Number of rows must be between 1 and 100,000";

const TABULAR_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];
const TIME_SERIES_EXTENSIONS: &[&str] = &["csv"];
const TIME_SERIES_ARTIFACT_NAME: &str = "synthetic_timeseries_data.csv";
const EDA_REPORT_ARTIFACT_NAME: &str = "eda_report.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Prompt,
    File,
    Schema,
    TimeSeries,
    Eda,
}

impl GenerationMode {
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Prompt => "/api/generate/prompt",
            Self::File => "/api/generate/file",
            Self::Schema => "/api/generate/schema",
            Self::TimeSeries => "/api/generate/timeseries",
            Self::Eda => "/api/eda/report",
        }
    }

    pub fn requires_file(self) -> bool {
        matches!(self, Self::File | Self::TimeSeries | Self::Eda)
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::TimeSeries => TIME_SERIES_EXTENSIONS,
            Self::Prompt | Self::File | Self::Schema | Self::Eda => TABULAR_EXTENSIONS,
        }
    }

    pub fn invalid_file_type_message(self) -> &'static str {
        match self {
            Self::TimeSeries => "Invalid file type. Please upload a CSV file.",
            Self::Prompt | Self::File | Self::Schema | Self::Eda => {
                "Invalid file type. Please upload CSV or Excel files."
            }
        }
    }

    pub fn missing_input_message(self) -> &'static str {
        match self {
            Self::Prompt => "Please enter a data description",
            Self::File => "Please select a file to upload",
            Self::Schema => "Please enter a JSON schema",
            Self::TimeSeries => "Please select a CSV file to upload",
            Self::Eda => "Please select a file for the EDA report",
        }
    }

    pub fn fallback_failure_message(self) -> &'static str {
        match self {
            Self::Eda => "EDA report generation failed",
            Self::Prompt | Self::File | Self::Schema | Self::TimeSeries => "Generation failed",
        }
    }

    pub fn resting_label(self) -> &'static str {
        match self {
            Self::Eda => "Generate EDA Report",
            Self::Prompt | Self::File | Self::Schema | Self::TimeSeries => "Generate Data",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Self::Eda => "Generating EDA...",
            Self::Prompt | Self::File | Self::Schema | Self::TimeSeries => "Generating...",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::File => "file",
            Self::Schema => "schema",
            Self::TimeSeries => "timeseries",
            Self::Eda => "eda",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RowCount(u32);

impl RowCount {
    pub fn new(value: i64) -> Result<Self, GenerationError> {
        u32::try_from(value)
            .ok()
            .filter(|rows| (ROW_COUNT_MIN..=ROW_COUNT_MAX).contains(rows))
            .map(Self)
            .ok_or_else(|| GenerationError::validation(ROW_COUNT_RANGE_MESSAGE))
    }

    /// Parses the raw text of a row-count field. Non-integer input fails the range check.
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| GenerationError::validation(ROW_COUNT_RANGE_MESSAGE))?;
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OutputFormat(String);

impl OutputFormat {
    pub fn new(value: impl Into<String>) -> Result<Self, GenerationError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(GenerationError::validation("output format must not be empty"));
        }
        Ok(Self(value))
    }

    pub fn csv() -> Self {
        Self("csv".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPayload {
    Prompt {
        prompt: String,
        rows: RowCount,
        format: OutputFormat,
    },
    File {
        file: SelectedFile,
        rows: RowCount,
        format: OutputFormat,
        preserve_stats: bool,
    },
    Schema {
        schema: serde_json::Value,
        rows: RowCount,
        format: OutputFormat,
    },
    TimeSeries {
        file: SelectedFile,
        rows: RowCount,
    },
    Eda {
        file: SelectedFile,
    },
}

/// A fully validated request, ready to be dispatched to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub payload: GenerationPayload,
}

impl GenerationRequest {
    pub fn new(payload: GenerationPayload) -> Self {
        Self { payload }
    }

    pub fn mode(&self) -> GenerationMode {
        match &self.payload {
            GenerationPayload::Prompt { .. } => GenerationMode::Prompt,
            GenerationPayload::File { .. } => GenerationMode::File,
            GenerationPayload::Schema { .. } => GenerationMode::Schema,
            GenerationPayload::TimeSeries { .. } => GenerationMode::TimeSeries,
            GenerationPayload::Eda { .. } => GenerationMode::Eda,
        }
    }

    pub fn row_count(&self) -> Option<RowCount> {
        match &self.payload {
            GenerationPayload::Prompt { rows, .. }
            | GenerationPayload::File { rows, .. }
            | GenerationPayload::Schema { rows, .. }
            | GenerationPayload::TimeSeries { rows, .. } => Some(*rows),
            GenerationPayload::Eda { .. } => None,
        }
    }

    pub fn output_format(&self) -> Option<&OutputFormat> {
        match &self.payload {
            GenerationPayload::Prompt { format, .. }
            | GenerationPayload::File { format, .. }
            | GenerationPayload::Schema { format, .. } => Some(format),
            GenerationPayload::TimeSeries { .. } | GenerationPayload::Eda { .. } => None,
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        match &self.payload {
            GenerationPayload::File { file, .. }
            | GenerationPayload::TimeSeries { file, .. }
            | GenerationPayload::Eda { file } => Some(file),
            GenerationPayload::Prompt { .. } | GenerationPayload::Schema { .. } => None,
        }
    }

    /// Name under which the resulting artifact is saved or opened.
    pub fn artifact_file_name(&self) -> String {
        match &self.payload {
            GenerationPayload::Prompt { format, .. }
            | GenerationPayload::File { format, .. }
            | GenerationPayload::Schema { format, .. } => format!("synthetic_data.{format}"),
            GenerationPayload::TimeSeries { .. } => TIME_SERIES_ARTIFACT_NAME.to_string(),
            GenerationPayload::Eda { file } => file
                .stem()
                .map(|stem| format!("eda_{stem}.html"))
                .unwrap_or_else(|| EDA_REPORT_ARTIFACT_NAME.to_string()),
        }
    }

    pub fn success_message(&self) -> String {
        match &self.payload {
            GenerationPayload::Prompt { rows, .. }
            | GenerationPayload::File { rows, .. }
            | GenerationPayload::Schema { rows, .. } => {
                format!("✅ Successfully generated {rows} rows!")
            }
            GenerationPayload::TimeSeries { rows, .. } => {
                format!("✅ Successfully generated {rows} synthetic time series rows!")
            }
            GenerationPayload::Eda { .. } => {
                "✅ EDA report generated. Opened in the report viewer.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

/// Binary body of a successful backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

impl Artifact {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
