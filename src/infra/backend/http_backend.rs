use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{
    Artifact, GenerationError, GenerationPayload, GenerationRequest, SelectedFile,
};
use crate::infra::config::ClientConfig;

use super::GenerationBackend;
use super::response_parsing::{extract_error_message, truncate_message};

const BACKEND_ID: &str = "synthgen-http";
const HEALTH_PATH: &str = "/api/health";

pub struct HttpGenerationBackend {
    base_url: String,
    client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HttpGenerationBackend {
    pub fn from_config(config: &ClientConfig) -> Result<Self, GenerationError> {
        Self::new(config.base_url.clone())
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, GenerationError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(GenerationError::validation(
                "backend base URL must not be empty",
            ));
        }

        // Requests resolve only when the backend answers; the client enforces no deadline.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| {
                GenerationError::internal(format!("failed to create backend HTTP client: {err}"))
            })?;

        Ok(Self {
            base_url: base_url.trim().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub fn health(&self) -> Result<HealthStatus, GenerationError> {
        let response = self
            .client
            .get(self.endpoint_url(HEALTH_PATH))
            .send()
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.text().map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|err| {
            GenerationError::response_parse(format!("health response decode failed: {err}"))
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> Result<RequestBuilder, GenerationError> {
        let url = self.endpoint_url(request.mode().endpoint_path());
        let builder = self.client.post(url);

        let builder = match &request.payload {
            GenerationPayload::Prompt {
                prompt,
                rows,
                format,
            } => builder.json(&PromptRequestBody {
                prompt,
                rows: rows.get(),
                format: format.as_str(),
            }),
            GenerationPayload::Schema {
                schema,
                rows,
                format,
            } => builder.json(&SchemaRequestBody {
                schema,
                rows: rows.get(),
                format: format.as_str(),
            }),
            GenerationPayload::File {
                file,
                rows,
                format,
                preserve_stats,
            } => builder.multipart(
                Form::new()
                    .part("file", file_part(file)?)
                    .text("rows", rows.to_string())
                    .text("format", format.to_string())
                    .text("preserve_stats", preserve_stats.to_string()),
            ),
            GenerationPayload::TimeSeries { file, rows } => builder.multipart(
                Form::new()
                    .part("file", file_part(file)?)
                    .text("rows", rows.to_string()),
            ),
            GenerationPayload::Eda { file } => {
                builder.multipart(Form::new().part("file", file_part(file)?))
            }
        };
        Ok(builder)
    }
}

impl GenerationBackend for HttpGenerationBackend {
    fn backend_id(&self) -> &str {
        BACKEND_ID
    }

    fn dispatch(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError> {
        let builder = self.build_request(request)?;
        let started = Instant::now();
        info!(mode = %request.mode(), endpoint = request.mode().endpoint_path(), "dispatching generation request");

        let response = builder.send().map_err(map_transport_error)?;
        let status = response.status();
        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() {
            let body = match response.text() {
                Ok(body) => body,
                Err(err) => {
                    debug!(%status, "failure body could not be read: {err}");
                    String::new()
                }
            };
            return Err(map_http_error(status, &body));
        }

        let bytes = response.bytes().map_err(|err| {
            GenerationError::response_parse(format!(
                "artifact body could not be read: {}",
                truncate_message(&err.to_string())
            ))
        })?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(mode = %request.mode(), bytes = bytes.len(), elapsed_ms, "generation request succeeded");

        Ok(Artifact::new(bytes.to_vec(), media_type))
    }
}

#[derive(Debug, Serialize)]
struct PromptRequestBody<'a> {
    prompt: &'a str,
    rows: u32,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct SchemaRequestBody<'a> {
    schema: &'a serde_json::Value,
    rows: u32,
    format: &'a str,
}

fn file_part(file: &SelectedFile) -> Result<Part, GenerationError> {
    Part::bytes(file.content().to_vec())
        .file_name(file.name().to_string())
        .mime_str(file.media_type())
        .map_err(|err| {
            GenerationError::validation(format!(
                "{} has an invalid media type '{}': {err}",
                file.name(),
                file.media_type()
            ))
        })
}

fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    GenerationError::Service {
        status: status.as_u16(),
        message: extract_error_message(body),
    }
}

fn map_transport_error(error: reqwest::Error) -> GenerationError {
    GenerationError::transport(truncate_message(&error.to_string()))
}
