use std::path::PathBuf;

use crate::domain::GenerationError;

pub const ENV_BASE_URL: &str = "SYNTHGEN_BASE_URL";
pub const ENV_DOWNLOAD_DIR: &str = "SYNTHGEN_DOWNLOAD_DIR";
pub const ENV_REPORT_DIR: &str = "SYNTHGEN_REPORT_DIR";
pub const ENV_DEBUG_PROMPT_LOG: &str = "SYNTHGEN_DEBUG_PROMPT_LOG";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REPORT_SUBDIR: &str = "synthgen-reports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub download_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_lookup(read_env_var)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerationError>
    where
        F: Fn(&str) -> Result<Option<String>, GenerationError>,
    {
        let base_url = match lookup(ENV_BASE_URL)? {
            Some(value) if value.trim().is_empty() => {
                return Err(GenerationError::validation(format!(
                    "{ENV_BASE_URL} must not be empty"
                )));
            }
            Some(value) => value.trim().to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };
        let download_dir = non_blank_path(lookup(ENV_DOWNLOAD_DIR)?)
            .unwrap_or_else(default_download_dir);
        let report_dir = non_blank_path(lookup(ENV_REPORT_DIR)?)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_REPORT_SUBDIR));

        Ok(Self {
            base_url,
            download_dir,
            report_dir,
        })
    }
}

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, GenerationError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(GenerationError::validation(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub fn debug_prompt_log_enabled() -> bool {
    std::env::var(ENV_DEBUG_PROMPT_LOG)
        .ok()
        .as_deref()
        .is_some_and(parse_truthy_flag)
}

pub fn parse_truthy_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("1")
        || raw.eq_ignore_ascii_case("true")
        || raw.eq_ignore_ascii_case("yes")
        || raw.eq_ignore_ascii_case("on")
}

fn non_blank_path(value: Option<String>) -> Option<PathBuf> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| PathBuf::from(value.trim()))
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
