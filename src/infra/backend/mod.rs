mod http_backend;
mod provider;
mod response_parsing;

pub use http_backend::{HealthStatus, HttpGenerationBackend};
pub use provider::GenerationBackend;
