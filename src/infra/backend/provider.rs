use crate::domain::{Artifact, GenerationError, GenerationRequest};

pub trait GenerationBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    fn dispatch(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError>;
}
