// ============================================================================
// ERRORS — failures surfaced by the pipeline engine and its GPU backend
// ============================================================================

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A pipeline identity that is not in the registry.  Identities come
    /// from a closed enumeration, so this is a programming error.
    #[error("unknown pipeline '{0}'")]
    UnknownPipeline(String),

    /// The backend rejected an effect's shader pair.
    #[error("shader for effect '{effect}' failed to compile: {message}")]
    ShaderCompile { effect: &'static str, message: String },

    /// No usable GPU adapter, not even the software fallback.
    #[error("no GPU adapter available")]
    NoGpu,

    #[error("frame readback failed: {0}")]
    Readback(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("export failed: {0}")]
    Export(String),
}
