//! Errors from the FBX SDK bridge.

use thiserror::Error;

/// Document-level failures. Any of these aborts the load before the scene
/// is walked.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("FBX file not found: {0}")]
    FileNotFound(String),

    #[error("Path contains invalid UTF-8 or an interior NUL")]
    InvalidPath,

    #[error("Failed to create FBX manager")]
    ManagerCreation,

    #[error("Failed to create FBX importer")]
    ImporterCreation,

    #[error("Failed to create FBX scene '{0}'")]
    SceneCreation(String),

    #[error("Failed to initialize importer: {0}")]
    Initialize(String),

    #[error("Failed to import scene: {0}")]
    Import(String),

    #[error("fbxflat_core was built without the `fbx-sdk` feature")]
    Unavailable,
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Importer status text, with a fallback for SDKs that report failure
/// without a message.
#[cfg_attr(not(feature = "fbx-sdk"), allow(dead_code))]
pub(crate) fn status_message(message: String) -> String {
    if message.trim().is_empty() {
        "unknown importer error".to_string()
    } else {
        message
    }
}
