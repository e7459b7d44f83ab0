use serde::{Deserialize, Serialize};

/// Identifier of a file accepted by the file import endpoint. Only used to reference the upload
/// from a follow-up Storage API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFileResult {
    pub id: u64,
}
