//! Serializable snapshot of the editor state.
//!
//! Persistence itself is an external collaborator; this module only defines
//! the versioned JSON envelope a storage backend reads and writes.

use crate::editor::EditorState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    editor: EditorState,
}

/// Encode a state snapshot as JSON.
pub fn encode(state: &EditorState) -> Result<String, SnapshotError> {
    let envelope = Envelope {
        version: SNAPSHOT_VERSION,
        editor: state.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decode a JSON snapshot back into an editor state.
pub fn decode(json: &str) -> Result<EditorState, SnapshotError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.editor)
}
