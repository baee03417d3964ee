use flowcanvas::Document;
use std::path::Path;

/// Suggested file name for exports.
pub const EXPORT_FILE_NAME: &str = "flowdo-data.json";

/// Top-level keys an imported file must carry.
pub const REQUIRED_KEYS: [&str; 4] = ["nodes", "edges", "groups", "viewport"];

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON file. Please ensure it is a valid flow file.")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid flow file format. Missing required properties.")]
    MissingProperties,
    #[error("Invalid flow file format: {0}")]
    Invalid(#[source] serde_json::Error),
}

// ------------------------------------------------------------------
// Conversion
// ------------------------------------------------------------------

pub fn to_json(document: &Document) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(document).map_err(DocumentError::Invalid)
}

/// Parse an exported document. The key check runs before typed decoding
/// so a file missing a section gets the dedicated message.
pub fn from_json(text: &str) -> Result<Document, DocumentError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(DocumentError::Parse)?;
    let complete = value.as_object().is_some_and(|object| {
        REQUIRED_KEYS
            .iter()
            .all(|key| object.get(*key).is_some_and(|v| !v.is_null()))
    });
    if !complete {
        return Err(DocumentError::MissingProperties);
    }
    serde_json::from_value(value).map_err(DocumentError::Invalid)
}

// ------------------------------------------------------------------
// Files
// ------------------------------------------------------------------

pub fn save_to_file(
    document: &Document,
    path: &Path,
) -> Result<(), DocumentError> {
    let json = to_json(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Document, DocumentError> {
    let text = std::fs::read_to_string(path)?;
    from_json(&text)
}
