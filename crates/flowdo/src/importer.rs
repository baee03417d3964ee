use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flowcanvas::{Attachment, AttachmentKind};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("File processing error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
}

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

fn image_mime(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    })
}

/// Read a file from disk into an attachment.
pub fn import_file(path: &Path, id: String) -> Result<Attachment, ImportError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)?;
    attachment_from_bytes(&name, &bytes, id)
}

/// Text and markdown keep their content; images become data URLs. The
/// type is chosen by the extension of `name`.
pub fn attachment_from_bytes(
    name: &str,
    bytes: &[u8],
    id: String,
) -> Result<Attachment, ImportError> {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Attachment {
            id,
            name: name.to_string(),
            kind: AttachmentKind::File,
            data: String::from_utf8_lossy(bytes).into_owned(),
        });
    }
    if let Some(mime) = image_mime(&extension) {
        return Ok(Attachment {
            id,
            name: name.to_string(),
            kind: AttachmentKind::Image,
            data: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        });
    }
    Err(ImportError::Unsupported(name.to_string()))
}

/// Split a `data:` URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("notes.md")]
    #[case("READ.TXT")]
    fn test_text_is_kept_verbatim(#[case] name: &str) {
        let a = attachment_from_bytes(name, "# Inertia\nmass".as_bytes(), "a".into()).unwrap();
        assert_eq!(a.kind, AttachmentKind::File);
        assert_eq!(a.data, "# Inertia\nmass");
    }

    #[test]
    fn test_image_becomes_data_url() {
        let bytes = [0x89, b'P', b'N', b'G', 0, 1, 2];
        let a = attachment_from_bytes("diagram.png", &bytes, "img".into()).unwrap();
        assert_eq!(a.kind, AttachmentKind::Image);
        assert!(a.data.starts_with("data:image/png;base64,"));
        let (mime, decoded) = decode_data_url(&a.data).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
    }

    #[rstest]
    #[case("slides.pdf")]
    #[case("archive.zip")]
    #[case("no_extension")]
    fn test_other_types_are_unsupported(#[case] name: &str) {
        assert!(matches!(
            attachment_from_bytes(name, b"x", "a".into()),
            Err(ImportError::Unsupported(_))
        ));
    }

    #[test]
    fn test_import_reads_from_disk() {
        let path = std::env::temp_dir().join("flowdo_import_test.txt");
        std::fs::write(&path, "hello").unwrap();
        let a = import_file(&path, "f".into()).unwrap();
        assert_eq!(a.name, "flowdo_import_test.txt");
        assert_eq!(a.data, "hello");
        std::fs::remove_file(&path).ok();
        assert!(matches!(import_file(&path, "f".into()), Err(ImportError::Io(_))));
    }
}
