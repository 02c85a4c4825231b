use bytes::Bytes;

/// Extensions accepted at enqueue time.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac"];

/// MIME type inferred from a filename extension, defaulting to audio/mpeg.
pub fn mime_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}

/// Immutable audio payload attached to a task at creation or upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub data: Bytes,
    pub filename: String,
}

impl AudioFile {
    pub fn new(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn has_supported_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }
}
