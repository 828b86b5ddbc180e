use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::excel_validator::ValidatorError;

/// Declared content types accepted for upload
pub const ACCEPTED_CONTENT_TYPES: [&str; 4] = [
    "application/vnd.ms-excel",
    "text/xls",
    "text/xlsx",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// An uploaded file as handed over by the caller: original file name,
/// declared media type, and the raw bytes
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        IncomingFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

/// A staged upload persisted to a temporary path for the duration of one
/// validation run
///
/// The backing file is removed when the value is dropped, so release is
/// guaranteed on every exit path of the pipeline, including errors
/// propagated with `?`.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Persist an upload to a temporary file after checking its declared type
///
/// Rejects anything outside [`ACCEPTED_CONTENT_TYPES`] before touching the
/// filesystem; staging I/O failures surface as [`ValidatorError::Upload`].
pub fn stage(upload: &IncomingFile) -> Result<StagedFile, ValidatorError> {
    if !ACCEPTED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
        return Err(ValidatorError::InvalidFileType);
    }

    let extension = Path::new(&upload.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("xlsx");

    let mut file = tempfile::Builder::new()
        .prefix("temp-excel-file-")
        .suffix(&format!(".{}", extension))
        .tempfile()?;

    file.write_all(&upload.bytes)?;
    file.flush()?;

    Ok(StagedFile { file })
}
