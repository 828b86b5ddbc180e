use excel_validator::IncomingFile;

// Re-export shared test utilities from src/test_utils.rs
// Not every test binary uses both helpers
#[allow(unused_imports)]
pub use excel_validator::test_utils::{sheet, single_rule_spec};

/// Upload descriptor with an accepted Excel content type
#[allow(dead_code)]
pub fn xlsx_upload(bytes: &[u8]) -> IncomingFile {
    IncomingFile::new(
        "upload.xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        bytes.to_vec(),
    )
}

/// Upload descriptor with a content type outside the accepted set
#[allow(dead_code)]
pub fn pdf_upload(bytes: &[u8]) -> IncomingFile {
    IncomingFile::new("upload.pdf", "application/pdf", bytes.to_vec())
}
