//! PDF attachments
//!
//! An attachment is not an entity: the backend stores it next to the book
//! and exposes it by file name.

use std::fmt;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file picked by the user, or downloaded from the files endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Shorthand for a PDF file
    pub fn pdf(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(file_name, PDF_CONTENT_TYPE, bytes)
    }

    pub fn is_pdf(&self) -> bool {
        self.has_content_type(PDF_CONTENT_TYPE)
    }

    /// Compare the MIME essence, ignoring parameters and case
    pub fn has_content_type(&self, expected: &str) -> bool {
        self.content_type
            .split(';')
            .next()
            .map(|mime| mime.trim().eq_ignore_ascii_case(expected.trim()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Keep file contents out of logs.
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Last path segment of a stored attachment path
pub fn attachment_file_name(pdf_path: &str) -> &str {
    pdf_path.rsplit('/').next().unwrap_or(pdf_path)
}
