//! Entity models
//!
//! Value shapes exchanged with the backend. Rust field names are English;
//! the wire names follow the backend's JSON.

mod attachment;
mod author;
mod book;

pub use attachment::{attachment_file_name, Attachment, PDF_CONTENT_TYPE};
pub use author::{Author, AuthorId};
pub use book::{Book, BookId};
