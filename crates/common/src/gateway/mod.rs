//! Remote gateway abstraction
//!
//! One async operation per REST verb against the books/authors resources.
//! Every call is at-most-once: no retries, no timeouts, no caching and no
//! request de-duplication. Callers own idempotency when a user re-submits.
//!
//! Implementations:
//! - [`HttpGateway`]: reqwest client against the REST backend
//! - [`InMemoryGateway`]: in-process store with a call journal, for tests

mod http;
mod memory;

pub use http::HttpGateway;
pub use memory::{Call, InMemoryGateway};

use crate::errors::Result;
use crate::models::{Attachment, Author, AuthorId, Book, BookId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for the remote books/authors store
#[async_trait]
pub trait LibraryGateway: Send + Sync {
    /// GET /books
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// GET /books/{id}
    async fn get_book(&self, id: BookId) -> Result<Book>;

    /// POST /books; the answer carries the assigned id
    async fn create_book(&self, book: &Book) -> Result<Book>;

    /// PUT /books/{id}
    async fn update_book(&self, id: BookId, book: &Book) -> Result<Book>;

    /// DELETE /books/{id}
    async fn delete_book(&self, id: BookId) -> Result<()>;

    /// POST /books/{id}/upload-pdf (multipart field `file`).
    ///
    /// Only valid once the book exists. Returns the updated book when the
    /// backend answers with one.
    async fn upload_attachment(&self, id: BookId, attachment: &Attachment) -> Result<Option<Book>>;

    /// GET /books/files/{filename}
    async fn fetch_attachment(&self, file_name: &str) -> Result<Attachment>;

    /// GET /authors
    async fn list_authors(&self) -> Result<Vec<Author>>;

    /// GET /authors/{id}
    async fn get_author(&self, id: AuthorId) -> Result<Author>;

    /// POST /authors
    async fn create_author(&self, author: &Author) -> Result<Author>;

    /// PUT /authors/{id}
    async fn update_author(&self, id: AuthorId, author: &Author) -> Result<Author>;

    /// DELETE /authors/{id}
    async fn delete_author(&self, id: AuthorId) -> Result<()>;

    /// View/download URL for a stored attachment path
    fn attachment_url(&self, pdf_path: &str) -> String;
}

/// Gateway operations, used to label errors, logs and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListBooks,
    GetBook,
    CreateBook,
    UpdateBook,
    DeleteBook,
    UploadAttachment,
    FetchAttachment,
    ListAuthors,
    GetAuthor,
    CreateAuthor,
    UpdateAuthor,
    DeleteAuthor,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListBooks => "list_books",
            Operation::GetBook => "get_book",
            Operation::CreateBook => "create_book",
            Operation::UpdateBook => "update_book",
            Operation::DeleteBook => "delete_book",
            Operation::UploadAttachment => "upload_attachment",
            Operation::FetchAttachment => "fetch_attachment",
            Operation::ListAuthors => "list_authors",
            Operation::GetAuthor => "get_author",
            Operation::CreateAuthor => "create_author",
            Operation::UpdateAuthor => "update_author",
            Operation::DeleteAuthor => "delete_author",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
