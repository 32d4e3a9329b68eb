//! In-memory gateway
//!
//! Behaves like the REST backend (id assignment, 404 on missing records,
//! `uploads/{file}` attachment paths) and journals every call, so view-models
//! can be tested for exactly which requests they issue and in what order.

use super::{LibraryGateway, Operation};
use crate::config::DEFAULT_BASE_URL;
use crate::errors::{AppError, Result};
use crate::models::{attachment_file_name, Attachment, Author, AuthorId, Book, BookId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// One journaled gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListBooks,
    GetBook(BookId),
    CreateBook { title: String },
    UpdateBook(BookId),
    DeleteBook(BookId),
    UploadAttachment(BookId),
    FetchAttachment(String),
    ListAuthors,
    GetAuthor(AuthorId),
    CreateAuthor { name: String },
    UpdateAuthor(AuthorId),
    DeleteAuthor(AuthorId),
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::ListBooks => Operation::ListBooks,
            Call::GetBook(_) => Operation::GetBook,
            Call::CreateBook { .. } => Operation::CreateBook,
            Call::UpdateBook(_) => Operation::UpdateBook,
            Call::DeleteBook(_) => Operation::DeleteBook,
            Call::UploadAttachment(_) => Operation::UploadAttachment,
            Call::FetchAttachment(_) => Operation::FetchAttachment,
            Call::ListAuthors => Operation::ListAuthors,
            Call::GetAuthor(_) => Operation::GetAuthor,
            Call::CreateAuthor { .. } => Operation::CreateAuthor,
            Call::UpdateAuthor(_) => Operation::UpdateAuthor,
            Call::DeleteAuthor(_) => Operation::DeleteAuthor,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Status(u16),
    Unreachable,
}

#[derive(Default)]
struct Store {
    books: BTreeMap<BookId, Book>,
    authors: BTreeMap<AuthorId, Author>,
    files: HashMap<String, Attachment>,
    last_book_id: BookId,
    last_author_id: AuthorId,
    calls: Vec<Call>,
    failures: HashMap<Operation, Injected>,
}

/// A failure armed for one operation, after `skip` successful calls
#[derive(Debug, Clone, Copy)]
struct Injected {
    skip: usize,
    failure: Failure,
}

impl Store {
    fn take_failure(&mut self, operation: Operation) -> Option<Failure> {
        let injected = self.failures.get_mut(&operation)?;
        if injected.skip > 0 {
            injected.skip -= 1;
            return None;
        }
        self.failures.remove(&operation).map(|injected| injected.failure)
    }

    fn insert_book(&mut self, mut book: Book) -> Book {
        let id = match book.id {
            Some(id) => id,
            None => self.last_book_id + 1,
        };
        self.last_book_id = self.last_book_id.max(id);
        book.id = Some(id);
        self.books.insert(id, book.clone());
        book
    }

    fn insert_author(&mut self, mut author: Author) -> Author {
        let id = match author.id {
            Some(id) => id,
            None => self.last_author_id + 1,
        };
        self.last_author_id = self.last_author_id.max(id);
        author.id = Some(id);
        self.authors.insert(id, author.clone());
        author
    }
}

/// In-process implementation of [`LibraryGateway`]
pub struct InMemoryGateway {
    store: Mutex<Store>,
    latency: Option<Duration>,
    base_url: String,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            latency: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Seed an author; an id is assigned when absent
    pub fn with_author(self, author: Author) -> Self {
        self.store().insert_author(author);
        self
    }

    /// Seed a book; an id is assigned when absent
    pub fn with_book(self, book: Book) -> Self {
        self.store().insert_book(book);
        self
    }

    /// Delay every call, to observe in-flight behaviour
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The next call of `operation` answers with `status`
    pub fn fail_next(&self, operation: Operation, status: u16) {
        self.fail_after(operation, 0, status);
    }

    /// Let `successes` calls of `operation` through, then answer the
    /// following one with `status`
    pub fn fail_after(&self, operation: Operation, successes: usize, status: u16) {
        self.arm(operation, successes, Failure::Status(status));
    }

    /// The next call of `operation` cannot reach the backend
    pub fn fail_next_unreachable(&self, operation: Operation) {
        self.arm(operation, 0, Failure::Unreachable);
    }

    fn arm(&self, operation: Operation, skip: usize, failure: Failure) {
        self.store()
            .failures
            .insert(operation, Injected { skip, failure });
    }

    /// Journal of calls received so far
    pub fn calls(&self) -> Vec<Call> {
        self.store().calls.clone()
    }

    /// Number of journaled calls for one operation
    pub fn count(&self, operation: Operation) -> usize {
        self.store()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.store().calls.clear();
    }

    /// Snapshot of the stored books
    pub fn books(&self) -> Vec<Book> {
        self.store().books.values().cloned().collect()
    }

    /// Snapshot of the stored authors
    pub fn authors(&self) -> Vec<Author> {
        self.store().authors.values().cloned().collect()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal the call, apply latency, then surface any injected failure
    async fn begin(&self, call: Call) -> Result<()> {
        let operation = call.operation();
        debug!(call = ?call, "In-memory gateway call");
        let failure = {
            let mut store = self.store();
            store.calls.push(call);
            store.take_failure(operation)
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match failure {
            None => Ok(()),
            Some(Failure::Status(status)) => Err(AppError::Remote { operation, status }),
            Some(Failure::Unreachable) => Err(AppError::Connection {
                operation,
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn not_found(operation: Operation) -> AppError {
    AppError::Remote {
        operation,
        status: 404,
    }
}

#[async_trait]
impl LibraryGateway for InMemoryGateway {
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.begin(Call::ListBooks).await?;
        Ok(self.books())
    }

    async fn get_book(&self, id: BookId) -> Result<Book> {
        self.begin(Call::GetBook(id)).await?;
        self.store()
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(Operation::GetBook))
    }

    async fn create_book(&self, book: &Book) -> Result<Book> {
        self.begin(Call::CreateBook {
            title: book.title.clone(),
        })
        .await?;

        let mut store = self.store();
        // Mirrors the backend: every referenced author must exist.
        if book.author_ids.iter().any(|id| !store.authors.contains_key(id)) {
            return Err(not_found(Operation::CreateBook));
        }
        let mut book = book.clone();
        book.id = None;
        book.pdf_path = None;
        Ok(store.insert_book(book))
    }

    async fn update_book(&self, id: BookId, book: &Book) -> Result<Book> {
        self.begin(Call::UpdateBook(id)).await?;

        let mut store = self.store();
        let pdf_path = match store.books.get(&id) {
            Some(existing) => existing.pdf_path.clone(),
            None => return Err(not_found(Operation::UpdateBook)),
        };
        // The backend silently drops unknown author ids on update.
        let author_ids = book
            .author_ids
            .iter()
            .copied()
            .filter(|author_id| store.authors.contains_key(author_id))
            .collect();
        let updated = Book {
            id: Some(id),
            author_ids,
            pdf_path,
            ..book.clone()
        };
        store.books.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        self.begin(Call::DeleteBook(id)).await?;
        self.store()
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(Operation::DeleteBook))
    }

    async fn upload_attachment(&self, id: BookId, attachment: &Attachment) -> Result<Option<Book>> {
        self.begin(Call::UploadAttachment(id)).await?;

        let mut store = self.store();
        let path = format!("uploads/{}", attachment.file_name);
        let book = match store.books.get_mut(&id) {
            Some(book) => {
                book.pdf_path = Some(path);
                book.clone()
            }
            None => return Err(not_found(Operation::UploadAttachment)),
        };
        store
            .files
            .insert(attachment.file_name.clone(), attachment.clone());
        Ok(Some(book))
    }

    async fn fetch_attachment(&self, file_name: &str) -> Result<Attachment> {
        self.begin(Call::FetchAttachment(file_name.to_string()))
            .await?;
        self.store()
            .files
            .get(file_name)
            .cloned()
            .ok_or_else(|| not_found(Operation::FetchAttachment))
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        self.begin(Call::ListAuthors).await?;
        Ok(self.authors())
    }

    async fn get_author(&self, id: AuthorId) -> Result<Author> {
        self.begin(Call::GetAuthor(id)).await?;
        self.store()
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(Operation::GetAuthor))
    }

    async fn create_author(&self, author: &Author) -> Result<Author> {
        self.begin(Call::CreateAuthor {
            name: author.name.clone(),
        })
        .await?;

        let mut author = author.clone();
        author.id = None;
        Ok(self.store().insert_author(author))
    }

    async fn update_author(&self, id: AuthorId, author: &Author) -> Result<Author> {
        self.begin(Call::UpdateAuthor(id)).await?;

        let mut store = self.store();
        if !store.authors.contains_key(&id) {
            return Err(not_found(Operation::UpdateAuthor));
        }
        let updated = Author {
            id: Some(id),
            ..author.clone()
        };
        store.authors.insert(id, updated.clone());
        Ok(updated)
    }

    /// Book references to the author are left in place, as dangling ids.
    async fn delete_author(&self, id: AuthorId) -> Result<()> {
        self.begin(Call::DeleteAuthor(id)).await?;
        self.store()
            .authors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(Operation::DeleteAuthor))
    }

    fn attachment_url(&self, pdf_path: &str) -> String {
        format!(
            "{}/books/files/{}",
            self.base_url,
            attachment_file_name(pdf_path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn book(title: &str, author_ids: Vec<AuthorId>) -> Book {
        Book {
            id: None,
            title: title.to_string(),
            author_ids,
            page_count: 100,
            available: true,
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            pdf_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let gateway = InMemoryGateway::new().with_author(Author::named("Ana Silva"));

        let first = gateway.create_book(&book("One", vec![1])).await.unwrap();
        let second = gateway.create_book(&book("Two", vec![1])).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(gateway.count(Operation::CreateBook), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_author() {
        let gateway = InMemoryGateway::new();
        let err = gateway.create_book(&book("One", vec![42])).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(gateway.books().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next(Operation::ListBooks, 503);

        let err = gateway.list_books().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        tokio_test::assert_ok!(gateway.list_books().await);
        assert_eq!(gateway.calls(), vec![Call::ListBooks, Call::ListBooks]);
    }

    #[tokio::test]
    async fn test_failure_after_successes() {
        let gateway = InMemoryGateway::new();
        gateway.fail_after(Operation::CreateAuthor, 1, 500);

        tokio_test::assert_ok!(gateway.create_author(&Author::named("Carla Dias")).await);
        let err = gateway.create_author(&Author::named("Davi Reis")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        tokio_test::assert_ok!(gateway.create_author(&Author::named("Davi Reis")).await);
        assert_eq!(gateway.authors().len(), 2);
        assert_eq!(gateway.count(Operation::CreateAuthor), 3);
    }

    #[tokio::test]
    async fn test_upload_sets_path_and_serves_file() {
        let gateway = InMemoryGateway::new()
            .with_author(Author::named("Ana Silva"))
            .with_book(book("Dune", vec![1]));

        let updated = gateway
            .upload_attachment(1, &Attachment::pdf("dune.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.pdf_path.as_deref(), Some("uploads/dune.pdf"));

        let file = gateway.fetch_attachment("dune.pdf").await.unwrap();
        assert_eq!(file.bytes, b"%PDF-1.4");
        assert_eq!(
            gateway.attachment_url("uploads/dune.pdf"),
            "http://localhost:8080/books/files/dune.pdf"
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway.delete_book(9).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.operation(), Some(Operation::DeleteBook));
    }

    #[tokio::test]
    async fn test_update_keeps_attachment_and_drops_unknown_authors() {
        let gateway = InMemoryGateway::new()
            .with_author(Author::named("Ana Silva"))
            .with_book(Book {
                pdf_path: Some("uploads/a.pdf".to_string()),
                ..book("A", vec![1])
            });

        let updated = gateway
            .update_book(1, &book("A2", vec![1, 77]))
            .await
            .unwrap();
        assert_eq!(updated.title, "A2");
        assert_eq!(updated.author_ids, vec![1]);
        assert_eq!(updated.pdf_path.as_deref(), Some("uploads/a.pdf"));
    }
}
