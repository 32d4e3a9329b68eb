use crate::authors::AuthorIndex;
use crate::delete::{self, Confirmed, DeleteOutcome, DeleteState, DeleteTarget, Resource};
use crate::mount::{Mount, MountHandle};
use crate::routes::Route;
use biblioteca_common::{Author, Book, BookId, LibraryGateway, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const BOOKS_FAILED: &str = "Could not load books.";
const AUTHORS_FAILED: &str = "Could not load authors.";

/// Catalog summary, recomputed from the collection on every call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub with_pdf: usize,
}

impl CatalogCounts {
    pub fn of(books: &[Book]) -> Self {
        books.iter().fold(Self::default(), |mut counts, book| {
            counts.total += 1;
            if book.available {
                counts.available += 1;
            } else {
                counts.unavailable += 1;
            }
            if book.has_attachment() {
                counts.with_pdf += 1;
            }
            counts
        })
    }
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRow {
    pub id: Option<BookId>,
    pub title: String,
    pub authors: String,
    pub page_count: u32,
    pub available: bool,
    pub publication_date: NaiveDate,
    pub attachment_url: Option<String>,
    pub detail: Option<Route>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BookListView {
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    pub loading: bool,
    pub books_error: Option<String>,
    pub authors_error: Option<String>,
    /// Banner for a failed delete
    pub error: Option<String>,
    pub delete: DeleteState,
}

impl BookListView {
    fn apply_load(&mut self, books: Result<Vec<Book>>, authors: Result<Vec<Author>>) {
        self.loading = false;
        match books {
            Ok(books) => {
                self.books = books;
                self.books_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load books");
                self.books_error = Some(BOOKS_FAILED.to_string());
            }
        }
        match authors {
            Ok(authors) => {
                self.authors = authors;
                self.authors_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load authors");
                self.authors_error = Some(AUTHORS_FAILED.to_string());
            }
        }
    }
}

pub struct BookListPresenter {
    gateway: Arc<dyn LibraryGateway>,
    state: Mount<BookListView>,
}

impl BookListPresenter {
    pub fn new(gateway: Arc<dyn LibraryGateway>) -> Self {
        Self {
            gateway,
            state: Mount::new(BookListView::default()),
        }
    }

    pub fn view(&self) -> BookListView {
        self.state.snapshot()
    }

    async fn fetch(gateway: Arc<dyn LibraryGateway>, handle: MountHandle<BookListView>) -> bool {
        let (books, authors) = futures::join!(gateway.list_books(), gateway.list_authors());
        handle.apply(|state| state.apply_load(books, authors))
    }

    /// Fetch books and authors
    pub async fn load(&self) {
        self.state.update(|state| state.loading = true);
        Self::fetch(self.gateway.clone(), self.state.handle()).await;
    }

    /// Fire-and-forget load; the task yields false if the presenter was
    /// dropped before the fetch completed.
    pub fn spawn_load(&self) -> JoinHandle<bool> {
        self.state.update(|state| state.loading = true);
        tokio::spawn(Self::fetch(self.gateway.clone(), self.state.handle()))
    }

    pub fn rows(&self) -> Vec<BookRow> {
        self.state.read(|state| {
            let index = AuthorIndex::new(&state.authors);
            state
                .books
                .iter()
                .map(|book| BookRow {
                    id: book.id,
                    title: book.title.clone(),
                    authors: index.display(&book.author_ids),
                    page_count: book.page_count,
                    available: book.available,
                    publication_date: book.publication_date,
                    attachment_url: book
                        .pdf_path
                        .as_deref()
                        .map(|path| self.gateway.attachment_url(path)),
                    detail: book.id.map(Route::BookDetail),
                })
                .collect()
        })
    }

    pub fn counts(&self) -> CatalogCounts {
        self.state.read(|state| CatalogCounts::of(&state.books))
    }

    /// Put a book up for confirmation; labelled by title when it is listed
    pub fn request_delete(&self, id: BookId) -> bool {
        self.state.update(|state| {
            let label = state
                .books
                .iter()
                .find(|book| book.id == Some(id))
                .map(|book| book.title.clone())
                .unwrap_or_else(|| format!("#{}", id));
            state.error = None;
            state.delete.request(DeleteTarget::new(id, label))
        })
    }

    pub fn cancel_delete(&self) -> bool {
        self.state.update(|state| state.delete.cancel())
    }

    /// Delete the pending book; on success only that entry leaves the list
    pub async fn confirm_delete(&self) -> Option<Confirmed> {
        let Some(target) = self.state.update(|state| state.delete.begin()) else {
            debug!("Confirm without a pending delete ignored");
            return None;
        };

        let outcome = delete::execute(self.gateway.as_ref(), Resource::Book, &target).await;
        self.state.update(|state| {
            match &outcome {
                DeleteOutcome::Deleted { target } => {
                    state.books.retain(|book| book.id != Some(target.id));
                }
                DeleteOutcome::Failed { message, .. } => state.error = Some(message.clone()),
            }
            state.delete.finish(outcome.clone());
        });

        Some(Confirmed {
            outcome,
            navigate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblioteca_common::{AuthorId, InMemoryGateway, Operation};
    use std::time::Duration;

    fn book(id: BookId, title: &str, available: bool, pdf: Option<&str>, authors: Vec<AuthorId>) -> Book {
        Book {
            id: Some(id),
            title: title.to_string(),
            author_ids: authors,
            page_count: 100,
            available,
            publication_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            pdf_path: pdf.map(str::to_string),
        }
    }

    fn catalog() -> Arc<InMemoryGateway> {
        Arc::new(
            InMemoryGateway::new()
                .with_author(Author::named("Frank Herbert"))
                .with_book(book(1, "Dune", true, Some("dune.pdf"), vec![1]))
                .with_book(book(2, "Foo", false, None, vec![1, 42]))
                .with_book(book(3, "Bar", true, None, vec![])),
        )
    }

    #[test]
    fn test_counts_over_mixed_catalog() {
        let books = vec![
            book(1, "Dune", true, Some("dune.pdf"), vec![]),
            book(2, "Foo", false, None, vec![]),
        ];
        assert_eq!(
            CatalogCounts::of(&books),
            CatalogCounts {
                total: 2,
                available: 1,
                unavailable: 1,
                with_pdf: 1
            }
        );
        assert_eq!(CatalogCounts::of(&[]), CatalogCounts::default());
    }

    #[tokio::test]
    async fn test_rows_resolve_dangling_reference() {
        let gateway = catalog();
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;

        let rows = presenter.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].authors, "Frank Herbert");
        assert_eq!(
            rows[0].attachment_url.as_deref(),
            Some("http://localhost:8080/books/files/dune.pdf")
        );
        assert_eq!(rows[1].authors, "Frank Herbert, Unknown author");
        assert_eq!(rows[2].authors, "No authors");
        assert_eq!(rows[2].detail, Some(Route::BookDetail(3)));

        let counts = presenter.counts();
        assert_eq!(counts.available + counts.unavailable, counts.total);
    }

    #[tokio::test]
    async fn test_collection_failures_are_independent() {
        let gateway = catalog();
        gateway.fail_next(Operation::ListAuthors, 500);
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;

        let view = presenter.view();
        assert!(!view.loading);
        assert_eq!(view.books.len(), 3);
        assert_eq!(view.authors_error.as_deref(), Some(AUTHORS_FAILED));
        assert_eq!(view.books_error, None);
        assert_eq!(presenter.rows()[0].authors, "Unknown author");

        gateway.fail_next_unreachable(Operation::ListBooks);
        presenter.load().await;
        let view = presenter.view();
        assert_eq!(view.books_error.as_deref(), Some(BOOKS_FAILED));
        assert_eq!(view.authors_error, None);
        assert_eq!(view.authors.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let gateway = catalog();
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;

        assert!(presenter.request_delete(2));
        assert_eq!(
            presenter.view().delete.pending().map(DeleteTarget::prompt),
            Some("Delete \"Foo\"?".to_string())
        );
        let confirmed = presenter.confirm_delete().await.unwrap();
        assert!(confirmed.outcome.is_deleted());
        assert_eq!(confirmed.navigate, None);

        let view = presenter.view();
        let ids: Vec<_> = view.books.iter().filter_map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(view.error, None);
    }

    #[tokio::test]
    async fn test_deleting_removed_id_fails_without_touching_list() {
        let gateway = catalog();
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;
        gateway.delete_book(1).await.unwrap();

        presenter.request_delete(1);
        let confirmed = presenter.confirm_delete().await.unwrap();
        assert!(!confirmed.outcome.is_deleted());
        let view = presenter.view();
        assert_eq!(view.books.len(), 3);
        assert!(view.error.is_some());
        assert!(matches!(
            view.delete,
            DeleteState::Done {
                outcome: DeleteOutcome::Failed { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_delete_banner_clears_on_next_request() {
        let gateway = catalog();
        gateway.fail_next(Operation::DeleteBook, 500);
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;

        presenter.request_delete(3);
        let confirmed = presenter.confirm_delete().await.unwrap();
        let DeleteOutcome::Failed { message, .. } = &confirmed.outcome else {
            panic!("expected a failed delete");
        };
        assert_eq!(presenter.view().error.as_deref(), Some(message.as_str()));
        assert_eq!(presenter.view().books_error, None);

        presenter.request_delete(3);
        assert_eq!(presenter.view().error, None);
        assert!(presenter.confirm_delete().await.unwrap().outcome.is_deleted());
        assert_eq!(presenter.counts().total, 2);
    }

    #[tokio::test]
    async fn test_cancel_has_no_side_effects() {
        let gateway = catalog();
        let presenter = BookListPresenter::new(gateway.clone());
        presenter.load().await;
        gateway.clear_calls();

        presenter.request_delete(1);
        assert!(presenter.cancel_delete());
        assert!(presenter.confirm_delete().await.is_none());
        assert!(gateway.calls().is_empty());
        assert_eq!(presenter.view().books.len(), 3);
        assert_eq!(presenter.view().delete, DeleteState::Idle);
    }

    #[tokio::test]
    async fn test_late_completion_after_unmount_is_noop() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_book(book(1, "Dune", true, None, vec![]))
                .with_latency(Duration::from_millis(20)),
        );
        let presenter = BookListPresenter::new(gateway.clone());
        let task = presenter.spawn_load();
        assert!(presenter.view().loading);
        drop(presenter);

        assert!(!task.await.unwrap());
        assert_eq!(gateway.count(Operation::ListBooks), 1);
    }

    #[tokio::test]
    async fn test_spawned_load_applies_while_mounted() {
        let gateway = catalog();
        let presenter = BookListPresenter::new(gateway.clone());
        assert!(presenter.spawn_load().await.unwrap());
        assert_eq!(presenter.counts().total, 3);
    }
}
