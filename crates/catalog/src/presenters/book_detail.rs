use super::FileSaver;
use crate::authors::AuthorIndex;
use crate::delete::{self, Confirmed, DeleteOutcome, DeleteState, DeleteTarget, Resource};
use crate::mount::Mount;
use crate::routes::Route;
use biblioteca_common::{AppError, Attachment, Author, Book, BookId, LibraryGateway, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOAD_FAILED: &str = "Could not load the book.";
const NO_ATTACHMENT: &str = "This book has no PDF attached.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct BookDetailView {
    pub book: Option<Book>,
    pub authors: Vec<Author>,
    pub loading: bool,
    pub error: Option<String>,
    pub show_pdf: bool,
    pub delete: DeleteState,
}

pub struct BookDetailPresenter {
    gateway: Arc<dyn LibraryGateway>,
    state: Mount<BookDetailView>,
}

impl BookDetailPresenter {
    pub fn new(gateway: Arc<dyn LibraryGateway>) -> Self {
        Self {
            gateway,
            state: Mount::new(BookDetailView::default()),
        }
    }

    pub fn view(&self) -> BookDetailView {
        self.state.snapshot()
    }

    /// Fetch the book and the author snapshot used to name its authors.
    ///
    /// Without authors the page still renders, with sentinel names.
    pub async fn load(&self, id: BookId) {
        self.state.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let (book, authors) =
            futures::join!(self.gateway.get_book(id), self.gateway.list_authors());

        self.state.update(|state| {
            state.loading = false;
            match book {
                Ok(book) => state.book = Some(book),
                Err(e) => {
                    warn!(book_id = id, error = %e, "Failed to load book");
                    state.book = None;
                    state.error = Some(LOAD_FAILED.to_string());
                }
            }
            match authors {
                Ok(authors) => state.authors = authors,
                Err(e) => warn!(error = %e, "Failed to load authors for book detail"),
            }
        });
    }

    pub fn author_names(&self) -> Vec<String> {
        self.state.read(|state| {
            let Some(book) = &state.book else {
                return Vec::new();
            };
            AuthorIndex::new(&state.authors)
                .names(&book.author_ids)
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Show or hide the inline viewer; stays hidden without an attachment
    pub fn toggle_pdf_viewer(&self) -> bool {
        self.state.update(|state| {
            let has_attachment = state.book.as_ref().is_some_and(Book::has_attachment);
            state.show_pdf = has_attachment && !state.show_pdf;
            state.show_pdf
        })
    }

    pub fn attachment_url(&self) -> Option<String> {
        self.state.read(|state| {
            state
                .book
                .as_ref()
                .and_then(|book| book.pdf_path.as_deref())
                .map(|path| self.gateway.attachment_url(path))
        })
    }

    fn no_attachment() -> AppError {
        AppError::Validation {
            message: NO_ATTACHMENT.to_string(),
            field: Some("pdf_path".to_string()),
        }
    }

    /// Hand the attachment URL to the platform, suggesting `{title}.pdf`
    pub async fn download(&self, saver: &dyn FileSaver) -> Result<()> {
        let (url, title) = self.state.read(|state| {
            let book = state.book.as_ref()?;
            let path = book.pdf_path.as_deref()?;
            Some((self.gateway.attachment_url(path), book.title.clone()))
        })
        .ok_or_else(Self::no_attachment)?;

        let suggested_name = format!("{}.pdf", title);
        debug!(url = %url, file = %suggested_name, "Saving attachment");
        saver.save(&url, &suggested_name).await
    }

    /// Fetch the attachment bytes for inline viewing
    pub async fn fetch_attachment(&self) -> Result<Attachment> {
        let file_name = self
            .state
            .read(|state| {
                state
                    .book
                    .as_ref()
                    .and_then(Book::attachment_file_name)
                    .map(str::to_string)
            })
            .ok_or_else(Self::no_attachment)?;

        self.gateway.fetch_attachment(&file_name).await
    }

    pub fn edit_route(&self) -> Option<Route> {
        self.state
            .read(|state| state.book.as_ref().and_then(|book| book.id))
            .map(Route::EditBook)
    }

    /// Put the shown book up for confirmation
    pub fn request_delete(&self) -> bool {
        self.state.update(|state| {
            let Some((id, title)) = state
                .book
                .as_ref()
                .and_then(|book| book.id.map(|id| (id, book.title.clone())))
            else {
                return false;
            };
            state.error = None;
            state.delete.request(DeleteTarget::new(id, title))
        })
    }

    pub fn cancel_delete(&self) -> bool {
        self.state.update(|state| state.delete.cancel())
    }

    /// Delete the shown book; success navigates back to the collection
    pub async fn confirm_delete(&self) -> Option<Confirmed> {
        let target = self.state.update(|state| state.delete.begin())?;

        let outcome = delete::execute(self.gateway.as_ref(), Resource::Book, &target).await;
        let navigate = outcome.is_deleted().then_some(Route::Books);
        if navigate.is_some() {
            info!(book_id = target.id, "Leaving detail of deleted book");
        }
        self.state.update(|state| {
            if let DeleteOutcome::Failed { message, .. } = &outcome {
                state.error = Some(message.clone());
            }
            state.delete.finish(outcome.clone());
        });

        Some(Confirmed { outcome, navigate })
    }
}
