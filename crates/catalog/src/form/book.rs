//! Book form
//!
//! Persisting is two-phase and not transactional:
//! 1. create/update the record; on failure stop, the draft stays editable
//! 2. only then, and only if a file is selected, upload it against the
//!    record id; on failure the record is kept and the form reports a
//!    partial save

use super::{
    date_message, length_message, validate_name, validate_required_date, FieldErrors, FormField,
    FormMode, FormPhase, SubmitOutcome, Touched, NAME_MAX, NAME_MIN, REQUIRED,
};
use crate::authors::{parse_author_names, resolve_author_names, AuthorIndex};
use crate::routes::Route;
use biblioteca_common::config::AttachmentConfig;
use biblioteca_common::metrics::record_save;
use biblioteca_common::{
    AppError, Attachment, Author, AuthorId, Book, BookId, LibraryGateway, Operation, Result,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

const CREATED: &str = "Book created successfully!";
const UPDATED: &str = "Book updated successfully!";
const UPLOADED: &str = " PDF uploaded successfully!";
const PARTIAL: &str = "Book saved, but the PDF upload failed.";
const SAVE_FAILED: &str = "Could not save the book. Check the data and try again.";
const LOAD_FAILED: &str = "Could not load the book.";
const AUTHORS_FAILED: &str = "Could not load authors.";
const NOT_PDF: &str = "Please select a PDF file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    Title,
    Authors,
    PageCount,
    Available,
    PublicationDate,
}

impl FormField for BookField {
    const ALL: &'static [Self] = &[
        BookField::Title,
        BookField::Authors,
        BookField::PageCount,
        BookField::Available,
        BookField::PublicationDate,
    ];

    fn name(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Authors => "author_ids",
            BookField::PageCount => "page_count",
            BookField::Available => "available",
            BookField::PublicationDate => "publication_date",
        }
    }
}

/// In-progress book; starts from the zero-value template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct BookDraft {
    #[validate(custom(function = "validate_name"))]
    pub title: String,

    #[validate(length(min = 1))]
    pub author_ids: Vec<AuthorId>,

    #[validate(range(min = 1, max = 10000))]
    pub page_count: u32,

    pub available: bool,

    /// ISO date as typed
    #[validate(custom(function = "validate_required_date"))]
    pub publication_date: String,
}

impl Default for BookDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            author_ids: Vec::new(),
            page_count: 0,
            available: true,
            publication_date: String::new(),
        }
    }
}

impl BookDraft {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author_ids: book.author_ids.clone(),
            page_count: book.page_count,
            available: book.available,
            publication_date: book.publication_date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn errors(&self) -> FieldErrors<BookField> {
        FieldErrors::collect(self.validate(), |field, error| self.message(field, error))
    }

    fn message(&self, field: BookField, error: &ValidationError) -> String {
        match field {
            BookField::Title => length_message(&self.title, NAME_MIN, NAME_MAX),
            BookField::Authors => "Select at least one author.".to_string(),
            BookField::PageCount => "Value must be between 1 and 10000.".to_string(),
            BookField::PublicationDate => date_message(error),
            BookField::Available => REQUIRED.to_string(),
        }
    }

    /// The payload for the gateway; `None` while the draft is invalid
    pub fn to_book(&self, id: Option<BookId>) -> Option<Book> {
        if self.validate().is_err() {
            return None;
        }
        let publication_date =
            NaiveDate::parse_from_str(self.publication_date.trim(), "%Y-%m-%d").ok()?;

        Some(Book {
            id,
            title: self.title.trim().to_string(),
            author_ids: self.author_ids.clone(),
            page_count: self.page_count,
            available: self.available,
            publication_date,
            pdf_path: None,
        })
    }
}

/// Serializable snapshot for rendering
#[derive(Debug, Clone, Serialize)]
pub struct BookFormView {
    pub mode: FormMode,
    pub phase: FormPhase,
    pub draft: BookDraft,
    pub author_text: String,
    pub authors: Vec<Author>,
    pub selected_file: Option<String>,
    pub field_errors: BTreeMap<&'static str, String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub struct BookForm {
    gateway: Arc<dyn LibraryGateway>,
    attachments: AttachmentConfig,
    mode: FormMode,
    draft: BookDraft,
    touched: Touched<BookField>,
    attachment: Option<Attachment>,
    authors: Vec<Author>,
    phase: FormPhase,
    error: Option<String>,
    success: Option<String>,
}

impl BookForm {
    /// A new-record form over the empty template
    pub fn new(gateway: Arc<dyn LibraryGateway>, attachments: AttachmentConfig) -> Self {
        Self {
            gateway,
            attachments,
            mode: FormMode::Create,
            draft: BookDraft::default(),
            touched: Touched::default(),
            attachment: None,
            authors: Vec::new(),
            phase: FormPhase::Editing,
            error: None,
            success: None,
        }
    }

    /// Open a form and fetch what it needs: the author options and, in edit
    /// mode, the record. The two fetches fail independently.
    pub async fn open(
        gateway: Arc<dyn LibraryGateway>,
        attachments: AttachmentConfig,
        mode: FormMode,
    ) -> Self {
        let mut form = Self::new(gateway, attachments);
        form.mode = mode;

        match mode {
            FormMode::Create => form.load_authors().await,
            FormMode::Edit(id) => {
                form.phase = FormPhase::Loading;
                let gateway = form.gateway.clone();
                let (book, authors) = futures::join!(gateway.get_book(id), gateway.list_authors());
                form.apply_authors(authors);
                match book {
                    Ok(book) => form.draft = BookDraft::from_book(&book),
                    Err(e) => {
                        warn!(book_id = id, error = %e, "Failed to load book for editing");
                        form.error = Some(LOAD_FAILED.to_string());
                    }
                }
                form.phase = FormPhase::Editing;
            }
        }
        form
    }

    /// Refresh the author options
    pub async fn load_authors(&mut self) {
        let authors = self.gateway.list_authors().await;
        self.apply_authors(authors);
    }

    fn apply_authors(&mut self, authors: Result<Vec<Author>>) {
        match authors {
            Ok(authors) => self.authors = authors,
            Err(e) => {
                warn!(error = %e, "Failed to load authors");
                self.error = Some(AUTHORS_FAILED.to_string());
            }
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &BookDraft {
        &self.draft
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn selected_attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    fn edit(&mut self) -> &mut BookDraft {
        self.phase = self.phase.edited();
        &mut self.draft
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.edit().title = title.into();
    }

    pub fn set_author_ids(&mut self, ids: Vec<AuthorId>) {
        self.edit().author_ids = ids;
    }

    /// Select or deselect one author option
    pub fn toggle_author(&mut self, id: AuthorId) {
        let ids = &mut self.edit().author_ids;
        match ids.iter().position(|existing| *existing == id) {
            Some(index) => {
                ids.remove(index);
            }
            None => ids.push(id),
        }
    }

    pub fn set_page_count(&mut self, page_count: u32) {
        self.edit().page_count = page_count;
    }

    pub fn set_available(&mut self, available: bool) {
        self.edit().available = available;
    }

    pub fn set_publication_date(&mut self, date: impl Into<String>) {
        self.edit().publication_date = date.into();
    }

    /// Field lost focus
    pub fn touch(&mut self, field: BookField) {
        self.touched.touch(field);
    }

    pub fn errors(&self) -> FieldErrors<BookField> {
        self.draft.errors()
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// The error to show under `field`, if it is invalid and touched
    pub fn visible_error(&self, field: BookField) -> Option<String> {
        if !self.touched.is_touched(field) {
            return None;
        }
        self.errors().get(field).map(str::to_string)
    }

    /// Selected authors as an editable comma list
    pub fn author_text(&self) -> String {
        AuthorIndex::new(&self.authors).editable_text(&self.draft.author_ids)
    }

    /// Replace the author selection from free text.
    ///
    /// Known names are reused; unknown names are created on the backend.
    /// Authors created before a failure join the snapshot, so a retry
    /// reuses them.
    pub async fn apply_author_text(&mut self, text: &str) -> Result<()> {
        let names = parse_author_names(text);
        let resolution =
            match resolve_author_names(&names, &self.authors, self.gateway.as_ref()).await {
                Ok(resolution) => resolution,
                Err(incomplete) => {
                    let e = incomplete.error;
                    warn!(
                        error = %e,
                        created = incomplete.created.len(),
                        "Failed to resolve author names"
                    );
                    self.authors.extend(incomplete.created);
                    self.error = Some(e.user_message());
                    return Err(e);
                }
            };

        self.authors.extend(resolution.created);
        self.set_author_ids(resolution.ids);
        self.touch(BookField::Authors);
        Ok(())
    }

    /// Pick the file to upload after the record is saved.
    ///
    /// Anything but the accepted MIME type clears the selection. The size
    /// limit is advisory.
    pub fn select_attachment(&mut self, attachment: Attachment) -> Result<()> {
        if !attachment.has_content_type(&self.attachments.accepted_content_type) {
            self.attachment = None;
            self.error = Some(NOT_PDF.to_string());
            return Err(AppError::InvalidAttachment {
                content_type: attachment.content_type,
            });
        }

        if attachment.len() > self.attachments.advisory_max_bytes {
            warn!(
                file = %attachment.file_name,
                size = attachment.len(),
                limit = self.attachments.advisory_max_bytes,
                "Attachment exceeds the advisory size limit"
            );
        }

        self.attachment = Some(attachment);
        self.error = None;
        Ok(())
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    pub fn view(&self) -> BookFormView {
        BookFormView {
            mode: self.mode,
            phase: self.phase,
            draft: self.draft.clone(),
            author_text: self.author_text(),
            authors: self.authors.clone(),
            selected_file: self.attachment.as_ref().map(|a| a.file_name.clone()),
            field_errors: self.errors().visible(&self.touched),
            error: self.error.clone(),
            success: self.success.clone(),
        }
    }

    /// Validate, save the record, then upload the selected file
    pub async fn submit(&mut self) -> SubmitOutcome<Book> {
        let errors = self.errors();
        let payload = match self.draft.to_book(self.mode.record_id()) {
            Some(book) if errors.is_empty() => book,
            _ => {
                self.touched.touch_all();
                return SubmitOutcome::Invalid {
                    errors: errors.by_name(),
                };
            }
        };

        self.phase = FormPhase::Saving;
        self.error = None;
        self.success = None;

        // Phase 1: the record
        let saved = match self.mode {
            FormMode::Create => self.gateway.create_book(&payload).await,
            FormMode::Edit(id) => self.gateway.update_book(id, &payload).await,
        };
        let saved = match saved {
            Ok(book) => book,
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "Book save failed");
                return self.fail(e);
            }
        };

        let Some(book_id) = saved.id.or(self.mode.record_id()) else {
            return self.fail(AppError::Decode {
                operation: Operation::CreateBook,
                message: "saved book carries no id".to_string(),
            });
        };

        let mut success = (if self.mode.is_edit() { UPDATED } else { CREATED }).to_string();
        // Re-submitting after a partial save must update, not create again.
        self.mode = FormMode::Edit(book_id);
        info!(book_id, title = %saved.title, "Book saved");

        // Phase 2: the attachment
        let Some(attachment) = self.attachment.clone() else {
            return self.succeed(saved, success);
        };

        match self.gateway.upload_attachment(book_id, &attachment).await {
            Ok(updated) => {
                info!(book_id, file = %attachment.file_name, "Attachment uploaded");
                self.attachment = None;
                success.push_str(UPLOADED);
                self.succeed(updated.unwrap_or(saved), success)
            }
            Err(e) => {
                warn!(book_id, error = %e, "Attachment upload failed after save");
                record_save("book", "partial");
                self.phase = FormPhase::PartialFailure;
                self.success = Some(success);
                self.error = Some(PARTIAL.to_string());
                SubmitOutcome::PartiallySaved {
                    record: saved,
                    error: AppError::PartialSave {
                        book_id,
                        source: Box::new(e),
                    },
                }
            }
        }
    }

    fn succeed(&mut self, book: Book, success: String) -> SubmitOutcome<Book> {
        record_save("book", "saved");
        self.phase = FormPhase::Saved;
        self.success = Some(success);
        SubmitOutcome::Saved {
            record: book,
            navigate: Route::Books,
        }
    }

    fn fail(&mut self, error: AppError) -> SubmitOutcome<Book> {
        record_save("book", "failed");
        self.phase = FormPhase::Failed;
        self.error = Some(SAVE_FAILED.to_string());
        SubmitOutcome::Failed(error)
    }

    /// Leave without saving
    pub fn cancel(&self) -> Route {
        Route::Books
    }
}
