//! Biblioteca Catalog
//!
//! Headless view-models for the library catalog:
//! - Book and author forms with validation and the two-phase persist
//! - Free-text author parsing and resolution into author references
//! - List and detail presenters with author-name joins and counts
//! - Explicit delete confirmation state
//!
//! Every view state is a plain serializable struct; a UI shell renders it
//! and turns the returned [`Route`]s into navigation.

pub mod authors;
pub mod delete;
pub mod form;
pub mod mount;
pub mod presenters;
pub mod routes;

pub use delete::{Confirmed, DeleteOutcome, DeleteState, DeleteTarget};
pub use form::{AuthorForm, BookForm, FormMode, FormPhase, SubmitOutcome};
pub use presenters::{
    AuthorDetailPresenter, AuthorListPresenter, BookDetailPresenter, BookListPresenter,
    CatalogCounts, FileSaver,
};
pub use routes::Route;
