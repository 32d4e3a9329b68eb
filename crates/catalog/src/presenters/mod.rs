//! List and detail presenters
//!
//! Each presenter owns one serializable view state through a
//! [`Mount`](crate::mount::Mount), built fresh per presenter. Loads that
//! fetch two collections treat them independently: one failing never hides
//! the other.

mod author_detail;
mod author_list;
mod book_detail;
mod book_list;

pub use author_detail::{AuthorDetailPresenter, AuthorDetailView};
pub use author_list::{AuthorListPresenter, AuthorListView, AUTHOR_DELETED};
pub use book_detail::{BookDetailPresenter, BookDetailView};
pub use book_list::{BookListPresenter, BookListView, BookRow, CatalogCounts};

use async_trait::async_trait;
use biblioteca_common::Result;

/// Platform capability that saves or opens a remote file
#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save(&self, url: &str, suggested_name: &str) -> Result<()>;
}
