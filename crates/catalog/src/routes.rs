//! Navigation intents
//!
//! View-models never navigate; they hand one of these back to the shell.

use biblioteca_common::{AuthorId, BookId};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "id", rename_all = "snake_case")]
pub enum Route {
    Books,
    NewBook,
    BookDetail(BookId),
    EditBook(BookId),
    Authors,
    NewAuthor,
    AuthorDetail(AuthorId),
    EditAuthor(AuthorId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Books => "/books".to_string(),
            Route::NewBook => "/books/new".to_string(),
            Route::BookDetail(id) => format!("/books/view/{}", id),
            Route::EditBook(id) => format!("/books/edit/{}", id),
            Route::Authors => "/authors".to_string(),
            Route::NewAuthor => "/authors/new".to_string(),
            Route::AuthorDetail(id) => format!("/authors/{}", id),
            Route::EditAuthor(id) => format!("/authors/edit/{}", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Books.path(), "/books");
        assert_eq!(Route::BookDetail(3).path(), "/books/view/3");
        assert_eq!(Route::EditBook(3).to_string(), "/books/edit/3");
        assert_eq!(Route::EditAuthor(8).path(), "/authors/edit/8");
    }
}
