//! Book entity
//!
//! Books reference their authors by id. The backend answers with the
//! authors embedded (`authors: [{id, name, ..}]`) while it accepts
//! `authorIds` on writes; decoding folds both shapes into `author_ids`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::author::{Author, AuthorId};
use super::attachment::attachment_file_name;

pub type BookId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BookRecord")]
pub struct Book {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,

    #[serde(rename = "titulo")]
    pub title: String,

    /// Ordered author references; order is display order
    #[serde(rename = "authorIds")]
    pub author_ids: Vec<AuthorId>,

    #[serde(rename = "paginas")]
    pub page_count: u32,

    #[serde(rename = "disponivel")]
    pub available: bool,

    #[serde(rename = "dataPublicacao")]
    pub publication_date: NaiveDate,

    /// Server-side path of the attached PDF, e.g. `uploads/dune.pdf`
    #[serde(rename = "pdfPath", skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
}

/// Wire shape accepted on reads
#[derive(Deserialize)]
struct BookRecord {
    #[serde(default)]
    id: Option<BookId>,
    #[serde(rename = "titulo")]
    title: String,
    #[serde(rename = "authorIds", default)]
    author_ids: Option<Vec<AuthorId>>,
    #[serde(default)]
    authors: Option<Vec<Author>>,
    #[serde(rename = "paginas")]
    page_count: u32,
    #[serde(rename = "disponivel")]
    available: bool,
    #[serde(rename = "dataPublicacao")]
    publication_date: NaiveDate,
    #[serde(rename = "pdfPath", default)]
    pdf_path: Option<String>,
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        let author_ids = match record.author_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => record
                .authors
                .unwrap_or_default()
                .into_iter()
                .filter_map(|author| author.id)
                .collect(),
        };

        Self {
            id: record.id,
            title: record.title,
            author_ids,
            page_count: record.page_count,
            available: record.available,
            publication_date: record.publication_date,
            pdf_path: record.pdf_path.filter(|path| !path.is_empty()),
        }
    }
}

impl Book {
    pub fn has_attachment(&self) -> bool {
        self.pdf_path.is_some()
    }

    /// File name of the attachment as served by the files endpoint
    pub fn attachment_file_name(&self) -> Option<&str> {
        self.pdf_path.as_deref().map(attachment_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_authors_become_references() {
        let json = r#"{
            "id": 1,
            "titulo": "Dune",
            "autor": "Frank Herbert",
            "authors": [{"id": 4, "name": "Frank Herbert"}, {"id": 9, "name": "Brian Herbert"}],
            "paginas": 412,
            "disponivel": true,
            "dataPublicacao": "1965-08-01",
            "pdfPath": "uploads/dune.pdf"
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.author_ids, vec![4, 9]);
        assert_eq!(book.attachment_file_name(), Some("dune.pdf"));
        assert!(book.has_attachment());
    }

    #[test]
    fn test_explicit_ids_win_over_embedded_authors() {
        let json = r#"{
            "titulo": "Foo",
            "authorIds": [2],
            "authors": [{"id": 5, "name": "Someone"}],
            "paginas": 10,
            "disponivel": false,
            "dataPublicacao": "2001-01-01",
            "pdfPath": ""
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.author_ids, vec![2]);
        assert_eq!(book.pdf_path, None);
    }

    #[test]
    fn test_writes_use_author_ids() {
        let book = Book {
            id: None,
            title: "Dune".to_string(),
            author_ids: vec![4],
            page_count: 412,
            available: true,
            publication_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            pdf_path: None,
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "titulo": "Dune",
                "authorIds": [4],
                "paginas": 412,
                "disponivel": true,
                "dataPublicacao": "1965-08-01"
            })
        );
    }
}
