//! Author entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type AuthorId = i64;

/// A person credited on books. Names are not unique in this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AuthorId>,

    pub name: String,

    #[serde(
        rename = "dataNascimento",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<NaiveDate>,

    #[serde(
        rename = "nacionalidade",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub nationality: Option<String>,

    #[serde(rename = "biografia", default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
}

impl Author {
    /// An unsaved author carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            birth_date: None,
            nationality: None,
            biography: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_backend_payload() {
        let json = r#"{
            "id": 3,
            "name": "Clarice Lispector",
            "dataNascimento": "1920-12-10",
            "nacionalidade": "Brasileira",
            "biografia": null
        }"#;
        let author: Author = serde_json::from_str(json).unwrap();
        assert_eq!(author.id, Some(3));
        assert_eq!(author.birth_date, NaiveDate::from_ymd_opt(1920, 12, 10));
        assert_eq!(author.nationality.as_deref(), Some("Brasileira"));
        assert_eq!(author.biography, None);
    }

    #[test]
    fn test_new_author_omits_absent_fields() {
        let value = serde_json::to_value(Author::named("Ana Silva")).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Ana Silva" }));
    }
}
