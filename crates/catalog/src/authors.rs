//! Author references
//!
//! Books point at authors by id. This module joins ids to display names and
//! turns a free-text author list ("Ana Silva, Bruno Costa") into ids.
//!
//! Resolution policy: a typed name matching a known author (trimmed,
//! case-insensitive) reuses that author; only unmatched names are created,
//! once each. Re-submitting a list that was already saved creates nothing.

use biblioteca_common::{AppError, Author, AuthorId, LibraryGateway, Operation};
use std::collections::HashMap;
use tracing::{debug, info};

/// Shown for an id missing from the author snapshot
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Shown for a book without author references
pub const NO_AUTHORS: &str = "No authors";

/// Split a comma-separated author list into trimmed, non-empty names
pub fn parse_author_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_author_names`] for display in a text field
pub fn format_author_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Id lookup over one snapshot of the author collection
pub struct AuthorIndex<'a> {
    by_id: HashMap<AuthorId, &'a Author>,
}

impl<'a> AuthorIndex<'a> {
    pub fn new(authors: &'a [Author]) -> Self {
        let by_id = authors
            .iter()
            .filter_map(|author| author.id.map(|id| (id, author)))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: AuthorId) -> Option<&'a Author> {
        self.by_id.get(&id).copied()
    }

    /// Display name; never fails
    pub fn name(&self, id: AuthorId) -> &'a str {
        self.get(id)
            .map(|author| author.name.as_str())
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    pub fn names(&self, ids: &[AuthorId]) -> Vec<&'a str> {
        ids.iter().map(|id| self.name(*id)).collect()
    }

    /// Comma-joined names for a row, or [`NO_AUTHORS`]
    pub fn display(&self, ids: &[AuthorId]) -> String {
        if ids.is_empty() {
            return NO_AUTHORS.to_string();
        }
        self.names(ids).join(", ")
    }

    /// Editable text for a free-text author field.
    ///
    /// Dangling ids have no name to show and are left out.
    pub fn editable_text(&self, ids: &[AuthorId]) -> String {
        let names: Vec<&str> = ids
            .iter()
            .filter_map(|id| {
                let author = self.get(*id);
                if author.is_none() {
                    debug!(author_id = id, "Dropping dangling author reference from text");
                }
                author.map(|author| author.name.as_str())
            })
            .collect();
        format_author_names(&names)
    }
}

/// Outcome of resolving typed names into references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorResolution {
    /// Resolved ids in first-occurrence order
    pub ids: Vec<AuthorId>,
    /// Authors created during resolution
    pub created: Vec<Author>,
}

/// A resolution cut short by a failed create
#[derive(Debug)]
pub struct IncompleteResolution {
    /// Authors the backend already holds from this attempt
    pub created: Vec<Author>,
    pub error: AppError,
}

/// Resolve names against `known`, creating only the missing authors.
///
/// Not transactional: if a create fails, authors created before it remain on
/// the backend and are handed back in the error so callers can know them.
pub async fn resolve_author_names(
    names: &[String],
    known: &[Author],
    gateway: &dyn LibraryGateway,
) -> std::result::Result<AuthorResolution, IncompleteResolution> {
    let mut by_name: HashMap<String, AuthorId> = HashMap::new();
    for author in known {
        if let Some(id) = author.id {
            by_name.entry(name_key(&author.name)).or_insert(id);
        }
    }

    let mut resolution = AuthorResolution::default();
    for name in names {
        let key = name_key(name);
        if key.is_empty() {
            continue;
        }

        let id = match by_name.get(&key) {
            Some(id) => *id,
            None => {
                let created = match gateway.create_author(&Author::named(name.trim())).await {
                    Ok(created) => created,
                    Err(error) => {
                        return Err(IncompleteResolution {
                            created: resolution.created,
                            error,
                        })
                    }
                };
                let Some(id) = created.id else {
                    return Err(IncompleteResolution {
                        created: resolution.created,
                        error: AppError::Decode {
                            operation: Operation::CreateAuthor,
                            message: "created author carries no id".to_string(),
                        },
                    });
                };
                info!(author_id = id, name = %created.name, "Author created from free text");
                by_name.insert(key, id);
                resolution.created.push(created);
                id
            }
        };

        if !resolution.ids.contains(&id) {
            resolution.ids.push(id);
        }
    }

    Ok(resolution)
}
