use crate::delete::{self, Confirmed, DeleteOutcome, DeleteState, DeleteTarget, Resource};
use crate::mount::Mount;
use crate::routes::Route;
use biblioteca_common::{Author, AuthorId, LibraryGateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub const AUTHOR_DELETED: &str = "Author deleted successfully.";
const LOAD_FAILED: &str = "Could not load authors.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorListView {
    pub authors: Vec<Author>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub delete: DeleteState,
}

pub struct AuthorListPresenter {
    gateway: Arc<dyn LibraryGateway>,
    state: Mount<AuthorListView>,
}

impl AuthorListPresenter {
    pub fn new(gateway: Arc<dyn LibraryGateway>) -> Self {
        Self {
            gateway,
            state: Mount::new(AuthorListView::default()),
        }
    }

    pub fn view(&self) -> AuthorListView {
        self.state.snapshot()
    }

    pub async fn load(&self) {
        self.state.update(|state| state.loading = true);
        let authors = self.gateway.list_authors().await;
        self.state.update(|state| {
            state.loading = false;
            match authors {
                Ok(authors) => {
                    state.authors = authors;
                    state.error = None;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load authors");
                    state.error = Some(LOAD_FAILED.to_string());
                }
            }
        });
    }

    pub fn detail_route(&self, id: AuthorId) -> Route {
        Route::AuthorDetail(id)
    }

    pub fn request_delete(&self, id: AuthorId) -> bool {
        self.state.update(|state| {
            let label = state
                .authors
                .iter()
                .find(|author| author.id == Some(id))
                .map(|author| author.name.clone())
                .unwrap_or_else(|| format!("#{}", id));
            state.notice = None;
            state.delete.request(DeleteTarget::new(id, label))
        })
    }

    pub fn cancel_delete(&self) -> bool {
        self.state.update(|state| state.delete.cancel())
    }

    /// Books keep their references to a deleted author; they render as
    /// unknown from then on.
    pub async fn confirm_delete(&self) -> Option<Confirmed> {
        let target = self.state.update(|state| state.delete.begin())?;

        let outcome = delete::execute(self.gateway.as_ref(), Resource::Author, &target).await;
        self.state.update(|state| {
            match &outcome {
                DeleteOutcome::Deleted { target } => {
                    state.authors.retain(|author| author.id != Some(target.id));
                    state.notice = Some(AUTHOR_DELETED.to_string());
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
