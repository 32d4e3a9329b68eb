use crate::mount::Mount;
use crate::routes::Route;
use biblioteca_common::{Author, AuthorId, LibraryGateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

const LOAD_FAILED: &str = "Could not load the author.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorDetailView {
    pub author: Option<Author>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct AuthorDetailPresenter {
    gateway: Arc<dyn LibraryGateway>,
    state: Mount<AuthorDetailView>,
}

impl AuthorDetailPresenter {
    pub fn new(gateway: Arc<dyn LibraryGateway>) -> Self {
        Self {
            gateway,
            state: Mount::new(AuthorDetailView::default()),
        }
    }

    pub fn view(&self) -> AuthorDetailView {
        self.state.snapshot()
    }

    pub async fn load(&self, id: AuthorId) {
        self.state.update(|state| {
            state.loading = true;
            state.error = None;
        });
        let author = self.gateway.get_author(id).await;
        self.state.update(|state| {
            state.loading = false;
            match author {
                Ok(author) => state.author = Some(author),
                Err(e) => {
                    warn!(author_id = id, error = %e, "Failed to load author");
                    state.author = None;
                    state.error = Some(LOAD_FAILED.to_string());
                }
            }
        });
    }

    pub fn edit_route(&self) -> Option<Route> {
        self.state
            .read(|state| state.author.as_ref().and_then(|author| author.id))
            .map(Route::EditAuthor)
    }
}
