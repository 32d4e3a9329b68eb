//! Author form: single-phase create/update

use super::{
    date_message, length_message, validate_name, validate_optional_date, FieldErrors, FormField,
    FormMode, FormPhase, SubmitOutcome, Touched, NAME_MAX, NAME_MIN, REQUIRED,
};
use crate::routes::Route;
use biblioteca_common::metrics::record_save;
use biblioteca_common::{Author, AuthorId, LibraryGateway, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

const CREATED: &str = "Author created successfully!";
const UPDATED: &str = "Author updated successfully!";
const SAVE_FAILED: &str = "Could not save the author. Check the data and try again.";
const LOAD_FAILED: &str = "Could not load the author.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorField {
    Name,
    BirthDate,
    Nationality,
    Biography,
}

impl FormField for AuthorField {
    const ALL: &'static [Self] = &[
        AuthorField::Name,
        AuthorField::BirthDate,
        AuthorField::Nationality,
        AuthorField::Biography,
    ];

    fn name(self) -> &'static str {
        match self {
            AuthorField::Name => "name",
            AuthorField::BirthDate => "birth_date",
            AuthorField::Nationality => "nationality",
            AuthorField::Biography => "biography",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct AuthorDraft {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(custom(function = "validate_optional_date"))]
    pub birth_date: String,

    pub nationality: String,

    pub biography: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AuthorDraft {
    pub fn from_author(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            birth_date: author
                .birth_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            nationality: author.nationality.clone().unwrap_or_default(),
            biography: author.biography.clone().unwrap_or_default(),
        }
    }

    pub fn errors(&self) -> FieldErrors<AuthorField> {
        FieldErrors::collect(self.validate(), |field, error| self.message(field, error))
    }

    fn message(&self, field: AuthorField, error: &ValidationError) -> String {
        match field {
            AuthorField::Name => length_message(&self.name, NAME_MIN, NAME_MAX),
            AuthorField::BirthDate => date_message(error),
            _ => REQUIRED.to_string(),
        }
    }

    /// Empty optional fields are sent as absent
    pub fn to_author(&self, id: Option<AuthorId>) -> Option<Author> {
        if self.validate().is_err() {
            return None;
        }
        let birth_date = match optional(&self.birth_date) {
            Some(date) => Some(NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?),
            None => None,
        };

        Some(Author {
            id,
            name: self.name.trim().to_string(),
            birth_date,
            nationality: optional(&self.nationality),
            biography: optional(&self.biography),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorFormView {
    pub mode: FormMode,
    pub phase: FormPhase,
    pub draft: AuthorDraft,
    pub field_errors: BTreeMap<&'static str, String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub struct AuthorForm {
    gateway: Arc<dyn LibraryGateway>,
    mode: FormMode,
    draft: AuthorDraft,
    touched: Touched<AuthorField>,
    phase: FormPhase,
    error: Option<String>,
    success: Option<String>,
}

impl AuthorForm {
    pub fn new(gateway: Arc<dyn LibraryGateway>) -> Self {
        Self {
            gateway,
            mode: FormMode::Create,
            draft: AuthorDraft::default(),
            touched: Touched::default(),
            phase: FormPhase::Editing,
            error: None,
            success: None,
        }
    }

    /// Open for editing; a failed load leaves an empty, editable draft
    pub async fn edit(gateway: Arc<dyn LibraryGateway>, id: AuthorId) -> Self {
        let mut form = Self::new(gateway);
        form.mode = FormMode::Edit(id);
        form.phase = FormPhase::Loading;

        match form.gateway.get_author(id).await {
            Ok(author) => form.draft = AuthorDraft::from_author(&author),
            Err(e) => {
                warn!(author_id = id, error = %e, "Failed to load author for editing");
                form.error = Some(LOAD_FAILED.to_string());
            }
        }
        form.phase = FormPhase::Editing;
        form
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &AuthorDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    fn edit_draft(&mut self) -> &mut AuthorDraft {
        self.phase = self.phase.edited();
        &mut self.draft
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.edit_draft().name = name.into();
    }

    pub fn set_birth_date(&mut self, date: impl Into<String>) {
        self.edit_draft().birth_date = date.into();
    }

    pub fn set_nationality(&mut self, nationality: impl Into<String>) {
        self.edit_draft().nationality = nationality.into();
    }

    pub fn set_biography(&mut self, biography: impl Into<String>) {
        self.edit_draft().biography = biography.into();
    }

    pub fn touch(&mut self, field: AuthorField) {
        self.touched.touch(field);
    }

    pub fn errors(&self) -> FieldErrors<AuthorField> {
        self.draft.errors()
    }

    pub fn visible_error(&self, field: AuthorField) -> Option<String> {
        if !self.touched.is_touched(field) {
            return None;
        }
        self.errors().get(field).map(str::to_string)
    }

    pub fn view(&self) -> AuthorFormView {
        AuthorFormView {
            mode: self.mode,
            phase: self.phase,
            draft: self.draft.clone(),
            field_errors: self.errors().visible(&self.touched),
            error: self.error.clone(),
            success: self.success.clone(),
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome<Author> {
        let errors = self.errors();
        let payload = match self.draft.to_author(self.mode.record_id()) {
            Some(author) if errors.is_empty() => author,
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

        let saved: Result<Author> = match self.mode {
            FormMode::Create => self.gateway.create_author(&payload).await,
            FormMode::Edit(id) => self.gateway.update_author(id, &payload).await,
        };

        match saved {
            Ok(author) => {
                info!(author_id = ?author.id, name = %author.name, "Author saved");
                record_save("author", "saved");
                self.success = Some(
                    (if self.mode.is_edit() { UPDATED } else { CREATED }).to_string(),
                );
                if let Some(id) = author.id {
                    self.mode = FormMode::Edit(id);
                }
                self.phase = FormPhase::Saved;
                SubmitOutcome::Saved {
                    record: author,
                    navigate: Route::Authors,
                }
            }
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "Author save failed");
                record_save("author", "failed");
                self.phase = FormPhase::Failed;
                self.error = Some(SAVE_FAILED.to_string());
                SubmitOutcome::Failed(e)
            }
        }
    }

    pub fn cancel(&self) -> Route {
        Route::Authors
    }
}
