//! Form reconciliation
//!
//! A form owns a draft, the set of touched fields and the last banners.
//! Drafts validate synchronously with `validator`; an error is shown for a
//! field only once that field was touched (blurred, or a submit attempted).
//! Invalid drafts never reach the gateway.

mod author;
mod book;

pub use author::{AuthorDraft, AuthorField, AuthorForm, AuthorFormView};
pub use book::{BookDraft, BookField, BookForm, BookFormView};

use crate::routes::Route;
use biblioteca_common::{AppError, BookId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use validator::{ValidationError, ValidationErrors};

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const INVALID_DATE: &str = "Enter a valid date (YYYY-MM-DD).";

/// Bounds on titles and author names, counted after trimming
pub(crate) const NAME_MIN: usize = 2;
pub(crate) const NAME_MAX: usize = 255;

/// A named input of a form
pub trait FormField: Copy + Ord + fmt::Debug + 'static {
    const ALL: &'static [Self];

    /// Name of the draft field this input edits
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }
}

/// Whether the form creates a record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "id", rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit(BookId),
}

impl FormMode {
    pub fn record_id(&self) -> Option<BookId> {
        match self {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(*id),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit(_))
    }
}

/// Editing → Saving → {Saved | PartialFailure | Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Loading,
    Editing,
    Saving,
    Saved,
    PartialFailure,
    Failed,
}

impl FormPhase {
    /// Terminal save states go back to editing on the next change
    pub(crate) fn edited(self) -> Self {
        match self {
            FormPhase::Saving => FormPhase::Saving,
            _ => FormPhase::Editing,
        }
    }
}

/// Result of a submit attempt
#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// Validation failed locally; nothing was sent
    Invalid { errors: BTreeMap<&'static str, String> },
    /// Everything persisted
    Saved { record: T, navigate: Route },
    /// The record persisted, the attachment did not (`AppError::PartialSave`)
    PartiallySaved { record: T, error: AppError },
    /// Nothing persisted
    Failed(AppError),
}

impl<T> SubmitOutcome<T> {
    /// Where the shell should go next, if anywhere
    pub fn navigation(&self) -> Option<Route> {
        match self {
            SubmitOutcome::Saved { navigate, .. } => Some(*navigate),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved { .. })
    }
}

/// Fields the user has left (or that a submit attempt revealed)
#[derive(Debug, Clone)]
pub struct Touched<F: FormField> {
    fields: BTreeSet<F>,
}

impl<F: FormField> Default for Touched<F> {
    fn default() -> Self {
        Self {
            fields: BTreeSet::new(),
        }
    }
}

impl<F: FormField> Touched<F> {
    pub fn touch(&mut self, field: F) {
        self.fields.insert(field);
    }

    pub fn touch_all(&mut self) {
        self.fields.extend(F::ALL.iter().copied());
    }

    pub fn is_touched(&self, field: F) -> bool {
        self.fields.contains(&field)
    }
}

/// First error message per invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F: FormField> {
    errors: BTreeMap<F, String>,
}

impl<F: FormField> Default for FieldErrors<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<F: FormField> FieldErrors<F> {
    pub(crate) fn collect(
        result: Result<(), ValidationErrors>,
        mut describe: impl FnMut(F, &ValidationError) -> String,
    ) -> Self {
        let mut errors = BTreeMap::new();
        if let Err(validation) = result {
            for (name, field_errors) in validation.field_errors() {
                let Some(field) = F::from_name(&name) else {
                    continue;
                };
                if let Some(first) = field_errors.first() {
                    errors.insert(field, describe(field, first));
                }
            }
        }
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: F) -> bool {
        self.errors.contains_key(&field)
    }

    /// Only the messages the touched rule lets through
    pub fn visible(&self, touched: &Touched<F>) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .filter(|(field, _)| touched.is_touched(**field))
            .map(|(field, message)| (field.name(), message.clone()))
            .collect()
    }

    pub fn by_name(&self) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .map(|(field, message)| (field.name(), message.clone()))
            .collect()
    }
}

/// Message for a `length(min, max)` failure on text
pub(crate) fn length_message(value: &str, min: usize, max: usize) -> String {
    let len = value.trim().chars().count();
    if len == 0 {
        REQUIRED.to_string()
    } else if len < min {
        format!("Must be at least {} characters.", min)
    } else {
        format!("Must be at most {} characters.", max)
    }
}

/// Shared validator for titles and names; the trimmed value is what gets sent
pub(crate) fn validate_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Err(ValidationError::new("required"))
    } else if !(NAME_MIN..=NAME_MAX).contains(&len) {
        Err(ValidationError::new("length"))
    } else {
        Ok(())
    }
}

/// Shared validator for required ISO dates
pub(crate) fn validate_required_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    validate_optional_date(value)
}

/// Shared validator for optional ISO dates
pub(crate) fn validate_optional_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_date"))
}

/// Message for a date validator failure
pub(crate) fn date_message(error: &ValidationError) -> String {
    match error.code.as_ref() {
        "required" => REQUIRED.to_string(),
        _ => INVALID_DATE.to_string(),
    }
}
