//! Public HTML forms: parsing, cleaning and accessible rendering data.
//!
//! A form deserializes from the urlencoded body as raw strings, `clean`s
//! into a validated domain value or [`FieldErrors`], and `view`s into a
//! [`FormView`] the templates render field by field.

mod registration;
mod sensitive_data;

pub use registration::*;
pub use sensitive_data::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Choice;
use crate::validation::{FieldErrors, ValidationError};

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub input_type: &'static str,
    /// Extra HTML attributes (autocomplete, inputmode, pattern, ...).
    pub attrs: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Render data of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub id: String,
    pub label: &'static str,
    pub input_type: &'static str,
    pub help: Option<&'static str>,
    pub help_id: String,
    pub error_id: String,
    pub value: String,
    pub checked: bool,
    pub choices: Vec<ChoiceView>,
    pub errors: Vec<String>,
    pub describedby: Option<String>,
    pub invalid: bool,
    pub attrs: Vec<(&'static str, &'static str)>,
}

impl FieldView {
    pub fn new(spec: &FieldSpec, value: &str, errors: &FieldErrors) -> Self {
        let errors = errors.get(spec.name).to_vec();
        let id = format!("id_{}", spec.name);
        Self {
            name: spec.name,
            help_id: format!("{id}-hint"),
            error_id: format!("{id}-error"),
            describedby: aria_describedby(spec.name, spec.help.is_some(), !errors.is_empty()),
            invalid: !errors.is_empty(),
            id,
            label: spec.label,
            input_type: spec.input_type,
            help: spec.help,
            value: value.to_string(),
            checked: false,
            choices: Vec::new(),
            errors,
            attrs: spec.attrs.to_vec(),
        }
    }

    pub fn checkbox(spec: &FieldSpec, checked: bool, errors: &FieldErrors) -> Self {
        Self {
            checked,
            ..Self::new(spec, "", errors)
        }
    }

    pub fn select<T: Choice>(spec: &FieldSpec, value: &str, errors: &FieldErrors) -> Self {
        Self {
            choices: T::ALL
                .iter()
                .map(|c| ChoiceView {
                    value: c.code(),
                    label: c.label(),
                    selected: c.code() == value,
                })
                .collect(),
            ..Self::new(spec, value, errors)
        }
    }
}

/// `aria-describedby` value: the hint id, then the error id, when present.
pub fn aria_describedby(name: &str, has_help: bool, has_error: bool) -> Option<String> {
    let mut ids = Vec::with_capacity(2);
    if has_help {
        ids.push(format!("id_{name}-hint"));
    }
    if has_error {
        ids.push(format!("id_{name}-error"));
    }
    (!ids.is_empty()).then(|| ids.join(" "))
}

/// Everything a template needs to render a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub(crate) fn parse_choice<T: Choice>(raw: &str) -> Result<T, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::required());
    }
    T::parse(raw.trim()).ok_or_else(|| {
        ValidationError::new("Wybierz poprawną wartość. Podana wartość nie jest dostępna.")
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::required());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::new("Wpisz poprawną datę."))
}

/// HTML checkboxes post a value only when ticked.
pub(crate) fn is_checked(raw: &Option<String>) -> bool {
    matches!(raw.as_deref(), Some(v) if !v.is_empty() && v != "off" && v != "false")
}
