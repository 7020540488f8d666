// Form input validation and the create/edit state machine

use crate::backend::Backend;
use crate::error::{ParseError, StoreError, SubmitError};
use crate::record::Record;
use crate::store::{Mutation, RecordStore};
use chrono::{NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::str::FromStr;
use tracing::debug;

/// Raw text of each input widget, keyed by field name
pub type RawFields = BTreeMap<String, String>;

/// Build `RawFields` from `(name, value)` pairs
pub fn raw_fields<I, K, V>(pairs: I) -> RawFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Why a single field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooShort { min: usize },
    InThePast,
    NotANumber,
    Invalid(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required => write!(f, "required"),
            FieldError::TooShort { min } => write!(f, "too short (minimum {} characters)", min),
            FieldError::InThePast => write!(f, "in the past"),
            FieldError::NotANumber => write!(f, "not a number"),
            FieldError::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

/// Field name -> error, one entry per rejected field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, error: FieldError) {
        self.0.insert(field.to_string(), error);
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, err)| format!("{}: {}", field, err)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// What the validator needs to know about the submission
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    /// True for create submissions; past deadlines are only rejected then
    pub creating: bool,
    pub now: NaiveDateTime,
}

/// Per-variant mapping between form fields and records
pub trait FormSchema: Record {
    /// Validate every field independently and either build a payload or
    /// report all failing fields at once
    fn validate(raw: &RawFields, ctx: &ValidationContext) -> Result<Self::Payload, FieldErrors>;

    /// Field values that pre-fill the form when editing this record
    fn prefill(&self) -> RawFields;
}

/// Reads fields one by one, accumulating errors instead of stopping at the first
pub struct FieldReader<'a> {
    raw: &'a RawFields,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(raw: &'a RawFields) -> Self {
        Self {
            raw,
            errors: FieldErrors::default(),
        }
    }

    fn trimmed(&self, name: &str) -> &'a str {
        self.raw.get(name).map(|v| v.trim()).unwrap_or("")
    }

    /// Required text, trimmed; `min_len` counts characters
    pub fn text(&mut self, name: &str, min_len: usize) -> Option<String> {
        let value = self.trimmed(name);
        if value.is_empty() {
            self.errors.insert(name, FieldError::Required);
            return None;
        }
        if value.chars().count() < min_len {
            self.errors.insert(name, FieldError::TooShort { min: min_len });
            return None;
        }
        Some(value.to_string())
    }

    /// Optional text; blank input becomes `None`
    pub fn optional_text(&self, name: &str) -> Option<String> {
        let value = self.trimmed(name);
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Required date-time; when `not_before` is set, earlier values are rejected
    pub fn datetime(&mut self, name: &str, not_before: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        let value = self.trimmed(name);
        if value.is_empty() {
            self.errors.insert(name, FieldError::Required);
            return None;
        }
        let Some(parsed) = parse_datetime(value) else {
            self.errors
                .insert(name, FieldError::Invalid("expected YYYY-MM-DDTHH:MM".to_string()));
            return None;
        };
        if not_before.is_some_and(|now| parsed < now) {
            self.errors.insert(name, FieldError::InThePast);
            return None;
        }
        Some(parsed)
    }

    /// Required `HH:MM` time of day
    pub fn time(&mut self, name: &str) -> Option<NaiveTime> {
        let value = self.trimmed(name);
        if value.is_empty() {
            self.errors.insert(name, FieldError::Required);
            return None;
        }
        match parse_time(value) {
            Some(time) => Some(time),
            None => {
                self.errors.insert(name, FieldError::Invalid("expected HH:MM".to_string()));
                None
            }
        }
    }

    /// Required integer inside `range`
    pub fn integer(&mut self, name: &str, range: RangeInclusive<i64>) -> Option<i64> {
        let value = self.trimmed(name);
        if value.is_empty() {
            self.errors.insert(name, FieldError::Required);
            return None;
        }
        match value.parse::<i64>() {
            Ok(n) if range.contains(&n) => Some(n),
            Ok(_) => {
                self.errors.insert(
                    name,
                    FieldError::Invalid(format!("must be between {} and {}", range.start(), range.end())),
                );
                None
            }
            Err(_) => {
                self.errors.insert(name, FieldError::NotANumber);
                None
            }
        }
    }

    /// Required value parsed with `FromStr`
    pub fn parsed<T>(&mut self, name: &str) -> Option<T>
    where
        T: FromStr<Err = ParseError>,
    {
        let value = self.trimmed(name);
        if value.is_empty() {
            self.errors.insert(name, FieldError::Required);
            return None;
        }
        self.parse_value(name, value)
    }

    /// Optional value parsed with `FromStr`, `default` when blank
    pub fn parsed_or<T>(&mut self, name: &str, default: T) -> Option<T>
    where
        T: FromStr<Err = ParseError>,
    {
        let value = self.trimmed(name);
        if value.is_empty() {
            return Some(default);
        }
        self.parse_value(name, value)
    }

    fn parse_value<T>(&mut self, name: &str, value: &str) -> Option<T>
    where
        T: FromStr<Err = ParseError>,
    {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.errors.insert(name, FieldError::Invalid(e.to_string()));
                None
            }
        }
    }

    /// Fail with every accumulated error, or assemble the payload
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }
}

/// Parse `YYYY-MM-DDTHH:MM`, with optional seconds and a space separator
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parse `HH:MM`, with optional seconds
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Whether the form creates a new record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(String),
}

/// Form state shared by every variant: the create/edit mode and the
/// record awaiting delete confirmation
#[derive(Debug)]
pub struct FormSession<R: FormSchema> {
    mode: FormMode,
    pending_delete: Option<String>,
    _record: PhantomData<R>,
}

impl<R: FormSchema> Default for FormSession<R> {
    fn default() -> Self {
        Self {
            mode: FormMode::Create,
            pending_delete: None,
            _record: PhantomData,
        }
    }
}

impl<R: FormSchema> FormSession<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Switch to edit mode for `id` and return the pre-filled fields
    pub fn begin_edit<B: Backend>(&mut self, store: &RecordStore<R, B>, id: &str) -> Result<RawFields, StoreError> {
        let record = store.get(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let fields = record.prefill();
        self.mode = FormMode::Edit(id.to_string());
        debug!(collection = R::collection_name(), id, "form entered edit mode");
        Ok(fields)
    }

    /// Discard in-progress edits and return to create mode
    pub fn cancel_edit(&mut self) {
        if let FormMode::Edit(id) = &self.mode {
            debug!(collection = R::collection_name(), id = id.as_str(), "edit cancelled");
        }
        self.mode = FormMode::Create;
    }

    /// Validate `raw` and create or update depending on the current mode.
    ///
    /// A successful edit returns the form to create mode; a rejected one
    /// stays in edit mode so the user can correct the fields.
    pub fn submit<B: Backend>(
        &mut self,
        store: &mut RecordStore<R, B>,
        raw: &RawFields,
    ) -> Result<Mutation<R>, SubmitError> {
        match self.mode.clone() {
            FormMode::Create => submit_create(store, raw),
            FormMode::Edit(id) => {
                let result = submit_update(store, &id, raw);
                if !matches!(result, Err(SubmitError::Invalid(_))) {
                    self.mode = FormMode::Create;
                }
                result
            }
        }
    }

    /// Park `id` in the confirmation slot
    pub fn request_delete<B: Backend>(&mut self, store: &RecordStore<R, B>, id: &str) -> Result<(), StoreError> {
        if store.get(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.pending_delete = Some(id.to_string());
        Ok(())
    }

    /// Delete the parked record; `Ok(None)` when nothing was parked
    pub fn confirm_delete<B: Backend>(&mut self, store: &mut RecordStore<R, B>) -> Result<Option<Mutation<R>>, StoreError> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };
        let mutation = store.delete(&id)?;
        self.forget(&id);
        Ok(Some(mutation))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete `id` without the confirmation step
    pub fn delete<B: Backend>(&mut self, store: &mut RecordStore<R, B>, id: &str) -> Result<Mutation<R>, StoreError> {
        let mutation = store.delete(id)?;
        self.forget(id);
        Ok(mutation)
    }

    /// Drop every reference the form holds to a deleted record
    fn forget(&mut self, id: &str) {
        if self.pending_delete.as_deref() == Some(id) {
            self.pending_delete = None;
        }
        if matches!(&self.mode, FormMode::Edit(editing) if editing == id) {
            debug!(collection = R::collection_name(), id, "edited record deleted, back to create mode");
            self.mode = FormMode::Create;
        }
    }
}

/// Validate as a new record and create it
pub fn submit_create<R: FormSchema, B: Backend>(
    store: &mut RecordStore<R, B>,
    raw: &RawFields,
) -> Result<Mutation<R>, SubmitError> {
    let ctx = ValidationContext {
        creating: true,
        now: store.clock().now_local(),
    };
    let payload = R::validate(raw, &ctx).map_err(SubmitError::Invalid)?;
    Ok(store.create(payload))
}

/// Validate as an edit of `id` and apply every field to it
pub fn submit_update<R: FormSchema, B: Backend>(
    store: &mut RecordStore<R, B>,
    id: &str,
    raw: &RawFields,
) -> Result<Mutation<R>, SubmitError> {
    if store.get(id).is_none() {
        return Err(StoreError::NotFound(id.to_string()).into());
    }
    let ctx = ValidationContext {
        creating: false,
        now: store.clock().now_local(),
    };
    let payload = R::validate(raw, &ctx).map_err(SubmitError::Invalid)?;
    Ok(store.update(id, R::Patch::from(payload))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_fields() -> RawFields {
        raw_fields([
            ("short", "ab"),
            ("blank", "   "),
            ("ok", "  Clean Code  "),
            ("num", "90"),
            ("nan", "ninety"),
            ("when", "2025-01-10T09:30"),
            ("clock", "07:45"),
        ])
    }

    #[test]
    fn test_text_rules() {
        let raw = reader_fields();
        let mut reader = FieldReader::new(&raw);
        assert_eq!(reader.text("ok", 3), Some("Clean Code".to_string()));
        assert_eq!(reader.text("short", 3), None);
        assert_eq!(reader.text("blank", 3), None);
        assert_eq!(reader.text("missing", 3), None);
        let errors = reader.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("short"), Some(&FieldError::TooShort { min: 3 }));
        assert_eq!(errors.get("blank"), Some(&FieldError::Required));
        assert_eq!(errors.get("missing"), Some(&FieldError::Required));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_numbers_and_times() {
        let raw = reader_fields();
        let mut reader = FieldReader::new(&raw);
        assert_eq!(reader.integer("num", 1..=100), Some(90));
        assert_eq!(reader.integer("nan", 1..=100), None);
        assert_eq!(reader.time("clock"), NaiveTime::from_hms_opt(7, 45, 0));
        assert!(reader.datetime("when", None).is_some());
        let errors = reader.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("nan"), Some(&FieldError::NotANumber));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_datetime_in_the_past() {
        let raw = reader_fields();
        let now = parse_datetime("2025-02-01T00:00").unwrap();
        let mut reader = FieldReader::new(&raw);
        assert_eq!(reader.datetime("when", Some(now)), None);
        let errors = reader.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("when"), Some(&FieldError::InThePast));
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2025-01-10T09:30").is_some());
        assert!(parse_datetime("2025-01-10T09:30:15").is_some());
        assert!(parse_datetime("2025-01-10 09:30").is_some());
        assert!(parse_datetime("10/01/2025").is_none());
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.insert("title", FieldError::TooShort { min: 3 });
        errors.insert("author", FieldError::Required);
        assert_eq!(errors.to_string(), "author: required, title: too short (minimum 3 characters)");
    }

    #[test]
    fn test_finish_ok_without_errors() {
        let raw = reader_fields();
        let mut reader = FieldReader::new(&raw);
        let title = reader.text("ok", 3);
        let payload = reader.finish(|| title).unwrap();
        assert_eq!(payload, "Clean Code");
    }
}
