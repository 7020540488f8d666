// Generic record trait for any storable collection entry

use crate::error::ParseError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + PartialEq {
    /// Validated field set for a new record
    type Payload: Clone + Debug;

    /// Partial field set for an update; `None` leaves the field untouched
    type Patch: Clone + Debug + Default + From<Self::Payload>;

    /// Value the status filter matches against
    type Status: Copy + Eq + Debug + Display + FromStr<Err = ParseError>;

    /// Keys the view can be sorted by
    type SortKey: Copy + Eq + Debug + Display + FromStr<Err = ParseError>;

    /// Collection name for this record type (e.g., "tasks", "books").
    /// This is the single durable-storage key holding the whole collection.
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Build a fresh record from a validated payload
    fn from_payload(id: String, created_at: i64, payload: Self::Payload) -> Self;

    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Creation timestamp (milliseconds since epoch), immutable
    fn created_at(&self) -> i64;

    /// Timestamp of the last update, `None` until the first one
    fn updated_at(&self) -> Option<i64>;

    /// Merge the fields present in `patch` into this record
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Stamp `updated_at`
    fn touch(&mut self, at: i64);

    fn status(&self) -> Self::Status;

    /// Text fields searched by the view, in display order
    fn searchable_text(&self) -> Vec<&str>;

    /// Ordering of two records under `key`
    fn compare(&self, other: &Self, key: Self::SortKey) -> Ordering;

    fn default_sort() -> Self::SortKey
    where
        Self: Sized;

    /// Flip a boolean field, returning its new value, or `None` when the
    /// record has no such field
    fn toggle_flag(&mut self, _field: &str) -> Option<bool> {
        None
    }
}

/// Case-insensitive text ordering with a case-sensitive tie-break, so
/// "apple" sorts next to "Apple" rather than after "Zebra"
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_text_ignores_case_first() {
        let mut names = vec!["zebra", "Apple", "banana", "apple"];
        names.sort_by(|a, b| compare_text(a, b));
        assert_eq!(names, vec!["Apple", "apple", "banana", "zebra"]);
    }

    #[test]
    fn test_compare_text_equal() {
        assert_eq!(compare_text("Clean Code", "Clean Code"), Ordering::Equal);
    }
}
