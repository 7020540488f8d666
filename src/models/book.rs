// Personal book catalog entry

use crate::error::ParseError;
use crate::form::{FieldErrors, FieldReader, FormSchema, RawFields, ValidationContext, raw_fields};
use crate::record::{Record, compare_text};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ownership status, stored with the catalog's Indonesian tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    #[serde(rename = "milik")]
    Owned,
    #[serde(rename = "baca")]
    Reading,
    #[serde(rename = "beli")]
    Wishlist,
}

impl BookStatus {
    pub fn token(self) -> &'static str {
        match self {
            BookStatus::Owned => "milik",
            BookStatus::Reading => "baca",
            BookStatus::Wishlist => "beli",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookStatus::Owned => "Sudah Dimiliki",
            BookStatus::Reading => "Sedang Dibaca",
            BookStatus::Wishlist => "Ingin Dibeli",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for BookStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "milik" | "owned" => Ok(BookStatus::Owned),
            "baca" | "reading" => Ok(BookStatus::Reading),
            "beli" | "wishlist" => Ok(BookStatus::Wishlist),
            _ => Err(ParseError::new("book status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub status: BookStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<BookStatus>,
}

impl From<BookPayload> for BookPatch {
    fn from(p: BookPayload) -> Self {
        Self {
            title: Some(p.title),
            author: Some(p.author),
            status: Some(p.status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSort {
    /// Insertion order
    Created,
    Title,
    Author,
}

impl fmt::Display for BookSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookSort::Created => write!(f, "created"),
            BookSort::Title => write!(f, "title"),
            BookSort::Author => write!(f, "author"),
        }
    }
}

impl FromStr for BookSort {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(BookSort::Created),
            "title" => Ok(BookSort::Title),
            "author" => Ok(BookSort::Author),
            _ => Err(ParseError::new("sort key", s)),
        }
    }
}

impl Record for Book {
    type Payload = BookPayload;
    type Patch = BookPatch;
    type Status = BookStatus;
    type SortKey = BookSort;

    fn collection_name() -> &'static str {
        "books"
    }

    fn from_payload(id: String, created_at: i64, p: BookPayload) -> Self {
        Self {
            id,
            title: p.title,
            author: p.author,
            status: p.status,
            created_at,
            updated_at: None,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    fn apply_patch(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    fn touch(&mut self, at: i64) {
        self.updated_at = Some(at);
    }

    fn status(&self) -> BookStatus {
        self.status
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.author.as_str()]
    }

    fn compare(&self, other: &Self, key: BookSort) -> Ordering {
        match key {
            BookSort::Created => self.created_at.cmp(&other.created_at),
            BookSort::Title => compare_text(&self.title, &other.title),
            BookSort::Author => compare_text(&self.author, &other.author),
        }
    }

    fn default_sort() -> BookSort {
        BookSort::Created
    }
}

impl FormSchema for Book {
    fn validate(raw: &RawFields, _ctx: &ValidationContext) -> Result<BookPayload, FieldErrors> {
        let mut f = FieldReader::new(raw);
        let title = f.text("title", 3);
        let author = f.text("author", 3);
        let status = f.parsed_or("status", BookStatus::Owned);
        f.finish(|| {
            Some(BookPayload {
                title: title?,
                author: author?,
                status: status?,
            })
        })
    }

    fn prefill(&self) -> RawFields {
        raw_fields([
            ("title", self.title.clone()),
            ("author", self.author.clone()),
            ("status", self.status.to_string()),
        ])
    }
}
