// Coursework task with a deadline and a completion flag

use crate::error::ParseError;
use crate::form::{FieldReader, FieldErrors, FormSchema, RawFields, ValidationContext, raw_fields};
use crate::record::{Record, compare_text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub deadline: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskPayload {
    pub name: String,
    pub subject: String,
    pub deadline: NaiveDateTime,
    pub description: Option<String>,
}

/// Partial task update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl From<TaskPayload> for TaskPatch {
    // A form edit re-opens the task
    fn from(p: TaskPayload) -> Self {
        Self {
            name: Some(p.name),
            subject: Some(p.subject),
            deadline: Some(p.deadline),
            description: Some(p.description),
            completed: Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Completed,
    Incomplete,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Completed => write!(f, "completed"),
            TaskState::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl FromStr for TaskState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "completed" | "done" => Ok(TaskState::Completed),
            "incomplete" | "pending" => Ok(TaskState::Incomplete),
            _ => Err(ParseError::new("task state", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    Deadline,
    Name,
    Subject,
}

impl fmt::Display for TaskSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSort::Deadline => write!(f, "deadline"),
            TaskSort::Name => write!(f, "name"),
            TaskSort::Subject => write!(f, "subject"),
        }
    }
}

impl FromStr for TaskSort {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deadline" => Ok(TaskSort::Deadline),
            "name" => Ok(TaskSort::Name),
            "subject" => Ok(TaskSort::Subject),
            _ => Err(ParseError::new("sort key", s)),
        }
    }
}

/// How close an unfinished task is to its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue,
    DueSoon,
    Normal,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Overdue => write!(f, "overdue"),
            Urgency::DueSoon => write!(f, "due-soon"),
            Urgency::Normal => write!(f, "normal"),
        }
    }
}

impl Task {
    /// Overdue when past the deadline, due soon inside the last 24 hours.
    /// Completed tasks are never urgent.
    pub fn urgency(&self, now: NaiveDateTime) -> Urgency {
        if self.completed {
            return Urgency::Normal;
        }
        let left = self.deadline - now;
        if left < chrono::Duration::zero() {
            Urgency::Overdue
        } else if left < chrono::Duration::hours(24) && left > chrono::Duration::zero() {
            Urgency::DueSoon
        } else {
            Urgency::Normal
        }
    }

    /// Short relative hint shown next to the deadline
    pub fn deadline_hint(&self, now: NaiveDateTime) -> Option<String> {
        let left = self.deadline - now;
        if left < chrono::Duration::zero() {
            Some(format!("{} days late", (-left).num_days()))
        } else if left < chrono::Duration::hours(24) {
            Some(format!("{} hours left", left.num_hours()))
        } else if left < chrono::Duration::days(7) {
            Some(format!("{} days left", left.num_days()))
        } else {
            None
        }
    }
}

impl Record for Task {
    type Payload = TaskPayload;
    type Patch = TaskPatch;
    type Status = TaskState;
    type SortKey = TaskSort;

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn from_payload(id: String, created_at: i64, p: TaskPayload) -> Self {
        Self {
            id,
            name: p.name,
            subject: p.subject,
            deadline: p.deadline,
            description: p.description,
            completed: false,
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

    fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    fn touch(&mut self, at: i64) {
        self.updated_at = Some(at);
    }

    fn status(&self) -> TaskState {
        if self.completed {
            TaskState::Completed
        } else {
            TaskState::Incomplete
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.subject.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn compare(&self, other: &Self, key: TaskSort) -> Ordering {
        match key {
            TaskSort::Deadline => self.deadline.cmp(&other.deadline),
            TaskSort::Name => compare_text(&self.name, &other.name),
            TaskSort::Subject => compare_text(&self.subject, &other.subject),
        }
    }

    fn default_sort() -> TaskSort {
        TaskSort::Deadline
    }

    fn toggle_flag(&mut self, field: &str) -> Option<bool> {
        match field {
            "completed" => {
                self.completed = !self.completed;
                Some(self.completed)
            }
            _ => None,
        }
    }
}

impl FormSchema for Task {
    fn validate(raw: &RawFields, ctx: &ValidationContext) -> Result<TaskPayload, FieldErrors> {
        let mut f = FieldReader::new(raw);
        let name = f.text("name", 3);
        let subject = f.text("subject", 1);
        // Past deadlines are accepted when editing an existing task
        let deadline = f.datetime("deadline", ctx.creating.then_some(ctx.now));
        let description = f.optional_text("description");
        f.finish(|| {
            Some(TaskPayload {
                name: name?,
                subject: subject?,
                deadline: deadline?,
                description,
            })
        })
    }

    fn prefill(&self) -> RawFields {
        raw_fields([
            ("name", self.name.clone()),
            ("subject", self.subject.clone()),
            ("deadline", self.deadline.format("%Y-%m-%dT%H:%M").to_string()),
            ("description", self.description.clone().unwrap_or_default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldError, parse_datetime};

    fn at(text: &str) -> NaiveDateTime {
        parse_datetime(text).unwrap()
    }

    fn task(deadline: &str, completed: bool) -> Task {
        Task {
            id: "1".to_string(),
            name: "Laporan Praktikum".to_string(),
            subject: "Pemrograman Web".to_string(),
            deadline: at(deadline),
            description: Some("Bab 1 sampai 3".to_string()),
            completed,
            created_at: 1000,
            updated_at: None,
        }
    }

    fn ctx(creating: bool) -> ValidationContext {
        ValidationContext {
            creating,
            now: at("2025-03-01T08:00"),
        }
    }

    #[test]
    fn test_validate_ok() {
        let raw = raw_fields([
            ("name", " Laporan "),
            ("subject", "Web"),
            ("deadline", "2025-03-05T23:59"),
            ("description", ""),
        ]);
        let payload = Task::validate(&raw, &ctx(true)).unwrap();
        assert_eq!(payload.name, "Laporan");
        assert_eq!(payload.description, None);
        assert_eq!(payload.deadline, at("2025-03-05T23:59"));
    }

    #[test]
    fn test_validate_accumulates_errors() {
        let raw = raw_fields([("name", "ab"), ("subject", "  "), ("deadline", "")]);
        let errors = Task::validate(&raw, &ctx(true)).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), Some(&FieldError::TooShort { min: 3 }));
        assert_eq!(errors.get("subject"), Some(&FieldError::Required));
        assert_eq!(errors.get("deadline"), Some(&FieldError::Required));
    }

    #[test]
    fn test_past_deadline_only_rejected_on_create() {
        let raw = raw_fields([("name", "Laporan"), ("subject", "Web"), ("deadline", "2025-02-01T10:00")]);
        let errors = Task::validate(&raw, &ctx(true)).unwrap_err();
        assert_eq!(errors.get("deadline"), Some(&FieldError::InThePast));
        assert!(Task::validate(&raw, &ctx(false)).is_ok());
    }

    #[test]
    fn test_patch_from_payload_reopens_task() {
        let mut t = task("2025-03-05T10:00", true);
        let payload = TaskPayload {
            name: "Renamed".to_string(),
            subject: "Web".to_string(),
            deadline: at("2025-03-06T10:00"),
            description: None,
        };
        t.apply_patch(TaskPatch::from(payload));
        assert_eq!(t.name, "Renamed");
        assert_eq!(t.description, None);
        assert!(!t.completed);
    }

    #[test]
    fn test_urgency() {
        let now = at("2025-03-01T08:00");
        assert_eq!(task("2025-02-28T08:00", false).urgency(now), Urgency::Overdue);
        assert_eq!(task("2025-03-01T20:00", false).urgency(now), Urgency::DueSoon);
        assert_eq!(task("2025-03-04T08:00", false).urgency(now), Urgency::Normal);
        assert_eq!(task("2025-02-28T08:00", true).urgency(now), Urgency::Normal);
    }

    #[test]
    fn test_deadline_hint() {
        let now = at("2025-03-01T08:00");
        assert_eq!(task("2025-02-26T07:00", false).deadline_hint(now).as_deref(), Some("3 days late"));
        assert_eq!(task("2025-03-01T13:30", false).deadline_hint(now).as_deref(), Some("5 hours left"));
        assert_eq!(task("2025-03-04T09:00", false).deadline_hint(now).as_deref(), Some("3 days left"));
        assert_eq!(task("2025-03-20T09:00", false).deadline_hint(now), None);
    }

    #[test]
    fn test_prefill_roundtrips_through_validate() {
        let t = task("2025-03-05T10:00", false);
        let payload = Task::validate(&t.prefill(), &ctx(false)).unwrap();
        assert_eq!(payload.name, t.name);
        assert_eq!(payload.deadline, t.deadline);
        assert_eq!(payload.description, t.description);
    }

    #[test]
    fn test_status_and_sort_parsing() {
        assert_eq!("Completed".parse::<TaskState>().unwrap(), TaskState::Completed);
        assert_eq!("incomplete".parse::<TaskState>().unwrap(), TaskState::Incomplete);
        assert!("archived".parse::<TaskState>().is_err());
        assert_eq!("subject".parse::<TaskSort>().unwrap(), TaskSort::Subject);
    }
}
