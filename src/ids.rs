// Record id generation

use crate::clock::now_ms;

/// Produces ids for newly created records
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Millisecond-timestamp ids, bumped when two ids land in the same millisecond
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: i64,
}

impl IdGenerator for TimestampIds {
    fn next_id(&mut self) -> String {
        let candidate = now_ms().max(self.last + 1);
        self.last = candidate;
        candidate.to_string()
    }
}

/// Time-ordered UUIDv7 ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        uuid::Uuid::now_v7().to_string()
    }
}

/// Deterministic `{prefix}-{n}` ids for tests and demos
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("{}-{}", self.prefix, n)
    }
}

impl IdGenerator for Box<dyn IdGenerator> {
    fn next_id(&mut self) -> String {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_timestamp_ids_are_unique_in_a_burst() {
        let mut ids = TimestampIds::default();
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("task");
        assert_eq!(ids.next_id(), "task-1");
        assert_eq!(ids.next_id(), "task-2");
    }

    #[test]
    fn test_uuid_ids_parse() {
        let mut ids = UuidIds;
        let id = ids.next_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }
}
