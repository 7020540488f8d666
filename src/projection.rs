// Filtered, searched and sorted views over a record list

use crate::error::ParseError;
use crate::record::Record;
use std::fmt;
use std::str::FromStr;

/// Status filter: everything, or one status value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter<S> {
    All,
    Only(S),
}

impl<S> StatusFilter<S>
where
    S: PartialEq,
{
    pub fn matches(&self, status: &S) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl<S: fmt::Display> fmt::Display for StatusFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Only(s) => write!(f, "{}", s),
        }
    }
}

impl<S: FromStr<Err = ParseError>> FromStr for StatusFilter<S> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

/// View parameters for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query<R: Record> {
    pub status: StatusFilter<R::Status>,
    pub search: String,
    pub sort: R::SortKey,
}

impl<R: Record> Default for Query<R> {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            search: String::new(),
            sort: R::default_sort(),
        }
    }
}

impl<R: Record> Query<R> {
    pub fn status(mut self, status: StatusFilter<R::Status>) -> Self {
        self.status = status;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn sort(mut self, key: R::SortKey) -> Self {
        self.sort = key;
        self
    }
}

/// Apply the status filter, then the search, then a stable sort.
///
/// Search is a case-insensitive substring match against any searchable
/// field; a blank term matches everything. Records that compare equal keep
/// their input order.
pub fn project<'a, R: Record>(records: &'a [R], query: &Query<R>) -> Vec<&'a R> {
    let needle = query.search.trim().to_lowercase();

    let mut view: Vec<&R> = records
        .iter()
        .filter(|r| query.status.matches(&r.status()))
        .filter(|r| needle.is_empty() || matches_search(*r, &needle))
        .collect();

    view.sort_by(|a, b| a.compare(b, query.sort));
    view
}

fn matches_search<R: Record>(record: &R, needle: &str) -> bool {
    record
        .searchable_text()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::parse_datetime;
    use crate::models::{Book, BookSort, BookStatus, Day, Schedule, Task, TaskSort, TaskState};
    use chrono::NaiveTime;

    fn book(id: &str, title: &str, author: &str, status: BookStatus, created_at: i64) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            status,
            created_at,
            updated_at: None,
        }
    }

    fn books() -> Vec<Book> {
        vec![
            book("1", "Effective Java", "Joshua Bloch", BookStatus::Reading, 1),
            book("2", "Clean Code", "Robert Martin", BookStatus::Owned, 2),
            book("3", "clean architecture", "Robert Martin", BookStatus::Wishlist, 3),
            book("4", "Refactoring", "Martin Fowler", BookStatus::Owned, 4),
        ]
    }

    fn ids<R: Record>(view: &[&R]) -> Vec<String> {
        view.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_all_is_a_sorted_permutation() {
        let records = books();
        let view = project(&records, &Query::<Book>::default().sort(BookSort::Title));
        assert_eq!(view.len(), records.len());
        assert_eq!(ids(&view), vec!["3", "2", "1", "4"]);
        for pair in view.windows(2) {
            assert_ne!(pair[0].compare(pair[1], BookSort::Title), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let records = books();
        let view = project(&records, &Query::<Book>::default().search("clean"));
        assert_eq!(ids(&view), vec!["2", "3"]);
        assert!(view.iter().all(|b| b.title != "Effective Java"));

        // Authors are searchable too
        let view = project(&records, &Query::<Book>::default().search("FOWLER"));
        assert_eq!(ids(&view), vec!["4"]);
    }

    #[test]
    fn test_blank_search_matches_all() {
        let records = books();
        let view = project(&records, &Query::<Book>::default().search("   "));
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_status_filter_and_search_combine() {
        let records = books();
        let query = Query::<Book>::default()
            .status(StatusFilter::Only(BookStatus::Owned))
            .search("martin");
        let view = project(&records, &query);
        assert_eq!(ids(&view), vec!["2", "4"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let records = books();
        // Both Robert Martin books tie on author and keep input order
        let view = project(&records, &Query::<Book>::default().sort(BookSort::Author));
        assert_eq!(ids(&view), vec!["1", "4", "2", "3"]);
    }

    #[test]
    fn test_input_is_untouched() {
        let records = books();
        let before = records.clone();
        let _ = project(&records, &Query::<Book>::default().sort(BookSort::Title));
        assert_eq!(records, before);
    }

    #[test]
    fn test_schedule_day_filter() {
        let make = |id: &str, day: Day| Schedule {
            id: id.to_string(),
            course_name: "Basis Data".to_string(),
            lecturer: "Ibu Sari".to_string(),
            day,
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            room: "A1".to_string(),
            duration: 100,
            created_at: 0,
            updated_at: None,
        };
        let records = vec![make("a", Day::Senin), make("b", Day::Jumat)];
        let query = Query::<Schedule>::default().status("Senin".parse().unwrap());
        let view = project(&records, &query);
        assert_eq!(ids(&view), vec!["a"]);
    }

    #[test]
    fn test_task_deadline_sort_and_completion_filter() {
        let make = |id: &str, deadline: &str, completed: bool| Task {
            id: id.to_string(),
            name: format!("Tugas {}", id),
            subject: "Web".to_string(),
            deadline: parse_datetime(deadline).unwrap(),
            description: Some("kelompok".to_string()),
            completed,
            created_at: 0,
            updated_at: None,
        };
        let records = vec![
            make("late", "2025-03-09T10:00", false),
            make("soon", "2025-03-02T10:00", false),
            make("done", "2025-03-01T10:00", true),
        ];

        let view = project(&records, &Query::<Task>::default());
        assert_eq!(ids(&view), vec!["done", "soon", "late"]);

        let query = Query::<Task>::default().status(StatusFilter::Only(TaskState::Incomplete));
        assert_eq!(ids(&project(&records, &query)), vec!["soon", "late"]);

        // Description is searchable
        let query = Query::<Task>::default().search("KELOMPOK").sort(TaskSort::Name);
        assert_eq!(project(&records, &query).len(), 3);
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter<BookStatus>>().unwrap(), StatusFilter::All);
        assert_eq!(
            "baca".parse::<StatusFilter<BookStatus>>().unwrap(),
            StatusFilter::Only(BookStatus::Reading)
        );
        assert!("nope".parse::<StatusFilter<BookStatus>>().is_err());
        assert_eq!(StatusFilter::Only(Day::Rabu).to_string(), "Rabu");
    }
}
