// Aggregate counts shown by the summary widgets

use crate::models::{Book, BookStatus, Day, Schedule, Task};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
}

impl TaskStats {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            completed,
            incomplete: tasks.len() - completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    pub total: usize,
    /// Classes held on `today`
    pub today: usize,
}

impl ScheduleStats {
    pub fn of(schedules: &[Schedule], today: Day) -> Self {
        Self {
            total: schedules.len(),
            today: schedules.iter().filter(|s| s.day == today).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStats {
    pub total: usize,
    pub owned: usize,
    pub reading: usize,
    pub wishlist: usize,
    /// Percentages rounded to one decimal, 0 for an empty catalog
    pub owned_percentage: f64,
    pub reading_percentage: f64,
    pub wishlist_percentage: f64,
    /// Author with the most books; on equal counts the later author wins
    pub most_common_author: Option<String>,
    /// Books per author, in order of first appearance
    pub author_count: Vec<(String, usize)>,
}

impl BookStats {
    pub fn of(books: &[Book]) -> Self {
        let count = |status: BookStatus| books.iter().filter(|b| b.status == status).count();
        let total = books.len();
        let owned = count(BookStatus::Owned);
        let reading = count(BookStatus::Reading);
        let wishlist = count(BookStatus::Wishlist);

        let mut author_count: Vec<(String, usize)> = Vec::new();
        for book in books {
            match author_count.iter().position(|(author, _)| *author == book.author) {
                Some(i) => author_count[i].1 += 1,
                None => author_count.push((book.author.clone(), 1)),
            }
        }

        let mut most_common_author: Option<(&str, usize)> = None;
        for (author, n) in &author_count {
            if most_common_author.is_none_or(|(_, best)| *n >= best) {
                most_common_author = Some((author.as_str(), *n));
            }
        }

        Self {
            total,
            owned,
            reading,
            wishlist,
            owned_percentage: percentage(owned, total),
            reading_percentage: percentage(reading, total),
            wishlist_percentage: percentage(wishlist, total),
            most_common_author: most_common_author.map(|(author, _)| author.to_string()),
            author_count,
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}
