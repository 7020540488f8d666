// Data models for the three collections

mod book;
mod schedule;
mod task;

pub use book::{Book, BookPatch, BookPayload, BookSort, BookStatus};
pub use schedule::{Day, MAX_DURATION, Schedule, SchedulePatch, SchedulePayload, ScheduleSort};
pub use task::{Task, TaskPatch, TaskPayload, TaskSort, TaskState, Urgency};
