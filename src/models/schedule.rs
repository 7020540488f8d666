// Weekly class schedule entry

use crate::error::ParseError;
use crate::form::{FieldErrors, FieldReader, FormSchema, RawFields, ValidationContext, raw_fields};
use crate::record::{Record, compare_text};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Day of the week, Monday first, with Indonesian names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Senin,
        Day::Selasa,
        Day::Rabu,
        Day::Kamis,
        Day::Jumat,
        Day::Sabtu,
        Day::Minggu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Senin => "Senin",
            Day::Selasa => "Selasa",
            Day::Rabu => "Rabu",
            Day::Kamis => "Kamis",
            Day::Jumat => "Jumat",
            Day::Sabtu => "Sabtu",
            Day::Minggu => "Minggu",
        }
    }

    pub fn of(date: NaiveDateTime) -> Day {
        Day::ALL[date.weekday().num_days_from_monday() as usize]
    }

    /// Current-time line shown above the timetable, e.g. "Senin 07:00:05"
    pub fn clock_label(now: NaiveDateTime) -> String {
        format!("{} {}", Day::of(now), now.format("%H:%M:%S"))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = ParseError;

    /// Indonesian or English day name, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim().to_lowercase().as_str() {
            "senin" | "monday" => Day::Senin,
            "selasa" | "tuesday" => Day::Selasa,
            "rabu" | "wednesday" => Day::Rabu,
            "kamis" | "thursday" => Day::Kamis,
            "jumat" | "friday" => Day::Jumat,
            "sabtu" | "saturday" => Day::Sabtu,
            "minggu" | "sunday" => Day::Minggu,
            _ => return Err(ParseError::new("weekday", s)),
        };
        Ok(day)
    }
}

/// Longest class, in minutes
pub const MAX_DURATION: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub course_name: String,
    pub lecturer: String,
    pub day: Day,
    pub time: NaiveTime,
    pub room: String,
    /// Minutes
    pub duration: u32,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePayload {
    pub course_name: String,
    pub lecturer: String,
    pub day: Day,
    pub time: NaiveTime,
    pub room: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    pub course_name: Option<String>,
    pub lecturer: Option<String>,
    pub day: Option<Day>,
    pub time: Option<NaiveTime>,
    pub room: Option<String>,
    pub duration: Option<u32>,
}

impl From<SchedulePayload> for SchedulePatch {
    fn from(p: SchedulePayload) -> Self {
        Self {
            course_name: Some(p.course_name),
            lecturer: Some(p.lecturer),
            day: Some(p.day),
            time: Some(p.time),
            room: Some(p.room),
            duration: Some(p.duration),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSort {
    /// Weekday, then start time
    Day,
    Course,
    Lecturer,
}

impl fmt::Display for ScheduleSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSort::Day => write!(f, "day"),
            ScheduleSort::Course => write!(f, "course"),
            ScheduleSort::Lecturer => write!(f, "lecturer"),
        }
    }
}

impl FromStr for ScheduleSort {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "time" => Ok(ScheduleSort::Day),
            "course" => Ok(ScheduleSort::Course),
            "lecturer" => Ok(ScheduleSort::Lecturer),
            _ => Err(ParseError::new("sort key", s)),
        }
    }
}

impl Schedule {
    /// Start time plus duration, wrapping past midnight
    pub fn end_time(&self) -> NaiveTime {
        let start = self.time.hour() * 60 + self.time.minute();
        let total = (start + self.duration) % (24 * 60);
        NaiveTime::from_hms_opt(total / 60, total % 60, 0).unwrap_or(self.time)
    }

    /// "`course` - `day` `start` - `end`"
    pub fn summary(&self) -> String {
        format!(
            "{} - {} {} - {}",
            self.course_name,
            self.day,
            self.time.format("%H:%M"),
            self.end_time().format("%H:%M")
        )
    }
}

impl Record for Schedule {
    type Payload = SchedulePayload;
    type Patch = SchedulePatch;
    type Status = Day;
    type SortKey = ScheduleSort;

    fn collection_name() -> &'static str {
        "schedules"
    }

    fn from_payload(id: String, created_at: i64, p: SchedulePayload) -> Self {
        Self {
            id,
            course_name: p.course_name,
            lecturer: p.lecturer,
            day: p.day,
            time: p.time,
            room: p.room,
            duration: p.duration,
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

    fn apply_patch(&mut self, patch: SchedulePatch) {
        if let Some(course_name) = patch.course_name {
            self.course_name = course_name;
        }
        if let Some(lecturer) = patch.lecturer {
            self.lecturer = lecturer;
        }
        if let Some(day) = patch.day {
            self.day = day;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(room) = patch.room {
            self.room = room;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
    }

    fn touch(&mut self, at: i64) {
        self.updated_at = Some(at);
    }

    fn status(&self) -> Day {
        self.day
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.course_name.as_str(), self.lecturer.as_str(), self.room.as_str()]
    }

    fn compare(&self, other: &Self, key: ScheduleSort) -> Ordering {
        match key {
            ScheduleSort::Day => self.day.cmp(&other.day).then(self.time.cmp(&other.time)),
            ScheduleSort::Course => compare_text(&self.course_name, &other.course_name),
            ScheduleSort::Lecturer => compare_text(&self.lecturer, &other.lecturer),
        }
    }

    fn default_sort() -> ScheduleSort {
        ScheduleSort::Day
    }
}

impl FormSchema for Schedule {
    fn validate(raw: &RawFields, _ctx: &ValidationContext) -> Result<SchedulePayload, FieldErrors> {
        let mut f = FieldReader::new(raw);
        let course_name = f.text("course_name", 3);
        let lecturer = f.text("lecturer", 3);
        let day = f.parsed::<Day>("day");
        let time = f.time("time");
        let room = f.text("room", 1);
        let duration = f.integer("duration", 1..=MAX_DURATION).map(|n| n as u32);
        f.finish(|| {
            Some(SchedulePayload {
                course_name: course_name?,
                lecturer: lecturer?,
                day: day?,
                time: time?,
                room: room?,
                duration: duration?,
            })
        })
    }

    fn prefill(&self) -> RawFields {
        raw_fields([
            ("course_name", self.course_name.clone()),
            ("lecturer", self.lecturer.clone()),
            ("day", self.day.to_string()),
            ("time", self.time.format("%H:%M").to_string()),
            ("room", self.room.clone()),
            ("duration", self.duration.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldError, parse_datetime};

    fn schedule(day: Day, time: &str, duration: u32) -> Schedule {
        Schedule {
            id: "1".to_string(),
            course_name: "Pemrograman Web".to_string(),
            lecturer: "Dr. Andi".to_string(),
            day,
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            room: "GK1-201".to_string(),
            duration,
            created_at: 1000,
            updated_at: None,
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext {
            creating: true,
            now: parse_datetime("2025-03-03T08:00").unwrap(),
        }
    }

    #[test]
    fn test_end_time() {
        assert_eq!(schedule(Day::Senin, "08:00", 150).end_time().format("%H:%M").to_string(), "10:30");
        assert_eq!(schedule(Day::Senin, "23:00", 90).end_time().format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            schedule(Day::Rabu, "13:00", 100).summary(),
            "Pemrograman Web - Rabu 13:00 - 14:40"
        );
    }

    #[test]
    fn test_clock_label() {
        let now = parse_datetime("2025-03-07T09:05:03").unwrap();
        assert_eq!(Day::clock_label(now), "Jumat 09:05:03");
    }

    #[test]
    fn test_day_parsing_and_order() {
        assert_eq!("senin".parse::<Day>().unwrap(), Day::Senin);
        assert_eq!("Friday".parse::<Day>().unwrap(), Day::Jumat);
        assert!("Funday".parse::<Day>().is_err());
        assert!(Day::Senin < Day::Jumat);
        assert!(Day::Sabtu < Day::Minggu);
        // 2025-03-03 is a Monday
        assert_eq!(Day::of(parse_datetime("2025-03-03T08:00").unwrap()), Day::Senin);
        assert_eq!(Day::of(parse_datetime("2025-03-09T08:00").unwrap()), Day::Minggu);
    }

    #[test]
    fn test_sort_by_day_then_time() {
        let a = schedule(Day::Selasa, "08:00", 60);
        let b = schedule(Day::Senin, "13:00", 60);
        let c = schedule(Day::Senin, "07:30", 60);
        assert_eq!(a.compare(&b, ScheduleSort::Day), Ordering::Greater);
        assert_eq!(b.compare(&c, ScheduleSort::Day), Ordering::Greater);
    }

    #[test]
    fn test_validate() {
        let raw = raw_fields([
            ("course_name", "Basis Data"),
            ("lecturer", "Ibu Sari"),
            ("day", "Kamis"),
            ("time", "10:00"),
            ("room", "A1"),
            ("duration", "100"),
        ]);
        let payload = Schedule::validate(&raw, &ctx()).unwrap();
        assert_eq!(payload.day, Day::Kamis);
        assert_eq!(payload.duration, 100);
        assert_eq!(payload.room, "A1");
    }

    #[test]
    fn test_validate_reports_every_field() {
        let raw = raw_fields([
            ("course_name", "BD"),
            ("lecturer", ""),
            ("day", "Funday"),
            ("time", "25:00"),
            ("duration", "seratus"),
        ]);
        let errors = Schedule::validate(&raw, &ctx()).unwrap_err();
        assert_eq!(errors.get("course_name"), Some(&FieldError::TooShort { min: 3 }));
        assert_eq!(errors.get("lecturer"), Some(&FieldError::Required));
        assert!(matches!(errors.get("day"), Some(FieldError::Invalid(_))));
        assert!(matches!(errors.get("time"), Some(FieldError::Invalid(_))));
        assert_eq!(errors.get("room"), Some(&FieldError::Required));
        assert_eq!(errors.get("duration"), Some(&FieldError::NotANumber));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut raw = schedule(Day::Senin, "08:00", 60).prefill();
        raw.insert("duration".to_string(), "0".to_string());
        let errors = Schedule::validate(&raw, &ctx()).unwrap_err();
        assert!(matches!(errors.get("duration"), Some(FieldError::Invalid(_))));
    }

    #[test]
    fn test_serialized_day_name() {
        let json = serde_json::to_string(&schedule(Day::Jumat, "08:00", 60)).unwrap();
        assert!(json.contains("\"day\":\"Jumat\""));
        assert!(json.contains("\"time\":\"08:00:00\""));
    }
}
