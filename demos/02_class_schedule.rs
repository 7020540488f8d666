//! Example 02: Class Schedule
//!
//! This example builds a weekly timetable on the SQLite backend, edits a
//! class through the form session, and shows the per-day view.
//!
//! Run with: cargo run --example 02_class_schedule

use eyre::{Result, eyre};
use recordkeeper::models::{Day, Schedule};
use recordkeeper::stats::ScheduleStats;
use recordkeeper::{Command, Controller, FixedClock, Outcome, RecordStore, SqliteBackend, StatusFilter, raw_fields};
use std::rc::Rc;

fn main() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("recordkeeper.db");
    // 2025-03-03 is a Monday
    let clock = Rc::new(FixedClock::at("2025-03-03T07:00").ok_or_else(|| eyre!("bad demo clock time"))?);

    println!("RecordKeeper Class Schedule Example");
    println!("===================================\n");
    println!("Database: {}\n", db_path.display());

    let store: RecordStore<Schedule, _> = RecordStore::open(SqliteBackend::open(&db_path)?).with_clock(clock.clone());
    let mut app = Controller::new(store);

    println!("1. CREATE - Adding classes...");
    for (course, lecturer, day, time, room, duration) in [
        ("Basis Data", "Ibu Sari", "Senin", "08:00", "A1", "100"),
        ("Algoritma", "Pak Budi", "Rabu", "13:00", "B2", "150"),
        ("Jaringan Komputer", "Ibu Rina", "Senin", "10:00", "Lab 3", "120"),
        ("Kalkulus", "Pak Andi", "Jumat", "23:00", "C1", "90"),
    ] {
        let outcome = app.dispatch(Command::Create(raw_fields([
            ("course_name", course),
            ("lecturer", lecturer),
            ("day", day),
            ("time", time),
            ("room", room),
            ("duration", duration),
        ])));
        if let Outcome::Created(m) = outcome {
            println!("   {}", m.record.summary());
        }
    }
    println!();

    println!("2. WEEK - Sorted by day then start time...");
    for class in app.view() {
        println!("   {}", class.summary());
    }
    println!();

    println!("3. EDIT - Moving Algoritma to Kamis...");
    let id = app
        .view()
        .iter()
        .find(|s| s.course_name == "Algoritma")
        .map(|s| s.id.clone())
        .unwrap_or_default();
    if let Outcome::Editing(mut fields) = app.dispatch(Command::BeginEdit(id)) {
        fields.insert("day".to_string(), "Kamis".to_string());
        if let Outcome::Updated(m) = app.dispatch(Command::Submit(fields)) {
            println!("   {}\n", m.record.summary());
        }
    }

    println!("4. TODAY - Classes on Senin...");
    let today = Day::of(app.store().clock().now_local());
    app.dispatch(Command::Filter(StatusFilter::Only(today)));
    for class in app.view() {
        println!("   {}", class.summary());
    }
    println!("   {:?}\n", ScheduleStats::of(app.store().list(), today));

    println!("Example complete!");
    Ok(())
}
