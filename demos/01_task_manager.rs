//! Example 01: Task Manager
//!
//! This example walks through the assignment tracker: creating tasks from
//! form fields, handling validation errors, toggling completion, and
//! filtering, searching and sorting the list.
//!
//! Run with: cargo run --example 01_task_manager

use eyre::{Result, eyre};
use recordkeeper::models::{Task, TaskSort, TaskState};
use recordkeeper::stats::TaskStats;
use recordkeeper::{Command, Controller, FileBackend, FixedClock, Outcome, RecordStore, StatusFilter, raw_fields};
use std::rc::Rc;

fn main() -> Result<()> {
    // Create a temporary directory for this example
    let temp_dir = tempfile::tempdir()?;
    let clock = Rc::new(FixedClock::at("2025-03-01T08:00").ok_or_else(|| eyre!("bad demo clock time"))?);

    println!("RecordKeeper Task Manager Example");
    println!("=================================\n");
    println!("Data path: {}\n", temp_dir.path().display());

    let store: RecordStore<Task, _> = RecordStore::open(FileBackend::open(temp_dir.path())?).with_clock(clock.clone());
    let mut app = Controller::new(store);

    // CREATE: add tasks through the form
    println!("1. CREATE - Adding tasks...");
    for (name, subject, deadline) in [
        ("Laporan Praktikum", "Pemrograman Web", "2025-03-01T20:00"),
        ("Esai Etika", "Filsafat", "2025-03-06T23:59"),
        ("Kuis Basis Data", "Basis Data", "2025-03-20T10:00"),
    ] {
        let outcome = app.dispatch(Command::Create(raw_fields([
            ("name", name),
            ("subject", subject),
            ("deadline", deadline),
        ])));
        if let Outcome::Created(m) = outcome {
            println!("   Created {} ({})", m.record.name, m.record.id);
        }
    }
    println!();

    // VALIDATION: every bad field is reported at once
    println!("2. VALIDATION - Submitting a bad form...");
    let outcome = app.dispatch(Command::Create(raw_fields([
        ("name", "ab"),
        ("subject", ""),
        ("deadline", "2025-02-01T08:00"),
    ])));
    if let Outcome::Rejected(errors) = outcome {
        for (field, error) in errors.iter() {
            println!("   - {}: {}", field, error);
        }
    }
    println!("   Tasks stored: {}\n", app.store().len());

    // URGENCY: deadlines relative to the clock
    println!("3. URGENCY - Deadline hints...");
    let now = app.store().clock().now_local();
    for task in app.view() {
        println!(
            "   {:<20} {:<10} {}",
            task.name,
            task.urgency(now).to_string(),
            task.deadline_hint(now).unwrap_or_default()
        );
    }
    println!();

    // TOGGLE: mark the first task done
    println!("4. TOGGLE - Completing the most urgent task...");
    let first = app.view()[0].id.clone();
    app.dispatch(Command::ToggleFlag(first, "completed".to_string()));
    println!("   {:?}\n", TaskStats::of(app.store().list()));

    // VIEW: filter, search and sort
    println!("5. VIEW - Incomplete tasks sorted by name...");
    app.dispatch(Command::Filter(StatusFilter::Only(TaskState::Incomplete)));
    app.dispatch(Command::Sort(TaskSort::Name));
    for task in app.view() {
        println!("   - {} ({})", task.name, task.subject);
    }
    app.dispatch(Command::Filter(StatusFilter::All));
    app.dispatch(Command::Search("basis".to_string()));
    println!("   Search 'basis': {} match(es)\n", app.view().len());

    // RELOAD: everything was written to disk
    println!("6. RELOAD - Reopening the store...");
    let reopened: RecordStore<Task, _> = RecordStore::open(FileBackend::open(temp_dir.path())?);
    println!("   Tasks on disk: {}\n", reopened.len());

    println!("Example complete!");
    Ok(())
}
