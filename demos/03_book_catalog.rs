//! Example 03: Book Catalog
//!
//! This example keeps a personal book list: statuses, the delete
//! confirmation step, per-status views and catalog statistics.
//!
//! Run with: cargo run --example 03_book_catalog

use eyre::Result;
use recordkeeper::models::{Book, BookSort, BookStatus};
use recordkeeper::stats::BookStats;
use recordkeeper::{Command, Controller, FileBackend, Outcome, RecordStore, StatusFilter, raw_fields};

fn main() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;

    println!("RecordKeeper Book Catalog Example");
    println!("=================================\n");

    let store: RecordStore<Book, _> = RecordStore::open(FileBackend::open(temp_dir.path())?);
    let mut app = Controller::new(store);

    println!("1. CREATE - Cataloguing books...");
    for (title, author, status) in [
        ("Clean Code", "Robert Martin", "milik"),
        ("The Pragmatic Programmer", "Andrew Hunt", "baca"),
        ("Clean Architecture", "Robert Martin", "beli"),
        ("Refactoring", "Martin Fowler", "milik"),
    ] {
        app.dispatch(Command::Create(raw_fields([
            ("title", title),
            ("author", author),
            ("status", status),
        ])));
    }
    for book in app.view() {
        println!("   - {} by {} [{}]", book.title, book.author, book.status.label());
    }
    println!();

    println!("2. VIEW - Owned books by title...");
    app.dispatch(Command::Filter(StatusFilter::Only(BookStatus::Owned)));
    app.dispatch(Command::Sort(BookSort::Title));
    for book in app.view() {
        println!("   - {}", book.title);
    }
    app.dispatch(Command::Filter(StatusFilter::All));
    println!();

    println!("3. DELETE - With confirmation...");
    let id = app.store().list()[0].id.clone();
    app.dispatch(Command::RequestDelete(id.clone()));
    println!("   Pending: {:?}", app.pending_delete());
    app.dispatch(Command::CancelDelete);
    println!("   Cancelled, books: {}", app.store().len());
    app.dispatch(Command::RequestDelete(id));
    if let Outcome::Deleted(m) = app.dispatch(Command::ConfirmDelete) {
        println!("   Deleted '{}', books: {}\n", m.record.title, app.store().len());
    }

    println!("4. STATS - Catalog summary...");
    let stats = BookStats::of(app.store().list());
    println!(
        "   total {} / owned {} ({}%) / reading {} ({}%) / wishlist {} ({}%)",
        stats.total,
        stats.owned,
        stats.owned_percentage,
        stats.reading,
        stats.reading_percentage,
        stats.wishlist,
        stats.wishlist_percentage
    );
    println!("   Most common author: {}\n", stats.most_common_author.unwrap_or_default());

    println!("Example complete!");
    Ok(())
}
