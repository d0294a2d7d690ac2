//! Binary entry point that glues the verse store to the TUI. The
//! bootstrapping pipeline is deliberately explicit: open the selected
//! backend, run the one-shot backfill migration, load the collection, wire
//! up the persisted cursor, and drive the Ratatui event loop until the user
//! exits.
use verse_keeper::{open_default_store, run_app, App, FileCursorSlot};

/// Initialize persistence, load the verse collection, and launch the TUI.
///
/// Returning a `Result` bubbles up fatal initialization problems (an
/// unreadable data directory, a malformed verse document) to the terminal
/// instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let mut store = open_default_store()?;

    // Explicit migration pass: loads stay side-effect-free because repairs
    // happen here, once, before the collection is read.
    let repaired = store.backfill()?;

    let verses = store.load()?;
    let cursor_slot = FileCursorSlot::in_data_dir()?;

    let mut app = App::new(store, verses, Box::new(cursor_slot));
    if repaired > 0 {
        app.flash_info(format!("Backfilled {repaired} verse record(s)."));
    }
    run_app(&mut app)
}
