//! Binary entry point: resolve the data directory, start file logging, open
//! the SQLite database and hand the managers to the TUI until the user quits.
use student_records::{logging, run_app, App, AppConfig, Database, Records};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config)?;

    let db = Database::open(&config.db_path)?;
    info!(path = %db.path().display(), "starting student records");

    let mut app = App::new(Records::sqlite(db))?;
    run_app(&mut app)
}
