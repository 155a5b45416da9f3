use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh, fully-migrated SQLite database and returns a pooled connection to it. Every
/// call uses a random file under `data/`, so tests run in parallel without seeing each other's
/// rows. The pool holds several connections, the same as production, so tests also exercise
/// cross-connection visibility.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = format!("sqlite://../data/test_icebox_{:016x}", rand::random::<u64>());
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🪛️ Could not drop {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}
