use std::path::Path;

use crate::cli::DB_FILE;
use crate::db::{get_connection, init_db, seed_default_budgets};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};

pub fn run(data_dir: &Path, owner: Option<&str>, employer: Option<&str>) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join(DB_FILE);
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let seeded = seed_default_budgets(&conn)?;

    let mut settings = load_settings();
    settings.data_dir = data_dir.to_string_lossy().to_string();
    if let Some(owner) = owner {
        settings.owner_name = owner.to_string();
    }
    if let Some(employer) = employer {
        settings.employer_name = employer.to_string();
    }
    save_settings(&settings)?;

    println!("Initialized database at {}", db_path.display());
    if seeded > 0 {
        println!("Seeded {seeded} default budget categories");
    }
    Ok(())
}
