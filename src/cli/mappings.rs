use std::path::Path;

use comfy_table::{Cell, Table};

use crate::categorizer::{list_mappings, CategoryEngine};
use crate::cli::open_db;
use crate::error::{FlorinError, Result};
use crate::models::Category;
use crate::settings::load_settings;

pub fn learn(data_dir: &Path, substring: &str, category: &str) -> Result<()> {
    let category = Category::new(category);
    if category.is_unknown() {
        return Err(FlorinError::Other("Category cannot be empty".to_string()));
    }
    let conn = open_db(data_dir)?;
    let engine = CategoryEngine::from_settings(&load_settings());
    engine.learn(&conn, substring, &category)?;
    println!("Descriptions containing {substring:?} will be categorized as {category}");
    Ok(())
}

pub fn list(data_dir: &Path) -> Result<()> {
    let conn = open_db(data_dir)?;
    let mappings = list_mappings(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Substring", "Category"]);
    for mapping in mappings {
        table.add_row(vec![
            Cell::new(mapping.id),
            Cell::new(mapping.description_substring),
            Cell::new(mapping.category.to_string()),
        ]);
    }
    println!("Learned mappings\n{table}");
    Ok(())
}
