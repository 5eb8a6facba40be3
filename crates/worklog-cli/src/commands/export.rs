//! CSV export of all recorded entries.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use worklog_core::{Config, Database, SessionEngine};

pub fn run(user: &str, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let engine = SessionEngine::new(db, config.defaults.clone());
    let export = engine.export(user)?;

    let path = output.unwrap_or_else(|| PathBuf::from(&config.export_filename));
    let mut file = std::fs::File::create(&path)?;
    for row in &export.rows {
        let cells: Vec<String> = row.iter().map(|cell| quote_csv(cell)).collect();
        writeln!(file, "{}", cells.join(","))?;
    }

    println!("Exported {} entries to {}", export.rows.len() - 1, path.display());
    Ok(())
}

/// RFC 4180 quoting: cells with commas, quotes or line breaks are
/// wrapped in double quotes, with inner quotes doubled.
fn quote_csv(cell: &str) -> String {
    let needs_quotes = cell.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r'));
    if needs_quotes {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_cells_pass_through() {
        assert_eq!(quote_csv("Work"), "Work");
        assert_eq!(quote_csv("01-01-1970 00:00"), "01-01-1970 00:00");
    }

    #[test]
    fn special_cells_are_quoted() {
        assert_eq!(quote_csv("a,b"), "\"a,b\"");
        assert_eq!(quote_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_csv("line\nbreak"), "\"line\nbreak\"");
    }
}
