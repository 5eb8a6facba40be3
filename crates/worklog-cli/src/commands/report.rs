//! Per-project totals, as the summary text or as JSON.

use std::error::Error;

use worklog_core::report;
use worklog_core::Database;

pub fn run(user: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let db = Database::open()?;
    let entries = db.list_logs(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report::aggregate(&entries))?);
    } else {
        print!("{}", report::summary_text(&entries));
    }
    Ok(())
}
