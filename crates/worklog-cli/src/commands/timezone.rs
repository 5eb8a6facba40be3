//! Display timezone administration.

use std::error::Error;

use worklog_core::{Config, Database};

pub fn run(user: &str, hours: i64) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    db.set_timezone(user, hours, &config.defaults)?;
    println!("Timezone set to {hours:+} GMT");
    Ok(())
}
