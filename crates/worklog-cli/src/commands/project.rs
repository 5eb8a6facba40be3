//! Project list administration.

use std::error::Error;

use clap::Subcommand;

use worklog_core::{Config, Database};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project to the chooser
    Add { name: String },
    /// Remove a project (recorded entries are preserved)
    Remove { name: String },
    /// List projects in chooser order
    List,
}

pub fn run(user: &str, action: ProjectAction) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        ProjectAction::Add { name } => {
            if db.add_project(user, &name, &config.defaults)? {
                println!("Added project '{name}'");
            } else {
                println!("Project '{name}' already exists");
            }
        }
        ProjectAction::Remove { name } => {
            if db.remove_project(user, &name, &config.defaults)? {
                println!("Removed project '{name}' (entries are preserved)");
            } else {
                println!("No such project '{name}'");
            }
        }
        ProjectAction::List => {
            for name in db.list_projects(user, &config.defaults)? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
