//! Per-user settings.

use serde::{Deserialize, Serialize};

/// Seed values for first-contact profiles, normally taken from
/// [`Config`](crate::storage::Config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDefaults {
    #[serde(default = "default_timezone")]
    pub timezone: i64,
    #[serde(default = "default_projects")]
    pub projects: Vec<String>,
}

fn default_timezone() -> i64 {
    0
}

fn default_projects() -> Vec<String> {
    vec![
        "Work".to_string(),
        "Sport".to_string(),
        "Education".to_string(),
        "Portfolio".to_string(),
    ]
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            projects: default_projects(),
        }
    }
}

/// A user's settings: display timezone offset in whole hours and the
/// project list offered by the record chooser, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub timezone: i64,
    pub projects: Vec<String>,
}

impl UserProfile {
    pub fn with_defaults(user_id: &str, defaults: &ProfileDefaults) -> Self {
        Self {
            user_id: user_id.to_string(),
            timezone: defaults.timezone,
            projects: defaults.projects.clone(),
        }
    }

    /// Exact, case-sensitive membership test.
    pub fn has_project(&self, name: &str) -> bool {
        self.projects.iter().any(|p| p == name)
    }

    /// Append `name` unless already present. Returns whether it was added.
    pub fn add_project(&mut self, name: &str) -> bool {
        if self.has_project(name) {
            return false;
        }
        self.projects.push(name.to_string());
        true
    }

    /// Drop `name` from the list. Returns whether it was present.
    pub fn remove_project(&mut self, name: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p != name);
        self.projects.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_the_standard_projects() {
        let profile = UserProfile::with_defaults("u1", &ProfileDefaults::default());
        assert_eq!(profile.timezone, 0);
        assert_eq!(profile.projects, ["Work", "Sport", "Education", "Portfolio"]);
    }

    #[test]
    fn add_project_is_case_sensitive_and_dedupes() {
        let mut profile = UserProfile::with_defaults("u1", &ProfileDefaults::default());
        assert!(!profile.add_project("Work"));
        assert!(profile.add_project("work"));
        assert_eq!(profile.projects.len(), 5);
    }

    #[test]
    fn remove_project_keeps_the_order_of_the_rest() {
        let mut profile = UserProfile::with_defaults("u1", &ProfileDefaults::default());
        assert!(profile.remove_project("Sport"));
        assert!(!profile.remove_project("Sport"));
        assert_eq!(profile.projects, ["Work", "Education", "Portfolio"]);
    }
}
