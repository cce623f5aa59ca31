use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Project;

/// Categories inserted by `portfolio seed` into an empty catalog.
pub const DEFAULT_CATEGORIES: &[&str] = &["Web Apps", "Data Science", "Automation"];

/// A named group of projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Unique across all categories, 1 to 50 characters.
    pub name: String,
}

/// Input for creating a new category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// A category with the projects filed under it, used for detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithProjects {
    #[serde(flatten)]
    pub category: Category,
    pub projects: Vec<Project>,
}

/// What happens to projects that still reference a category being deleted.
///
/// - `Restrict`: the delete is refused while any project references it
/// - `Detach`: those projects become uncategorized
/// - `Cascade`: those projects are deleted too
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDeletePolicy {
    #[default]
    Restrict,
    Detach,
    Cascade,
}

impl CategoryDeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restrict => "restrict",
            Self::Detach => "detach",
            Self::Cascade => "cascade",
        }
    }
}

impl FromStr for CategoryDeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restrict" => Ok(Self::Restrict),
            "detach" => Ok(Self::Detach),
            "cascade" => Ok(Self::Cascade),
            other => Err(format!(
                "unknown category delete policy '{other}' (expected restrict, detach or cascade)"
            )),
        }
    }
}

impl fmt::Display for CategoryDeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Detach".parse::<CategoryDeletePolicy>(), Ok(CategoryDeletePolicy::Detach));
        assert_eq!(" cascade ".parse::<CategoryDeletePolicy>(), Ok(CategoryDeletePolicy::Cascade));
        assert_eq!("restrict".parse::<CategoryDeletePolicy>(), Ok(CategoryDeletePolicy::Restrict));
    }

    #[test]
    fn policy_rejects_unknown_values() {
        assert!("nullify".parse::<CategoryDeletePolicy>().is_err());
    }

    #[test]
    fn policy_defaults_to_restrict() {
        assert_eq!(CategoryDeletePolicy::default(), CategoryDeletePolicy::Restrict);
    }

    #[test]
    fn policy_display_round_trips() {
        for policy in [
            CategoryDeletePolicy::Restrict,
            CategoryDeletePolicy::Detach,
            CategoryDeletePolicy::Cascade,
        ] {
            assert_eq!(policy.to_string().parse::<CategoryDeletePolicy>(), Ok(policy));
        }
    }
}
