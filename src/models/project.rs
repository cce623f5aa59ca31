use serde::{Deserialize, Serialize};

use super::{Category, Patch};

/// A project in the catalog.
///
/// `category_id` is `None` for uncategorized projects. When set, it always
/// references an existing [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    /// Display name, 1 to 100 characters.
    pub name: String,
    /// Free text, at most 500 characters. `Some("")` and `None` are different values.
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Input for updating an existing project.
///
/// Every field defaults to [`Patch::Keep`]. Nullable columns take
/// `Patch<Option<_>>`, so `Set(None)` clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<Option<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub category_id: Patch<Option<i64>>,
}

impl UpdateProjectInput {
    /// Whether applying this input would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_keep() && self.description.is_keep() && self.category_id.is_keep()
    }
}

/// A project together with the category it is filed under, used for detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub category: Option<Category>,
}
