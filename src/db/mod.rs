mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{is_unique_violation, Result, StorageError};
use crate::models::*;

const PROJECT_COLUMNS: &str = "id, name, description, category_id";

/// Handle to the catalog database.
///
/// Cloning is cheap and shares the underlying connection. Every operation
/// runs in its own transaction.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Location of the database when none is configured.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "portfolio")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("portfolio.db"))
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Project operations
    // ============================================================

    /// All projects in insertion order.
    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project ORDER BY id"
        ))?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.lock();
        fetch_project(&conn, id)
    }

    /// The project and the category it is filed under.
    pub fn get_project_detail(&self, id: i64) -> Result<Option<ProjectDetail>> {
        let conn = self.lock();
        let Some(project) = fetch_project(&conn, id)? else {
            return Ok(None);
        };

        let category = match project.category_id {
            Some(category_id) => fetch_category(&conn, category_id)?,
            None => None,
        };

        Ok(Some(ProjectDetail { project, category }))
    }

    /// Insert a project.
    ///
    /// Fails with [`StorageError::UnknownCategory`] if `category_id` does not
    /// reference an existing category; nothing is written in that case.
    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if let Some(category_id) = input.category_id {
            ensure_category(&tx, category_id)?;
        }

        tx.execute(
            "INSERT INTO project (name, description, category_id) VALUES (?, ?, ?)",
            (&input.name, &input.description, input.category_id),
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!("Created project {}: '{}'", id, input.name);

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            category_id: input.category_id,
        })
    }

    /// Overwrite the fields supplied in `input`, leaving the rest untouched.
    ///
    /// Returns `None` if no project has this id.
    pub fn update_project(&self, id: i64, input: UpdateProjectInput) -> Result<Option<Project>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let Some(existing) = fetch_project(&tx, id)? else {
            return Ok(None);
        };

        if input.is_empty() {
            return Ok(Some(existing));
        }

        if let Some(Some(category_id)) = input.category_id.as_set() {
            ensure_category(&tx, *category_id)?;
        }

        let project = Project {
            id,
            name: input.name.apply(existing.name),
            description: input.description.apply(existing.description),
            category_id: input.category_id.apply(existing.category_id),
        };

        tx.execute(
            "UPDATE project SET name = ?, description = ?, category_id = ? WHERE id = ?",
            (&project.name, &project.description, project.category_id, id),
        )?;
        tx.commit()?;

        tracing::debug!("Updated project {}", id);

        Ok(Some(project))
    }

    /// Returns `false` if no project has this id.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM project WHERE id = ?", [id])?;
        if rows > 0 {
            tracing::debug!("Deleted project {}", id);
        }
        Ok(rows > 0)
    }

    // ============================================================
    // Category operations
    // ============================================================

    /// All categories ordered by name, as offered when filing a project.
    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM category ORDER BY name")?;

        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(categories)
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.lock();
        fetch_category(&conn, id)
    }

    pub fn get_category_with_projects(&self, id: i64) -> Result<Option<CategoryWithProjects>> {
        let conn = self.lock();
        let Some(category) = fetch_category(&conn, id)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE category_id = ? ORDER BY id"
        ))?;
        let projects = stmt
            .query_map([id], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(CategoryWithProjects { category, projects }))
    }

    pub fn create_category(&self, input: CreateCategoryInput) -> Result<Category> {
        let conn = self.lock();
        insert_category(&conn, input.name)
    }

    /// Delete a category, resolving projects that still reference it per `policy`.
    ///
    /// Returns `false` if no category has this id. Under
    /// [`CategoryDeletePolicy::Restrict`] a referenced category is left in
    /// place and [`StorageError::CategoryInUse`] is returned.
    pub fn delete_category(&self, id: i64, policy: CategoryDeletePolicy) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if fetch_category(&tx, id)?.is_none() {
            return Ok(false);
        }

        let projects: i64 = tx.query_row(
            "SELECT COUNT(*) FROM project WHERE category_id = ?",
            [id],
            |row| row.get(0),
        )?;

        if projects > 0 {
            match policy {
                CategoryDeletePolicy::Restrict => {
                    return Err(StorageError::CategoryInUse { id, projects });
                }
                CategoryDeletePolicy::Detach => {
                    tx.execute(
                        "UPDATE project SET category_id = NULL WHERE category_id = ?",
                        [id],
                    )?;
                }
                CategoryDeletePolicy::Cascade => {
                    tx.execute("DELETE FROM project WHERE category_id = ?", [id])?;
                }
            }
        }

        tx.execute("DELETE FROM category WHERE id = ?", [id])?;
        tx.commit()?;

        tracing::debug!(
            "Deleted category {} ({} project(s), policy {})",
            id,
            projects,
            policy
        );

        Ok(true)
    }

    /// Insert [`DEFAULT_CATEGORIES`] into an empty catalog.
    ///
    /// Returns the inserted categories, or an empty list if any category
    /// already existed.
    pub fn seed_categories(&self) -> Result<Vec<Category>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(Vec::new());
        }

        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|name| insert_category(&tx, name.to_string()))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        Ok(categories)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn fetch_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM project WHERE id = ?"),
            [id],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

fn fetch_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let category = conn
        .query_row("SELECT id, name FROM category WHERE id = ?", [id], category_from_row)
        .optional()?;
    Ok(category)
}

fn ensure_category(conn: &Connection, id: i64) -> Result<()> {
    match fetch_category(conn, id)? {
        Some(_) => Ok(()),
        None => Err(StorageError::UnknownCategory(id)),
    }
}

fn insert_category(conn: &Connection, name: String) -> Result<Category> {
    conn.execute("INSERT INTO category (name) VALUES (?)", [&name])
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateCategory(name.clone())
            } else {
                e.into()
            }
        })?;

    let id = conn.last_insert_rowid();
    tracing::debug!("Created category {}: '{}'", id, name);

    Ok(Category { id, name })
}
