//! Open SQLite databases and the workspace that tracks them.

pub mod query;

use crate::error::{PurrError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An open SQLite database file.
pub struct Database {
    /// File name shown in the explorer.
    pub name: String,
    /// Full path, or `:memory:`.
    pub path: PathBuf,
    pub conn: Connection,
    /// User tables, sorted by name.
    pub tables: Vec<String>,
}

impl Database {
    /// Open a database file, creating it when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let created = !path.exists();
        let conn = Connection::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut db = Self {
            name,
            path: path.to_path_buf(),
            conn,
            tables: Vec::new(),
        };
        db.refresh_tables()?;
        info!(path = %path.display(), created, tables = db.tables.len(), "opened database");
        Ok(db)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            name: ":memory:".to_string(),
            path: PathBuf::from(":memory:"),
            conn,
            tables: Vec::new(),
        })
    }

    /// Re-read the table list from the schema catalog.
    pub fn refresh_tables(&mut self) -> Result<()> {
        self.tables = query::fetch_tables(&self.conn)?;
        debug!(database = %self.name, tables = self.tables.len(), "refreshed tables");
        Ok(())
    }
}

/// Ordered set of open databases with one active at a time.
#[derive(Default)]
pub struct Workspace {
    databases: Vec<Database>,
    active: Option<usize>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file and make it active. An already-open path is just activated.
    pub fn open(&mut self, path: &Path) -> Result<&mut Database> {
        let idx = match self.position_of_path(path) {
            Some(idx) => idx,
            None => {
                self.databases.push(Database::open(path)?);
                self.databases.len() - 1
            }
        };
        self.active = Some(idx);
        Ok(&mut self.databases[idx])
    }

    /// Add an in-memory database and make it active.
    pub fn open_in_memory(&mut self) -> Result<&mut Database> {
        self.databases.push(Database::open_in_memory()?);
        let idx = self.databases.len() - 1;
        self.active = Some(idx);
        Ok(&mut self.databases[idx])
    }

    /// Close a database by name or 1-based index, or the active one when `None`.
    pub fn close(&mut self, target: Option<&str>) -> Result<Database> {
        let idx = match target {
            Some(t) => self.find(t)?,
            None => self.active.ok_or(PurrError::NoDatabase)?,
        };
        let db = self.databases.remove(idx);
        self.active = match self.active {
            _ if self.databases.is_empty() => None,
            Some(a) if a > idx => Some(a - 1),
            Some(a) if a == idx => Some(idx.min(self.databases.len() - 1)),
            other => other,
        };
        info!(database = %db.name, "closed database");
        Ok(db)
    }

    /// Make the database with this name or 1-based index active.
    pub fn switch(&mut self, target: &str) -> Result<&Database> {
        let idx = self.find(target)?;
        self.active = Some(idx);
        Ok(&self.databases[idx])
    }

    pub fn set_active(&mut self, idx: usize) {
        if idx < self.databases.len() {
            self.active = Some(idx);
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Database> {
        self.active.and_then(|i| self.databases.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Database> {
        self.active.and_then(move |i| self.databases.get_mut(i))
    }

    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Database> {
        self.databases.get_mut(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    fn position_of_path(&self, path: &Path) -> Option<usize> {
        let wanted = path.canonicalize().ok()?;
        self.databases
            .iter()
            .position(|db| db.path.canonicalize().ok().as_deref() == Some(wanted.as_path()))
    }

    fn find(&self, target: &str) -> Result<usize> {
        if let Ok(n) = target.parse::<usize>()
            && n >= 1
            && n <= self.databases.len()
        {
            return Ok(n - 1);
        }
        self.databases
            .iter()
            .position(|db| db.name == target || db.path.to_string_lossy() == target)
            .ok_or_else(|| PurrError::UnknownDatabase(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.name, "new.db");
        assert!(db.tables.is_empty());
    }

    #[test]
    fn test_workspace_open_switch_close() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.db");
        let b = dir.path().join("b.db");
        let mut ws = Workspace::new();
        ws.open(&a).unwrap();
        ws.open(&b).unwrap();
        assert_eq!(ws.active().unwrap().name, "b.db");

        // Reopening does not duplicate.
        ws.open(&a).unwrap();
        assert_eq!(ws.databases().len(), 2);
        assert_eq!(ws.active().unwrap().name, "a.db");

        ws.switch("2").unwrap();
        assert_eq!(ws.active().unwrap().name, "b.db");
        assert!(ws.switch("zzz.db").is_err());

        ws.close(Some("a.db")).unwrap();
        assert_eq!(ws.active().unwrap().name, "b.db");
        ws.close(None).unwrap();
        assert!(ws.active().is_none());
        assert!(ws.close(None).is_err());
    }
}
