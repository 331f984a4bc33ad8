//! Local persistence for user records.
//!
//! A single table keyed by an auto-incrementing id. [`FileStore`] keeps the
//! table in a JSON document on disk, [`MemoryStore`] keeps it in memory only.
//! Both hand out whole-table scans, point reads, inserts, point updates and
//! bulk deletes through the [`UserStore`] trait so screens never touch a
//! concrete backend.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Layout version written into every table file.
pub const SCHEMA_VERSION: u32 = 1;

/// One persisted user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A record that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Fields to merge into an existing record. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserChanges {
    fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
    }
}

impl From<NewUser> for UserChanges {
    fn from(u: NewUser) -> Self {
        Self {
            name: Some(u.name),
            email: Some(u.email),
            password: Some(u.password),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Point update addressed an id that is not in the table.
    NotFound(u64),
    Io(std::io::Error),
    Corrupt(serde_json::Error),
    /// The table file was written with a layout this build does not know.
    Schema(u32),
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "no user with id {id}"),
            StoreError::Io(e) => write!(f, "storage unavailable: {e}"),
            StoreError::Corrupt(e) => write!(f, "user table is corrupt: {e}"),
            StoreError::Schema(v) => write!(
                f,
                "unsupported user table version {v} (expected {SCHEMA_VERSION})"
            ),
            StoreError::Poisoned => write!(f, "user table lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Corrupt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operations every user table backend provides.
///
/// Each call resolves or fails as a whole; there is no partial success.
pub trait UserStore: Send + Sync {
    /// All records in storage (insertion) order.
    fn list(&self) -> StoreResult<Vec<User>>;
    fn get(&self, id: u64) -> StoreResult<Option<User>>;
    /// Assign the next id, persist the record and return the id.
    fn insert(&self, user: NewUser) -> StoreResult<u64>;
    /// Merge `changes` into the record with `id`. Fails with [`StoreError::NotFound`].
    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()>;
    /// Remove every record whose id is in `ids`; unknown ids are ignored.
    /// Returns how many records were removed.
    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Table {
    version: u32,
    next_id: u64,
    users: Vec<User>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            next_id: 1,
            users: Vec::new(),
        }
    }
}

impl Table {
    fn get(&self, id: u64) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    fn insert(&mut self, user: NewUser) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.users.push(User {
            id,
            name: user.name,
            email: user.email,
            password: user.password,
        });
        id
    }

    fn update(&mut self, id: u64, changes: UserChanges) -> StoreResult<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound(id))?;
        changes.apply(user);
        Ok(())
    }

    fn bulk_delete(&mut self, ids: &[u64]) -> usize {
        let doomed: HashSet<u64> = ids.iter().copied().collect();
        let before = self.users.len();
        self.users.retain(|u| !doomed.contains(&u.id));
        before - self.users.len()
    }
}

/// Non-durable table, used by tests and `--in-memory` sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with records, assigning ids in order.
    pub fn with_users(users: impl IntoIterator<Item = NewUser>) -> Self {
        let mut table = Table::default();
        for u in users {
            table.insert(u);
        }
        Self {
            table: Mutex::new(table),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Table>> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl UserStore for MemoryStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock()?.users.clone())
    }

    fn get(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.get(id))
    }

    fn insert(&self, user: NewUser) -> StoreResult<u64> {
        Ok(self.lock()?.insert(user))
    }

    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()> {
        self.lock()?.update(id, changes)
    }

    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize> {
        Ok(self.lock()?.bulk_delete(ids))
    }
}

/// Durable table backed by one JSON document.
///
/// The file is read once on open; every mutation rewrites it through a
/// sibling temp file followed by a rename. The in-memory copy only changes
/// after the write succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    table: Mutex<Table>,
}

impl FileStore {
    /// Open the table at `path`. A missing file is an empty table.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let bytes = fs::read(&path)?;
            let table: Table = serde_json::from_slice(&bytes)?;
            if table.version != SCHEMA_VERSION {
                return Err(StoreError::Schema(table.version));
            }
            table
        } else {
            Table::default()
        };
        tracing::debug!(path = %path.display(), users = table.users.len(), "opened user table");
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Table>> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, table: &Table) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut f = File::create(&tmp)?;
            f.write_all(&serde_json::to_vec_pretty(table)?)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `f` to a copy of the table, persist it, then commit the copy.
    fn mutate<R>(&self, f: impl FnOnce(&mut Table) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl UserStore for FileStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock()?.users.clone())
    }

    fn get(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.get(id))
    }

    fn insert(&self, user: NewUser) -> StoreResult<u64> {
        self.mutate(|t| Ok(t.insert(user)))
    }

    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()> {
        self.mutate(|t| t.update(id, changes))
    }

    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize> {
        self.mutate(|t| Ok(t.bulk_delete(ids)))
    }
}
