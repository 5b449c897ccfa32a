//! SQLite reference backend.
//!
//! Implements both collaborator seams on one bundled-SQLite database:
//! profile rows, kind definitions, and field payloads each get their own
//! table, so the field-attachment subsystem can later move elsewhere without
//! touching the row schema.

use crate::backend::{FieldAttachment, ProfileBackend};
use crate::error::{StoreError, StoreResult};
use persona_model::{Profile, ProfileIdentity, ProfileKind};
use persona_types::{ProfileId, SubjectId};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Profile persistence backed by SQLite.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens (or creates) a backend database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Persistence(format!("failed to open database: {e}")))?;
        let backend = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    /// Opens an in-memory backend (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Persistence(format!("failed to open in-memory database: {e}")))?;
        let backend = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                pid INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                subject TEXT,
                label TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                changed_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_profiles_subject ON profiles(subject);
            CREATE INDEX IF NOT EXISTS idx_profiles_kind ON profiles(kind);

            CREATE TABLE IF NOT EXISTS profile_fields (
                pid INTEGER NOT NULL,
                kind TEXT NOT NULL,
                fields TEXT NOT NULL,
                UNIQUE(pid, kind)
            );

            CREATE TABLE IF NOT EXISTS profile_kinds (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                weight INTEGER NOT NULL,
                locked INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| StoreError::Persistence(format!("failed to init schema: {e}")))?;
        Ok(())
    }

    fn rows_to_profiles(
        rows: Vec<(i64, String, Option<String>, String, i64, i64)>,
    ) -> StoreResult<Vec<Profile>> {
        let mut result = Vec::with_capacity(rows.len());
        for (pid, kind, subject_str, label, created_at, changed_at) in rows {
            let subject = match subject_str {
                Some(s) => Some(
                    s.parse::<SubjectId>()
                        .map_err(|e| StoreError::Persistence(format!("invalid subject id in row {pid}: {e}")))?,
                ),
                None => None,
            };
            result.push(Profile {
                identity: ProfileIdentity::Persisted(ProfileId::from_raw(pid)),
                kind,
                subject,
                label,
                fields: serde_json::Value::Object(serde_json::Map::new()),
                created_at,
                changed_at,
            });
        }
        Ok(result)
    }
}

const PROFILE_COLUMNS: &str = "pid, kind, subject, label, created_at, changed_at";

impl ProfileBackend for SqliteBackend {
    fn insert(&self, profile: &Profile) -> StoreResult<ProfileId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO profiles (kind, subject, label, created_at, changed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile.kind,
                profile.subject.map(|s| s.to_string()),
                profile.label,
                profile.created_at,
                profile.changed_at,
            ],
        )
        .map_err(|e| StoreError::Persistence(format!("failed to insert profile: {e}")))?;
        Ok(ProfileId::from_raw(conn.last_insert_rowid()))
    }

    fn update(&self, profile: &Profile) -> StoreResult<()> {
        let Some(id) = profile.id() else {
            return Err(StoreError::Persistence(
                "cannot update a profile that was never saved".to_string(),
            ));
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE profiles SET kind = ?1, subject = ?2, label = ?3, created_at = ?4, changed_at = ?5 WHERE pid = ?6",
            params![
                profile.kind,
                profile.subject.map(|s| s.to_string()),
                profile.label,
                profile.created_at,
                profile.changed_at,
                id.as_i64(),
            ],
        )
        .map_err(|e| StoreError::Persistence(format!("failed to update profile {id}: {e}")))?;
        Ok(())
    }

    fn select_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles WHERE pid = ?1"
                ))
                .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
            let rows = stmt
                .query_map(params![id.as_i64()], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })
                .map_err(|e| StoreError::Persistence(format!("failed to query profile {id}: {e}")))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Persistence(format!("failed to read profile {id}: {e}")))?
        };
        Ok(Self::rows_to_profiles(rows)?.pop())
    }

    fn select_by_ids(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>> {
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = self.select_by_id(*id)? {
                result.push(profile);
            }
        }
        Ok(result)
    }

    fn select_all(&self) -> StoreResult<Vec<Profile>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY pid"
                ))
                .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })
                .map_err(|e| StoreError::Persistence(format!("failed to query profiles: {e}")))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Persistence(format!("failed to read profiles: {e}")))?
        };
        Self::rows_to_profiles(rows)
    }

    fn select_by_subject(&self, subject: SubjectId) -> StoreResult<Vec<Profile>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles WHERE subject = ?1 ORDER BY pid"
                ))
                .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
            let rows = stmt
                .query_map(params![subject.to_string()], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })
                .map_err(|e| {
                    StoreError::Persistence(format!("failed to query profiles of {subject}: {e}"))
                })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|e| {
                StoreError::Persistence(format!("failed to read profiles of {subject}: {e}"))
            })?
        };
        Self::rows_to_profiles(rows)
    }

    fn select_ids_by_kind(&self, kind: &str) -> StoreResult<Vec<ProfileId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT pid FROM profiles WHERE kind = ?1 ORDER BY pid")
            .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
        let rows = stmt
            .query_map(params![kind], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Persistence(format!("failed to query kind '{kind}': {e}")))?;

        let mut result = Vec::new();
        for row in rows {
            let pid =
                row.map_err(|e| StoreError::Persistence(format!("failed to read pid: {e}")))?;
            result.push(ProfileId::from_raw(pid));
        }
        Ok(result)
    }

    fn delete_by_ids(&self, ids: &[ProfileId]) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        for id in ids {
            conn.execute("DELETE FROM profiles WHERE pid = ?1", params![id.as_i64()])
                .map_err(|e| {
                    StoreError::Persistence(format!("failed to delete profile {id}: {e}"))
                })?;
        }
        Ok(())
    }

    fn select_kind_by_id(&self, id: &str) -> StoreResult<Option<ProfileKind>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, label, weight, locked FROM profile_kinds WHERE id = ?1")
            .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(ProfileKind {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    weight: row.get(2)?,
                    locked: row.get::<_, i64>(3)? != 0,
                })
            })
            .map_err(|e| StoreError::Persistence(format!("failed to query kind '{id}': {e}")))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| {
                StoreError::Persistence(format!("failed to read kind '{id}': {e}"))
            })?)),
            None => Ok(None),
        }
    }

    fn select_all_kinds(&self) -> StoreResult<Vec<ProfileKind>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, label, weight, locked FROM profile_kinds")
            .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProfileKind {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    weight: row.get(2)?,
                    locked: row.get::<_, i64>(3)? != 0,
                })
            })
            .map_err(|e| StoreError::Persistence(format!("failed to query kinds: {e}")))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(
                row.map_err(|e| StoreError::Persistence(format!("failed to read kind: {e}")))?,
            );
        }
        Ok(result)
    }

    fn upsert_kind(&self, kind: &ProfileKind) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO profile_kinds (id, label, weight, locked) VALUES (?1, ?2, ?3, ?4)",
            params![kind.id, kind.label, kind.weight, kind.locked as i64],
        )
        .map_err(|e| StoreError::Persistence(format!("failed to upsert kind '{}': {e}", kind.id)))?;
        Ok(())
    }

    fn delete_kind(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM profile_kinds WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Persistence(format!("failed to delete kind '{id}': {e}")))?;
        Ok(())
    }
}

impl FieldAttachment for SqliteBackend {
    fn load_fields(&self, kind: &str, id: ProfileId) -> StoreResult<serde_json::Value> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT fields FROM profile_fields WHERE pid = ?1 AND kind = ?2")
            .map_err(|e| StoreError::Persistence(format!("failed to prepare select: {e}")))?;
        let mut rows = stmt
            .query_map(params![id.as_i64(), kind], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Persistence(format!("failed to query fields of {id}: {e}")))?;

        match rows.next() {
            Some(row) => {
                let raw = row.map_err(|e| {
                    StoreError::Persistence(format!("failed to read fields of {id}: {e}"))
                })?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(serde_json::Value::Object(serde_json::Map::new())),
        }
    }

    fn save_fields(
        &self,
        kind: &str,
        id: ProfileId,
        fields: &serde_json::Value,
    ) -> StoreResult<()> {
        let raw = serde_json::to_string(fields)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO profile_fields (pid, kind, fields) VALUES (?1, ?2, ?3)",
            params![id.as_i64(), kind, raw],
        )
        .map_err(|e| StoreError::Persistence(format!("failed to save fields of {id}: {e}")))?;
        Ok(())
    }

    fn delete_fields(&self, _kind: &str, id: ProfileId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM profile_fields WHERE pid = ?1",
            params![id.as_i64()],
        )
        .map_err(|e| StoreError::Persistence(format!("failed to delete fields of {id}: {e}")))?;
        Ok(())
    }
}
