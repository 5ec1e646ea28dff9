//! Filesystem storage for the file-backed gateway.
//!
//! Layout under the root directory:
//!
//! ```text
//! records/<entity>/<id>.json   one document per record
//! push.jsonl                   append-only log of created/updated records
//! push.lock                    advisory lock serializing log writers
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use padel_core::error::{Error, InvalidInputError, MalformedResponse, ProtocolError};
use padel_core::{Cursor, DynRecord, EntityName, Record, RecordId, Result};

/// File name of the push log.
pub(crate) const PUSH_LOG: &str = "push.jsonl";

/// One line of the push log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PushLogEntry {
    pub entity: String,
    /// RFC 3339 timestamp.
    pub time: String,
    pub data: Value,
}

fn encode_error(e: serde_json::Error) -> Error {
    Error::InvalidInput(InvalidInputError::Other {
        message: e.to_string(),
    })
}

/// Filesystem-backed record storage.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self, entity: &EntityName) -> PathBuf {
        self.root.join("records").join(entity.as_str())
    }

    fn record_path(&self, entity: &EntityName, id: &RecordId) -> PathBuf {
        self.records_dir(entity).join(format!("{}.json", id))
    }

    pub(crate) fn push_log_path(&self) -> PathBuf {
        self.root.join(PUSH_LOG)
    }

    fn push_lock_path(&self) -> PathBuf {
        self.root.join("push.lock")
    }

    /// Generate an id in the backend's 24-hex-digit shape.
    fn generate_id() -> Result<RecordId> {
        let hex = Uuid::new_v4().simple().to_string();
        RecordId::new(&hex[..24])
    }

    fn read_record(&self, path: &Path) -> Result<DynRecord> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| MalformedResponse::new(path.display().to_string(), e).into())
    }

    fn write_record(&self, entity: &EntityName, record: &DynRecord) -> Result<()> {
        let path = self.record_path(entity, &record.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(record).map_err(encode_error)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Append a record to the push log under an exclusive lock.
    fn append_push(&self, entity: &EntityName, record: &DynRecord) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.push_lock_path())?;
        lock_file.lock_exclusive()?;

        let entry = PushLogEntry {
            entity: entity.to_string(),
            time: Utc::now().to_rfc3339(),
            data: serde_json::to_value(record).map_err(encode_error)?,
        };
        let line = serde_json::to_string(&entry).map_err(encode_error)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.push_log_path())?;
        writeln!(file, "{}", line)?;
        file.sync_data()?;

        lock_file.unlock()?;
        Ok(())
    }

    /// All records of an entity, ordered by file name.
    pub fn list(&self, entity: &EntityName) -> Result<Vec<DynRecord>> {
        let dir = self.records_dir(entity);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths.iter().map(|p| self.read_record(p)).collect()
    }

    /// Records `[skip, skip + limit)` and the total count.
    #[instrument(skip(self))]
    pub fn page(&self, entity: &EntityName, cursor: Cursor) -> Result<(Vec<DynRecord>, u64)> {
        let all = self.list(entity)?;
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(cursor.skip() as usize)
            .take(cursor.limit() as usize)
            .collect();
        Ok((items, total))
    }

    /// Case-insensitive substring match over string fields.
    #[instrument(skip(self))]
    pub fn search(&self, entity: &EntityName, query: &str) -> Result<Vec<DynRecord>> {
        Ok(self
            .list(entity)?
            .into_iter()
            .filter(|r| r.matches_text(query))
            .collect())
    }

    pub fn get(&self, entity: &EntityName, id: &RecordId) -> Result<DynRecord> {
        let path = self.record_path(entity, id);
        if !path.exists() {
            return Err(ProtocolError::not_found(format!("{} {}", entity, id)).into());
        }
        self.read_record(&path)
    }

    /// Store a new record. An `_id` in the body is honored, otherwise one is
    /// generated.
    #[instrument(skip(self, body))]
    pub fn create(&self, entity: &EntityName, body: &Value) -> Result<DynRecord> {
        let mut fields = object_fields(body)?;
        let id = match fields.remove("_id") {
            Some(Value::String(id)) => RecordId::new(id)?,
            Some(other) => {
                return Err(InvalidInputError::RecordId {
                    value: other.to_string(),
                    reason: "must be a string".to_string(),
                }
                .into());
            }
            None => Self::generate_id()?,
        };

        if self.record_path(entity, &id).exists() {
            return Err(ProtocolError::new(
                409,
                Some("Conflict".to_string()),
                Some(format!("{} {} already exists", entity, id)),
            )
            .into());
        }

        let record = Record::new(id, fields);
        self.write_record(entity, &record)?;
        self.append_push(entity, &record)?;

        debug!(%entity, id = %record.id, "Created record");
        Ok(record)
    }

    /// Merge top-level fields into an existing record. The id cannot change.
    #[instrument(skip(self, patch))]
    pub fn update(&self, entity: &EntityName, id: &RecordId, patch: &Value) -> Result<DynRecord> {
        let mut record = self.get(entity, id)?;
        for (key, value) in object_fields(patch)? {
            if key != "_id" {
                record.fields.insert(key, value);
            }
        }

        self.write_record(entity, &record)?;
        self.append_push(entity, &record)?;

        debug!(%entity, %id, "Updated record");
        Ok(record)
    }
}

fn object_fields(body: &Value) -> Result<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map.clone()),
        _ => Err(InvalidInputError::Other {
            message: "record body must be a JSON object".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    fn push_log(store: &FileStore) -> Vec<PushLogEntry> {
        fs::read_to_string(store.push_log_path())
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn create_assigns_id_and_logs() {
        let (_dir, store) = store();
        let sale = EntityName::sale();

        let record = store.create(&sale, &json!({"total": 10})).unwrap();
        assert_eq!(record.id.as_str().len(), 24);
        assert_eq!(store.get(&sale, &record.id).unwrap(), record);

        let log = push_log(&store);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].entity, "sale");
        assert_eq!(log[0].data["_id"], json!(record.id.as_str()));
    }

    #[test]
    fn create_with_existing_id_conflicts() {
        let (_dir, store) = store();
        let sale = EntityName::sale();

        store.create(&sale, &json!({"_id": "a1"})).unwrap();
        let err = store.create(&sale, &json!({"_id": "a1"})).unwrap_err();
        assert!(matches!(err, Error::Protocol(ref e) if e.status == 409));
    }

    #[test]
    fn create_rejects_non_object() {
        let (_dir, store) = store();
        assert!(store.create(&EntityName::sale(), &json!([1])).is_err());
        assert!(store.create(&EntityName::sale(), &json!({"_id": 7})).is_err());
    }

    #[test]
    fn paging_is_ordered_by_id() {
        let (_dir, store) = store();
        let user = EntityName::user();
        for id in ["c", "a", "d", "b"] {
            store.create(&user, &json!({"_id": id})).unwrap();
        }

        let (items, total) = store.page(&user, Cursor::new(1, 2).unwrap()).unwrap();
        assert_eq!(total, 4);
        let ids: Vec<_> = items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let (items, _) = store.page(&user, Cursor::new(4, 2).unwrap()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_dir, store) = store();
        let user = EntityName::user();
        store.create(&user, &json!({"_id": "u1", "nickname": "Ana"})).unwrap();
        store.create(&user, &json!({"_id": "u2", "nickname": "Bea"})).unwrap();

        let found = store.search(&user, "aN").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "u1");
    }

    #[test]
    fn update_merges_fields_and_keeps_id() {
        let (_dir, store) = store();
        let sale = EntityName::sale();
        store
            .create(&sale, &json!({"_id": "a1", "total": 10, "estado": "PENDIENTE"}))
            .unwrap();

        let id = RecordId::new("a1").unwrap();
        let updated = store
            .update(&sale, &id, &json!({"_id": "zz", "estado": "COMPLETADA"}))
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.field("estado"), Some(&json!("COMPLETADA")));
        assert_eq!(updated.field("total"), Some(&json!(10)));
        assert_eq!(push_log(&store).len(), 2);
    }

    #[test]
    fn missing_record_is_not_found() {
        let (_dir, store) = store();
        let id = RecordId::new("nope").unwrap();
        let err = store.get(&EntityName::sale(), &id).unwrap_err();
        assert!(matches!(err, Error::Protocol(ref e) if e.status == 404));
        assert!(store.update(&EntityName::sale(), &id, &json!({})).is_err());
    }

    #[test]
    fn corrupt_document_is_malformed() {
        let (_dir, store) = store();
        let sale = EntityName::sale();
        let dir = store.records_dir(&sale);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.json"), "{not json").unwrap();

        assert!(matches!(store.list(&sale), Err(Error::Malformed(_))));
    }
}
