use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard};

use docshift_common::{Error, Result};
use regex::Regex;
use rusqlite::{Connection, params};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("valid regex"));

static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
});

/// Schemaless document database: named collections of JSON objects keyed by
/// a string `_id`, persisted in a single SQLite table.
///
/// Filters are JSON objects matched by top-level field equality. An empty
/// object (or `null`) matches every document in the collection. Results come
/// back in insertion order unless a sort field is given.
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

/// Result of a replace operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: usize,
    pub upserted_id: Option<String>,
}

impl DocumentStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening document store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("document store lock poisoned".into()))
    }

    fn ensure_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (collection, id)
            );",
        )
        .map_err(|e| Error::Database(format!("failed to create documents table: {e}")))?;

        Ok(())
    }

    /// Insert a document, generating a UUID `_id` when it has none.
    /// Returns the document id.
    pub fn insert_one(&self, collection: &str, doc: Value) -> Result<String> {
        validate_collection_name(collection)?;
        let (id, body) = prepare_document(doc, None)?;
        let conn = self.connection()?;
        insert_row(&conn, collection, &id, &body)?;
        Ok(id)
    }

    /// Insert several documents atomically.
    pub fn insert_many(&self, collection: &str, docs: Vec<Value>) -> Result<Vec<String>> {
        validate_collection_name(collection)?;
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let (id, body) = prepare_document(doc, None)?;
            insert_row(&tx, collection, &id, &body)?;
            ids.push(id);
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit insert: {e}")))?;
        Ok(ids)
    }

    pub fn find(&self, collection: &str, filter: &Value) -> Result<Vec<Value>> {
        self.find_inner(collection, filter, None)
    }

    /// Like [`find`](Self::find), ordered ascending by a (possibly dotted)
    /// field path. String values compare byte-wise.
    pub fn find_sorted(&self, collection: &str, filter: &Value, sort_field: &str) -> Result<Vec<Value>> {
        validate_field(sort_field)?;
        self.find_inner(collection, filter, Some(sort_field))
    }

    fn find_inner(
        &self,
        collection: &str,
        filter: &Value,
        sort_field: Option<&str>,
    ) -> Result<Vec<Value>> {
        let filter = as_filter(filter)?;
        let conn = self.connection()?;
        let docs = load(&conn, collection, sort_field)?;
        Ok(docs
            .into_iter()
            .filter(|(_, doc)| matches(doc, filter))
            .map(|(_, doc)| doc)
            .collect())
    }

    pub fn find_one(&self, collection: &str, filter: &Value) -> Result<Option<Value>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    pub fn count(&self, collection: &str, filter: &Value) -> Result<usize> {
        Ok(self.find(collection, filter)?.len())
    }

    /// Replace the first matching document. With `upsert`, a missing match
    /// inserts `doc`, taking its `_id` from the filter when the document has
    /// none.
    pub fn replace_one(
        &self,
        collection: &str,
        filter: &Value,
        doc: Value,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        validate_collection_name(collection)?;
        let filter = as_filter(filter)?;
        let conn = self.connection()?;

        let existing = load(&conn, collection, None)?
            .into_iter()
            .find(|(_, d)| matches(d, filter));

        match existing {
            Some((id, _)) => {
                let mut doc = doc;
                if let Value::Object(map) = &mut doc {
                    map.remove("_id");
                }
                let (_, body) = prepare_document(doc, Some(&id))?;
                conn.execute(
                    "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                    params![collection, id, body],
                )
                .map_err(|e| Error::Database(format!("failed to replace document {id}: {e}")))?;
                Ok(UpdateOutcome {
                    matched: 1,
                    upserted_id: None,
                })
            }
            None if upsert => {
                let id_hint = filter.and_then(|f| f.get("_id")).and_then(Value::as_str);
                let (id, body) = prepare_document(doc, id_hint)?;
                insert_row(&conn, collection, &id, &body)?;
                Ok(UpdateOutcome {
                    matched: 0,
                    upserted_id: Some(id),
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    /// Merge `set` into every matching document. Returns the number of
    /// documents rewritten. `_id` cannot be changed.
    pub fn update_many(
        &self,
        collection: &str,
        filter: &Value,
        set: &Map<String, Value>,
    ) -> Result<usize> {
        self.rewrite_matching(collection, filter, |doc| {
            for (key, value) in set {
                if key != "_id" {
                    doc.insert(key.clone(), value.clone());
                }
            }
            !set.is_empty()
        })
    }

    /// Remove a top-level field from every matching document that has it.
    pub fn unset_field(&self, collection: &str, filter: &Value, field: &str) -> Result<usize> {
        if field == "_id" {
            return Err(Error::Database("cannot unset _id".into()));
        }
        self.rewrite_matching(collection, filter, |doc| doc.remove(field).is_some())
    }

    fn rewrite_matching<F>(&self, collection: &str, filter: &Value, mut rewrite: F) -> Result<usize>
    where
        F: FnMut(&mut Map<String, Value>) -> bool,
    {
        let filter = as_filter(filter)?;
        let mut conn = self.connection()?;
        let docs = load(&conn, collection, None)?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        let mut modified = 0;
        for (id, doc) in docs {
            if !matches(&doc, filter) {
                continue;
            }
            let Value::Object(mut map) = doc else {
                continue;
            };
            if !rewrite(&mut map) {
                continue;
            }
            let body = serde_json::to_string(&Value::Object(map))?;
            tx.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection, id, body],
            )
            .map_err(|e| Error::Database(format!("failed to update document {id}: {e}")))?;
            modified += 1;
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit update: {e}")))?;
        Ok(modified)
    }

    /// Delete the first matching document. Returns whether one was removed.
    pub fn delete_one(&self, collection: &str, filter: &Value) -> Result<bool> {
        let filter = as_filter(filter)?;
        let conn = self.connection()?;
        let target = load(&conn, collection, None)?
            .into_iter()
            .find(|(_, d)| matches(d, filter));

        let Some((id, _)) = target else {
            return Ok(false);
        };
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .map_err(|e| Error::Database(format!("failed to delete document {id}: {e}")))?;
        Ok(true)
    }

    pub fn delete_many(&self, collection: &str, filter: &Value) -> Result<usize> {
        let filter = as_filter(filter)?;
        let conn = self.connection()?;
        let mut removed = 0;
        for (id, doc) in load(&conn, collection, None)? {
            if matches(&doc, filter) {
                removed += conn
                    .execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection, id],
                    )
                    .map_err(|e| Error::Database(format!("failed to delete document {id}: {e}")))?;
            }
        }
        Ok(removed)
    }

    /// Names of all collections that currently hold documents.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(format!("failed to list collections: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("failed to read collection row: {e}")))
    }

    /// Remove every document and index of a collection. Returns the number
    /// of documents removed.
    pub fn drop_collection(&self, collection: &str) -> Result<usize> {
        validate_collection_name(collection)?;
        let indexes = self.list_indexes(collection)?;
        let conn = self.connection()?;
        let removed = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1",
                params![collection],
            )
            .map_err(|e| Error::Database(format!("failed to drop collection {collection}: {e}")))?;

        for name in indexes {
            conn.execute_batch(&format!(
                "DROP INDEX IF EXISTS \"{}\"",
                index_ident(collection, &name)
            ))
            .map_err(|e| Error::Database(format!("failed to drop index {name}: {e}")))?;
        }

        info!("dropped collection {collection} ({removed} documents)");
        Ok(removed)
    }

    /// Create a (optionally unique) index over one or more field paths of a
    /// collection. Creating an index that already exists is a no-op.
    pub fn create_index(
        &self,
        collection: &str,
        name: &str,
        fields: &[&str],
        unique: bool,
    ) -> Result<()> {
        validate_collection_name(collection)?;
        validate_name("index", name)?;
        if fields.is_empty() {
            return Err(Error::Database(format!("index {name} needs at least one field")));
        }
        for field in fields {
            validate_field(field)?;
        }

        let columns = fields
            .iter()
            .map(|f| format!("json_extract(body, '$.{f}')"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE {unique}INDEX IF NOT EXISTS \"{ident}\" ON documents({columns}) \
             WHERE collection = '{collection}'",
            unique = if unique { "UNIQUE " } else { "" },
            ident = index_ident(collection, name),
        );

        let conn = self.connection()?;
        conn.execute_batch(&sql)
            .map_err(|e| Error::Database(format!("failed to create index {name}: {e}")))?;
        info!("created index {name} on {collection}");
        Ok(())
    }

    /// Drop an index. Returns whether it existed.
    pub fn drop_index(&self, collection: &str, name: &str) -> Result<bool> {
        validate_collection_name(collection)?;
        validate_name("index", name)?;
        if !self.list_indexes(collection)?.iter().any(|n| n == name) {
            return Ok(false);
        }

        let conn = self.connection()?;
        conn.execute_batch(&format!(
            "DROP INDEX IF EXISTS \"{}\"",
            index_ident(collection, name)
        ))
        .map_err(|e| Error::Database(format!("failed to drop index {name}: {e}")))?;
        Ok(true)
    }

    pub fn list_indexes(&self, collection: &str) -> Result<Vec<String>> {
        let prefix = index_ident(collection, "");
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'index' AND tbl_name = 'documents'
                 ORDER BY name",
            )
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(format!("failed to list indexes: {e}")))?;

        let mut names = Vec::new();
        for row in rows {
            let name = row.map_err(|e| Error::Database(format!("failed to read index row: {e}")))?;
            if let Some(short) = name.strip_prefix(&prefix) {
                names.push(short.to_string());
            }
        }
        Ok(names)
    }
}

fn load(conn: &Connection, collection: &str, sort_field: Option<&str>) -> Result<Vec<(String, Value)>> {
    validate_collection_name(collection)?;
    // json_extract(body, NULL) is NULL for every row, leaving rowid order.
    let sort_path = sort_field.map(|f| format!("$.{f}"));
    let mut stmt = conn
        .prepare(
            "SELECT id, body FROM documents
             WHERE collection = ?1
             ORDER BY json_extract(body, ?2), rowid",
        )
        .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map(params![collection, sort_path], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| Error::Database(format!("failed to query {collection}: {e}")))?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, body) =
            row.map_err(|e| Error::Database(format!("failed to read document row: {e}")))?;
        docs.push((id, serde_json::from_str(&body)?));
    }
    debug!("loaded {} documents from {collection}", docs.len());
    Ok(docs)
}

fn insert_row(conn: &Connection, collection: &str, id: &str, body: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
        params![collection, id, body],
    )
    .map_err(|e| Error::Database(format!("failed to insert document {id} into {collection}: {e}")))?;
    Ok(())
}

fn prepare_document(doc: Value, id_hint: Option<&str>) -> Result<(String, String)> {
    let Value::Object(mut map) = doc else {
        return Err(Error::Database("document must be a JSON object".into()));
    };

    let id = match map.remove("_id") {
        Some(Value::String(id)) => id,
        Some(Value::Null) | None => id_hint
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        Some(other) => {
            return Err(Error::Database(format!("_id must be a string, got {other}")));
        }
    };

    map.insert("_id".into(), Value::String(id.clone()));
    let body = serde_json::to_string(&Value::Object(map))?;
    Ok((id, body))
}

fn as_filter(filter: &Value) -> Result<Option<&Map<String, Value>>> {
    match filter {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(Error::Database(format!(
            "filter must be a JSON object, got {other}"
        ))),
    }
}

fn matches(doc: &Value, filter: Option<&Map<String, Value>>) -> bool {
    filter.is_none_or(|f| f.iter().all(|(key, value)| doc.get(key) == Some(value)))
}

/// SQLite name of a collection's index. `$` cannot occur in either part, so
/// the split back into collection and index name is unambiguous.
fn index_ident(collection: &str, name: &str) -> String {
    format!("{collection}${name}")
}

/// Check that `name` can be used as a collection name.
pub fn validate_collection_name(name: &str) -> Result<()> {
    validate_name("collection", name)
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(Error::Database(format!("invalid {kind} name: {name:?}")))
    }
}

fn validate_field(field: &str) -> Result<()> {
    if FIELD_PATTERN.is_match(field) {
        Ok(())
    } else {
        Err(Error::Database(format!("invalid field path: {field:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_find_round_trip() {
        let store = DocumentStore::in_memory().unwrap();
        let id = store
            .insert_one("users", json!({"_id": "u-1", "email": "a@example.com"}))
            .unwrap();
        assert_eq!(id, "u-1");

        let found = store.find_one("users", &json!({"_id": "u-1"})).unwrap().unwrap();
        assert_eq!(found["email"], "a@example.com");
    }

    #[test]
    fn insert_generates_id_when_missing() {
        let store = DocumentStore::in_memory().unwrap();
        let id = store.insert_one("users", json!({"name": "x"})).unwrap();
        assert!(!id.is_empty());

        let doc = store.find_one("users", &json!({})).unwrap().unwrap();
        assert_eq!(doc["_id"], id.as_str());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let store = DocumentStore::in_memory().unwrap();
        store.insert_one("users", json!({"_id": "dup"})).unwrap();
        let err = store.insert_one("users", json!({"_id": "dup"})).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn same_id_in_different_collections_is_fine() {
        let store = DocumentStore::in_memory().unwrap();
        store.insert_one("a", json!({"_id": "1"})).unwrap();
        store.insert_one("b", json!({"_id": "1"})).unwrap();
        assert_eq!(store.list_collections().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn non_object_documents_and_filters_are_rejected() {
        let store = DocumentStore::in_memory().unwrap();
        assert!(store.insert_one("users", json!([1, 2])).is_err());
        assert!(store.insert_one("users", json!({"_id": 7})).is_err());
        assert!(store.find("users", &json!("nope")).is_err());
    }

    #[test]
    fn find_filters_by_field_equality_in_insertion_order() {
        let store = DocumentStore::in_memory().unwrap();
        store
            .insert_many(
                "users",
                vec![
                    json!({"name": "c", "role": "admin"}),
                    json!({"name": "a", "role": "user"}),
                    json!({"name": "b", "role": "admin"}),
                ],
            )
            .unwrap();

        let admins = store.find("users", &json!({"role": "admin"})).unwrap();
        let names: Vec<_> = admins.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "b"]);
        assert_eq!(store.count("users", &Value::Null).unwrap(), 3);
    }

    #[test]
    fn find_sorted_orders_by_field() {
        let store = DocumentStore::in_memory().unwrap();
        for v in ["20240101_003", "20240101_001", "20240101_002"] {
            store.insert_one("log", json!({"version": v})).unwrap();
        }

        let sorted = store.find_sorted("log", &json!({}), "version").unwrap();
        let versions: Vec<_> = sorted.iter().map(|d| d["version"].as_str().unwrap()).collect();
        assert_eq!(versions, vec!["20240101_001", "20240101_002", "20240101_003"]);
    }

    #[test]
    fn replace_one_updates_or_upserts() {
        let store = DocumentStore::in_memory().unwrap();

        let outcome = store
            .replace_one("cfg", &json!({"_id": "app"}), json!({"mode": "a"}), false)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert_eq!(store.count("cfg", &json!({})).unwrap(), 0);

        let outcome = store
            .replace_one("cfg", &json!({"_id": "app"}), json!({"mode": "a"}), true)
            .unwrap();
        assert_eq!(outcome.upserted_id.as_deref(), Some("app"));

        let outcome = store
            .replace_one("cfg", &json!({"_id": "app"}), json!({"mode": "b"}), true)
            .unwrap();
        assert_eq!(outcome.matched, 1);

        let doc = store.find_one("cfg", &json!({"_id": "app"})).unwrap().unwrap();
        assert_eq!(doc, json!({"_id": "app", "mode": "b"}));
        assert_eq!(store.count("cfg", &json!({})).unwrap(), 1);
    }

    #[test]
    fn update_many_and_unset_field() {
        let store = DocumentStore::in_memory().unwrap();
        store.insert_one("users", json!({"_id": "1", "status": "new"})).unwrap();
        store.insert_one("users", json!({"_id": "2", "status": "new"})).unwrap();
        store.insert_one("users", json!({"_id": "3", "status": "old"})).unwrap();

        let mut set = Map::new();
        set.insert("verified".into(), json!(true));
        let n = store.update_many("users", &json!({"status": "new"}), &set).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.count("users", &json!({"verified": true})).unwrap(), 2);

        let n = store.unset_field("users", &json!({}), "verified").unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.count("users", &json!({"verified": true})).unwrap(), 0);
        assert!(store.unset_field("users", &json!({}), "_id").is_err());
    }

    #[test]
    fn delete_one_and_many() {
        let store = DocumentStore::in_memory().unwrap();
        for i in 0..4 {
            store
                .insert_one("jobs", json!({"n": i, "done": i % 2 == 0}))
                .unwrap();
        }

        assert!(store.delete_one("jobs", &json!({"n": 1})).unwrap());
        assert!(!store.delete_one("jobs", &json!({"n": 1})).unwrap());
        assert_eq!(store.delete_many("jobs", &json!({"done": true})).unwrap(), 2);
        assert_eq!(store.count("jobs", &json!({})).unwrap(), 1);
    }

    #[test]
    fn unique_index_rejects_duplicates_within_collection_only() {
        let store = DocumentStore::in_memory().unwrap();
        store
            .create_index("users", "email_unique", &["email"], true)
            .unwrap();
        // Creating it again is a no-op.
        store
            .create_index("users", "email_unique", &["email"], true)
            .unwrap();

        store.insert_one("users", json!({"email": "a@x.io"})).unwrap();
        assert!(store.insert_one("users", json!({"email": "a@x.io"})).is_err());
        store.insert_one("admins", json!({"email": "a@x.io"})).unwrap();

        assert_eq!(store.list_indexes("users").unwrap(), vec!["email_unique"]);
        assert!(store.list_indexes("admins").unwrap().is_empty());
    }

    #[test]
    fn drop_index_reports_existence() {
        let store = DocumentStore::in_memory().unwrap();
        store
            .create_index("users", "created_status", &["created_at", "status"], false)
            .unwrap();
        assert!(store.drop_index("users", "created_status").unwrap());
        assert!(!store.drop_index("users", "created_status").unwrap());
    }

    #[test]
    fn drop_collection_removes_documents_and_indexes() {
        let store = DocumentStore::in_memory().unwrap();
        store.create_index("audit", "by_ts", &["ts"], false).unwrap();
        store.insert_one("audit", json!({"ts": 1})).unwrap();
        store.insert_one("audit", json!({"ts": 2})).unwrap();

        assert_eq!(store.drop_collection("audit").unwrap(), 2);
        assert!(store.list_indexes("audit").unwrap().is_empty());
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn rejects_unsafe_names() {
        let store = DocumentStore::in_memory().unwrap();
        assert!(store.insert_one("bad'name", json!({})).is_err());
        assert!(store.create_index("users", "x\"y", &["email"], false).is_err());
        assert!(store.create_index("users", "ok", &["email') --"], false).is_err());
        assert!(store.create_index("users", "ok", &[], false).is_err());
    }

    #[test]
    fn reads_reject_invalid_collection_names() {
        let store = DocumentStore::in_memory().unwrap();
        assert!(store.find("schema migrations", &json!({})).is_err());
        assert!(store.find_sorted("schema migrations", &json!({}), "version").is_err());
        assert!(store.count("bad'name", &json!({})).is_err());
        assert!(store.delete_one("a b", &json!({})).is_err());

        assert!(validate_collection_name("schema_migrations").is_ok());
        assert!(validate_collection_name("schema migrations").is_err());
        assert!(validate_collection_name("").is_err());
    }

    #[test]
    fn list_indexes_ignores_collections_sharing_a_prefix() {
        let store = DocumentStore::in_memory().unwrap();
        store.create_index("users", "by_name", &["name"], false).unwrap();
        store
            .create_index("users__archive", "email", &["email"], false)
            .unwrap();

        assert_eq!(store.list_indexes("users").unwrap(), vec!["by_name"]);
        assert_eq!(store.list_indexes("users__archive").unwrap(), vec!["email"]);
    }

    #[test]
    fn drop_collection_keeps_other_collections_indexes() {
        let store = DocumentStore::in_memory().unwrap();
        store.create_index("users", "by_name", &["name"], false).unwrap();
        store
            .create_index("users__archive", "email", &["email"], false)
            .unwrap();

        store.drop_collection("users").unwrap();
        assert!(store.list_indexes("users").unwrap().is_empty());
        assert_eq!(store.list_indexes("users__archive").unwrap(), vec!["email"]);
    }

    #[test]
    fn index_names_do_not_collide_across_collections() {
        let store = DocumentStore::in_memory().unwrap();
        store.create_index("a", "b__c", &["x"], false).unwrap();
        store.create_index("a__b", "c", &["y"], true).unwrap();

        store.insert_one("a__b", json!({"y": 1})).unwrap();
        assert!(store.insert_one("a__b", json!({"y": 1})).is_err());
        assert_eq!(store.list_indexes("a").unwrap(), vec!["b__c"]);
        assert_eq!(store.list_indexes("a__b").unwrap(), vec!["c"]);
    }
}
