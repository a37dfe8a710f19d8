//! SQLite implementation of the Store trait.
//!
//! This is the durable backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking. Every write runs in its own
//! transaction; every read runs under the connection mutex, so a single
//! call always sees one consistent snapshot.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use namereg_core::{DomainRecord, MetadataUpdate, NameKey, OwnerId, Timestamp};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_lease, InsertResult, Store};

const RECORD_COLUMNS: &str = "name_key, name, owner, created_at, expires_at, bio, address";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Timestamps are stored as SQLite INTEGER (i64).
fn ts_to_sql(ts: Timestamp) -> Result<i64> {
    i64::try_from(ts)
        .map_err(|_| StoreError::InvalidData(format!("timestamp {} out of range", ts)))
}

/// `now` for comparisons. Anything past i64::MAX is later than every
/// storable expiry.
fn query_now(now: Timestamp) -> i64 {
    i64::try_from(now).unwrap_or(i64::MAX)
}

fn blob32(row: &Row<'_>, idx: usize) -> rusqlite::Result<[u8; 32]> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "32-byte blob".into(), Type::Blob))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

// Column order follows RECORD_COLUMNS.
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DomainRecord> {
    Ok(DomainRecord {
        key: NameKey::from_bytes(blob32(row, 0)?),
        name: row.get(1)?,
        owner: OwnerId::from_bytes(blob32(row, 2)?),
        created_at: timestamp(row, 3)?,
        expires_at: timestamp(row, 4)?,
        bio: row.get(5)?,
        address: row.get(6)?,
    })
}

fn select_record(conn: &Connection, key: &NameKey) -> Result<Option<DomainRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM domains WHERE name_key = ?1", RECORD_COLUMNS),
        params![key.as_bytes().as_slice()],
        row_to_record,
    )
    .optional()
    .map_err(StoreError::from)
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &NameKey, now: Timestamp) -> Result<Option<DomainRecord>> {
        let key = *key;
        self.blocking(move |conn| {
            Ok(select_record(conn, &key)?.filter(|r| r.is_live(now)))
        })
        .await
    }

    async fn get_any(&self, key: &NameKey) -> Result<Option<DomainRecord>> {
        let key = *key;
        self.blocking(move |conn| select_record(conn, &key)).await
    }

    async fn all_live(&self, now: Timestamp) -> Result<Vec<DomainRecord>> {
        let now = query_now(now);
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM domains WHERE expires_at > ?1 ORDER BY inserted_seq",
                RECORD_COLUMNS
            ))?;
            let records = stmt
                .query_map(params![now], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn insert(&self, record: &DomainRecord, now: Timestamp) -> Result<InsertResult> {
        check_lease(record)?;

        let record = record.clone();
        let created_at = ts_to_sql(record.created_at)?;
        let expires_at = ts_to_sql(record.expires_at)?;
        let now = query_now(now);

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let key = record.key.as_bytes().as_slice();
            let owner = record.owner.as_bytes().as_slice();

            let existing: Option<(Vec<u8>, i64)> = tx
                .query_row(
                    "SELECT owner, expires_at FROM domains WHERE name_key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let previous_owner = match existing {
                Some((_, existing_expiry)) if existing_expiry > now => {
                    return Err(StoreError::NameTaken(record.key));
                }
                Some((bytes, _)) => {
                    let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                        StoreError::InvalidData(format!("malformed owner for {}", record.key))
                    })?;
                    Some(OwnerId::from_bytes(bytes))
                }
                None => None,
            };

            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(inserted_seq), 0) + 1 FROM domains",
                [],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT OR REPLACE INTO domains (
                    name_key, name, owner, created_at, expires_at, bio, address, inserted_seq
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    key,
                    record.name,
                    owner,
                    created_at,
                    expires_at,
                    record.bio,
                    record.address,
                    seq,
                ],
            )?;

            if let Some(prev) = &previous_owner {
                tx.execute(
                    "DELETE FROM owner_index WHERE owner = ?1 AND name_key = ?2",
                    params![prev.as_bytes().as_slice(), key],
                )?;
            }
            tx.execute(
                "INSERT OR IGNORE INTO owner_index (owner, name_key) VALUES (?1, ?2)",
                params![owner, key],
            )?;

            tx.commit()?;

            Ok(match previous_owner {
                Some(previous_owner) => {
                    tracing::debug!(
                        key = %record.key,
                        previous = %previous_owner,
                        owner = %record.owner,
                        "replaced expired record"
                    );
                    InsertResult::Replaced { previous_owner }
                }
                None => InsertResult::Inserted,
            })
        })
        .await
    }

    async fn extend_expiry(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        duration_secs: u64,
        now: Timestamp,
        grace_secs: u64,
    ) -> Result<DomainRecord> {
        let key = *key;
        let owner = *owner;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let mut record = select_record(&tx, &key)?
                .filter(|r| r.is_renewable(now, grace_secs))
                .ok_or(StoreError::NotFound(key))?;

            if record.owner != owner {
                return Err(StoreError::Unauthorized(key));
            }

            record.expires_at = record.renewed_expiry(duration_secs, now)?;
            tx.execute(
                "UPDATE domains SET expires_at = ?1 WHERE name_key = ?2",
                params![ts_to_sql(record.expires_at)?, key.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            Ok(record)
        })
        .await
    }

    async fn update_metadata(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        update: &MetadataUpdate,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        let key = *key;
        let owner = *owner;
        let update = update.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let mut record = select_record(&tx, &key)?
                .filter(|r| r.is_live(now))
                .ok_or(StoreError::NotFound(key))?;

            if record.owner != owner {
                return Err(StoreError::Unauthorized(key));
            }

            update.apply_to(&mut record);
            tx.execute(
                "UPDATE domains SET bio = ?1, address = ?2 WHERE name_key = ?3",
                params![record.bio, record.address, key.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            Ok(record)
        })
        .await
    }

    async fn domains_of(&self, owner: &OwnerId) -> Result<BTreeSet<NameKey>> {
        let owner = *owner;
        self.blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT name_key FROM owner_index WHERE owner = ?1")?;
            let keys = stmt
                .query_map(params![owner.as_bytes().as_slice()], |row| {
                    blob32(row, 0).map(NameKey::from_bytes)
                })?
                .collect::<rusqlite::Result<BTreeSet<_>>>()?;
            Ok(keys)
        })
        .await
    }

    async fn live_records_of(
        &self,
        owner: &OwnerId,
        now: Timestamp,
    ) -> Result<Vec<DomainRecord>> {
        let owner = *owner;
        let now = query_now(now);

        self.blocking(move |conn| {
            // BLOB comparison is memcmp, so this matches NameKey's Ord.
            let mut stmt = conn.prepare(
                "SELECT d.name_key, d.name, d.owner, d.created_at, d.expires_at, d.bio, d.address
                 FROM owner_index i
                 JOIN domains d ON d.name_key = i.name_key
                 WHERE i.owner = ?1 AND d.owner = ?1 AND d.expires_at > ?2
                 ORDER BY d.name_key",
            )?;
            let records = stmt
                .query_map(params![owner.as_bytes().as_slice(), now], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namereg_core::{CoreError, Keypair, MAX_TIMESTAMP};

    fn owner(seed: u8) -> OwnerId {
        Keypair::from_seed(&[seed; 32]).owner_id()
    }

    fn record(name: &str, owner: OwnerId, now: Timestamp, duration: u64) -> DomainRecord {
        DomainRecord::new(NameKey::derive(name), name, owner, now, duration).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteStore::open_memory().unwrap();
        let r = record("alice", owner(1), 100, 50);

        assert_eq!(store.insert(&r, 100).await.unwrap(), InsertResult::Inserted);
        assert_eq!(store.get(&r.key, 149).await.unwrap(), Some(r.clone()));
        assert_eq!(store.get(&r.key, 150).await.unwrap(), None);
        assert_eq!(store.get_any(&r.key).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn test_conflict_and_replacement() {
        let store = SqliteStore::open_memory().unwrap();
        let (a, b) = (owner(1), owner(2));
        let r = record("alice", a, 100, 50);
        store.insert(&r, 100).await.unwrap();

        let err = store.insert(&record("alice", b, 120, 50), 120).await.unwrap_err();
        assert!(matches!(err, StoreError::NameTaken(_)));

        let fresh = record("alice", b, 200, 50);
        let result = store.insert(&fresh, 200).await.unwrap();
        assert_eq!(result, InsertResult::Replaced { previous_owner: a });

        assert!(store.domains_of(&a).await.unwrap().is_empty());
        assert_eq!(
            store.domains_of(&b).await.unwrap().into_iter().collect::<Vec<_>>(),
            vec![r.key]
        );
        assert_eq!(store.get(&r.key, 210).await.unwrap().unwrap().owner, b);
    }

    #[tokio::test]
    async fn test_extend_and_metadata() {
        let store = SqliteStore::open_memory().unwrap();
        let a = owner(1);
        let r = record("alice", a, 100, 50);
        store.insert(&r, 100).await.unwrap();

        let err = store.extend_expiry(&r.key, &a, 0, 110, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::InvalidDuration(_))));

        let err = store.extend_expiry(&r.key, &owner(2), 100, 110, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));

        let extended = store.extend_expiry(&r.key, &a, 100, 160, 20).await.unwrap();
        assert_eq!(extended.expires_at, 250);
        assert_eq!(store.get(&r.key, 160).await.unwrap(), Some(extended));

        let updated = store
            .update_metadata(&r.key, &a, &MetadataUpdate::address("0xabc"), 200)
            .await
            .unwrap();
        assert_eq!(updated.address.as_deref(), Some("0xabc"));
        assert_eq!(store.get(&r.key, 200).await.unwrap(), Some(updated));

        let err = store
            .update_metadata(&r.key, &owner(2), &MetadataUpdate::address("0xbad"), 200)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
        let stored = store.get(&r.key, 200).await.unwrap().unwrap();
        assert_eq!(stored.address.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn test_renewal_within_grace_must_pass_now() {
        let store = SqliteStore::open_memory().unwrap();
        let a = owner(1);
        let r = record("alice", a, 0, 100);
        store.insert(&r, 0).await.unwrap();

        let err = store.extend_expiry(&r.key, &a, 20, 130, 50).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::InvalidDuration(_))));
        assert_eq!(store.get_any(&r.key).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn test_listings() {
        let store = SqliteStore::open_memory().unwrap();
        let (a, b) = (owner(1), owner(2));
        store.insert(&record("zed", a, 0, 10), 0).await.unwrap();
        store.insert(&record("amy", b, 0, 100), 0).await.unwrap();
        store.insert(&record("kim", a, 0, 100), 0).await.unwrap();

        let names: Vec<String> = store
            .all_live(50)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["amy", "kim"]);

        let held = store.live_records_of(&a, 50).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].name, "kim");
        assert_eq!(store.domains_of(&a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_timestamp() {
        let store = SqliteStore::open_memory().unwrap();
        let mut r = record("alice", owner(1), 0, 5);
        r.created_at = MAX_TIMESTAMP;
        r.expires_at = u64::MAX;
        let err = store.insert(&r, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.get_any(&r.key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");
        let r = record("alice", owner(1), 100, 50);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&r, 100).await.unwrap();
            store
                .update_metadata(&r.key, &r.owner, &MetadataUpdate::bio("hi"), 110)
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let loaded = store.get(&r.key, 120).await.unwrap().unwrap();
        assert_eq!(loaded.bio.as_deref(), Some("hi"));
        assert!(store.domains_of(&r.owner).await.unwrap().contains(&r.key));
    }
}
