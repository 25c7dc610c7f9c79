use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use super::StoreError;

/// A secondary index declared by a record type: a name plus a key extractor.
pub struct IndexSpec<T> {
    pub name: &'static str,
    pub key: fn(&T) -> String,
}

/// A document that can live in a [`Table`].
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    const INDEXES: &'static [IndexSpec<Self>];

    fn id(&self) -> &str;
}

type IndexMap = HashMap<&'static str, HashMap<String, BTreeSet<String>>>;

struct TableInner<T> {
    rows: BTreeMap<String, T>,
    indexes: IndexMap,
}

impl<T: Record> TableInner<T> {
    fn empty() -> Self {
        let indexes = T::INDEXES
            .iter()
            .map(|spec| (spec.name, HashMap::new()))
            .collect();
        TableInner {
            rows: BTreeMap::new(),
            indexes,
        }
    }

    fn index_insert(&mut self, record: &T) {
        for spec in T::INDEXES {
            if let Some(index) = self.indexes.get_mut(spec.name) {
                index
                    .entry((spec.key)(record))
                    .or_default()
                    .insert(record.id().to_string());
            }
        }
    }

    fn index_remove(&mut self, record: &T) {
        for spec in T::INDEXES {
            let Some(index) = self.indexes.get_mut(spec.name) else {
                continue;
            };
            let key = (spec.key)(record);
            if let Some(ids) = index.get_mut(&key) {
                ids.remove(record.id());
                if ids.is_empty() {
                    index.remove(&key);
                }
            }
        }
    }

    /// The first other row sharing `record`'s key in `index` for which `clash` holds.
    fn find_clash<C>(&self, index: &str, record: &T, clash: C) -> Result<Option<&T>, StoreError>
    where
        C: Fn(&T, &T) -> bool,
    {
        let spec = T::INDEXES
            .iter()
            .find(|spec| spec.name == index)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: T::TABLE,
                index: index.to_string(),
            })?;
        let key = (spec.key)(record);
        Ok(self
            .indexes
            .get(index)
            .and_then(|entries| entries.get(&key))
            .and_then(|ids| {
                ids.iter()
                    .filter(|id| id.as_str() != record.id())
                    .filter_map(|id| self.rows.get(id))
                    .find(|other| clash(record, *other))
            }))
    }

    fn clash_error(index: &str, record: &T, existing: &T) -> StoreError {
        StoreError::Clash {
            table: T::TABLE,
            id: record.id().to_string(),
            existing: existing.id().to_string(),
            index: index.to_string(),
        }
    }

    fn rebuild_indexes(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        *self = TableInner::empty();
        for record in rows.values() {
            self.index_insert(record);
        }
        self.rows = rows;
    }
}

/// An in-memory document table keyed by record id with declared secondary indexes.
///
/// Every read hands out an owned clone, so callers can never mutate stored
/// rows without going through `update`.
pub struct Table<T: Record> {
    inner: RwLock<TableInner<T>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Table {
            inner: RwLock::new(TableInner::empty()),
        }
    }

    /// Builds a table from previously persisted rows.
    pub fn from_rows(rows: Vec<T>) -> Result<Self, StoreError> {
        let mut inner = TableInner::empty();
        for record in rows {
            if inner.rows.contains_key(record.id()) {
                return Err(StoreError::duplicate::<T>(record.id()));
            }
            inner.index_insert(&record);
            inner.rows.insert(record.id().to_string(), record);
        }
        Ok(Table {
            inner: RwLock::new(inner),
        })
    }

    pub fn name(&self) -> &'static str {
        T::TABLE
    }

    pub async fn add(&self, record: T) -> Result<T, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.rows.contains_key(record.id()) {
            return Err(StoreError::duplicate::<T>(record.id()));
        }
        inner.index_insert(&record);
        inner.rows.insert(record.id().to_string(), record.clone());
        Ok(record)
    }

    /// Inserts `record` unless a stored row with the same `index` key satisfies
    /// `clash`. The check and the insert share one write lock.
    pub async fn add_unique<C>(&self, record: T, index: &str, clash: C) -> Result<T, StoreError>
    where
        C: Fn(&T, &T) -> bool,
    {
        let mut inner = self.inner.write().await;
        if inner.rows.contains_key(record.id()) {
            return Err(StoreError::duplicate::<T>(record.id()));
        }
        if let Some(existing) = inner.find_clash(index, &record, &clash)? {
            return Err(TableInner::clash_error(index, &record, existing));
        }
        inner.index_insert(&record);
        inner.rows.insert(record.id().to_string(), record.clone());
        Ok(record)
    }

    /// Inserts all records or none of them.
    pub async fn bulk_add(&self, records: Vec<T>) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let mut incoming = BTreeSet::new();
        for record in &records {
            if inner.rows.contains_key(record.id()) || !incoming.insert(record.id()) {
                return Err(StoreError::duplicate::<T>(record.id()));
            }
        }
        let added = records.len();
        for record in records {
            inner.index_insert(&record);
            inner.rows.insert(record.id().to_string(), record);
        }
        Ok(added)
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.inner.read().await.rows.get(id).cloned()
    }

    pub async fn require(&self, id: &str) -> Result<T, StoreError> {
        self.get(id)
            .await
            .ok_or_else(|| StoreError::not_found::<T>(id))
    }

    /// Applies `change` to the stored record and returns the result.
    /// The closure must not alter the record id.
    pub async fn update<F>(&self, id: &str, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.inner.write().await;
        let mut record = inner
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found::<T>(id))?;
        inner.index_remove(&record);
        change(&mut record);
        inner.index_insert(&record);
        inner.rows.insert(id.to_string(), record.clone());
        Ok(record)
    }

    /// Like [`Table::update`], but the changed record is discarded if another
    /// row with the same `index` key satisfies `clash`.
    pub async fn update_unique<F, C>(
        &self,
        id: &str,
        change: F,
        index: &str,
        clash: C,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T),
        C: Fn(&T, &T) -> bool,
    {
        let mut inner = self.inner.write().await;
        let original = inner
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found::<T>(id))?;
        let mut record = original.clone();
        change(&mut record);
        if let Some(existing) = inner.find_clash(index, &record, &clash)? {
            return Err(TableInner::clash_error(index, &record, existing));
        }
        inner.index_remove(&original);
        inner.index_insert(&record);
        inner.rows.insert(id.to_string(), record.clone());
        Ok(record)
    }

    /// Inserts or replaces a record, returning the previous version if any.
    pub async fn upsert(&self, record: T) -> Option<T> {
        let mut inner = self.inner.write().await;
        let previous = inner.rows.remove(record.id());
        if let Some(old) = &previous {
            inner.index_remove(old);
        }
        inner.index_insert(&record);
        inner.rows.insert(record.id().to_string(), record);
        previous
    }

    pub async fn delete(&self, id: &str) -> Result<T, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .rows
            .remove(id)
            .ok_or_else(|| StoreError::not_found::<T>(id))?;
        inner.index_remove(&record);
        Ok(record)
    }

    /// Runs a multi-record mutation under a single write lock and reindexes afterwards.
    pub async fn mutate<R, F>(&self, change: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, T>) -> Result<R, StoreError>,
    {
        let mut inner = self.inner.write().await;
        let result = change(&mut inner.rows);
        inner.rebuild_indexes();
        result
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    /// All rows in primary-key order.
    pub async fn all(&self) -> Vec<T> {
        self.inner.read().await.rows.values().cloned().collect()
    }

    /// All rows ordered ascending by `key`, ties broken by id.
    pub async fn ordered_by<K, F>(&self, key: F) -> Vec<T>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let mut rows = self.all().await;
        rows.sort_by(|a, b| key(a).cmp(&key(b)).then_with(|| a.id().cmp(b.id())));
        rows
    }

    /// Rows whose declared index `index` has key `value`.
    pub async fn find_by(&self, index: &str, value: &str) -> Result<Vec<T>, StoreError> {
        let inner = self.inner.read().await;
        let ids = inner
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: T::TABLE,
                index: index.to_string(),
            })?;
        Ok(ids
            .get(value)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.rows.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Number of rows per key of the declared index `index`.
    pub async fn count_by(&self, index: &str) -> Result<BTreeMap<String, usize>, StoreError> {
        let inner = self.inner.read().await;
        let ids = inner
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: T::TABLE,
                index: index.to_string(),
            })?;
        Ok(ids
            .iter()
            .map(|(key, ids)| (key.clone(), ids.len()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        folder: String,
        rank: i64,
    }

    impl Record for Note {
        const TABLE: &'static str = "notes";
        const INDEXES: &'static [IndexSpec<Self>] = &[IndexSpec {
            name: "folder",
            key: |n| n.folder.clone(),
        }];

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, folder: &str, rank: i64) -> Note {
        Note {
            id: id.to_string(),
            folder: folder.to_string(),
            rank,
        }
    }

    #[tokio::test]
    async fn test_add_rejects_existing_id() {
        let table = Table::new();
        table.add(note("a", "inbox", 1)).await.unwrap();
        let err = table.add(note("a", "done", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(table.get("a").await.unwrap().folder, "inbox");
    }

    #[tokio::test]
    async fn test_bulk_add_is_all_or_nothing() {
        let table = Table::new();
        table.add(note("b", "inbox", 1)).await.unwrap();
        let batch = vec![note("a", "inbox", 0), note("b", "inbox", 2)];
        assert!(table.bulk_add(batch).await.is_err());
        assert_eq!(table.count().await, 1);

        let added = table
            .bulk_add(vec![note("c", "inbox", 3), note("d", "done", 4)])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(table.count().await, 3);
    }

    #[tokio::test]
    async fn test_reads_are_detached_copies() {
        let table = Table::new();
        table.add(note("a", "inbox", 1)).await.unwrap();
        let mut copy = table.get("a").await.unwrap();
        copy.folder = "tampered".to_string();
        assert_eq!(table.get("a").await.unwrap().folder, "inbox");
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let table: Table<Note> = Table::new();
        let err = table.update("ghost", |n| n.rank = 9).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_moves_index_entry() {
        let table = Table::new();
        table.add(note("a", "inbox", 1)).await.unwrap();
        table
            .update("a", |n| n.folder = "done".to_string())
            .await
            .unwrap();
        assert!(table.find_by("folder", "inbox").await.unwrap().is_empty());
        assert_eq!(table.find_by("folder", "done").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_index() {
        let table = Table::new();
        table.add(note("a", "inbox", 1)).await.unwrap();
        table.delete("a").await.unwrap();
        assert_eq!(table.count().await, 0);
        assert!(table.count_by("folder").await.unwrap().is_empty());
        assert!(table.delete("a").await.is_err());
    }

    #[tokio::test]
    async fn test_ordered_by_sorts_on_key() {
        let table = Table::new();
        table
            .bulk_add(vec![note("a", "x", 3), note("b", "x", 1), note("c", "x", 2)])
            .await
            .unwrap();
        let ids: Vec<_> = table
            .ordered_by(|n| n.rank)
            .await
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_unknown_index_is_an_error() {
        let table: Table<Note> = Table::new();
        assert!(matches!(
            table.find_by("colour", "red").await,
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[tokio::test]
    async fn test_mutate_reindexes_every_row() {
        let table = Table::new();
        table
            .bulk_add(vec![note("a", "inbox", 1), note("b", "inbox", 2)])
            .await
            .unwrap();
        table
            .mutate(|rows| {
                for row in rows.values_mut() {
                    row.folder = "archive".to_string();
                }
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(table.find_by("folder", "archive").await.unwrap().len(), 2);
        assert!(table.find_by("folder", "inbox").await.unwrap().is_empty());
    }

    fn same_rank(a: &Note, b: &Note) -> bool {
        a.rank == b.rank
    }

    #[tokio::test]
    async fn test_add_unique_checks_rows_sharing_the_key() {
        let table = Table::new();
        table.add(note("a", "inbox", 1)).await.unwrap();

        let err = table
            .add_unique(note("b", "inbox", 1), "folder", same_rank)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Clash { ref existing, .. } if existing == "a"));
        assert_eq!(table.count().await, 1);

        // Same rank in another folder is not a clash.
        table
            .add_unique(note("c", "done", 1), "folder", same_rank)
            .await
            .unwrap();
        assert_eq!(table.count().await, 2);
    }

    #[tokio::test]
    async fn test_update_unique_discards_clashing_change() {
        let table = Table::new();
        table
            .bulk_add(vec![note("a", "inbox", 1), note("b", "done", 1)])
            .await
            .unwrap();

        let err = table
            .update_unique("b", |n| n.folder = "inbox".to_string(), "folder", same_rank)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Clash { .. }));
        assert_eq!(table.get("b").await.unwrap().folder, "done");
        assert_eq!(table.find_by("folder", "inbox").await.unwrap().len(), 1);

        // A row never clashes with itself.
        let kept = table
            .update_unique("a", |n| n.folder = "inbox".to_string(), "folder", same_rank)
            .await
            .unwrap();
        assert_eq!(kept.rank, 1);
    }

    #[tokio::test]
    async fn test_unique_checks_need_a_declared_index() {
        let table: Table<Note> = Table::new();
        let err = table
            .add_unique(note("a", "inbox", 1), "rank", same_rank)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex { .. }));
    }
}
