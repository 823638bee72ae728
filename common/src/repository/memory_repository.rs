use crate::AppResult;
use crate::errors::AppError;
use crate::index_trait::MongoIndexModelProvider;
use crate::query_builder::{bson_cmp, QueryBuilder};
use crate::repository_util::{Entity, OrderType, Repository, SortField};
use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::{self, Bson, Document};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

type Table = Arc<RwLock<Vec<Document>>>;

/// 进程内文档存储，按集合名分表，数据随进程结束丢失。
///
/// 每张表一把读写锁：写操作（插入、`$set`、`$inc`、删除）在写锁内完成，
/// 唯一约束检查与写入之间没有窗口。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<DashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, name: &str) -> Table {
        self.tables.entry(name.to_string()).or_default().clone()
    }

    pub async fn row_count(&self, name: &str) -> usize {
        match self.tables.get(name).map(|t| t.clone()) {
            Some(table) => table.read().await.len(),
            None => 0,
        }
    }
}

pub struct MemoryRepository<T> {
    table: Table,
    unique_keys: Vec<Vec<&'static str>>,
    _marker: PhantomData<T>,
}

impl<T: MongoIndexModelProvider> MemoryRepository<T> {
    pub fn new(store: &MemoryStore, name: &str) -> Self {
        Self { table: store.table(name), unique_keys: T::unique_keys(), _marker: Default::default() }
    }
}

fn is_blank(value: Option<&Bson>) -> bool {
    matches!(value, None | Some(Bson::Null))
}

fn row_id(row: &Document) -> Option<&str> {
    row.get_str("id").ok()
}

impl<T> MemoryRepository<T> {
    /// 与 sparse 唯一索引一致：任一字段缺失的行不参与检查
    fn check_unique(&self, rows: &[Document], candidate: &Document, skip: Option<usize>) -> AppResult<()> {
        for key in &self.unique_keys {
            if key.iter().any(|f| is_blank(candidate.get(*f))) {
                continue;
            }
            let clash = rows.iter().enumerate().filter(|(i, _)| Some(*i) != skip).any(|(_, row)| {
                key.iter().all(|f| match (row.get(*f), candidate.get(*f)) {
                    (Some(a), Some(b)) => bson_cmp(a, b) == Ordering::Equal,
                    _ => false,
                })
            });
            if clash {
                return Err(AppError::Conflict("数据已存在".to_string()));
            }
        }
        Ok(())
    }
}

fn position(rows: &[Document], id: &str) -> Option<usize> {
    rows.iter().position(|row| row_id(row) == Some(id))
}

fn compare_rows(a: &Document, b: &Document, sort: &[SortField<'_>]) -> Ordering {
    for (field, order) in sort {
        let x = a.get(*field).unwrap_or(&Bson::Null);
        let y = b.get(*field).unwrap_or(&Bson::Null);
        let ord = match order {
            OrderType::Asc => bson_cmp(x, y),
            OrderType::Desc => bson_cmp(y, x),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn find_one(&self, filter: &QueryBuilder) -> AppResult<Option<T>> {
        let rows = self.table.read().await;
        match rows.iter().find(|row| filter.matches(row)) {
            Some(row) => Ok(Some(bson::from_document(row.clone())?)),
            None => Ok(None),
        }
    }

    async fn find_page(&self, filter: &QueryBuilder, sort: &[SortField<'_>], skip: u64, limit: Option<i64>) -> AppResult<Vec<T>> {
        let mut matched = {
            let rows = self.table.read().await;
            rows.iter().filter(|row| filter.matches(row)).cloned().collect::<Vec<_>>()
        };
        // 稳定排序，同值保持写入顺序
        matched.sort_by(|a, b| compare_rows(a, b, sort));
        let limit = match limit {
            Some(n) if n > 0 => n as usize,
            _ => usize::MAX,
        };
        matched
            .into_iter()
            .skip(skip as usize)
            .take(limit)
            .map(|row| bson::from_document(row).map_err(AppError::from))
            .collect()
    }

    async fn count(&self, filter: &QueryBuilder) -> AppResult<u64> {
        let rows = self.table.read().await;
        Ok(rows.iter().filter(|row| filter.matches(row)).count() as u64)
    }

    async fn insert(&self, entity: &T) -> AppResult<()> {
        let doc = bson::to_document(entity)?;
        let mut rows = self.table.write().await;
        self.check_unique(&rows, &doc, None)?;
        rows.push(doc);
        Ok(())
    }

    async fn update_fields(&self, id: &str, fields: Document) -> AppResult<Option<T>> {
        let mut rows = self.table.write().await;
        let Some(idx) = position(&rows, id) else {
            return Ok(None);
        };
        let mut updated = rows[idx].clone();
        for (k, v) in fields {
            updated.insert(k, v);
        }
        self.check_unique(&rows, &updated, Some(idx))?;
        rows[idx] = updated.clone();
        Ok(Some(bson::from_document(updated)?))
    }

    async fn increment(&self, id: &str, field: &str, by: i64) -> AppResult<Option<T>> {
        let mut rows = self.table.write().await;
        let Some(idx) = position(&rows, id) else {
            return Ok(None);
        };
        let row = &mut rows[idx];
        let current = match row.get(field) {
            Some(Bson::Int32(v)) => *v as i64,
            Some(Bson::Int64(v)) => *v,
            Some(Bson::Double(v)) => *v as i64,
            _ => 0,
        };
        row.insert(field, Bson::Int64(current + by));
        Ok(Some(bson::from_document(row.clone())?))
    }

    async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let mut rows = self.table.write().await;
        match position(&rows, id) {
            Some(idx) => {
                rows.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn distinct_strings(&self, field: &str, filter: &QueryBuilder) -> AppResult<Vec<String>> {
        let rows = self.table.read().await;
        let mut result = vec![];
        for row in rows.iter().filter(|row| filter.matches(row)) {
            match row.get(field) {
                Some(Bson::String(s)) => result.push(s.clone()),
                Some(Bson::Array(items)) => {
                    result.extend(items.iter().filter_map(|v| v.as_str().map(str::to_string)));
                }
                _ => {}
            }
        }
        result.sort();
        result.dedup();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository_util::DbRes;
    use mongodb::bson::doc;
    use mongodb::IndexModel;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: String,
        slug: Option<String>,
        tags: Vec<String>,
        sort: i32,
        likes: i64,
    }

    impl MongoIndexModelProvider for Note {
        fn index_models() -> Vec<IndexModel> {
            vec![]
        }
        fn unique_keys() -> Vec<Vec<&'static str>> {
            vec![vec!["id"], vec!["slug"]]
        }
    }

    fn note(id: &str, slug: Option<&str>, sort: i32) -> Note {
        Note { id: id.into(), slug: slug.map(Into::into), tags: vec!["a".into()], sort, likes: 0 }
    }

    fn repo() -> Arc<dyn Repository<Note>> {
        DbRes::memory().repository::<Note>("notes")
    }

    #[tokio::test]
    async fn unique_key_rejects_duplicates_but_ignores_missing_values() {
        let repo = repo();
        repo.insert(&note("1", Some("coding"), 0)).await.unwrap();
        let err = repo.insert(&note("2", Some("coding"), 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        repo.insert(&note("3", None, 0)).await.unwrap();
        repo.insert(&note("4", None, 0)).await.unwrap();
        assert_eq!(repo.count(&QueryBuilder::new()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_cannot_steal_a_unique_value() {
        let repo = repo();
        repo.insert(&note("1", Some("a"), 0)).await.unwrap();
        repo.insert(&note("2", Some("b"), 0)).await.unwrap();
        let err = repo.update_fields("2", doc! { "slug": "a" }).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let same = repo.update_fields("2", doc! { "slug": "b", "sort": 5 }).await.unwrap().unwrap();
        assert_eq!(same.sort, 5);
        assert!(repo.update_fields("9", doc! { "sort": 1 }).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sort_is_stable_on_ties() {
        let repo = repo();
        repo.insert(&note("1", None, 1)).await.unwrap();
        repo.insert(&note("2", None, 0)).await.unwrap();
        repo.insert(&note("3", None, 1)).await.unwrap();
        repo.insert(&note("4", None, 0)).await.unwrap();
        let rows = repo.find_many(&QueryBuilder::new(), &[("sort", OrderType::Asc)]).await.unwrap();
        let ids = rows.iter().map(|n| n.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["2", "4", "1", "3"]);

        let page = repo.find_page(&QueryBuilder::new(), &[("sort", OrderType::Desc)], 1, Some(2)).await.unwrap();
        let ids = page.iter().map(|n| n.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let repo = repo();
        repo.insert(&note("1", None, 0)).await.unwrap();
        let tasks = (0..50)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment("1", "likes", 1).await })
            })
            .collect::<Vec<_>>();
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        let n = repo.find_by_id("1").await.unwrap().unwrap();
        assert_eq!(n.likes, 50);
        assert!(repo.increment("missing", "likes", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repositories_on_one_store_share_tables_by_name() {
        let store = MemoryStore::new();
        let a = MemoryRepository::<Note>::new(&store, "notes");
        let b = MemoryRepository::<Note>::new(&store, "notes");
        let other = MemoryRepository::<Note>::new(&store, "other");
        a.insert(&note("1", Some("x"), 0)).await.unwrap();
        assert!(b.find_by_id("1").await.unwrap().is_some());
        assert!(matches!(b.insert(&note("2", Some("x"), 0)).await.unwrap_err(), AppError::Conflict(_)));
        other.insert(&note("1", Some("x"), 0)).await.unwrap();
        assert_eq!(store.row_count("notes").await, 1);
        assert_eq!(store.row_count("other").await, 1);
        assert_eq!(store.row_count("missing").await, 0);
    }

    #[tokio::test]
    async fn delete_and_distinct() {
        let repo = repo();
        let mut n = note("1", None, 0);
        n.tags = vec!["b".into(), "a".into()];
        repo.insert(&n).await.unwrap();
        repo.insert(&note("2", None, 0)).await.unwrap();
        assert_eq!(repo.distinct_strings("tags", &QueryBuilder::new()).await.unwrap(), vec!["a", "b"]);
        assert!(repo.delete_by_id("1").await.unwrap());
        assert!(!repo.delete_by_id("1").await.unwrap());
        assert_eq!(repo.distinct_strings("tags", &QueryBuilder::new()).await.unwrap(), vec!["a"]);
    }
}
