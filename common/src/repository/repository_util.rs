use crate::AppResult;
use crate::config::DatabaseConfig;
use crate::index_trait::MongoIndexModelProvider;
use crate::memory_repository::{MemoryRepository, MemoryStore};
use crate::query_builder::{PageInfo, QueryBuilder};
use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// 可存储实体
pub trait Entity: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {}
impl<T> Entity for T where T: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: &PageInfo) -> Self {
        Self { items, total, page: page.page, page_size: page.page_size, total_pages: page.total_pages(total) }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum OrderType {
    #[default]
    Asc,
    Desc,
}

impl OrderType {
    pub fn direction(&self) -> i32 {
        match self {
            OrderType::Asc => 1,
            OrderType::Desc => -1,
        }
    }
}

pub type SortField<'a> = (&'a str, OrderType);

/// 存储访问接口。
///
/// 实体以 `id` 字段作为业务主键；同值排序时按写入顺序。
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<T>> {
        self.find_one(&QueryBuilder::new().eq("id", id)).await
    }
    async fn find_one(&self, filter: &QueryBuilder) -> AppResult<Option<T>>;
    async fn find_many(&self, filter: &QueryBuilder, sort: &[SortField<'_>]) -> AppResult<Vec<T>> {
        self.find_page(filter, sort, 0, None).await
    }
    async fn find_page(&self, filter: &QueryBuilder, sort: &[SortField<'_>], skip: u64, limit: Option<i64>) -> AppResult<Vec<T>>;
    async fn count(&self, filter: &QueryBuilder) -> AppResult<u64>;
    async fn insert(&self, entity: &T) -> AppResult<()>;
    /// `$set` 指定字段，返回更新后的实体
    async fn update_fields(&self, id: &str, fields: Document) -> AppResult<Option<T>>;
    /// 原子 `$inc`，返回更新后的实体
    async fn increment(&self, id: &str, field: &str, by: i64) -> AppResult<Option<T>>;
    async fn delete_by_id(&self, id: &str) -> AppResult<bool>;
    async fn distinct_strings(&self, field: &str, filter: &QueryBuilder) -> AppResult<Vec<String>>;
}

#[allow(dead_code)]
pub struct BaseRepository<T: Send + Sync> {
    pub collection: Collection<T>,
    _marker: PhantomData<T>,
}

impl<T: Send + Sync> BaseRepository<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection, _marker: Default::default() }
    }
}

fn sort_doc(sort: &[SortField<'_>]) -> Document {
    let mut d = doc! {};
    for (field, order) in sort {
        d.insert(*field, order.direction());
    }
    // 同值时按写入顺序
    if !d.contains_key("_id") {
        d.insert("_id", 1);
    }
    d
}

#[async_trait]
impl<T: Entity> Repository<T> for BaseRepository<T> {
    async fn find_one(&self, filter: &QueryBuilder) -> AppResult<Option<T>> {
        let result = self.collection.find_one(filter.build()).await?;
        Ok(result)
    }

    async fn find_page(&self, filter: &QueryBuilder, sort: &[SortField<'_>], skip: u64, limit: Option<i64>) -> AppResult<Vec<T>> {
        let find_options = FindOptions::builder().sort(sort_doc(sort)).skip(skip).limit(limit).build();
        let mut cursor = self.collection.find(filter.build()).with_options(find_options).await?;
        let mut results: Vec<T> = vec![];
        while let Some(doc) = cursor.try_next().await? {
            results.push(doc);
        }
        Ok(results)
    }

    async fn count(&self, filter: &QueryBuilder) -> AppResult<u64> {
        Ok(self.collection.count_documents(filter.build()).await?)
    }

    async fn insert(&self, entity: &T) -> AppResult<()> {
        self.collection.insert_one(entity).await?;
        Ok(())
    }

    async fn update_fields(&self, id: &str, fields: Document) -> AppResult<Option<T>> {
        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();
        let result = self.collection.find_one_and_update(doc! { "id": id }, doc! { "$set": fields }).with_options(options).await?;
        Ok(result)
    }

    async fn increment(&self, id: &str, field: &str, by: i64) -> AppResult<Option<T>> {
        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();
        let result = self.collection.find_one_and_update(doc! { "id": id }, doc! { "$inc": { field: by } }).with_options(options).await?;
        Ok(result)
    }

    async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn distinct_strings(&self, field: &str, filter: &QueryBuilder) -> AppResult<Vec<String>> {
        let values = self.collection.distinct(field, filter.build()).await?;
        let mut result = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect::<Vec<_>>();
        result.sort();
        result.dedup();
        Ok(result)
    }
}

/// 存储句柄，启动时创建一次并注入到各服务
#[derive(Clone)]
pub enum DbRes {
    Mongo(Database),
    Memory(MemoryStore),
}

impl DbRes {
    /// 按 `database.url` 选择存储：`memory://` 或 MongoDB
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        if config.is_memory() {
            return Ok(Self::memory());
        }
        let client_options = ClientOptions::parse(&config.url).await.map_err(|e| anyhow!("MongoDB URI parse error: {}", e))?;
        let client = Client::with_options(client_options).map_err(|e| anyhow!("MongoDB client init error: {}", e))?;
        Ok(DbRes::Mongo(client.database(&config.db_name)))
    }

    pub fn memory() -> Self {
        DbRes::Memory(MemoryStore::new())
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, DbRes::Memory(_))
    }

    pub fn repository<T: Entity + MongoIndexModelProvider>(&self, name: &str) -> Arc<dyn Repository<T>> {
        match self {
            DbRes::Mongo(db) => Arc::new(BaseRepository::new(db.collection::<T>(name))),
            DbRes::Memory(store) => Arc::new(MemoryRepository::<T>::new(store, name)),
        }
    }

    /// 创建缺失的索引；内存存储只需在仓库上登记唯一约束
    pub async fn ensure_indexes<T: MongoIndexModelProvider>(&self, name: &str) -> AppResult<()> {
        let DbRes::Mongo(db) = self else {
            return Ok(());
        };
        let coll = db.collection::<Document>(name);
        // 集合尚未创建时列索引会失败，按无索引处理
        let existing = coll.list_index_names().await.unwrap_or_default();
        for target in T::index_models() {
            let target_name = target.options.as_ref().and_then(|o| o.name.clone()).unwrap_or_default();
            if existing.contains(&target_name) {
                continue;
            }
            match coll.create_index(target.clone()).await {
                Ok(_) => log::info!("✅ 创建索引成功: {}.{}", name, target.keys),
                Err(e) => {
                    log::error!("❌ 创建索引失败: {}.{} {:?}", name, target.keys, e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}
