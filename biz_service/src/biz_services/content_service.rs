use crate::biz_services::USER_COLLECTION;
use crate::entitys::category_entity::CategoryEntity;
use crate::entitys::content::{AuthorView, ContentEntity, ContentView, Counter, CounterValue};
use crate::entitys::user_entity::UserEntity;
use common::errors::AppError;
use common::query_builder::{QueryBuilder, QueryFilterProvider};
use common::repository_util::{DbRes, OrderType, PageResult, Repository};
use common::util::common_utils::build_id;
use common::util::date_util::now_millis;
use common::AppResult;
use std::collections::HashMap;
use std::sync::Arc;

/// 五类内容共用的 CRUD / 分页 / 计数服务
pub struct ContentService<T: ContentEntity> {
    pub dao: Arc<dyn Repository<T>>,
    category_dao: Arc<dyn Repository<CategoryEntity>>,
    user_dao: Arc<dyn Repository<UserEntity>>,
}

impl<T: ContentEntity> ContentService<T> {
    pub fn new(db_res: &DbRes) -> Self {
        Self {
            dao: db_res.repository::<T>(T::COLLECTION),
            category_dao: db_res.repository::<CategoryEntity>(T::CATEGORY_COLLECTION),
            user_dao: db_res.repository::<UserEntity>(USER_COLLECTION),
        }
    }

    /// 分页列表，按创建时间倒序；列表与总数是两次独立查询
    pub async fn find_all(&self, query: &T::Query) -> AppResult<PageResult<ContentView<T>>> {
        let filter = query.to_query_builder();
        let page = query.page_info();
        let sort = [("createdAt", OrderType::Desc)];
        let (items, total) = futures::try_join!(
            self.dao.find_page(&filter, &sort, page.skip(), Some(page.page_size as i64)),
            self.dao.count(&filter)
        )?;
        let items = self.attach(items).await?;
        Ok(PageResult::new(items, total, &page))
    }

    /// 详情。带浏览计数的内容先原子 +1，返回 +1 之后的数据
    pub async fn find_one(&self, id: &str) -> AppResult<ContentView<T>> {
        let item = match T::VIEW_COUNTER {
            Some(counter) => self.dao.increment(id, counter.as_ref(), 1).await?,
            None => self.dao.find_by_id(id).await?,
        };
        let item = item.ok_or_else(|| AppError::not_found(T::LABEL))?;
        self.attach_one(item).await
    }

    pub async fn create(&self, draft: T::Draft, author_id: Option<&str>) -> AppResult<ContentView<T>> {
        let entity = T::from_draft(draft, build_id(), author_id.map(str::to_string), now_millis());
        if let Some(category_id) = entity.category_id() {
            self.ensure_category(category_id).await?;
        }
        self.dao.insert(&entity).await?;
        self.attach_one(entity).await
    }

    /// 只更新请求里出现的字段，计数器不可改
    pub async fn update(&self, id: &str, patch: T::Patch) -> AppResult<ContentView<T>> {
        if self.dao.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(T::LABEL));
        }
        let mut fields = mongodb::bson::to_document(&patch)?;
        if let Ok(category_id) = fields.get_str("categoryId") {
            self.ensure_category(category_id).await?;
        }
        fields.insert("updatedAt", now_millis());
        let updated = self.dao.update_fields(id, fields).await?.ok_or_else(|| AppError::not_found(T::LABEL))?;
        self.attach_one(updated).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.dao.delete_by_id(id).await? {
            return Err(AppError::not_found(T::LABEL));
        }
        Ok(())
    }

    /// 计数器原子 +1，返回新值
    pub async fn increment(&self, id: &str, counter: Counter) -> AppResult<CounterValue> {
        let item = self.dao.increment(id, counter.as_ref(), 1).await?.ok_or_else(|| AppError::not_found(T::LABEL))?;
        Ok(CounterValue { id: item.id().to_string(), counter, value: item.counter(counter) })
    }

    /// 全部标签，去重排序
    pub async fn tags(&self) -> AppResult<Vec<String>> {
        self.dao.distinct_strings("tags", &QueryBuilder::new()).await
    }

    async fn ensure_category(&self, category_id: &str) -> AppResult<()> {
        match self.category_dao.find_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation("分类不存在".to_string())),
        }
    }

    async fn attach_one(&self, item: T) -> AppResult<ContentView<T>> {
        let mut views = self.attach(vec![item]).await?;
        views.pop().ok_or_else(|| AppError::Internal("empty join result".to_string()))
    }

    /// 批量关联分类与作者
    async fn attach(&self, items: Vec<T>) -> AppResult<Vec<ContentView<T>>> {
        let mut category_ids = items.iter().filter_map(|i| i.category_id().map(str::to_string)).collect::<Vec<_>>();
        category_ids.sort();
        category_ids.dedup();
        let mut author_ids = items.iter().filter_map(|i| i.author_id().map(str::to_string)).collect::<Vec<_>>();
        author_ids.sort();
        author_ids.dedup();

        let (categories, authors) = futures::try_join!(self.load_categories(category_ids), self.load_authors(author_ids))?;
        Ok(items
            .into_iter()
            .map(|item| {
                let category = item.category_id().and_then(|id| categories.get(id).cloned());
                let author = item.author_id().and_then(|id| authors.get(id).cloned());
                ContentView { item, category, author }
            })
            .collect())
    }

    async fn load_categories(&self, ids: Vec<String>) -> AppResult<HashMap<String, CategoryEntity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self.category_dao.find_many(&QueryBuilder::new().in_array("id", ids), &[]).await?;
        Ok(rows.into_iter().map(|c| (c.id.clone(), c)).collect())
    }

    async fn load_authors(&self, ids: Vec<String>) -> AppResult<HashMap<String, AuthorView>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self.user_dao.find_many(&QueryBuilder::new().in_array("id", ids), &[]).await?;
        Ok(rows.iter().map(|u| (u.id.clone(), AuthorView::from(u))).collect())
    }
}
