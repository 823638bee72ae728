use crate::entitys::category_entity::{CategoryEntity, CategoryView, CreateCategoryDto, UpdateCategoryDto};
use crate::entitys::content::ContentEntity;
use common::errors::AppError;
use common::query_builder::QueryBuilder;
use common::repository_util::{DbRes, OrderType, Repository};
use common::util::common_utils::build_id;
use common::util::date_util::now_millis;
use common::AppResult;
use futures::future::try_join_all;
use std::sync::Arc;

const CATEGORY_LABEL: &str = "分类";

fn slug_conflict(e: AppError) -> AppError {
    match e {
        AppError::Conflict(_) => AppError::Conflict("分类标识已存在".to_string()),
        e => e,
    }
}

/// 某类内容的分类服务
pub struct CategoryService<T: ContentEntity> {
    pub dao: Arc<dyn Repository<CategoryEntity>>,
    members: Arc<dyn Repository<T>>,
}

impl<T: ContentEntity> CategoryService<T> {
    pub fn new(db_res: &DbRes) -> Self {
        Self { dao: db_res.repository::<CategoryEntity>(T::CATEGORY_COLLECTION), members: db_res.repository::<T>(T::COLLECTION) }
    }

    /// 按 sort 升序，同值按创建顺序；附带每个分类下的内容数
    pub async fn find_categories(&self) -> AppResult<Vec<CategoryView>> {
        let categories = self.dao.find_many(&QueryBuilder::new(), &[("sort", OrderType::Asc), ("createdAt", OrderType::Asc)]).await?;
        let counts = try_join_all(categories.iter().map(|c| {
            let filter = member_filter(&c.id);
            async move { self.members.count(&filter).await }
        }))
        .await?;
        Ok(categories.into_iter().zip(counts).map(|(category, count)| CategoryView { category, count }).collect())
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<CategoryEntity> {
        self.dao.find_one(&QueryBuilder::new().eq("slug", slug)).await?.ok_or_else(|| AppError::not_found(CATEGORY_LABEL))
    }

    /// slug 唯一性交给存储层唯一索引
    pub async fn create(&self, dto: CreateCategoryDto) -> AppResult<CategoryEntity> {
        let now = now_millis();
        let category = CategoryEntity {
            id: build_id(),
            name: dto.name,
            slug: dto.slug,
            description: dto.description,
            icon: dto.icon,
            sort: dto.sort,
            created_at: now,
            updated_at: now,
        };
        self.dao.insert(&category).await.map_err(slug_conflict)?;
        Ok(category)
    }

    pub async fn update(&self, id: &str, dto: UpdateCategoryDto) -> AppResult<CategoryEntity> {
        if self.dao.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(CATEGORY_LABEL));
        }
        let mut fields = mongodb::bson::to_document(&dto)?;
        fields.insert("updatedAt", now_millis());
        self.dao.update_fields(id, fields).await.map_err(slug_conflict)?.ok_or_else(|| AppError::not_found(CATEGORY_LABEL))
    }

    /// 分类下仍有内容时拒绝删除
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.dao.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(CATEGORY_LABEL));
        }
        let members = self.members.count(&member_filter(id)).await?;
        if members > 0 {
            return Err(AppError::Conflict(format!("分类下还有{}条{}，无法删除", members, T::LABEL)));
        }
        if !self.dao.delete_by_id(id).await? {
            return Err(AppError::not_found(CATEGORY_LABEL));
        }
        Ok(())
    }
}

fn member_filter(category_id: &str) -> QueryBuilder {
    QueryBuilder::new().eq("categoryId", category_id)
}
