use crate::entitys::content::{default_page, default_page_size, ContentEntity, Counter};
use common::index_trait::MongoIndexModelProvider;
use common::util::validate::validate_tags;
use mongo_macro::{MongoIndexModelProvider as MongoDeriveMongoIndex, QueryFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// AI 热点资讯
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields("id"), unique)]
#[mongo_index(fields("categoryId"))]
#[mongo_index(fields("createdAt"), order = "desc")]
pub struct AiHotspotEntity {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    /// 来源名称
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub author_id: Option<String>,
    pub view_count: i64,
    pub likes: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAiHotspotDto {
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: String,
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: String,
    pub summary: Option<String>,
    pub source: Option<String>,
    #[validate(url(message = "来源链接格式不正确"))]
    pub source_url: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAiHotspotDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "来源链接格式不正确"))]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, QueryFilter)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryAiHotspotsDto {
    #[query(search = "title,summary")]
    pub search: Option<String>,
    #[query(eq, field = "categoryId")]
    pub category_id: Option<String>,
    #[query(eq, field = "tags")]
    pub tag: Option<String>,
    #[serde(default = "default_page")]
    #[query(page)]
    #[validate(range(min = 1, message = "page 必须大于等于1"))]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[query(page_size)]
    #[validate(range(min = 1, message = "pageSize 必须大于等于1"))]
    pub page_size: u64,
}

impl ContentEntity for AiHotspotEntity {
    type Draft = CreateAiHotspotDto;
    type Patch = UpdateAiHotspotDto;
    type Query = QueryAiHotspotsDto;

    const COLLECTION: &'static str = "ai_hotspot";
    const CATEGORY_COLLECTION: &'static str = "ai_hotspot_category";
    const LABEL: &'static str = "AI热点";
    const VIEW_COUNTER: Option<Counter> = Some(Counter::ViewCount);
    const COUNTER_ROUTES: &'static [(&'static str, Counter)] = &[("like", Counter::Likes)];

    fn from_draft(draft: CreateAiHotspotDto, id: String, author_id: Option<String>, now: i64) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            summary: draft.summary,
            source: draft.source,
            source_url: draft.source_url,
            category_id: draft.category_id,
            tags: draft.tags,
            author_id,
            view_count: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
    fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }
    fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }
    fn counter(&self, counter: Counter) -> i64 {
        match counter {
            Counter::ViewCount => self.view_count,
            Counter::Likes => self.likes,
            _ => 0,
        }
    }
}
