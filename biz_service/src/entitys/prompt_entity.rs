use crate::entitys::content::{default_page, default_page_size, ContentEntity, Counter};
use common::index_trait::MongoIndexModelProvider;
use common::util::validate::validate_tags;
use mongo_macro::{MongoIndexModelProvider as MongoDeriveMongoIndex, QueryFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Prompt 模板
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields("id"), unique)]
#[mongo_index(fields("categoryId"))]
#[mongo_index(fields("createdAt"), order = "desc")]
pub struct PromptEntity {
    pub id: String,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub author_id: Option<String>,
    pub likes: i64,
    pub copies: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePromptDto {
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: String,
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePromptDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, QueryFilter)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryPromptsDto {
    #[query(search = "title,description")]
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

impl ContentEntity for PromptEntity {
    type Draft = CreatePromptDto;
    type Patch = UpdatePromptDto;
    type Query = QueryPromptsDto;

    const COLLECTION: &'static str = "prompt";
    const CATEGORY_COLLECTION: &'static str = "prompt_category";
    const LABEL: &'static str = "Prompt";
    const COUNTER_ROUTES: &'static [(&'static str, Counter)] = &[("like", Counter::Likes), ("copy", Counter::Copies)];

    fn from_draft(draft: CreatePromptDto, id: String, author_id: Option<String>, now: i64) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            description: draft.description,
            category_id: draft.category_id,
            tags: draft.tags,
            author_id,
            likes: 0,
            copies: 0,
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
            Counter::Likes => self.likes,
            Counter::Copies => self.copies,
            _ => 0,
        }
    }
}
