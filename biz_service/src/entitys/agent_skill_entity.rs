use crate::entitys::content::{default_page, default_page_size, ContentEntity, Counter};
use common::index_trait::MongoIndexModelProvider;
use common::util::validate::validate_tags;
use mongo_macro::{MongoIndexModelProvider as MongoDeriveMongoIndex, QueryFilter};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Agent Skill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields("id"), unique)]
#[mongo_index(fields("categoryId"))]
#[mongo_index(fields("difficulty"))]
#[mongo_index(fields("createdAt"), order = "desc")]
pub struct AgentSkillEntity {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 代码示例
    pub code: String,
    /// 配置说明
    pub config: Option<String>,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub author_id: Option<String>,
    pub usage: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAgentSkillDto {
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: String,
    #[validate(length(min = 1, message = "描述不能为空"))]
    pub description: String,
    #[validate(length(min = 1, message = "代码不能为空"))]
    pub code: String,
    pub config: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAgentSkillDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "标题不能为空"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "描述不能为空"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "代码不能为空"))]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Deserialize, Validate, QueryFilter)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryAgentSkillsDto {
    #[query(search = "title,description")]
    pub search: Option<String>,
    #[query(eq, field = "categoryId")]
    pub category_id: Option<String>,
    #[query(eq)]
    pub difficulty: Option<Difficulty>,
    #[serde(default = "default_page")]
    #[query(page)]
    #[validate(range(min = 1, message = "page 必须大于等于1"))]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[query(page_size)]
    #[validate(range(min = 1, message = "pageSize 必须大于等于1"))]
    pub page_size: u64,
}

impl ContentEntity for AgentSkillEntity {
    type Draft = CreateAgentSkillDto;
    type Patch = UpdateAgentSkillDto;
    type Query = QueryAgentSkillsDto;

    const COLLECTION: &'static str = "agent_skill";
    const CATEGORY_COLLECTION: &'static str = "agent_skill_category";
    const LABEL: &'static str = "Agent Skill";
    const COUNTER_ROUTES: &'static [(&'static str, Counter)] = &[("use", Counter::Usage)];

    fn from_draft(draft: CreateAgentSkillDto, id: String, author_id: Option<String>, now: i64) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            code: draft.code,
            config: draft.config,
            category_id: draft.category_id,
            tags: draft.tags,
            difficulty: draft.difficulty,
            author_id,
            usage: 0,
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
            Counter::Usage => self.usage,
            _ => 0,
        }
    }
}
