use common::index_trait::MongoIndexModelProvider;
use common::util::validate::validate_slug;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 分类，每类内容各有一个分类集合，结构相同
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields("id"), unique)]
#[mongo_index(fields("slug"), unique)]
#[mongo_index(fields("sort"))]
pub struct CategoryEntity {
    pub id: String,
    pub name: String,
    /// 对外稳定标识
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// 升序
    pub sort: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: CategoryEntity,
    /// 分类下的内容数
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 50, message = "分类名称长度为1-50"))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default)]
    pub sort: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCategoryDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "分类名称长度为1-50"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<i32>,
}
