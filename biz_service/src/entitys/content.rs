use crate::entitys::category_entity::CategoryEntity;
use crate::entitys::user_entity::UserEntity;
use common::index_trait::MongoIndexModelProvider;
use common::query_builder::QueryFilterProvider;
use common::repository_util::Entity;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use strum_macros::{AsRefStr, Display, EnumString};
use validator::Validate;

/// 计数字段（存储字段名即 camelCase 名称）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Counter {
    ViewCount,
    Likes,
    Copies,
    Downloads,
    Usage,
}

/// 五类内容（文章、Prompt、MCP、Agent Skill、AI 热点）的公共形状。
///
/// 每类内容有自己的集合和分类集合，创建 / 更新 / 列表查询 DTO 由关联类型给出，
/// 计数器只能通过 [`Counter`] 路由做 +1。
pub trait ContentEntity: Entity + MongoIndexModelProvider + Clone + Debug {
    type Draft: DeserializeOwned + Validate + Send + 'static;
    type Patch: DeserializeOwned + Serialize + Validate + Send + 'static;
    type Query: DeserializeOwned + Validate + QueryFilterProvider + Send + Sync + 'static;

    const COLLECTION: &'static str;
    const CATEGORY_COLLECTION: &'static str;
    /// 错误提示中的名称
    const LABEL: &'static str;
    /// 详情查询时顺带 +1 的计数器
    const VIEW_COUNTER: Option<Counter> = None;
    /// `POST /{id}/{action}` -> 计数器
    const COUNTER_ROUTES: &'static [(&'static str, Counter)];

    fn from_draft(draft: Self::Draft, id: String, author_id: Option<String>, now: i64) -> Self;
    fn id(&self) -> &str;
    fn category_id(&self) -> Option<&str>;
    fn author_id(&self) -> Option<&str>;
    fn counter(&self, counter: Counter) -> i64;
}

/// 作者公开信息，不含邮箱与凭据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

impl From<&UserEntity> for AuthorView {
    fn from(user: &UserEntity) -> Self {
        Self { id: user.id.clone(), nickname: user.nickname.clone(), avatar: user.avatar.clone() }
    }
}

/// 内容 + 分类 + 作者
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView<T> {
    #[serde(flatten)]
    pub item: T,
    pub category: Option<CategoryEntity>,
    pub author: Option<AuthorView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CounterValue {
    pub id: String,
    pub counter: Counter,
    pub value: i64,
}

pub(crate) fn default_page() -> u64 {
    common::query_builder::DEFAULT_PAGE
}

pub(crate) fn default_page_size() -> u64 {
    common::query_builder::DEFAULT_PAGE_SIZE
}
