use crate::biz_services::auth_service::AuthService;
use crate::biz_services::category_service::CategoryService;
use crate::biz_services::content_service::ContentService;
use crate::entitys::agent_skill_entity::AgentSkillEntity;
use crate::entitys::ai_hotspot_entity::AiHotspotEntity;
use crate::entitys::article_entity::ArticleEntity;
use crate::entitys::category_entity::CategoryEntity;
use crate::entitys::content::ContentEntity;
use crate::entitys::mcp_entity::McpEntity;
use crate::entitys::prompt_entity::PromptEntity;
use crate::entitys::user_entity::UserEntity;
use actix_web::web;
use common::config::AppConfig;
use common::repository_util::DbRes;
use common::AppResult;
use std::sync::Arc;

pub mod auth_service;
pub mod category_service;
pub mod content_service;
pub mod jwt_service;
pub mod seed_service;

pub const USER_COLLECTION: &str = "user_info";

/// 一类内容及其分类的服务
pub struct ContentModule<T: ContentEntity> {
    pub content: Arc<ContentService<T>>,
    pub categories: Arc<CategoryService<T>>,
}

impl<T: ContentEntity> Clone for ContentModule<T> {
    fn clone(&self) -> Self {
        Self { content: self.content.clone(), categories: self.categories.clone() }
    }
}

impl<T: ContentEntity> ContentModule<T> {
    fn new(db_res: &DbRes) -> Self {
        Self { content: Arc::new(ContentService::new(db_res)), categories: Arc::new(CategoryService::new(db_res)) }
    }

    fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.content.clone()));
        cfg.app_data(web::Data::from(self.categories.clone()));
    }

    async fn ensure_indexes(db_res: &DbRes) -> AppResult<()> {
        db_res.ensure_indexes::<T>(T::COLLECTION).await?;
        db_res.ensure_indexes::<CategoryEntity>(T::CATEGORY_COLLECTION).await
    }
}

/// 所有业务服务，启动时创建一次
#[derive(Clone)]
pub struct BizServices {
    pub auth: Arc<AuthService>,
    pub articles: ContentModule<ArticleEntity>,
    pub prompts: ContentModule<PromptEntity>,
    pub mcps: ContentModule<McpEntity>,
    pub agent_skills: ContentModule<AgentSkillEntity>,
    pub ai_hotspots: ContentModule<AiHotspotEntity>,
}

impl BizServices {
    pub fn new(db_res: &DbRes, config: &AppConfig) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db_res, &config.get_auth(), &config.get_wechat())),
            articles: ContentModule::new(db_res),
            prompts: ContentModule::new(db_res),
            mcps: ContentModule::new(db_res),
            agent_skills: ContentModule::new(db_res),
            ai_hotspots: ContentModule::new(db_res),
        }
    }

    pub async fn ensure_indexes(db_res: &DbRes) -> AppResult<()> {
        db_res.ensure_indexes::<UserEntity>(USER_COLLECTION).await?;
        ContentModule::<ArticleEntity>::ensure_indexes(db_res).await?;
        ContentModule::<PromptEntity>::ensure_indexes(db_res).await?;
        ContentModule::<McpEntity>::ensure_indexes(db_res).await?;
        ContentModule::<AgentSkillEntity>::ensure_indexes(db_res).await?;
        ContentModule::<AiHotspotEntity>::ensure_indexes(db_res).await
    }

    /// 注入 web::Data
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.auth.clone()));
        self.articles.configure(cfg);
        self.prompts.configure(cfg);
        self.mcps.configure(cfg);
        self.agent_skills.configure(cfg);
        self.ai_hotspots.configure(cfg);
    }
}
