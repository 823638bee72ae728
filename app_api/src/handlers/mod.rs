mod auth_handler;
mod common_handler;
mod content_handler;

use crate::middleware::RoutePolicy;
use actix_web::http::Method;
use actix_web::web;
use biz_service::biz_services::BizServices;
use biz_service::entitys::agent_skill_entity::AgentSkillEntity;
use biz_service::entitys::ai_hotspot_entity::AiHotspotEntity;
use biz_service::entitys::article_entity::ArticleEntity;
use biz_service::entitys::mcp_entity::McpEntity;
use biz_service::entitys::prompt_entity::PromptEntity;
use common::errors::AppError;

pub use common_handler::not_found;

pub const ARTICLES: &str = "/articles";
pub const PROMPTS: &str = "/prompts";
pub const MCPS: &str = "/mcps";
pub const AGENT_SKILLS: &str = "/agent-skills";
pub const AI_HOTSPOT: &str = "/ai-hotspot";

/// 注册服务、提取器错误处理与全部路由
pub fn configure(cfg: &mut web::ServiceConfig, services: &BizServices) {
    services.configure(cfg);
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| AppError::Validation(format!("请求体格式错误: {}", err)).into()));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| AppError::Validation(format!("查询参数错误: {}", err)).into()));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _| AppError::Validation(format!("路径参数错误: {}", err)).into()));

    common_handler::configure(cfg);
    auth_handler::configure(cfg);
    content_handler::configure::<ArticleEntity>(cfg, ARTICLES);
    content_handler::configure::<PromptEntity>(cfg, PROMPTS);
    content_handler::configure::<McpEntity>(cfg, MCPS);
    content_handler::configure::<AgentSkillEntity>(cfg, AGENT_SKILLS);
    content_handler::configure::<AiHotspotEntity>(cfg, AI_HOTSPOT);
}

/// 启动时组装的限流表，未列出的路由使用全局默认值
pub fn rate_limit_policies() -> Vec<RoutePolicy> {
    let mut policies = vec![
        RoutePolicy::new(Method::POST, "/auth/register", 5),
        RoutePolicy::new(Method::POST, "/auth/login", 10),
        RoutePolicy::new(Method::GET, "/auth/wechat/qrcode", 20),
        RoutePolicy::new(Method::POST, "/auth/wechat/callback", 10),
    ];
    policies.extend(content_handler::rate_limit_policies::<ArticleEntity>(ARTICLES));
    policies.extend(content_handler::rate_limit_policies::<PromptEntity>(PROMPTS));
    policies.extend(content_handler::rate_limit_policies::<McpEntity>(MCPS));
    policies.extend(content_handler::rate_limit_policies::<AgentSkillEntity>(AGENT_SKILLS));
    policies.extend(content_handler::rate_limit_policies::<AiHotspotEntity>(AI_HOTSPOT));
    policies
}
