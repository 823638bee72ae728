use crate::biz_services::{BizServices, ContentModule};
use crate::entitys::agent_skill_entity::{CreateAgentSkillDto, Difficulty};
use crate::entitys::ai_hotspot_entity::CreateAiHotspotDto;
use crate::entitys::article_entity::CreateArticleDto;
use crate::entitys::category_entity::CreateCategoryDto;
use crate::entitys::content::ContentEntity;
use crate::entitys::mcp_entity::CreateMcpDto;
use crate::entitys::prompt_entity::CreatePromptDto;
use crate::entitys::user_entity::RegisterDto;
use common::AppResult;
use log::{error, info};

pub const SEED_EMAIL: &str = "test@example.com";
pub const SEED_PASSWORD: &str = "password123";

/// 开发环境的初始数据：用户表为空时写入测试用户、每类一个分类和一条内容。
///
/// 返回是否执行了写入。失败只记录日志。
pub async fn seed_if_empty(services: &BizServices, production: bool) -> bool {
    if production {
        return false;
    }
    match services.auth.user_count().await {
        Ok(0) => {}
        Ok(_) => return false,
        Err(e) => {
            error!("seed skipped, cannot count users: {}", e);
            return false;
        }
    }
    match seed(services).await {
        Ok(()) => {
            info!("seed data created, login with {}", SEED_EMAIL);
            true
        }
        Err(e) => {
            error!("seed failed: {}", e);
            false
        }
    }
}

fn category(name: &str, slug: &str, description: &str) -> CreateCategoryDto {
    CreateCategoryDto { name: name.to_string(), description: Some(description.to_string()), icon: None, slug: slug.to_string(), sort: 0 }
}

async fn seed_family<T, F>(module: &ContentModule<T>, category_dto: CreateCategoryDto, author_id: &str, draft: F) -> AppResult<()>
where
    T: ContentEntity,
    F: FnOnce(String) -> T::Draft,
{
    let category = module.categories.create(category_dto).await?;
    let item = module.content.create(draft(category.id), Some(author_id)).await?;
    info!("seeded {} {}", T::LABEL, item.item.id());
    Ok(())
}

async fn seed(services: &BizServices) -> AppResult<()> {
    let user = services
        .auth
        .register(RegisterDto { email: SEED_EMAIL.to_string(), password: SEED_PASSWORD.to_string(), nickname: Some("测试用户".to_string()) })
        .await?
        .user;
    let author = user.id.as_str();

    seed_family(&services.articles, category("技术教程", "tutorial", "AI 技术教程与实践"), author, |category_id| CreateArticleDto {
        title: "大语言模型入门".to_string(),
        content: "本文介绍大语言模型的基本概念、训练方式与常见应用场景。".to_string(),
        summary: Some("大语言模型基础概念".to_string()),
        cover_image: None,
        category_id: Some(category_id),
        tags: vec!["LLM".to_string(), "入门".to_string()],
    })
    .await?;

    seed_family(&services.prompts, category("写作助手", "writing", "写作类 Prompt"), author, |category_id| CreatePromptDto {
        title: "文章润色".to_string(),
        content: "请在不改变原意的前提下润色以下文字，使其更通顺：{text}".to_string(),
        description: Some("润色中文文章".to_string()),
        category_id: Some(category_id),
        tags: vec!["写作".to_string()],
    })
    .await?;

    seed_family(&services.mcps, category("文件系统", "filesystem", "文件读写相关的 MCP 服务"), author, |category_id| CreateMcpDto {
        title: "filesystem".to_string(),
        description: "提供本地文件读写能力的 MCP 服务".to_string(),
        repository: Some("https://github.com/modelcontextprotocol/servers".to_string()),
        documentation: None,
        category_id: Some(category_id),
        tags: vec!["文件".to_string()],
    })
    .await?;

    seed_family(&services.agent_skills, category("数据处理", "data", "数据处理技能"), author, |category_id| CreateAgentSkillDto {
        title: "CSV 汇总".to_string(),
        description: "读取 CSV 并按列汇总".to_string(),
        code: "def summarize(rows):\n    return len(rows)".to_string(),
        config: None,
        category_id: Some(category_id),
        tags: vec!["数据".to_string()],
        difficulty: Difficulty::Beginner,
    })
    .await?;

    seed_family(&services.ai_hotspots, category("行业动态", "news", "AI 行业新闻"), author, |category_id| CreateAiHotspotDto {
        title: "开源模型持续发布".to_string(),
        content: "多家机构本月发布了新的开源模型。".to_string(),
        summary: None,
        source: Some("AI Hub".to_string()),
        source_url: None,
        category_id: Some(category_id),
        tags: vec!["开源".to_string()],
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitys::user_entity::LoginDto;
    use common::config::{AppConfig, AuthConfig};
    use common::repository_util::DbRes;

    fn services(db: &DbRes) -> BizServices {
        let config = AppConfig { auth: Some(AuthConfig { bcrypt_cost: 4, ..Default::default() }), ..Default::default() };
        BizServices::new(db, &config)
    }

    #[tokio::test]
    async fn seeds_once_when_empty() {
        let db = DbRes::memory();
        let services = services(&db);
        assert!(seed_if_empty(&services, false).await);
        assert!(!seed_if_empty(&services, false).await);

        assert_eq!(services.auth.user_count().await.unwrap(), 1);
        let login = services.auth.login(LoginDto { email: SEED_EMAIL.into(), password: SEED_PASSWORD.into() }).await.unwrap();
        assert_eq!(login.user.nickname.as_deref(), Some("测试用户"));

        let articles = services.articles.categories.find_categories().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].count, 1);
        assert_eq!(services.agent_skills.categories.find_categories().await.unwrap()[0].count, 1);
        assert_eq!(services.ai_hotspots.content.tags().await.unwrap(), vec!["开源".to_string()]);
    }

    #[tokio::test]
    async fn production_never_seeds() {
        let db = DbRes::memory();
        let services = services(&db);
        assert!(!seed_if_empty(&services, true).await);
        assert_eq!(services.auth.user_count().await.unwrap(), 0);
    }
}
