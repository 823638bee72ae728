pub mod agent_skill_entity;
pub mod ai_hotspot_entity;
pub mod article_entity;
pub mod category_entity;
pub mod content;
pub mod mcp_entity;
pub mod prompt_entity;
pub mod user_entity;
