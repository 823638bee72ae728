use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http, web, App, HttpServer};
use anyhow::Context;
use app_api::handlers;
use app_api::middleware::{RateLimit, RateLimiter};
use biz_service::biz_services::seed_service::seed_if_empty;
use biz_service::biz_services::BizServices;
use common::config::{AppConfig, DEFAULT_CONFIG_FILE};
use common::repository_util::DbRes;
use log::{warn, LevelFilter};
use std::str::FromStr;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 读取配置文件
    let config_file = std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let app_cfg = AppConfig::load(Some(&config_file))?;
    //初始化日志
    init_log(&app_cfg)?;

    let db_res = DbRes::connect(&app_cfg.get_database()).await?;
    BizServices::ensure_indexes(&db_res).await.context("create indexes")?;
    let services = BizServices::new(&db_res, &app_cfg);
    seed_if_empty(&services, app_cfg.get_sys().is_production()).await;

    let limiter = Arc::new(RateLimiter::new(&app_cfg.get_rate_limit(), handlers::rate_limit_policies()));
    let server = app_cfg.get_server();
    let address_and_port = format!("{}:{}", server.host, server.port);
    warn!("Starting server on {} ({})", address_and_port, if db_res.is_memory() { "memory store" } else { "mongodb" });
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&server.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE, http::header::ACCEPT])
            .supports_credentials()
            .max_age(3600);
        App::new()
            .wrap(RateLimit::new(limiter.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            // 配置 服务 与 控制器
            .configure(|cfg| handlers::configure(cfg, &services))
            .default_service(web::to(handlers::not_found))
    })
    .keep_alive(std::time::Duration::from_secs(75))
    .bind(address_and_port)?
    .run()
    .await?;
    Ok(())
}

pub fn init_log(config: &AppConfig) -> anyhow::Result<()> {
    let level = config.get_sys().log_level;
    let filter = LevelFilter::from_str(&level).with_context(|| format!("invalid log level {}", level))?;
    env_logger::Builder::new().filter(None, filter).init();
    Ok(())
}
