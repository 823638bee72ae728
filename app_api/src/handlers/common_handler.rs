use actix_web::{get, web, HttpRequest, HttpResponse};
use common::errors::AppError;
use common::result::result_data;
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index);
    cfg.service(health);
}

#[get("/")]
async fn index() -> HttpResponse {
    result_data(json!({"message": "AI Hub API", "status": "ok"}))
}

#[get("/health")]
async fn health() -> HttpResponse {
    result_data(json!({"status": "healthy", "timestamp": chrono::Utc::now().to_rfc3339()}))
}

/// 未匹配任何路由
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!("接口不存在: {} {}", req.method(), req.path())))
}
