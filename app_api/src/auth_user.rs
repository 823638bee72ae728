use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use biz_service::biz_services::auth_service::AuthService;
use biz_service::biz_services::jwt_service::Claims;
use common::errors::AppError;
use futures_util::future::{ready, Ready};

const BEARER: &str = "Bearer ";

/// 已登录用户。需要登录的接口把它放进参数即可，缺少或无效的 token 返回 401
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub claims: Claims,
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("未授权".to_string())
}

fn extract(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let auth = req.app_data::<web::Data<AuthService>>().ok_or_else(|| AppError::Internal("AuthService not configured".to_string()))?;
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(unauthorized)?;
    let claims = auth.verify_token(token)?;
    Ok(AuthUser { id: claims.sub.clone(), claims })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}
