use crate::auth_user::AuthUser;
use actix_web::{get, post, web, HttpResponse};
use biz_service::biz_services::auth_service::AuthService;
use biz_service::entitys::user_entity::{LoginDto, RegisterDto, WechatCallbackDto};
use common::errors::AppError;
use common::result::{result_data, result_msg};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(profile)
            .service(wechat_qrcode)
            .service(wechat_callback),
    );
}

#[post("/register")]
async fn register(auth: web::Data<AuthService>, dto: web::Json<RegisterDto>) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(auth.register(dto.into_inner()).await?))
}

#[post("/login")]
async fn login(auth: web::Data<AuthService>, dto: web::Json<LoginDto>) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(auth.login(dto.into_inner()).await?))
}

#[get("/profile")]
async fn profile(user: AuthUser, auth: web::Data<AuthService>) -> Result<HttpResponse, AppError> {
    Ok(result_data(auth.profile(&user.id).await?))
}

#[get("/wechat/qrcode")]
async fn wechat_qrcode(auth: web::Data<AuthService>) -> HttpResponse {
    result_data(auth.wechat_qrcode())
}

/// 用 code 换取 openid 需要微信开放平台资质，这里只校验参数
#[post("/wechat/callback")]
async fn wechat_callback(dto: web::Json<WechatCallbackDto>) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_msg("微信登录功能待完善，需要配置微信开放平台"))
}
