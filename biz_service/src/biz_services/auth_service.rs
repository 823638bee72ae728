use crate::biz_services::jwt_service::{Claims, JwtService};
use crate::biz_services::USER_COLLECTION;
use crate::entitys::user_entity::{AuthPayload, LoginDto, RegisterDto, UserEntity, UserView, WechatQrcode};
use common::config::{AuthConfig, WechatConfig};
use common::errors::AppError;
use common::query_builder::QueryBuilder;
use common::repository_util::{DbRes, Repository};
use common::util::common_utils::{build_id, random_token};
use common::util::date_util::now_millis;
use common::AppResult;
use std::sync::Arc;

const BAD_CREDENTIALS: &str = "邮箱或密码错误";
const EMAIL_TAKEN: &str = "邮箱已被注册";
const WECHAT_QRCONNECT: &str = "https://open.weixin.qq.com/connect/qrconnect";

pub struct AuthService {
    pub dao: Arc<dyn Repository<UserEntity>>,
    jwt: JwtService,
    bcrypt_cost: u32,
    wechat: WechatConfig,
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    // 非法哈希按校验失败处理
    Ok(verified.unwrap_or(false))
}

impl AuthService {
    pub fn new(db_res: &DbRes, auth: &AuthConfig, wechat: &WechatConfig) -> Self {
        Self {
            dao: db_res.repository::<UserEntity>(USER_COLLECTION),
            jwt: JwtService::new(auth),
            bcrypt_cost: auth.bcrypt_cost,
            wechat: wechat.clone(),
        }
    }

    pub async fn register(&self, dto: RegisterDto) -> AppResult<AuthPayload> {
        let email_filter = QueryBuilder::new().eq("email", dto.email.as_str());
        if self.dao.find_one(&email_filter).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }
        let password_hash = hash_password(dto.password, self.bcrypt_cost).await?;
        let nickname = dto
            .nickname
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| dto.email.split('@').next().unwrap_or_default().to_string());
        let now = now_millis();
        let user = UserEntity {
            id: build_id(),
            email: Some(dto.email),
            openid: None,
            password_hash: Some(password_hash),
            nickname: Some(nickname),
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        // 并发注册同一邮箱时由唯一索引兜底
        self.dao.insert(&user).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(EMAIL_TAKEN.to_string()),
            e => e,
        })?;
        log::info!("user registered: {}", user.id);
        self.issue(&user)
    }

    /// 邮箱不存在、无密码、密码错误返回同一个错误
    pub async fn login(&self, dto: LoginDto) -> AppResult<AuthPayload> {
        let user = self.dao.find_one(&QueryBuilder::new().eq("email", dto.email.as_str())).await?;
        let Some(user) = user else {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };
        let Some(hash) = user.password_hash.clone().filter(|h| !h.is_empty()) else {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };
        if !verify_password(dto.password, hash).await? {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
        self.issue(&user)
    }

    /// 微信用户首次登录时创建账号
    pub async fn wechat_login(&self, openid: &str, nickname: Option<String>, avatar: Option<String>) -> AppResult<AuthPayload> {
        let filter = QueryBuilder::new().eq("openid", openid);
        if let Some(user) = self.dao.find_one(&filter).await? {
            return self.issue(&user);
        }
        let now = now_millis();
        let user = UserEntity {
            id: build_id(),
            email: None,
            openid: Some(openid.to_string()),
            password_hash: None,
            nickname,
            avatar,
            created_at: now,
            updated_at: now,
        };
        match self.dao.insert(&user).await {
            Ok(()) => self.issue(&user),
            // 同一 openid 并发首登
            Err(AppError::Conflict(_)) => {
                let existing = self.dao.find_one(&filter).await?.ok_or_else(|| AppError::Internal("wechat user vanished".to_string()))?;
                self.issue(&existing)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn profile(&self, user_id: &str) -> AppResult<UserView> {
        match self.dao.find_by_id(user_id).await? {
            Some(user) => Ok(UserView::from(&user)),
            None => Err(AppError::Unauthorized("用户不存在".to_string())),
        }
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.jwt.validate_token(token)
    }

    /// 微信扫码登录地址，state 防 CSRF
    pub fn wechat_qrcode(&self) -> WechatQrcode {
        let state = random_token(13);
        let qrcode_url = format!(
            "{}?appid={}&redirect_uri={}&response_type=code&scope=snsapi_login&state={}#wechat_redirect",
            WECHAT_QRCONNECT,
            self.wechat.app_id,
            urlencoding::encode(&self.wechat.redirect_uri),
            state
        );
        WechatQrcode { qrcode_url, state }
    }

    pub async fn user_count(&self) -> AppResult<u64> {
        self.dao.count(&QueryBuilder::new()).await
    }

    fn issue(&self, user: &UserEntity) -> AppResult<AuthPayload> {
        Ok(AuthPayload { access_token: self.jwt.generate_token(user)?, user: UserView::from(user) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let auth = AuthConfig { jwt_secret: "test".into(), jwt_expiry_hours: 1, bcrypt_cost: 4 };
        let wechat = WechatConfig { app_id: "wx123".into(), redirect_uri: "https://hub.example.com/auth/wechat?x=1".into() };
        AuthService::new(&DbRes::memory(), &auth, &wechat)
    }

    fn register_dto(email: &str, nickname: Option<&str>) -> RegisterDto {
        RegisterDto { email: email.into(), password: "secret1".into(), nickname: nickname.map(str::to_string) }
    }

    #[tokio::test]
    async fn register_twice_conflicts() {
        let auth = service();
        let first = auth.register(register_dto("a@b.com", None)).await.unwrap();
        assert_eq!(first.user.nickname.as_deref(), Some("a"));
        assert_eq!(first.user.email.as_deref(), Some("a@b.com"));
        let claims = auth.verify_token(&first.access_token).unwrap();
        assert_eq!(claims.sub, first.user.id);

        let err = auth.register(register_dto("a@b.com", Some("again"))).await.unwrap_err();
        assert!(matches!(&err, AppError::Conflict(msg) if msg == EMAIL_TAKEN));
        assert_eq!(auth.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stored_hash_is_bcrypt_not_plaintext() {
        let auth = service();
        let payload = auth.register(register_dto("h@b.com", Some("h"))).await.unwrap();
        let stored = auth.dao.find_by_id(&payload.user.id).await.unwrap().unwrap();
        let hash = stored.password_hash.unwrap();
        assert_ne!(hash, "secret1");
        assert!(bcrypt::verify("secret1", &hash).unwrap());
        assert!(stored.openid.is_none());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(register_dto("a@b.com", None)).await.unwrap();

        let ok = auth.login(LoginDto { email: "a@b.com".into(), password: "secret1".into() }).await.unwrap();
        assert_eq!(ok.user.email.as_deref(), Some("a@b.com"));

        let wrong_password = auth.login(LoginDto { email: "a@b.com".into(), password: "wrong-pass".into() }).await.unwrap_err();
        let unknown_email = auth.login(LoginDto { email: "x@b.com".into(), password: "secret1".into() }).await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
        assert!(matches!(unknown_email, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn wechat_login_finds_or_creates_by_openid() {
        let auth = service();
        let first = auth.wechat_login("openid-1", Some("微信用户".into()), None).await.unwrap();
        let again = auth.wechat_login("openid-1", None, None).await.unwrap();
        assert_eq!(first.user.id, again.user.id);
        assert_eq!(auth.user_count().await.unwrap(), 1);
        assert_eq!(auth.profile(&first.user.id).await.unwrap().nickname.as_deref(), Some("微信用户"));
        assert!(matches!(auth.profile("ghost").await.unwrap_err(), AppError::Unauthorized(_)));
    }

    #[test]
    fn qrcode_url_shape() {
        let auth = service();
        let qr = auth.wechat_qrcode();
        assert_eq!(qr.state.len(), 13);
        assert!(qr.qrcode_url.starts_with("https://open.weixin.qq.com/connect/qrconnect?appid=wx123&"));
        assert!(qr.qrcode_url.contains("redirect_uri=https%3A%2F%2Fhub.example.com%2Fauth%2Fwechat%3Fx%3D1&"));
        assert!(qr.qrcode_url.ends_with(&format!("&response_type=code&scope=snsapi_login&state={}#wechat_redirect", qr.state)));
        assert_ne!(qr.state, auth.wechat_qrcode().state);
    }
}
