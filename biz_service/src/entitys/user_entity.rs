use common::index_trait::MongoIndexModelProvider;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 用户。
///
/// 邮箱注册的用户保存 `password_hash`，微信登录的用户保存 `openid`，两者互不复用。
#[derive(Debug, Clone, Serialize, Deserialize, Default, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields("id"), unique)]
#[mongo_index(fields("email"), unique, sparse)]
#[mongo_index(fields("openid"), unique, sparse)]
pub struct UserEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 微信 openid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openid: Option<String>,
    /// bcrypt 哈希
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 对外返回的用户信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

impl From<&UserEntity> for UserView {
    fn from(user: &UserEntity) -> Self {
        Self { id: user.id.clone(), email: user.email.clone(), nickname: user.nickname.clone(), avatar: user.avatar.clone() }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterDto {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 6, message = "密码至少6位"))]
    pub password: String,
    #[validate(length(max = 50, message = "昵称最多50个字符"))]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginDto {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 6, message = "密码至少6位"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WechatCallbackDto {
    #[validate(length(min = 1, message = "code 不能为空"))]
    pub code: String,
    pub state: Option<String>,
}

/// 登录 / 注册结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub access_token: String,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatQrcode {
    pub qrcode_url: String,
    pub state: String,
}
