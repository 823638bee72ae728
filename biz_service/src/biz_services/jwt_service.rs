use crate::entitys::user_entity::UserEntity;
use chrono::{Duration, Utc};
use common::config::AuthConfig;
use common::errors::AppError;
use common::AppResult;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 签发与校验，无刷新、无吊销
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_hours: config.jwt_expiry_hours,
        }
    }

    pub fn generate_token(&self, user: &UserEntity) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.expiry_hours);
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("未授权".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, hours: i64) -> JwtService {
        JwtService::new(&AuthConfig { jwt_secret: secret.to_string(), jwt_expiry_hours: hours, bcrypt_cost: 4 })
    }

    fn user() -> UserEntity {
        UserEntity { id: "u1".into(), email: Some("a@b.com".into()), nickname: Some("a".into()), ..Default::default() }
    }

    #[test]
    fn generate_and_validate_token() {
        let jwt = service("test-secret-key-for-testing", 24);
        let token = jwt.generate_token(&user()).unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.nickname.as_deref(), Some("a"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_garbage_foreign_and_expired_tokens() {
        let jwt = service("secret-a", 24);
        assert!(matches!(jwt.validate_token("invalid.token.here"), Err(AppError::Unauthorized(_))));

        let foreign = service("secret-b", 24).generate_token(&user()).unwrap();
        assert!(jwt.validate_token(&foreign).is_err());

        let expired = service("secret-a", -2).generate_token(&user()).unwrap();
        assert!(jwt.validate_token(&expired).is_err());
    }
}
