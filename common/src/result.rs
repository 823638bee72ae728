use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// 统一成功信封 `{code, msg, data}`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { code: 200, msg: "success".to_string(), data: Some(data) }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageDto {
    pub message: String,
}

pub fn result_data<T: Serialize + Debug>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

pub fn result_msg(msg: &str) -> HttpResponse {
    result_data(MessageDto { message: msg.to_string() })
}
