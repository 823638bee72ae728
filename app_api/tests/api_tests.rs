// HTTP 级测试：完整路由 + 内存存储，不启动真实服务

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use app_api::handlers;
use app_api::middleware::{RateLimit, RateLimiter};
use biz_service::biz_services::BizServices;
use common::config::{AppConfig, AuthConfig, RateLimitConfig};
use common::repository_util::DbRes;
use serde_json::{json, Value};
use std::sync::Arc;

fn services() -> BizServices {
    let config = AppConfig { auth: Some(AuthConfig { bcrypt_cost: 4, ..Default::default() }), ..Default::default() };
    BizServices::new(&DbRes::memory(), &config)
}

fn limiter(enabled: bool) -> Arc<RateLimiter> {
    let config = RateLimitConfig { enabled, ..Default::default() };
    Arc::new(RateLimiter::new(&config, handlers::rate_limit_policies()))
}

macro_rules! init_app {
    ($services:expr, $limiter:expr) => {
        test::init_service(
            App::new()
                .wrap(RateLimit::new($limiter))
                .configure(|cfg| handlers::configure(cfg, &$services))
                .default_service(web::to(handlers::not_found)),
        )
        .await
    };
}

macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

macro_rules! register {
    ($app:expr, $email:expr) => {{
        let (status, body) = call_json!(
            $app,
            test::TestRequest::post().uri("/auth/register").set_json(json!({"email": $email, "password": "secret1"}))
        );
        assert_eq!(status, StatusCode::OK, "{}", body);
        format!("Bearer {}", body["data"]["access_token"].as_str().unwrap())
    }};
}

#[actix_web::test]
async fn health_and_not_found_use_the_envelope() {
    let services = services();
    let app = init_app!(services, limiter(false));

    let (status, body) = call_json!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["status"], "healthy");

    let (status, body) = call_json!(app, test::TestRequest::get().uri("/nope/at/all"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert!(body["data"].is_null());

    let (status, body) = call_json!(app, test::TestRequest::get().uri("/articles/missing-id"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "文章不存在");
}

#[actix_web::test]
async fn mutations_require_a_valid_bearer_token() {
    let services = services();
    let app = init_app!(services, limiter(false));
    let article = json!({"title": "X", "content": "Y"});

    let (status, body) = call_json!(app, test::TestRequest::post().uri("/articles").set_json(&article));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = call_json!(
        app,
        test::TestRequest::post().uri("/articles").insert_header((header::AUTHORIZATION, "Bearer not-a-jwt")).set_json(&article)
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_json!(app, test::TestRequest::get().uri("/auth/profile"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register!(app, "me@example.com");
    let (status, body) = call_json!(app, test::TestRequest::get().uri("/auth/profile").insert_header((header::AUTHORIZATION, token)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "me@example.com");
    assert_eq!(body["data"]["nickname"], "me");
    assert!(body["data"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn login_errors_are_identical() {
    let services = services();
    let app = init_app!(services, limiter(false));
    register!(app, "a@b.com");

    let (wrong_status, wrong) =
        call_json!(app, test::TestRequest::post().uri("/auth/login").set_json(json!({"email": "a@b.com", "password": "bad-password"})));
    let (unknown_status, unknown) =
        call_json!(app, test::TestRequest::post().uri("/auth/login").set_json(json!({"email": "x@b.com", "password": "secret1"})));
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);

    let (status, body) =
        call_json!(app, test::TestRequest::post().uri("/auth/register").set_json(json!({"email": "a@b.com", "password": "secret1"})));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "邮箱已被注册");

    let (status, _) = call_json!(app, test::TestRequest::post().uri("/auth/register").set_json(json!({"email": "bad", "password": "1"})));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn article_lifecycle_with_views_tags_and_author() {
    let services = services();
    let app = init_app!(services, limiter(false));
    let token = register!(app, "writer@example.com");

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/articles")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"title": "X", "content": "Y", "tags": ["a", "b"]}))
    );
    assert_eq!(status, StatusCode::OK, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["viewCount"], 0);
    assert_eq!(body["data"]["author"]["nickname"], "writer");
    assert!(body["data"]["author"].get("email").is_none());

    let (_, with_a) = call_json!(app, test::TestRequest::get().uri("/articles?tag=a"));
    assert_eq!(with_a["data"]["total"], 1);
    assert_eq!(with_a["data"]["items"][0]["id"], id.as_str());
    let (_, with_c) = call_json!(app, test::TestRequest::get().uri("/articles?tag=c"));
    assert_eq!(with_c["data"]["total"], 0);
    assert_eq!(with_c["data"]["totalPages"], 0);

    let (_, first) = call_json!(app, test::TestRequest::get().uri(&format!("/articles/{}", id)));
    let (_, second) = call_json!(app, test::TestRequest::get().uri(&format!("/articles/{}", id)));
    assert_eq!(first["data"]["viewCount"], 1);
    assert_eq!(second["data"]["viewCount"], 2);

    let (_, tags) = call_json!(app, test::TestRequest::get().uri("/articles/tags"));
    assert_eq!(tags["data"], json!(["a", "b"]));

    let (status, updated) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/articles/{}", id))
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"title": "X2"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["title"], "X2");
    assert_eq!(updated["data"]["content"], "Y");
    assert_eq!(updated["data"]["viewCount"], 2);

    // 计数字段不能由客户端写入
    let (status, _) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/articles/{}", id))
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"likes": 99}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, deleted) =
        call_json!(app, test::TestRequest::delete().uri(&format!("/articles/{}", id)).insert_header((header::AUTHORIZATION, token.clone())));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["message"], "删除成功");
    let (status, _) = call_json!(app, test::TestRequest::delete().uri(&format!("/articles/{}", id)).insert_header((header::AUTHORIZATION, token)));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn invalid_pagination_is_rejected() {
    let services = services();
    let app = init_app!(services, limiter(false));
    for uri in ["/prompts?page=0", "/prompts?pageSize=0", "/prompts?page=abc", "/agent-skills?difficulty=expert"] {
        let (status, body) = call_json!(app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], 400);
    }
    let (status, body) = call_json!(app, test::TestRequest::get().uri("/prompts?page=2&pageSize=5"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["pageSize"], 5);
}

#[actix_web::test]
async fn concurrent_likes_are_not_lost() {
    let services = services();
    let app = init_app!(services, limiter(false));
    let token = register!(app, "p@example.com");
    let (_, created) = call_json!(
        app,
        test::TestRequest::post().uri("/prompts").insert_header((header::AUTHORIZATION, token)).set_json(json!({"title": "t", "content": "c"}))
    );
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/prompts/{}/like", id);
    let calls = (0..50).map(|_| test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()));
    let responses = futures::future::join_all(calls).await;
    assert!(responses.iter().all(|r| r.status() == StatusCode::OK));

    let (_, body) = call_json!(app, test::TestRequest::post().uri(&format!("/prompts/{}/copy", id)));
    assert_eq!(body["data"], json!({"id": id, "counter": "copies", "value": 1}));
    let (_, detail) = call_json!(app, test::TestRequest::get().uri(&format!("/prompts/{}", id)));
    assert_eq!(detail["data"]["likes"], 50);

    let (status, _) = call_json!(app, test::TestRequest::post().uri("/prompts/ghost/like"));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn category_routes_resolve_before_id_routes() {
    let services = services();
    let app = init_app!(services, limiter(false));
    let token = register!(app, "c@example.com");

    let (status, category) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/mcps/categories")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"name": "Coding", "slug": "coding", "sort": 0}))
    );
    assert_eq!(status, StatusCode::OK, "{}", category);
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/mcps/categories")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"name": "Again", "slug": "coding"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/mcps/categories")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"name": "Bad", "slug": "Not A Slug"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, by_slug) = call_json!(app, test::TestRequest::get().uri("/mcps/categories/slug/coding"));
    assert_eq!(by_slug["data"]["id"], category_id.as_str());

    let (status, _) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/mcps")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"title": "fs", "description": "d", "categoryId": "missing"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, mcp) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/mcps")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({"title": "fs", "description": "d", "categoryId": category_id}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mcp["data"]["category"]["slug"], "coding");

    let (_, listed) = call_json!(app, test::TestRequest::get().uri("/mcps/categories"));
    assert_eq!(listed["data"][0]["count"], 1);

    let (status, body) = call_json!(
        app,
        test::TestRequest::delete().uri(&format!("/mcps/categories/{}", category_id)).insert_header((header::AUTHORIZATION, token))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
}

#[actix_web::test]
async fn login_is_rate_limited() {
    let services = services();
    let app = init_app!(services, limiter(true));
    for _ in 0..10 {
        let (status, _) =
            call_json!(app, test::TestRequest::post().uri("/auth/login").set_json(json!({"email": "n@b.com", "password": "secret1"})));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) =
        call_json!(app, test::TestRequest::post().uri("/auth/login").set_json(json!({"email": "n@b.com", "password": "secret1"})));
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 429);
    assert_eq!(body["msg"], "请求过于频繁，请稍后再试");

    // 其它路由有独立的窗口
    let (status, _) = call_json!(app, test::TestRequest::get().uri("/auth/wechat/qrcode"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn wechat_endpoints() {
    let services = services();
    let app = init_app!(services, limiter(false));
    let (_, qr) = call_json!(app, test::TestRequest::get().uri("/auth/wechat/qrcode"));
    assert_eq!(qr["data"]["state"].as_str().unwrap().len(), 13);
    assert!(qr["data"]["qrcodeUrl"].as_str().unwrap().contains("scope=snsapi_login"));

    let (status, body) =
        call_json!(app, test::TestRequest::post().uri("/auth/wechat/callback").set_json(json!({"code": "abc", "state": "xyz"})));
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["message"].as_str().unwrap().contains("微信登录"));
}
