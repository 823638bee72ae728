use crate::auth_user::AuthUser;
use crate::middleware::RoutePolicy;
use actix_web::http::Method;
use actix_web::{web, HttpResponse};
use biz_service::biz_services::category_service::CategoryService;
use biz_service::biz_services::content_service::ContentService;
use biz_service::entitys::category_entity::{CreateCategoryDto, UpdateCategoryDto};
use biz_service::entitys::content::{ContentEntity, Counter};
use common::errors::AppError;
use common::result::{result_data, result_msg};
use validator::Validate;

/// 注册一类内容的全部路由。
///
/// 固定路径（`/tags`、`/categories...`）必须先于 `/{id}` 注册。
pub fn configure<T: ContentEntity>(cfg: &mut web::ServiceConfig, prefix: &str) {
    let mut scope = web::scope(prefix)
        .service(web::resource("").route(web::get().to(list::<T>)).route(web::post().to(create::<T>)))
        .service(web::resource("/tags").route(web::get().to(tags::<T>)))
        .service(
            web::resource("/categories")
                .route(web::get().to(list_categories::<T>))
                .route(web::post().to(create_category::<T>)),
        )
        .service(web::resource("/categories/slug/{slug}").route(web::get().to(category_by_slug::<T>)))
        .service(
            web::resource("/categories/{id}")
                .route(web::put().to(update_category::<T>))
                .route(web::delete().to(delete_category::<T>)),
        );
    for (action, counter) in T::COUNTER_ROUTES {
        let counter = *counter;
        scope = scope.service(web::resource(format!("/{{id}}/{}", action)).route(web::post().to(
            move |service: web::Data<ContentService<T>>, id: web::Path<String>| async move { increment(service, id, counter).await },
        )));
    }
    scope = scope.service(
        web::resource("/{id}")
            .route(web::get().to(detail::<T>))
            .route(web::put().to(update::<T>))
            .route(web::delete().to(delete::<T>)),
    );
    cfg.service(scope);
}

/// 每条路由每个 IP 在一个窗口内允许的请求数
pub fn rate_limit_policies<T: ContentEntity>(prefix: &str) -> Vec<RoutePolicy> {
    let mut policies = vec![
        RoutePolicy::new(Method::GET, prefix, 30),
        RoutePolicy::new(Method::POST, prefix, 10),
        RoutePolicy::new(Method::GET, format!("{}/tags", prefix), 20),
        RoutePolicy::new(Method::GET, format!("{}/categories", prefix), 30),
        RoutePolicy::new(Method::POST, format!("{}/categories", prefix), 10),
        RoutePolicy::new(Method::GET, format!("{}/categories/slug/{{slug}}", prefix), 30),
        RoutePolicy::new(Method::PUT, format!("{}/categories/{{id}}", prefix), 20),
        RoutePolicy::new(Method::DELETE, format!("{}/categories/{{id}}", prefix), 10),
        RoutePolicy::new(Method::GET, format!("{}/{{id}}", prefix), 50),
        RoutePolicy::new(Method::PUT, format!("{}/{{id}}", prefix), 20),
        RoutePolicy::new(Method::DELETE, format!("{}/{{id}}", prefix), 10),
    ];
    for (action, _) in T::COUNTER_ROUTES {
        policies.push(RoutePolicy::new(Method::POST, format!("{}/{{id}}/{}", prefix, action), 30));
    }
    policies
}

async fn list<T: ContentEntity>(service: web::Data<ContentService<T>>, query: web::Query<T::Query>) -> Result<HttpResponse, AppError> {
    query.validate()?;
    Ok(result_data(service.find_all(&query).await?))
}

async fn detail<T: ContentEntity>(service: web::Data<ContentService<T>>, id: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(result_data(service.find_one(&id).await?))
}

async fn tags<T: ContentEntity>(service: web::Data<ContentService<T>>) -> Result<HttpResponse, AppError> {
    Ok(result_data(service.tags().await?))
}

async fn create<T: ContentEntity>(
    user: AuthUser,
    service: web::Data<ContentService<T>>,
    dto: web::Json<T::Draft>,
) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(service.create(dto.into_inner(), Some(&user.id)).await?))
}

async fn update<T: ContentEntity>(
    _user: AuthUser,
    service: web::Data<ContentService<T>>,
    id: web::Path<String>,
    dto: web::Json<T::Patch>,
) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(service.update(&id, dto.into_inner()).await?))
}

async fn delete<T: ContentEntity>(_user: AuthUser, service: web::Data<ContentService<T>>, id: web::Path<String>) -> Result<HttpResponse, AppError> {
    service.delete(&id).await?;
    Ok(result_msg("删除成功"))
}

async fn increment<T: ContentEntity>(service: web::Data<ContentService<T>>, id: web::Path<String>, counter: Counter) -> Result<HttpResponse, AppError> {
    Ok(result_data(service.increment(&id, counter).await?))
}

async fn list_categories<T: ContentEntity>(service: web::Data<CategoryService<T>>) -> Result<HttpResponse, AppError> {
    Ok(result_data(service.find_categories().await?))
}

async fn category_by_slug<T: ContentEntity>(service: web::Data<CategoryService<T>>, slug: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(result_data(service.find_by_slug(&slug).await?))
}

async fn create_category<T: ContentEntity>(
    _user: AuthUser,
    service: web::Data<CategoryService<T>>,
    dto: web::Json<CreateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(service.create(dto.into_inner()).await?))
}

async fn update_category<T: ContentEntity>(
    _user: AuthUser,
    service: web::Data<CategoryService<T>>,
    id: web::Path<String>,
    dto: web::Json<UpdateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    dto.validate()?;
    Ok(result_data(service.update(&id, dto.into_inner()).await?))
}

async fn delete_category<T: ContentEntity>(_user: AuthUser, service: web::Data<CategoryService<T>>, id: web::Path<String>) -> Result<HttpResponse, AppError> {
    service.delete(&id).await?;
    Ok(result_msg("删除成功"))
}
