use actix_service::{Service, Transform};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::{Error, ResponseError};
use common::config::RateLimitConfig;
use common::errors::AppError;
use dashmap::DashMap;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::warn;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// 超过这个 key 数量时清理过期窗口
const SWEEP_THRESHOLD: usize = 10_000;

/// 单条路由的限流策略，pattern 为 actix 路由模板，如 `/articles/{id}`
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub method: Method,
    pub pattern: String,
    pub limit: usize,
}

impl RoutePolicy {
    pub fn new(method: Method, pattern: impl Into<String>, limit: usize) -> Self {
        Self { method, pattern: pattern.into(), limit }
    }
}

/// 进程内滑动窗口日志，按 (方法, 路由模板, 客户端 IP) 计数
pub struct RateLimiter {
    enabled: bool,
    window: Duration,
    default_limit: usize,
    policies: HashMap<(Method, String), usize>,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, policies: Vec<RoutePolicy>) -> Self {
        Self {
            enabled: config.enabled,
            window: Duration::from_millis(config.window_ms),
            default_limit: config.default_limit,
            policies: policies.into_iter().map(|p| ((p.method, p.pattern), p.limit)).collect(),
            hits: DashMap::new(),
        }
    }

    pub fn limit_for(&self, method: &Method, pattern: Option<&str>) -> usize {
        pattern
            .and_then(|p| self.policies.get(&(method.clone(), p.to_string())))
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// 记录一次请求；窗口内已满返回 false，且不计入
    pub fn check(&self, key: String, limit: usize, now: Instant) -> bool {
        if self.hits.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }
        let mut log = self.hits.entry(key).or_default();
        while let Some(first) = log.front() {
            if now.duration_since(*first) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }
        if log.len() >= limit {
            return false;
        }
        log.push_back(now);
        true
    }

    fn sweep(&self, now: Instant) {
        self.hits.retain(|_, log| log.back().is_some_and(|last| now.duration_since(*last) < self.window));
    }
}

/// 限流中间件
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitService { service: Rc::new(service), limiter: self.limiter.clone() })
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        if self.limiter.enabled {
            let pattern = req.match_pattern();
            let limit = self.limiter.limit_for(req.method(), pattern.as_deref());
            let ip = req.peer_addr().map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
            let key = format!("{} {}|{}", req.method(), pattern.as_deref().unwrap_or("*"), ip);
            if !self.limiter.check(key, limit, Instant::now()) {
                warn!("rate limited: {} {} from {}", req.method(), req.path(), ip);
                let resp = AppError::RateLimited.error_response();
                return Box::pin(async move { Ok(req.into_response(resp.map_into_right_body())) });
            }
        }
        Box::pin(async move {
            let res = srv.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64) -> RateLimiter {
        let config = RateLimitConfig { enabled: true, window_ms, default_limit: 3 };
        RateLimiter::new(&config, vec![RoutePolicy::new(Method::POST, "/auth/login", 2)])
    }

    #[test]
    fn policy_lookup_falls_back_to_default() {
        let limiter = limiter(60_000);
        assert_eq!(limiter.limit_for(&Method::POST, Some("/auth/login")), 2);
        assert_eq!(limiter.limit_for(&Method::GET, Some("/auth/login")), 3);
        assert_eq!(limiter.limit_for(&Method::GET, None), 3);
    }

    #[test]
    fn window_slides() {
        let limiter = limiter(1_000);
        let start = Instant::now();
        assert!(limiter.check("k".into(), 2, start));
        assert!(limiter.check("k".into(), 2, start + Duration::from_millis(10)));
        assert!(!limiter.check("k".into(), 2, start + Duration::from_millis(20)));
        // 其它 key 不受影响
        assert!(limiter.check("other".into(), 2, start + Duration::from_millis(20)));
        // 第一条过期后腾出一个位置
        assert!(limiter.check("k".into(), 2, start + Duration::from_millis(1_000)));
        assert!(!limiter.check("k".into(), 2, start + Duration::from_millis(1_005)));
    }

    #[test]
    fn sweep_drops_idle_keys() {
        let limiter = limiter(1_000);
        let start = Instant::now();
        limiter.check("idle".into(), 2, start);
        limiter.check("busy".into(), 2, start + Duration::from_millis(900));
        limiter.sweep(start + Duration::from_millis(1_500));
        assert!(!limiter.hits.contains_key("idle"));
        assert!(limiter.hits.contains_key("busy"));
    }
}
