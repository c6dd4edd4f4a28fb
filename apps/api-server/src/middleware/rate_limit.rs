//! Rate limiting middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    Error, HttpMessage, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use chrono::Utc;
use tally_core::RateLimitDecision;
use tally_core::ports::RateLimiter;
use tally_shared::{ErrorResponse, RateLimitStatus};

use crate::config::{FailurePolicy, RateLimitSettings};
use crate::middleware::error::AppError;
use crate::observability::RequestId;

/// Rate limiting middleware factory.
///
/// Keys are `"{scope}:{client ip}"`, so separately wrapped scopes keep
/// separate quotas for the same client.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    scope: Rc<str>,
    settings: RateLimitSettings,
}

impl RateLimitMiddleware {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        scope: impl Into<String>,
        settings: RateLimitSettings,
    ) -> Self {
        Self {
            limiter,
            scope: Rc::from(scope.into()),
            settings,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            scope: self.scope.clone(),
            settings: self.settings,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    scope: Rc<str>,
    settings: RateLimitSettings,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = Arc::clone(&self.limiter);
        let settings = self.settings;

        // Socket peer only: Forwarded / X-Forwarded-For are client-controlled.
        let key = match req.peer_addr() {
            Some(addr) => format!("{}:{}", self.scope, addr.ip()),
            None => format!("{}:unknown", self.scope),
        };

        Box::pin(async move {
            let outcome = limiter
                .rate_limit(&key, settings.max_requests, settings.window_secs)
                .await;

            match outcome {
                Ok(decision) if decision.success => {
                    let mut res = service.call(req).await?;
                    insert_rate_limit_headers(res.headers_mut(), &decision);
                    Ok(res.map_into_left_body())
                }
                Ok(decision) => {
                    tracing::warn!(key = %key, limit = decision.limit, "Rate limit exceeded");
                    Ok(reject(req, &decision).map_into_right_body())
                }
                Err(err) => match settings.failure_policy {
                    FailurePolicy::Open => {
                        tracing::error!(key = %key, error = %err, "Rate limiter error, failing open");
                        let res = service.call(req).await?;
                        Ok(res.map_into_left_body())
                    }
                    FailurePolicy::Closed => {
                        tracing::error!(key = %key, error = %err, "Rate limiter error, failing closed");
                        let response = AppError::from(err).error_response();
                        let (http_req, _payload) = req.into_parts();
                        Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                    }
                },
            }
        })
    }
}

/// 429 response carrying the decision in headers and in the problem body.
fn reject(req: ServiceRequest, decision: &RateLimitDecision) -> ServiceResponse {
    let retry_after = whole_seconds(decision.retry_after(Utc::now()));

    let mut body = ErrorResponse::too_many_requests(retry_after).with_rate_limit(RateLimitStatus {
        limit: decision.limit,
        remaining: decision.remaining,
        reset: decision.reset_epoch_secs(),
    });
    if let Some(request_id) = req.extensions().get::<RequestId>() {
        body = body.with_request_id(request_id.as_str());
    }

    let mut response = HttpResponse::TooManyRequests()
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .json(body);
    insert_rate_limit_headers(response.headers_mut(), decision);

    let (http_req, _payload) = req.into_parts();
    ServiceResponse::new(http_req, response)
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(decision.reset_epoch_secs()),
    );
}

fn whole_seconds(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
