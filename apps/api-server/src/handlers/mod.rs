//! HTTP handlers and route configuration.

mod health;
mod ping;

use actix_web::web;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
///
/// Health checks stay outside the limiter and never consume quota.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Rate limited routes
            .service(
                web::scope("/v1")
                    .wrap(RateLimitMiddleware::new(
                        state.limiter.clone(),
                        "v1",
                        state.rate_limit,
                    ))
                    .route("/ping", web::get().to(ping::ping)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use tally_core::FixedWindowLimiter;
    use tally_infra::InMemoryCounterStore;

    use crate::config::{FailurePolicy, RateLimitSettings};

    fn state(max_requests: u32) -> AppState {
        AppState::with_limiter(
            Arc::new(FixedWindowLimiter::new(Arc::new(InMemoryCounterStore::new()))),
            RateLimitSettings {
                max_requests,
                window_secs: 60,
                failure_policy: FailurePolicy::Closed,
            },
        )
    }

    #[actix_web::test]
    async fn health_is_not_rate_limited() {
        let state = state(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(|cfg| configure_routes(cfg, &state)),
        )
        .await;

        for _ in 0..3 {
            let res =
                test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::OK);
            assert!(!res.headers().contains_key("x-ratelimit-limit"));
        }
    }

    #[actix_web::test]
    async fn health_reports_backend() {
        let state = state(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(|cfg| configure_routes(cfg, &state)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
                .await;
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["rate_limit_backend"], "memory");
    }

    #[actix_web::test]
    async fn ping_is_rate_limited() {
        let state = state(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(|cfg| configure_routes(cfg, &state)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/ping").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/ping").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
