//! Rate limited liveness endpoint.

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct PingResponse {
    pub message: &'static str,
}

/// GET /api/v1/ping
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PingResponse { message: "pong" })
}
