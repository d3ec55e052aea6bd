use crate::{api::attendance, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, get, middleware::from_fn, web};
use serde_json::json;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let attendance_limiter = build_limiter(config.rate_attendance_per_min);

    cfg.service(health);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(attendance_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::history)))
                    .service(web::resource("/checkin").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/checkout").route(web::put().to(attendance::check_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    // /attendance/reference/{employee_id}
                    .service(
                        web::resource("/reference/{employee_id}")
                            .route(web::get().to(attendance::get_reference))
                            .route(web::put().to(attendance::set_reference)),
                    ),
            ),
    );
}
