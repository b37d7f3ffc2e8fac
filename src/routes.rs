use crate::{
    api::{events, od_request, students},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/signup")
                    .wrap(signup_limiter.clone())
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/events")
                    // /events
                    .service(
                        web::resource("")
                            .route(web::get().to(events::list_events))
                            .route(web::post().to(events::create_event)),
                    )
                    // /events/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(events::update_event))
                            .route(web::delete().to(events::delete_event)),
                    ),
            )
            .service(
                web::scope("/od-requests")
                    // /od-requests
                    .service(
                        web::resource("")
                            .route(web::get().to(od_request::list_od_requests))
                            .route(web::post().to(od_request::create_od_request)),
                    )
                    // /od-requests/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(od_request::get_od_request)),
                    )
                    // /od-requests/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(od_request::approve_od_request)),
                    )
                    // /od-requests/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::post().to(od_request::reject_od_request)),
                    ),
            )
            .service(
                web::resource("/staff/top-students").route(web::get().to(students::top_students)),
            )
            .service(
                web::scope("/students")
                    // /students/me/attendance
                    .service(
                        web::resource("/me/attendance")
                            .route(web::get().to(students::my_attendance)),
                    )
                    // /students/{id}/attendance
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::put().to(students::update_attendance)),
                    ),
            ),
    );
}

// SIGNUP / LOGIN
//  ├─ token (access, 15 min)
//  └─ refreshToken (7 days)

// API REQUEST
//  └─ Authorization: Bearer token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refreshToken
//       └─ returns new token pair
