use crate::{
    api::{balance, leave_request, policy},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Protected routes; tokens come from the identity service.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // before /{id} so the literal segments win
                    .service(
                        web::resource("/preview").route(web::get().to(leave_request::preview_leave)),
                    )
                    .service(
                        web::resource("/approvals/pending")
                            .route(web::get().to(leave_request::pending_approvals)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::update_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    .service(
                        web::resource("/{id}/submit").route(web::put().to(leave_request::submit_leave)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
                    )
                    .service(
                        web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)),
                    )
                    .service(
                        web::resource("/{id}/approvals")
                            .route(web::get().to(leave_request::leave_approvals)),
                    )
                    .service(
                        web::resource("/{id}/approvers")
                            .route(web::post().to(leave_request::add_approver)),
                    ),
            )
            .service(
                web::scope("/balance")
                    .service(
                        web::resource("")
                            .route(web::get().to(balance::list_balances))
                            .route(web::put().to(balance::upsert_allocation)),
                    )
                    .service(web::resource("/grant").route(web::post().to(balance::grant_balance)))
                    .service(web::resource("/revoke").route(web::post().to(balance::revoke_balance)))
                    .service(
                        web::resource("/initialize")
                            .route(web::post().to(balance::initialize_balances)),
                    )
                    .service(
                        web::resource("/carry-forward").route(web::post().to(balance::carry_forward)),
                    ),
            )
            .service(
                web::scope("/policy")
                    .service(web::resource("/process").route(web::post().to(policy::process_leaves)))
                    .service(
                        web::resource("/special").route(web::post().to(policy::process_special_leave)),
                    )
                    .service(
                        web::resource("/special/bulk")
                            .route(web::post().to(policy::process_special_leave_bulk)),
                    )
                    .service(web::resource("/history").route(web::get().to(policy::process_history))),
            ),
    );
}
