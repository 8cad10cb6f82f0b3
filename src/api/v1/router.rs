use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::Role;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let sign_in = warp::post()
        .and(warp::path!("auth" / "sign-in"))
        .and(warp::body::json())
        .and(with(server.sign_in_service.clone()))
        .and_then(handler::sign_in);

    let refresh = warp::post()
        .and(warp::path!("auth" / "refresh"))
        .and(warp::body::json())
        .and(with(server.refresh_service.clone()))
        .and_then(handler::refresh);

    let fast_forward_lockout = warp::patch()
        .and(warp::path!("admin" / "fast-forward-lockout"))
        .and(with_admin(server.token_service.clone()))
        .and(warp::body::json())
        .and(with(server.admin_service.clone()))
        .and_then(handler::fast_forward_lockout);

    let reset_lockout_count = warp::patch()
        .and(warp::path!("admin" / "reset-lockout-count"))
        .and(with_admin(server.token_service.clone()))
        .and(warp::body::json())
        .and(with(server.admin_service.clone()))
        .and_then(handler::reset_lockout_count);

    let lockout_status = warp::get()
        .and(warp::path!("admin" / "lockout-status"))
        .and(with_admin(server.token_service.clone()))
        .and(warp::query::<handler::EmailRequest>())
        .and(with(server.admin_service.clone()))
        .and_then(handler::lockout_status);

    sign_in
        .or(refresh)
        .or(fast_forward_lockout)
        .or(reset_lockout_count)
        .or(lockout_status)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Bearer token that verifies and carries the `Admin` role.
fn with_admin(
    token_service: Arc<dyn TokenService>,
) -> impl Filter<Extract = (VerifiedAccess,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_service = token_service.clone();
        async move {
            let Some(token) = token.strip_prefix("Bearer ") else {
                return Err(reject::custom(ApiRejection::from(ApiErrorCode::InvalidToken)));
            };
            let access = token_service
                .verify_access(token)
                .await
                .map_err(ApiRejection::from)
                .map_err(reject::custom)?;
            if !access.roles.contains(&Role::Admin) {
                return Err(reject::custom(ApiRejection::from(ApiErrorCode::Forbidden)));
            }
            Ok(access)
        }
    })
}
