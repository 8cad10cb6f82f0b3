use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub account_id: uuid::Uuid,
    pub roles: Vec<Role>,
    pub access_token: String,
    pub refresh_token: String,
    pub expire_minutes: u64,
}

impl From<SessionToken> for SignInResponse {
    fn from(session: SessionToken) -> Self {
        SignInResponse {
            account_id: session.account_id.0,
            roles: session.roles,
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            expire_minutes: session.tokens.expire_minutes,
        }
    }
}

pub async fn sign_in(
    request: SignInRequest,
    sign_in_service: Arc<dyn SignInService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session = sign_in_service
        .sign_in(SignInInput {
            email: Email::new(&request.email),
            password: request.password,
        })
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(SignInResponse::from(
        session,
    ))))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn refresh(
    request: RefreshRequest,
    refresh_service: Arc<dyn SessionRefreshService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session = refresh_service
        .refresh(RefreshInput {
            access_token: request.access_token,
            refresh_token: request.refresh_token,
        })
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(SignInResponse::from(
        session,
    ))))
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub async fn fast_forward_lockout(
    _admin: VerifiedAccess,
    request: EmailRequest,
    admin_service: Arc<dyn AdminService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    admin_service
        .fast_forward_lockout(&Email::new(&request.email))
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(
        "Lockout end has been successfully fast-forwarded",
    )))
}

pub async fn reset_lockout_count(
    _admin: VerifiedAccess,
    request: EmailRequest,
    admin_service: Arc<dyn AdminService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    admin_service
        .reset_lockout_count(&Email::new(&request.email))
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(
        "Lockout count has been reset",
    )))
}

pub async fn lockout_status(
    _admin: VerifiedAccess,
    query: EmailRequest,
    admin_service: Arc<dyn AdminService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = admin_service
        .lockout_status(&Email::new(&query.email))
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(status)))
}
