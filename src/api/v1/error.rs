use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, Reply, reject};

const SIGN_IN_FAILED: &str = "Sign-in failed. Check your email and password or try again later";

pub async fn recover_error(err: Rejection) -> Result<impl Reply, Infallible> {
    let rejection = if let Some(rejection) = err.find::<ApiRejection>() {
        rejection.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiRejection::new(ApiErrorCode::InvalidRequest, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiRejection::new(ApiErrorCode::InvalidRequest, e.to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        ApiRejection::from(ApiErrorCode::InvalidToken)
    } else if err.is_not_found() {
        ApiRejection::from(ApiErrorCode::NotFound)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiRejection::from(ApiErrorCode::NotFound)
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiRejection::from(ApiErrorCode::InternalError)
    };

    let status = rejection.code.status();
    let retry_after = rejection.retry_after_seconds;
    let json = warp::reply::json(&ApiResponse::<()>::err(rejection.into_api_error()));
    let reply = warp::reply::with_status(json, status);
    Ok(match retry_after {
        Some(secs) => {
            warp::reply::with_header(reply, "retry-after", secs.to_string()).into_response()
        }
        None => reply.into_response(),
    })
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("{}", SIGN_IN_FAILED)]
    SignInFailed,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Admin role required")]
    Forbidden,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::SignInFailed | ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::AccountNotFound | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejection carried through warp filters and rendered by `recover_error`.
#[derive(Debug, Clone)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
    pub retry_after_seconds: Option<u64>,
}

impl ApiRejection {
    fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiRejection {
            code,
            message: message.into(),
            retry_after_seconds: None,
        }
    }

    fn into_api_error(self) -> ApiError {
        ApiError {
            code: self.code,
            message: self.message,
            retry_after_seconds: self.retry_after_seconds,
        }
    }
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection::new(code, code.to_string())
    }
}

impl From<SignInError> for ApiRejection {
    fn from(error: SignInError) -> Self {
        match error {
            SignInError::InvalidCredentials => ApiErrorCode::SignInFailed.into(),
            SignInError::AccountLocked { remaining_seconds } => ApiRejection {
                retry_after_seconds: Some(remaining_seconds),
                ..ApiErrorCode::SignInFailed.into()
            },
            SignInError::Upstream(e) => ApiErrorCode::internal(e).into(),
        }
    }
}

impl From<RefreshError> for ApiRejection {
    fn from(error: RefreshError) -> Self {
        match error {
            RefreshError::InvalidToken => ApiErrorCode::InvalidToken.into(),
            RefreshError::Upstream(e) => ApiErrorCode::internal(e).into(),
        }
    }
}

impl From<AdminError> for ApiRejection {
    fn from(error: AdminError) -> Self {
        match error {
            AdminError::AccountNotFound(_) => ApiErrorCode::AccountNotFound.into(),
            AdminError::Upstream(e) => ApiErrorCode::internal(e).into(),
        }
    }
}

impl From<TokenError> for ApiRejection {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid | TokenError::Expired => ApiErrorCode::InvalidToken.into(),
            TokenError::InternalError(e) => ApiErrorCode::internal(e).into(),
        }
    }
}
