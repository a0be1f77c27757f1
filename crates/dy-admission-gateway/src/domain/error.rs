//! Status codes, response envelope and error types for the user API.
//!
//! Every structured reply (success or rejection) is an [`ApiResponse`] sent
//! with HTTP 200; the client inspects `status`. Unclassified failures are the
//! exception: they become an opaque HTTP 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Closed set of wire status codes understood by dashboard and CLI clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    Ok,
    OkDeployStarted,
    OkPartiallySuccessful,
    /// Generic error; used for namespace lock and active-build conflicts
    GenericConflict,
    NotInitialized,
    /// Session exists but its backing data is still loading (transient)
    UserNotInitialized,
    NotAuthorized,
    AlreadyExist,
    BadName,
    WrongPassword,
    AuthTokenInvalid,
    VerificationFailed,
    IllegalOperation,
    BuildError,
    IllegalParameter,
    NotFound,
    AuthenticationFailed,
    PasswordBackOff,
}

impl ApiStatus {
    pub const ALL: [ApiStatus; 18] = [
        ApiStatus::Ok,
        ApiStatus::OkDeployStarted,
        ApiStatus::OkPartiallySuccessful,
        ApiStatus::GenericConflict,
        ApiStatus::NotInitialized,
        ApiStatus::UserNotInitialized,
        ApiStatus::NotAuthorized,
        ApiStatus::AlreadyExist,
        ApiStatus::BadName,
        ApiStatus::WrongPassword,
        ApiStatus::AuthTokenInvalid,
        ApiStatus::VerificationFailed,
        ApiStatus::IllegalOperation,
        ApiStatus::BuildError,
        ApiStatus::IllegalParameter,
        ApiStatus::NotFound,
        ApiStatus::AuthenticationFailed,
        ApiStatus::PasswordBackOff,
    ];

    /// Numeric wire code
    pub fn code(self) -> u16 {
        match self {
            ApiStatus::Ok => 100,
            ApiStatus::OkDeployStarted => 101,
            ApiStatus::OkPartiallySuccessful => 102,
            ApiStatus::GenericConflict => 1000,
            ApiStatus::NotInitialized => 1001,
            ApiStatus::UserNotInitialized => 1002,
            ApiStatus::NotAuthorized => 1105,
            ApiStatus::AlreadyExist => 1106,
            ApiStatus::BadName => 1107,
            ApiStatus::WrongPassword => 1108,
            ApiStatus::AuthTokenInvalid => 1109,
            ApiStatus::VerificationFailed => 1110,
            ApiStatus::IllegalOperation => 1111,
            ApiStatus::BuildError => 1112,
            ApiStatus::IllegalParameter => 1113,
            ApiStatus::NotFound => 1114,
            ApiStatus::AuthenticationFailed => 1115,
            ApiStatus::PasswordBackOff => 1116,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Symbolic name, as used in logs
    pub fn name(self) -> &'static str {
        match self {
            ApiStatus::Ok => "OK",
            ApiStatus::OkDeployStarted => "OK_DEPLOY_STARTED",
            ApiStatus::OkPartiallySuccessful => "OK_PARTIALLY_SUCCESSFUL",
            ApiStatus::GenericConflict => "GENERIC_CONFLICT",
            ApiStatus::NotInitialized => "NOT_INITIALIZED",
            ApiStatus::UserNotInitialized => "USER_NOT_INITIALIZED",
            ApiStatus::NotAuthorized => "NOT_AUTHORIZED",
            ApiStatus::AlreadyExist => "ALREADY_EXIST",
            ApiStatus::BadName => "BAD_NAME",
            ApiStatus::WrongPassword => "WRONG_PASSWORD",
            ApiStatus::AuthTokenInvalid => "AUTH_TOKEN_INVALID",
            ApiStatus::VerificationFailed => "VERIFICATION_FAILED",
            ApiStatus::IllegalOperation => "ILLEGAL_OPERATION",
            ApiStatus::BuildError => "BUILD_ERROR",
            ApiStatus::IllegalParameter => "ILLEGAL_PARAMETER",
            ApiStatus::NotFound => "NOT_FOUND",
            ApiStatus::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ApiStatus::PasswordBackOff => "PASSWORD_BACK_OFF",
        }
    }

    pub fn is_success(self) -> bool {
        self.code() < 1000
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

impl Serialize for ApiStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.code())
    }
}

impl<'de> Deserialize<'de> for ApiStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = u16::deserialize(deserializer)?;
        ApiStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {}", code)))
    }
}

/// Structured response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn new(status: ApiStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            data: None,
        }
    }

    pub fn ok(description: impl Into<String>) -> Self {
        Self::new(ApiStatus::Ok, description)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// No session was resolved for the request
    pub fn not_authorized() -> Self {
        Self::new(ApiStatus::NotAuthorized, "The request is not authorized.")
    }

    pub fn user_not_initialized() -> Self {
        Self::new(
            ApiStatus::UserNotInitialized,
            "User data is being loaded... Please wait...",
        )
    }

    /// Session resolved but is not bound to a namespace
    pub fn namespace_not_found() -> Self {
        Self::new(
            ApiStatus::NotAuthorized,
            "Cannot find the namespace attached to this user",
        )
    }

    pub fn operation_in_progress() -> Self {
        Self::new(
            ApiStatus::GenericConflict,
            "Another operation still in progress... please wait...",
        )
    }

    pub fn build_in_progress(app_name: &str) -> Self {
        Self::new(
            ApiStatus::GenericConflict,
            format!("An active build ({}) is in progress... please wait...", app_name),
        )
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Failure surfaced by a downstream handler or one of its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Recognized domain condition, passed to the client verbatim
    #[error("{kind}: {message}")]
    Domain { kind: ApiStatus, message: String },

    /// Anything else; logged server-side, never exposed
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn domain(kind: ApiStatus, message: impl Into<String>) -> Self {
        HandlerError::Domain {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        HandlerError::Internal(anyhow::anyhow!(details.into()))
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Domain { kind, message } => ApiResponse::new(kind, message).into_response(),
            HandlerError::Internal(e) => {
                error!(error = ?e, "Unhandled handler failure");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Result type for downstream handlers
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Gateway-level errors (not sent to clients)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Session or webhook resolver failure
    #[error("session resolver error: {0}")]
    Resolver(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
