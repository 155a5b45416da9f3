use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use icebox_engine::{CatalogError, CustomerApiError, DriverApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    /// The request was well-formed but the order or stock state has moved on since the caller
    /// last looked. Safe to retry against fresh state.
    #[error("Conflict. {0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("This account has been disabled.")]
    AccountDisabled,
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        use OrderFlowError::*;
        match &e {
            Validation(_) | InvariantViolation(_) => Self::InvalidRequestBody(e.to_string()),
            OrderNotFound(_) | CustomerNotFound(_) | DriverNotFound(_) | ProductNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            Unauthorized(_) | NotAssigned(_) => Self::InsufficientPermissions(e.to_string()),
            _ if e.is_conflict() => Self::Conflict(e.to_string()),
            _ => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        use CatalogError::*;
        match &e {
            Validation(_) => Self::InvalidRequestBody(e.to_string()),
            ProductNotFound(_) | CategoryNotFound(_) => Self::NoRecordFound(e.to_string()),
            DuplicateCategory(_) | CategoryInUse(_) | ProductInUse(_) => Self::Conflict(e.to_string()),
            DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        use CustomerApiError::*;
        match &e {
            Validation(_) => Self::InvalidRequestBody(e.to_string()),
            NotFound(_) => Self::NoRecordFound(e.to_string()),
            EmailExists(_) | HasOrders(_) => Self::Conflict(e.to_string()),
            DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<DriverApiError> for ServerError {
    fn from(e: DriverApiError) -> Self {
        use DriverApiError::*;
        match &e {
            Validation(_) => Self::InvalidRequestBody(e.to_string()),
            NotFound(_) => Self::NoRecordFound(e.to_string()),
            EmailExists(_) | HasActiveOrders(_) | HasOrders(_) => Self::Conflict(e.to_string()),
            DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
