//! # Error Handling
//!
//! Every fallible operation in this crate returns [`DatatableError`]. The
//! variants map onto the situations a table endpoint can run into:
//!
//! - malformed table setup ([`DatatableError::Configuration`]),
//! - a request no registered parser understands ([`DatatableError::NoParserFound`]),
//! - a request naming a column the table does not have ([`DatatableError::UnknownColumn`]),
//! - the provider being used out of order ([`DatatableError::InvalidState`]),
//! - the data source failing ([`DatatableError::QueryExecution`]).
//!
//! A cache miss is *not* an error; the cache layer reports it as `None`.
//!
//! The error converts into an axum response with a sanitized message. Database
//! details are logged through `tracing` and never sent to the client:
//!
//! ```rust,ignore
//! async fn people(params: RequestParams, State(state): State<AppState>) -> Result<Json<Value>, DatatableError> {
//!     state.table.handle(&params, state.builder.clone()).await
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T, E = DatatableError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum DatatableError {
    /// Table or column setup is malformed (e.g. a column without a name).
    Configuration {
        /// Description of the setup problem
        message: String,
    },

    /// No registered parser recognised the request parameters.
    NoParserFound,

    /// A sort or search instruction referenced a column that is not configured.
    UnknownColumn {
        /// Column name or position as sent by the client
        column: String,
    },

    /// The execution provider was used out of order.
    InvalidState {
        /// What was attempted
        message: String,
    },

    /// The data source failed to execute the built query (details logged, not exposed)
    QueryExecution {
        /// Internal error
        internal: DbErr,
    },
}

impl DatatableError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Wrap a data source failure.
    ///
    /// # Example
    /// ```rust,ignore
    /// let rows = builder.fetch(&columns).await.map_err(DatatableError::query_execution)?;
    /// ```
    pub fn query_execution(err: DbErr) -> Self {
        Self::QueryExecution { internal: err }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoParserFound | Self::UnknownColumn { .. } => StatusCode::BAD_REQUEST,
            Self::Configuration { .. } | Self::InvalidState { .. } | Self::QueryExecution { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the client caused the error
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// User-facing message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::Configuration { message } => format!("Invalid table configuration: {message}"),
            Self::NoParserFound => "Unsupported table request".to_string(),
            Self::UnknownColumn { column } => format!("Column '{column}' does not exist"),
            Self::InvalidState { message } => format!("Invalid provider state: {message}"),
            Self::QueryExecution { .. } => "A database error occurred".to_string(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::QueryExecution { internal } => {
                tracing::error!(error = ?internal, "Table query failed");
            }
            Self::Configuration { message } | Self::InvalidState { message } => {
                tracing::error!(details = %message, "Table setup error");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Table request rejected"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for DatatableError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl fmt::Display for DatatableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Display is for logs as well, so keep the database detail here
            Self::QueryExecution { internal } => write!(f, "query execution failed: {internal}"),
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for DatatableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::QueryExecution { internal } => Some(internal),
            _ => None,
        }
    }
}

impl From<DbErr> for DatatableError {
    fn from(err: DbErr) -> Self {
        Self::query_execution(err)
    }
}
