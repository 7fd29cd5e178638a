use askama::Template;
use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use super::templates::ErrorPage;
use crate::result::Error;

/// A failure translated for the user: details stay in the logs
#[derive(Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        let (status, message) = match err {
            Error::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid YouTube URL format"),
            Error::MissingSelection => (StatusCode::BAD_REQUEST, "No format selected"),
            Error::UnavailableFormat => {
                (StatusCode::BAD_REQUEST, "Selected format is not available")
            }
            Error::UnavailableStream => (StatusCode::NOT_FOUND, "This video is unavailable"),
            Error::Miette(report) => {
                error!("Request failed: {report:?}");
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "An unexpected error occurred".to_owned(),
                };
            }
        };

        warn!("Request rejected: {message}");
        Self {
            status,
            message: message.to_owned(),
        }
    }
}

impl Failure {
    /// A request body the extractors refused, too big or not decodable
    fn rejected(status: StatusCode, detail: String) -> Self {
        warn!("Request body rejected ({status}): {detail}");
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self {
                status,
                message: "File too large".to_owned(),
            }
        } else {
            Self {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid request".to_owned(),
            }
        }
    }
}

/// Error answered with the HTML error page
#[derive(Debug)]
pub struct PageError(Failure);

impl PageError {
    pub fn not_found() -> Self {
        Self(Failure {
            status: StatusCode::NOT_FOUND,
            message: "Page not found".to_owned(),
        })
    }
}

impl From<Error> for PageError {
    fn from(err: Error) -> Self {
        Self(err.into())
    }
}

impl From<FormRejection> for PageError {
    fn from(rejection: FormRejection) -> Self {
        Self(Failure::rejected(rejection.status(), rejection.body_text()))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let Failure { status, message } = self.0;
        let page = ErrorPage {
            status: status.as_u16(),
            message: &message,
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                error!("Could not render error page: {err}");
                (status, message).into_response()
            }
        }
    }
}

/// Error answered with a JSON body: `{"success": false, "error": "..."}`
#[derive(Debug)]
pub struct ApiError(Failure);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Failure::rejected(rejection.status(), rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Failure { status, message } = self.0;
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
