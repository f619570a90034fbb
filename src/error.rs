use std::fmt::Display;

use serde::Deserialize;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("foreign id {0:?} is not a valid UUID")]
    InvalidForeignId(String),
    #[error("foreign id is required")]
    MissingForeignId,
    #[error("malformed activity payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("malformed `to` entry: {0}")]
    MalformedToEntry(String),
    #[error("invalid feed id {0:?}, slug and user id may only contain word characters and '-'")]
    InvalidFeedId(String),
    #[error("unable to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Service(ServiceError),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Error payload returned by the service with any non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceError {
    pub code: i64,
    pub status_code: u16,
    pub detail: String,
    pub duration: Option<String>,
    pub exception: String,
}

impl ServiceError {
    /// Build the error from a response body, falling back to the raw text
    /// when the body is not the documented JSON shape.
    pub(crate) fn from_response(status: u16, body: &[u8]) -> ServiceError {
        match serde_json::from_slice::<ServiceError>(body) {
            Ok(mut error) => {
                if error.status_code == 0 {
                    error.status_code = status;
                }
                error
            }
            Err(_) => ServiceError {
                status_code: status,
                detail: String::from_utf8_lossy(body).into_owned(),
                ..Default::default()
            },
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "service returned {} ({}, code {}): {}",
            self.status_code, self.exception, self.code, self.detail
        )?;
        if let Some(duration) = &self.duration {
            write!(f, " after {duration}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}
