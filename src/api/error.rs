use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("malformed response from {endpoint}: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    #[error("invalid base url {0}")]
    BaseUrl(String),
}

impl ApiError {
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == code)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
