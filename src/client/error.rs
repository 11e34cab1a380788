use thiserror::Error;

/// ClientError
///
/// Everything a client call can fail with. `Api` carries the server's own `msg` text,
/// which is what the state containers record for display.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{msg}")]
    Api { status: u16, msg: String },
}

impl ClientError {
    /// HTTP status of a server-side rejection; `None` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|status| status.as_u16()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
