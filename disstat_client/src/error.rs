use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (connection failure, timeout)
    #[error("Failed to reach the DisStat API: {0}")]
    Network(#[source] reqwest::Error),

    /// The API answered with a non-success status, this includes auth failures and rate limits
    #[error("DisStat API responded with {status}: {body}")]
    Remote { status: StatusCode, body: String },

    /// Auto-posting was started on a reporter that is already posting
    #[error("Auto-posting is already running")]
    AlreadyRunning,

    #[error("The posting interval must be greater than zero")]
    InvalidInterval,

    #[error("The command name must not be empty")]
    EmptyCommandName,

    /// The host bot has not logged in yet, so there is no bot id to post for
    #[error("The bot has not logged in yet, post after READY")]
    NotReady,

    #[error("The API key is not a valid header value")]
    InvalidApiKey,

    #[error("Invalid DisStat base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Whether the API rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Remote { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(value)
    }
}

pub type Result<T> = ::core::result::Result<T, Error>;
