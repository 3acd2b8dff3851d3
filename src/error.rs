use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(
        "password must be at least 8 characters and contain uppercase, lowercase and numbers"
    )]
    WeakPassword,

    #[error("username must be 3-32 characters of letters, numbers and underscores")]
    InvalidUsername,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("group already exists")]
    GroupExists,

    #[error("group not found")]
    GroupNotFound,

    #[error("user already in group")]
    UserAlreadyInGroup,

    #[error("user not in group")]
    UserNotInGroup,

    #[error("no access control defined for path")]
    NoAccessRuleDefined,

    #[error("file is already shared with this group")]
    AlreadyShared,

    #[error("share not found")]
    ShareNotFound,

    #[error("cannot share within the same group")]
    SelfShare,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    ExpiredToken,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Coarse classification callers map onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    InvalidToken,
    ExpiredToken,
    Validation,
    Internal,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UserNotFound
            | Error::GroupNotFound
            | Error::UserNotInGroup
            | Error::NoAccessRuleDefined
            | Error::ShareNotFound => ErrorKind::NotFound,
            Error::UserExists
            | Error::GroupExists
            | Error::UserAlreadyInGroup
            | Error::AlreadyShared => ErrorKind::Conflict,
            Error::InvalidCredentials | Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::InvalidToken => ErrorKind::InvalidToken,
            Error::ExpiredToken => ErrorKind::ExpiredToken,
            Error::WeakPassword
            | Error::InvalidUsername
            | Error::InvalidEmail
            | Error::SelfShare
            | Error::BadRequest(_) => ErrorKind::Validation,
            Error::Io(_) | Error::Json(_) | Error::Config(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
