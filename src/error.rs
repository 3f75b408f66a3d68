use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{status::Custom, Responder},
    serde::json::{json, serde_json::Error as JsonError, Json},
    Request,
};
use thiserror::Error;

use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage unavailable: {0}")]
    Db(#[from] DbError),
    #[error(transparent)]
    Json(#[from] JsonError),
    /// The message is sent to the client as is.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("Student '{0}' has already voted")]
    AlreadyVoted(String),
}

impl Error {
    pub fn student_not_found(stu_id: &str) -> Self {
        Self::NotFound(format!("Student '{stu_id}'"))
    }

    pub fn election_not_found(elec_id: &str) -> Self {
        Self::NotFound(format!("Election '{elec_id}'"))
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::AlreadyExists(_) | Self::AlreadyVoted(_) => Status::Conflict,
            Self::Db(_) => Status::ServiceUnavailable,
            Self::Json(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        if status.class() == StatusClass::ServerError {
            error!("  req{id} failed: {self}");
        } else {
            debug!("  req{id} rejected: {self}");
        }
        Custom(status, Json(json!({ "error": self.to_string() }))).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            Error::AlreadyExists("Student 'S1'".to_string()).status(),
            Status::Conflict
        );
        assert_eq!(
            Error::AlreadyVoted("S1".to_string()).status(),
            Status::Conflict
        );
    }

    #[test]
    fn lookups_map_to_404() {
        let err = Error::election_not_found("E1");
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(err.to_string(), "Election 'E1' not found");
    }

    #[test]
    fn malformed_requests_map_to_400() {
        let err = Error::BadRequest("Request not successful".to_string());
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.to_string(), "Request not successful");
    }
}
