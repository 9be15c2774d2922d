use std::collections::BTreeMap;
use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::{json, Serialize};
use rocket::catch;

use crate::leaderboard::LeaderboardError;
use crate::validation::Field;

/// Error body in the `application/problem+json` shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<Field, String>>,
}

impl Problem {
    pub fn new(status: Status, detail: impl Into<String>) -> Self {
        Self {
            kind: format!("https://httpstatuses.io/{}", status.code),
            title: status.reason_lossy().to_owned(),
            status: status.code,
            detail: detail.into(),
            instance: None,
            errors: None,
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_errors(mut self, errors: BTreeMap<Field, String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

pub fn problem_json() -> ContentType {
    ContentType::new("application", "problem+json")
}

impl From<&LeaderboardError> for Problem {
    fn from(error: &LeaderboardError) -> Self {
        match error {
            LeaderboardError::Validation(error) => {
                Problem::new(Status::BadRequest, "Validation failed").with_errors(error.errors().clone())
            }
            LeaderboardError::Store(_) => Problem::new(
                Status::ServiceUnavailable,
                "The score store is unavailable, try again later",
            ),
        }
    }
}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = Status::from_code(self.status).unwrap_or(Status::InternalServerError);
        let body = json::to_string(&self).map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(status)
            .header(problem_json())
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl<'r> Responder<'r, 'static> for LeaderboardError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Problem::from(&self)
            .with_instance(request.uri().path().to_string())
            .respond_to(request)
    }
}

/// Renders every error Rocket raises itself (unmatched routes, unreadable
/// bodies) as a problem.
#[catch(default)]
pub fn problem_catcher(status: Status, request: &Request<'_>) -> Problem {
    let detail = match status.code {
        400 | 422 => "Request body is malformed".to_owned(),
        403 => "Requests from this origin are not allowed".to_owned(),
        404 => format!("No resource at {}", request.uri().path()),
        _ => status.reason_lossy().to_owned(),
    };
    Problem::new(status, detail).with_instance(request.uri().path().to_string())
}
