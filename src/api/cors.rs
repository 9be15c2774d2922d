use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Method, Status},
    options,
    request::{FromRequest, Outcome},
    Request, Response,
};
use thiserror::Error;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Cross-origin rules for everything under `/api`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origin: String,
    max_age: u64,
}

impl CorsPolicy {
    pub fn new(allowed_origin: impl Into<String>, max_age: u64) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
            max_age,
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        origin == self.allowed_origin
    }

    pub fn covers(&self, path: &str) -> bool {
        path == "/api" || path.starts_with("/api/")
    }
}

/// Guard admitting requests without an `Origin` header or from the allowed one.
/// Any other origin is refused with `403 Forbidden`.
pub struct AllowedOrigin;

#[derive(Debug, Error)]
#[error("origin {origin} is not allowed")]
pub struct ForeignOrigin {
    pub origin: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AllowedOrigin {
    type Error = ForeignOrigin;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let policy = request.rocket().state::<CorsPolicy>();
        match (policy, request.headers().get_one("Origin")) {
            (Some(policy), Some(origin)) if !policy.allows(origin) => {
                let origin = origin.to_owned();
                Outcome::Error((Status::Forbidden, ForeignOrigin { origin }))
            }
            _ => Outcome::Success(AllowedOrigin),
        }
    }
}

/// Adds CORS headers to responses for the allowed origin.
/// Reads the [`CorsPolicy`] from managed state.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(policy) = request.rocket().state::<CorsPolicy>() else {
            return;
        };
        if !policy.covers(request.uri().path().as_str()) {
            return;
        }
        let Some(origin) = request.headers().get_one("Origin") else {
            return;
        };
        if !policy.allows(origin) {
            return;
        }

        response.set_raw_header("Access-Control-Allow-Origin", origin.to_owned());
        response.adjoin_raw_header("Vary", "Origin");

        if request.method() == Method::Options {
            response.set_raw_header("Access-Control-Allow-Methods", ALLOWED_METHODS);
            if let Some(headers) = request.headers().get_one("Access-Control-Request-Headers") {
                response.set_raw_header("Access-Control-Allow-Headers", headers.to_owned());
            }
            response.set_raw_header("Access-Control-Max-Age", policy.max_age.to_string());
        }
    }
}

/// Answers preflight requests; the fairing fills in the headers.
#[options("/<_..>")]
pub fn preflight(_origin: AllowedOrigin) -> Status {
    Status::NoContent
}
