use rocket::figment::{providers::Env, Figment};
use rocket::serde::Deserialize;

/// Application settings read from Rocket's figment.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(crate = "rocket::serde", default)]
pub struct AppConfig {
    /// `sqlite:` or `postgres://` url. Scores are kept in memory when unset.
    pub database_url: Option<String>,
    /// The only origin allowed to call `/api` from a browser.
    pub cors_allowed_origin: String,
    /// Seconds a browser may cache a preflight response.
    pub cors_max_age: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            cors_allowed_origin: "http://localhost:3000".to_owned(),
            cors_max_age: 3600,
        }
    }
}

/// Rocket's default sources (`Rocket.toml`, `ROCKET_*`) plus the plain
/// environment variables, after loading `.env`.
pub fn figment() -> Figment {
    dotenv::dotenv().ok();
    rocket::Config::figment().merge(Env::raw().only(&[
        "DATABASE_URL",
        "CORS_ALLOWED_ORIGIN",
        "CORS_MAX_AGE",
    ]))
}
