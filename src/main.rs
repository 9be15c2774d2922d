use std::sync::Arc;

use rocket::fairing::{self, AdHoc};
use rocket::figment::Figment;
use rocket::{launch, Build, Rocket};
use tracing::{error, warn};

use api::cors::CorsPolicy;
use config::AppConfig;
use database::{MemoryScoreStore, ScoreStore, SqlScoreStore};
use leaderboard::LeaderboardService;

mod api;
mod config;
mod database;
mod leaderboard;
mod logging;
mod score;
#[cfg(test)]
mod tests;
mod validation;

#[launch]
async fn rocket() -> _ {
    build(config::figment())
}

/// Builds the server from `figment`. The score store is opened during ignition.
pub fn build(figment: Figment) -> Rocket<Build> {
    logging::init();

    let rocket = rocket::custom(figment).attach(AdHoc::try_on_ignite("Score store", open_store));
    api::mount(rocket)
}

async fn open_store(rocket: Rocket<Build>) -> fairing::Result {
    let config = match rocket.figment().extract::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return Err(rocket);
        }
    };

    let store: Arc<dyn ScoreStore> = match &config.database_url {
        None => {
            warn!("DATABASE_URL is not set, scores will be kept in memory");
            Arc::new(MemoryScoreStore::new())
        }
        Some(database_url) => match SqlScoreStore::connect(database_url).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                error!(%err, "failed to connect to the database");
                return Err(rocket);
            }
        },
    };

    let cors = CorsPolicy::new(config.cors_allowed_origin, config.cors_max_age);
    Ok(rocket.manage(LeaderboardService::new(store)).manage(cors))
}
