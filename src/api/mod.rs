use rocket::{catchers, routes, Build, Rocket};

pub mod cors;
pub mod problem;
pub mod requests;

/// Mounts every route, catcher and response fairing of the HTTP surface.
pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(cors::Cors)
        .mount("/", routes![requests::index])
        .mount(
            "/api",
            routes![
                requests::create_score,
                requests::top_scores,
                requests::health,
                cors::preflight
            ],
        )
        .register("/", catchers![problem::problem_catcher])
}
