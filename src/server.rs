use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(crate::routes::health::health))
        // Datasets
        .route("/datasets", get(crate::routes::datasets::list_datasets))
        // Evaluation pipeline
        .route(
            "/evaluations",
            get(crate::routes::evaluations::list_evaluations)
                .post(crate::routes::evaluations::start_evaluation),
        )
        .route(
            "/evaluations/active",
            get(crate::routes::evaluations::active_evaluations),
        )
        .route(
            "/evaluations/{id}",
            get(crate::routes::evaluations::evaluation_summary),
        )
        .route(
            "/evaluations/{id}/results",
            get(crate::routes::evaluations::evaluation_results),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
