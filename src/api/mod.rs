mod handlers;

use axum::{
    extract::FromRef,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::models::CategoryDeletePolicy;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub category_delete: CategoryDeletePolicy,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for CategoryDeletePolicy {
    fn from_ref(state: &AppState) -> Self {
        state.category_delete
    }
}

/// Router with the default category delete policy.
pub fn create_router(db: Database) -> Router {
    create_router_with_policy(db, CategoryDeletePolicy::default())
}

pub fn create_router_with_policy(db: Database, category_delete: CategoryDeletePolicy) -> Router {
    let api = Router::new()
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::get_category).delete(handlers::delete_category),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState {
            db,
            category_delete,
        })
}
