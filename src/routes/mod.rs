pub mod jobs;

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use crate::providers::ProviderRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub providers: Arc<ProviderRegistry>,
}

pub fn router(pool: PgPool, providers: Arc<ProviderRegistry>) -> Router {
    jobs::router(AppState { pool, providers })
}
