//! API route definitions.

use axum::Router;
use bucketdrop_core::storage::ObjectStoreConnector;
use bucketdrop_shared::StorageSettingsSource;

use crate::AppState;

pub mod health;
pub mod upload;

/// Creates the API router with all routes.
pub fn api_routes<C, S>() -> Router<AppState<C, S>>
where
    C: ObjectStoreConnector + 'static,
    S: StorageSettingsSource + 'static,
{
    Router::new()
        .merge(health::routes())
        .merge(upload::routes())
}
