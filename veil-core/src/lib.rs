pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: config::AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
