pub mod errors;
pub mod models;
pub mod routes;

pub use errors::ServiceError;
pub use routes::{create_app, AppState};
