pub mod borrows;
pub mod dashboard;
pub mod dependents;
pub mod device;
pub mod equipment;
pub mod liff;
pub mod line;
pub mod rescues;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

pub use crate::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
