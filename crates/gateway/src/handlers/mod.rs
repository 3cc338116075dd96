//! API handlers module

use serde::Serialize;
use uuid::Uuid;

pub mod auth;
pub mod categories;
pub mod challenges;
pub mod copies;
pub mod eco;
pub mod health;
pub mod storage;

/// Body returned when a resource is created
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: Uuid,
}
