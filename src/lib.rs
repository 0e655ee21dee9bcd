pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod secrets;
pub mod service;
pub mod types;

pub use error::BeaconError;
pub use service::{HealthEvaluator, SelfTestRunner, ServiceContext};
