//! Leave management core: balances, request lifecycle, approval chains and
//! bulk policy processing, with an actix-web adapter on top.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod external;
pub mod model;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

pub use error::{LeaveError, LeaveResult};
pub use service::LeaveContext;
