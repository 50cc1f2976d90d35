pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod logging;
pub mod models;
pub mod patches;
pub mod reports;
pub mod secret;

pub use crate::{
    config::{ConnectionParams, DatabaseConfig},
    database::Database,
    errors::AppError,
};
