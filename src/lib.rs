pub mod auth;
pub mod config;
pub mod consent;
pub mod db;
pub mod documents;
pub mod error;
pub mod geo;
pub mod models;
pub mod routes;
pub mod schema;
pub mod snapshots;
pub mod state;
pub mod store;
pub mod verification;
