pub mod api;
pub mod attendance;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod model;
pub mod models;
pub mod routes;
pub mod store;
