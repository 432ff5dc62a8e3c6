pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
