pub mod assessments;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod extract;
pub mod jobs;
pub mod models;
pub mod network;
pub mod pipeline;
pub mod query;
pub mod routes;
pub mod seed;
pub mod state;
