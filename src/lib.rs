pub mod address;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
