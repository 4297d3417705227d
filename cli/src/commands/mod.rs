pub mod chat;
pub mod config;
pub mod embed;
pub mod extract;
pub mod generate;
pub mod models;
pub mod pull;
pub mod remove;
