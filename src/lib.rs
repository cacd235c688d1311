pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod observer;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
pub mod testing;
