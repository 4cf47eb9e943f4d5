pub mod actions;
pub mod api;
pub mod config;
pub mod http;
pub mod hydrate;
pub mod lists;
pub mod models;
pub mod tmdb;
pub mod trakt;
