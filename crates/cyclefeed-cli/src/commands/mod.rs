pub mod config;
pub mod feed;
mod fixture;
pub mod schedule;
