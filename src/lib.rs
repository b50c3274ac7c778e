//! FeedHub - A multi-source feed aggregator
//!
//! This crate fetches items from GitHub trending search, Hacker News,
//! Dev.to and user-supplied RSS feeds, normalizes them into one record
//! shape, and exposes filter and grouping views over the merged stream.

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod keywords;
pub mod models;
pub mod sources;
pub mod store;
pub mod views;
