//! # Jobmarket Core Library
//!
//! Backend core of the recruitment platform: the job approval workflow
//! with its audit log and advisory caches, and the real-time chat
//! subsystem built on websocket fan-out.

pub mod approval;
pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
