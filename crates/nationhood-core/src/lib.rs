//! Nationhood Core: domain models, error taxonomy, repository traits
//! and the territory catalog shared by every other crate.

pub mod catalog;
pub mod error;
pub mod models;
pub mod repository;
