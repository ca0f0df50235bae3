//! Domain models for Nationhood.

pub mod nation;
pub mod territory;
pub mod user;
