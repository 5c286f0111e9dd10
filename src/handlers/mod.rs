// src/handlers/mod.rs

pub mod auth;
pub mod blog;
pub mod contact;
pub mod quiz;
pub mod score;
