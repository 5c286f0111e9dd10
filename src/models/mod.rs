// src/models/mod.rs

pub mod blog;
pub mod contact;
pub mod pagination;
pub mod quiz;
pub mod score;
pub mod user;
