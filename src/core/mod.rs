//! Módulo core - Lógica central do Tongs

pub mod builder;
pub mod config;
pub mod merge;
pub mod recipe;
pub mod utils;
