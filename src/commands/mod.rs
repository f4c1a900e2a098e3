//! Módulo de comandos do Tongs

pub mod build;
pub mod env;
pub mod list;
pub mod merge;
