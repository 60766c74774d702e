// src/utils/mod.rs

pub mod code;
pub mod flex;
pub mod jwt;
pub mod mail;
