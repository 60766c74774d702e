// src/config.rs

use std::{env, str::FromStr};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Session length in seconds.
    pub jwt_expiration: u64,
    /// Lifetime of an emailed login code in seconds.
    pub code_ttl: u64,
    pub server_port: u16,
    pub rust_log: String,
}

fn var_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: var_or("JWT_EXPIRATION", 86_400),
            code_ttl: var_or("CODE_TTL", 300),
            server_port: var_or("SERVER_PORT", 8081),
            rust_log,
        }
    }
}
