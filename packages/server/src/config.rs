use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::domains::results::ScoreBounds;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub expo_access_token: Option<String>,
    pub allowed_origins: Vec<String>,
    pub score_bounds: ScoreBounds,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = ScoreBounds::default();
        let score_bounds = ScoreBounds {
            ca_max: optional_int("SCORE_CA_MAX")?.unwrap_or(defaults.ca_max),
            exam_max: optional_int("SCORE_EXAM_MAX")?.unwrap_or(defaults.exam_max),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "records-platform".to_string()),
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            score_bounds,
        })
    }
}

fn optional_int(name: &str) -> Result<Option<i32>> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse()
                .with_context(|| format!("{name} must be a valid number"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
