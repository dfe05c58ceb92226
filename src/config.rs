use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub recipes: RecipeLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub page_size: u64,
    pub max_page_size: u64,
}

/// Bounds enforced when a recipe is composed or edited.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecipeLimits {
    pub min_amount: i32,
    pub max_amount: i32,
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        RecipeLimits {
            min_amount: 1,
            max_amount: 32000,
            min_cooking_time: 1,
            max_cooking_time: 32000,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            page_size: 6,
            max_page_size: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();

        let limits = RecipeLimits::default();
        let pagination = PaginationConfig::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
                cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "your-secret-key-change-this".to_string()),
                expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
                bcrypt_cost: env::var("BCRYPT_COST")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(bcrypt::DEFAULT_COST),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| mysql_url_from_env()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            pagination: PaginationConfig {
                page_size: env::var("PAGE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(pagination.page_size),
                max_page_size: pagination.max_page_size,
            },
            recipes: RecipeLimits {
                max_amount: env::var("MAX_INGREDIENT_AMOUNT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(limits.max_amount),
                max_cooking_time: env::var("MAX_COOKING_TIME")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(limits.max_cooking_time),
                ..limits
            },
        })
    }

    /// Configuration for tests and tooling: defaults everywhere, explicit database URL.
    pub fn with_database_url(url: &str) -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_allowed_origin: None,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                expiration_hours: 1,
                bcrypt_cost: 4,
            },
            database: DatabaseConfig {
                url: url.to_string(),
                max_connections: 1,
            },
            pagination: PaginationConfig::default(),
            recipes: RecipeLimits::default(),
        }
    }
}

fn mysql_url_from_env() -> String {
    format!(
        "mysql://{}:{}@{}:{}/{}",
        env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string()),
        env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "password".to_string()),
        env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
        env::var("MYSQL_PORT").unwrap_or_else(|_| "3306".to_string()),
        env::var("MYSQL_DATABASE").unwrap_or_else(|_| "recipes_db".to_string()),
    )
}
