use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::store::SupabaseConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite://prioritymatrix.db?mode=rwc";

#[derive(Clone, Debug)]
pub enum StoreConfig {
    Sqlite { database_url: String },
    Supabase(SupabaseConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let backend = env::var("TASK_STORE").unwrap_or_else(|_| "sqlite".to_string());
        let store = match backend.as_str() {
            "sqlite" => StoreConfig::Sqlite {
                database_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            },
            "supabase" => StoreConfig::Supabase(SupabaseConfig::new_from_env()?),
            other => {
                return Err(AppError::Config(format!(
                    "TASK_STORE must be 'sqlite' or 'supabase', got '{}'",
                    other
                )));
            }
        };

        Ok(Self { bind_addr, store })
    }
}
