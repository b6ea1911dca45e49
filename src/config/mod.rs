use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub booking: BookingConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Внешний API автобусов
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки экрана бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Куда отправлять пользователя без токена.
    pub login_path: String,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

// В production у переменной нет значения по умолчанию
fn var_required_in_production(name: &'static str, default: &str, production: bool) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if production => Err(ConfigError::Missing { name }),
        _ => Ok(default.to_string()),
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: &str, expected: &'static str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value,
    })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = var_or("ENVIRONMENT", "development");
        let production = environment == "production";

        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8080", "port number")?,
                environment,
                rust_log: var_or("RUST_LOG", "bus_booking=debug,tower_http=debug"),
            },
            api: ApiConfig {
                base_url: var_required_in_production("BUS_API_URL", "http://localhost:8000/api", production)?,
                timeout_seconds: parse_var("BUS_API_TIMEOUT_SECONDS", "10", "number of seconds")?,
            },
            booking: BookingConfig {
                login_path: var_or("LOGIN_PATH", "/login"),
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_var("CIRCUIT_BREAKER_FAILURE_THRESHOLD", "5", "number")?,
                timeout_seconds: parse_var("CIRCUIT_BREAKER_TIMEOUT_SECONDS", "60", "number of seconds")?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}
