use reqwest::StatusCode;
use thiserror::Error;

/// Fetch failures that abort an endpoint group. Rate limits and network
/// errors are retried inside the fetch loop and only surface here once
/// retries are exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Fatal { url: String, status: StatusCode },

    #[error("failed to decode response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("retries exhausted after {attempts} attempts for {url}")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Storage failures. An upsert error means the whole batch was rolled
/// back; callers log it and move on to the next table or group.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upsert into {table} failed; batch rolled back")]
    Upsert {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Startup configuration problems. These are fatal before any network or
/// storage activity happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SPORTRADAR_API_KEY is missing or still set to a placeholder")]
    ApiKeyPlaceholder,

    #[error("database path is missing or still set to a placeholder")]
    DatabasePlaceholder,
}
