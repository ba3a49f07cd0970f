use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Event bus error: {0}")]
    Bus(#[from] redis::RedisError),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Solana SDK error: {0}")]
    Solana(#[from] solana_sdk::pubkey::ParsePubkeyError),

    #[error("Trading error: {0}")]
    Trading(String),

    #[error("Initialization error: {0}")]
    Init(String),

    // --- Pipeline error kinds, spec.md §7 ---
    #[error("builder could not assemble a transaction: {0}")]
    BuildFailed(String),

    #[error("no route builder accepts this route hint: {0:?}")]
    RouteUnavailable(Option<String>),

    #[error("minimum-out floor would be breached: quoted {quoted}, floor {floor}")]
    SlippageFloorViolated { quoted: u64, floor: u64 },

    #[error("RPC refused the submitted transaction: {0}")]
    SubmitFailed(String),

    #[error("settlement poll deadline reached without a terminal status")]
    Expired,

    #[error("transaction landed on-chain with a failure status")]
    OnChainFailed,

    #[error("follower holds zero balance of the input mint: {0}")]
    BalanceMissing(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
