pub mod admission;
pub mod analytics;
pub mod bus;
pub mod cache;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod http;
pub mod ingress;
pub mod ledger;
pub mod notify;
pub mod processor;
pub mod routes;
pub mod settlement;
pub mod shaper;
pub mod store;
pub mod utils;
