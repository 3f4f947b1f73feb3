pub mod config;
pub mod control;
pub mod logging;

pub mod error;
pub mod fetch_head;
pub mod http;
pub mod intake;
pub mod job_store;
pub mod manage;
pub mod notify;
pub mod provider;
pub mod rate_limit;
pub mod transfer;
pub mod transfer_gate;
pub mod url_model;
pub mod worker;
