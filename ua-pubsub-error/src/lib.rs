//! Error types for the subscription engine.
//!
//! Client-facing validation failures are OPC UA status codes returned in
//! operation results, never `UaError`. This enum is reserved for caller
//! contract bugs and infrastructure faults, so the core stays free of
//! exception-driven control flow.

use std::{error::Error as StdError, io::Error as IoError};
use thiserror::Error;
use tokio::task::JoinError;

pub type UaResult<T, E = UaError> = anyhow::Result<T, E>;

#[derive(Error, Debug, Default)]
pub enum UaError {
    #[error("service unavailable")]
    #[default]
    ServiceUnavailable,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("subscription error: {0}")]
    SubscriptionError(String),
    #[error("condition error: {0}")]
    ConditionError(String),
    #[error("channel closed: {0}")]
    ChannelClosed(String),
    #[error("{0}")]
    JoinError(#[from] JoinError),
    #[error("{0}")]
    IoError(#[from] IoError),
    #[error("{0}")]
    StdError(#[from] Box<dyn StdError + Send + Sync>),
    #[error("{0}")]
    Msg(String),
}

impl From<String> for UaError {
    #[inline]
    fn from(e: String) -> Self {
        UaError::Msg(e)
    }
}

impl From<&str> for UaError {
    #[inline]
    fn from(e: &str) -> Self {
        UaError::Msg(e.to_string())
    }
}
