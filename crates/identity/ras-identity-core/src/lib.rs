//! Core identity traits and types shared by the authentication drivers.
//!
//! Drivers verify a provider-specific payload into a [`VerifiedIdentity`] and
//! are made available to the host through an explicit [`DriverRegistry`]
//! instead of process-wide state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod registry;

pub use registry::{DriverFactory, DriverRegistry};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid authentication payload")]
    InvalidPayload,

    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// An identity confirmed by an external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity>;
}
