//! Client for the Veo video generation API.
//!
//! This crate provides the provider boundary used by the orchestrator:
//! - The [`VideoProvider`] trait (submit, poll, fetch asset)
//! - [`VeoClient`], the HTTP implementation against the Generative Language API
//! - Credential resolution and request validation
//! - Mapping of provider failures onto local error kinds

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod types;

pub use client::VeoClient;
pub use config::VeoClientConfig;
pub use credentials::CredentialSource;
pub use error::{ProviderError, ProviderResult};
pub use provider::{GenerationRequest, PollStatus, ProviderHandle, VideoProvider};
