//! Core types, traits, configuration and errors for sockenv.
//!
//! - [`types`] — wire [`Payload`](types::Payload), [`Verbosity`](types::Verbosity),
//!   space descriptions
//! - [`traits`] — [`EnvDescription`](traits::EnvDescription) and
//!   [`ActionSink`](traits::ActionSink) seams
//! - [`config`] — TOML-loadable [`ClientConfig`](config::ClientConfig)
//! - [`error`] — error taxonomy shared by every sockenv crate

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use crate::{
        config::{ClientConfig, Framing, HistoryConfig},
        error::{BufferError, ClientError, ConfigError, EncodingError},
        traits::{ActionSink, EnvDescription},
        types::{Payload, SpaceSpec, StaticDescription, ValueType, Verbosity},
    };
}
