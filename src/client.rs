//! Client facade: builder, immutable configuration and call execution.
//!
//! Implementation details are split into submodules under `src/client/`.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`builder`] | [`HttpClientBuilder`] and eager validation |
//! | [`config`] | [`ClientConfig`] and defaults |
//! | [`core`] | [`HttpClient`] and endpoint lookup |
//! | [`handle`] | [`CallHandle`] and [`CancelHandle`] |

pub mod builder;
pub mod config;
pub mod core;
mod execution;
pub mod handle;

pub use builder::HttpClientBuilder;
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use self::core::HttpClient;
pub use handle::{CallHandle, CancelHandle};
