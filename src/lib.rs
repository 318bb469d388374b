//! # lib-http
//!
//! Reactive HTTP client core: declared endpoints are turned into requests,
//! passed through an ordered interceptor chain, executed by a pluggable
//! transport and decoded into typed results on a shared worker runtime.
//!
//! ## Overview
//!
//! - **Declarative endpoints**: method, path template, parameter bindings and
//!   payload types are registered once and validated when the client is built
//! - **Interceptors**: logging, header injection, retry, form body rewriting,
//!   payload encryption and response analysis compose without touching the core
//! - **Pluggable codecs**: one codec per logical type, JSON by default
//! - **Cancellable calls**: every call yields exactly one outcome, awaited,
//!   observed or waited on with a timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lib_http::{CallArgs, EndpointDefinition, HttpClient, LoggingInterceptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> lib_http::Result<()> {
//!     let client = HttpClient::builder()
//!         .base_url("https://api.example.com/v1/")
//!         .json::<User>()
//!         .interceptor(LoggingInterceptor::new())
//!         .endpoint(
//!             EndpointDefinition::get("user", "/users/{id}")
//!                 .returns::<User>()
//!                 .path_params_from_template(),
//!         )
//!         .build()?;
//!
//!     let user = client
//!         .execute::<User>("user", CallArgs::new().path("id", 42))
//!         .await?;
//!     println!("{:?}", user.value);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Builder, configuration, execution engine and call handles |
//! | [`request`] | Endpoint definitions, path templates and request building |
//! | [`codec`] | Codec trait, JSON/text codecs and the type-keyed registry |
//! | [`interceptors`] | Interceptor chain and the shipped interceptors |
//! | [`transport`] | Transport trait and the `reqwest` implementation |
//! | [`pipeline`] | Response classification and call lifecycle states |
//! | [`types`] | Headers, methods, media types and responses |
//! | [`error`] | Error taxonomy |

pub mod client;
pub mod codec;
pub mod interceptors;
pub mod pipeline;
pub mod request;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CallHandle, CancelHandle, ClientConfig, HttpClient, HttpClientBuilder};
pub use codec::{Codec, CodecError, CodecRegistry, FormBody, FormCodec, JsonCodec, TextCodec};
pub use interceptors::{
    BodyTransformer, CallContext, CallSummary, HeaderInjector, Interceptor, InterceptorChain,
    LoggingInterceptor, PayloadCipher, ResponseAnalyzer, RetryInterceptor,
};
pub use request::{CallArgs, EndpointDefinition, ParamBinding, ParamKind, RequestModel};
pub use transport::{HttpTransport, Transport};
pub use types::{HeaderList, HttpMethod, RawResponse, TypedResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for the library
pub mod error;
pub use error::{ClientError, ErrorBody, ErrorContext, ErrorKind, NetworkError, NetworkErrorKind};
