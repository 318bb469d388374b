//! Core value types shared by every layer of the client.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpMethod`] | Request verb, including the WebDAV extensions |
//! | [`HeaderList`] | Ordered, case-insensitive header list |
//! | [`RawResponse`] | Undecoded transport response |
//! | [`TypedResult`] | Decoded payload plus response metadata |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`headers`] | Header list and redaction |
//! | [`method`] | HTTP methods |
//! | [`mime`] | Common media types |
//! | [`response`] | Raw and typed responses |

pub mod headers;
pub mod method;
pub mod mime;
pub mod response;

pub use headers::{HeaderList, SensitiveHeaders, REDACTED};
pub use method::HttpMethod;
pub use response::{RawResponse, TypedResult};
