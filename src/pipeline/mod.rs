//! Response pipeline: turns a raw response into a typed result or a classified
//! [`ClientError`](crate::ClientError).
//!
//! ## Classification
//!
//! ```text
//! RawResponse ──► 2xx ──────────► success codec ──► TypedResult<T>
//!      │                               └─ parse failure ──► Decode{status, field, excerpt}
//!      └──────► other status ──► empty body ──► Http{status, empty body}
//!                                └─ error codec ──► Http{status, decoded body}
//!                                       └─ parse failure ──► Decode{status, field, excerpt}
//! ```
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`state`] | Call lifecycle states and the validating tracker |

mod decode;
pub mod state;


pub use decode::{excerpt, EXCERPT_LIMIT};
pub use state::{CallState, StateTracker};

pub(crate) use decode::{decode_response, AnyValue};
