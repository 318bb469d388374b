//! Media types commonly used in request and response bodies.

pub const APPLICATION_ATOM_XML: &str = "application/atom+xml";
pub const APPLICATION_BASE64: &str = "application/base64";
pub const APPLICATION_JAVASCRIPT: &str = "application/javascript";
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const APPLICATION_FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_XML: &str = "application/xml";
pub const MULTIPART_ALTERNATIVE: &str = "multipart/alternative";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const MULTIPART_MIXED: &str = "multipart/mixed";
pub const TEXT_CSS: &str = "text/css";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Header name used for body media types.
pub const CONTENT_TYPE: &str = "Content-Type";
