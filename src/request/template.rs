//! Path templates such as `/users/{id}/posts`.

use std::collections::HashMap;
use url::Url;

use crate::{ClientError, ErrorContext, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Param(String),
}

/// One `/`-separated segment, made of literal text and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    pieces: Vec<Piece>,
}

/// A parsed endpoint path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        let err = |msg: String| {
            ClientError::configuration_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path("endpoint.path")
                    .with_details(raw.to_string())
                    .with_source("path_template"),
            )
        };

        if raw.contains('?') || raw.contains('#') {
            return Err(err("path template must not carry a query or fragment".into()));
        }

        let trimmed = raw.trim_start_matches('/');
        let trailing_slash = trimmed.ends_with('/') && !trimmed.is_empty();
        let body = trimmed.trim_end_matches('/');

        let mut segments = Vec::new();
        let mut seen = Vec::<String>::new();
        if !body.is_empty() {
            for part in body.split('/') {
                if part.is_empty() {
                    return Err(err("path template contains an empty segment".into()));
                }
                let mut pieces = Vec::new();
                let mut rest = part;
                while !rest.is_empty() {
                    match rest.find(['{', '}']) {
                        None => {
                            pieces.push(Piece::Literal(rest.to_string()));
                            rest = "";
                        }
                        Some(i) if rest.as_bytes()[i] == b'}' => {
                            return Err(err("unmatched '}' in path template".into()));
                        }
                        Some(i) => {
                            if i > 0 {
                                pieces.push(Piece::Literal(rest[..i].to_string()));
                            }
                            let after = &rest[i + 1..];
                            let close = after
                                .find('}')
                                .ok_or_else(|| err("unclosed '{' in path template".into()))?;
                            let name = &after[..close];
                            if name.is_empty()
                                || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                            {
                                return Err(err(format!("invalid placeholder name '{}'", name)));
                            }
                            if seen.iter().any(|s| s == name) {
                                return Err(err(format!("placeholder '{}' appears twice", name)));
                            }
                            seen.push(name.to_string());
                            pieces.push(Piece::Param(name.to_string()));
                            rest = &after[close + 1..];
                        }
                    }
                }
                segments.push(Segment { pieces });
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            trailing_slash,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flat_map(|s| {
            s.pieces.iter().filter_map(|p| match p {
                Piece::Param(name) => Some(name.as_str()),
                Piece::Literal(_) => None,
            })
        })
    }

    /// Normalized shape used to detect conflicting endpoints.
    ///
    /// Placeholders compare positionally, so `/users/{id}` and `/users/{name}`
    /// share a signature.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            for piece in &segment.pieces {
                match piece {
                    Piece::Literal(text) => out.push_str(text),
                    Piece::Param(_) => out.push_str("{}"),
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// Append the rendered path to `base`. Every value must be present.
    ///
    /// Each rendered segment is percent-encoded by `url`, so a `/` inside a value
    /// cannot introduce a new segment. A placeholder segment that renders to
    /// `""`, `"."` or `".."` is rejected, since it would not address a segment.
    pub fn render_onto(&self, base: &Url, values: &HashMap<String, String>) -> Result<Url> {
        let mut url = base.clone();
        let mut rendered = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let mut text = String::new();
            let mut first_param = None;
            for piece in &segment.pieces {
                match piece {
                    Piece::Literal(lit) => text.push_str(lit),
                    Piece::Param(name) => {
                        let value = values.get(name).ok_or_else(|| {
                            ClientError::configuration_with_context(
                                format!("path parameter '{}' is not bound", name),
                                ErrorContext::new()
                                    .with_field_path(format!("args.path.{}", name))
                                    .with_source("path_template"),
                            )
                        })?;
                        text.push_str(value);
                        first_param.get_or_insert(name);
                    }
                }
            }
            if let Some(name) = first_param {
                if matches!(text.as_str(), "" | "." | "..") {
                    return Err(ClientError::configuration_with_context(
                        format!("path parameter '{}' renders the segment '{}'", name, text),
                        ErrorContext::new()
                            .with_field_path(format!("args.path.{}", name))
                            .with_details(self.raw.clone())
                            .with_source("path_template"),
                    ));
                }
            }
            rendered.push(text);
        }

        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::configuration_with_context(
                    "base URL cannot carry a path",
                    ErrorContext::new()
                        .with_field_path("config.base_url")
                        .with_details(base.to_string()),
                )
            })?;
            path.pop_if_empty();
            path.extend(rendered.iter().map(String::as_str));
            if self.trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }
}
