//! Instance assembly
//!
//! Materializes a descriptor's header/query templates into the values an
//! instance sends with every request.

use crate::config::ClientConfig;
use crate::models::request::upsert;
use crate::models::{ClientDescriptor, FieldTemplate, Pairs, SUFFIX_FIELD};
use crate::utils::error::{helpers::missing_field, ApiResult};
use std::collections::HashMap;
use tracing::warn;

/// Instantiation arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitArgs {
    /// Base address of the API
    pub url: String,
    /// Overrides the configured suffix
    pub suffix: Option<String>,
    /// Header/query values by key
    pub values: HashMap<String, String>,
}

impl InitArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Split a flat key/value map into base URL, suffix and template values.
    ///
    /// The base URL is read from the configured `rename_base_field`.
    pub fn from_values(config: &ClientConfig, mut values: HashMap<String, String>) -> ApiResult<Self> {
        let url = values
            .remove(&config.rename_base_field)
            .ok_or_else(|| missing_field(config.rename_base_field.as_str()))?;
        let suffix = values.remove(SUFFIX_FIELD);
        Ok(Self { url, suffix, values })
    }
}

/// Resolve templates against supplied values.
///
/// A supplied value wins over a default; a template without default must be
/// supplied. Of several templates with one key, the last declared applies.
pub fn resolve_parts<T: FieldTemplate>(parts: &[T], values: &HashMap<String, String>) -> ApiResult<Pairs> {
    let mut effective: Vec<&T> = Vec::with_capacity(parts.len());
    for part in parts {
        match effective.iter_mut().find(|p| p.key() == part.key()) {
            Some(slot) => *slot = part,
            None => effective.push(part),
        }
    }

    let mut resolved = Pairs::with_capacity(effective.len());
    for part in effective {
        let value = match values.get(part.key()) {
            Some(value) => value.as_str(),
            None => part.default_value().ok_or_else(|| missing_field(part.key()))?,
        };
        upsert(&mut resolved, part.key(), value);
    }
    Ok(resolved)
}

/// Resolved header and query values of one instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    pub headers: Pairs,
    pub query: Pairs,
}

/// Resolve all templates of a descriptor
pub fn assemble(descriptor: &ClientDescriptor, values: &HashMap<String, String>) -> ApiResult<ResolvedFields> {
    let headers = resolve_parts(descriptor.headers(), values)?;
    let query = resolve_parts(descriptor.queries(), values)?;

    for key in values.keys() {
        let known = descriptor.headers().iter().any(|p| &p.key == key)
            || descriptor.queries().iter().any(|p| &p.key == key);
        if !known {
            warn!("Ignoring value for undeclared field '{}' of '{}'", key, descriptor.name());
        }
    }

    Ok(ResolvedFields { headers, query })
}

/// Join URL segments with single slashes, skipping empty ones.
///
/// Slashes are only collapsed where two segments meet, so a trailing slash
/// on the last segment is kept.
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        if segment.trim_matches('/').is_empty() {
            continue;
        }
        url.truncate(url.trim_end_matches('/').len());
        url.push('/');
        url.push_str(segment.trim_start_matches('/'));
    }
    url
}
