//! Operation descriptions
//!
//! One `ApiMethodProperties` per remote operation of a client

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// HTTP verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Options,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Head => "HEAD",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status codes accepted as success when none are given
pub const DEFAULT_OK_CODE: u16 = 200;

/// Properties of one described remote operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMethodProperties {
    pub http_verb: HttpVerb,
    /// Remote operation identifier, appended to the base URL
    pub api_method: String,
    pub ok_codes: BTreeSet<u16>,
    /// `None`: anything outside `ok_codes` is an error
    pub error_codes: Option<BTreeSet<u16>>,
    pub pagination: bool,
    /// Free-form operation metadata, readable by handlers and paginators
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

macro_rules! verb_constructor {
    ($($name:ident => $verb:ident),* $(,)?) => {
        $(
            #[doc = concat!("`", stringify!($verb), "` operation with default properties")]
            pub fn $name(api_method: impl Into<String>) -> Self {
                Self::new(HttpVerb::$verb, api_method)
            }
        )*
    };
}

impl ApiMethodProperties {
    pub fn new(http_verb: HttpVerb, api_method: impl Into<String>) -> Self {
        Self {
            http_verb,
            api_method: api_method.into(),
            ok_codes: BTreeSet::from([DEFAULT_OK_CODE]),
            error_codes: None,
            pagination: false,
            extra: serde_json::Map::new(),
        }
    }

    verb_constructor! {
        get => Get,
        options => Options,
        head => Head,
        post => Post,
        put => Put,
        patch => Patch,
        delete => Delete,
    }

    pub fn ok_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.ok_codes = codes.into_iter().collect();
        self
    }

    pub fn error_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.error_codes = Some(codes.into_iter().collect());
        self
    }

    pub fn paginated(mut self) -> Self {
        self.pagination = true;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_ok(&self, status: u16) -> bool {
        self.ok_codes.contains(&status)
    }

    /// Whether `status` is one of the declared error codes.
    ///
    /// Always true when no error codes are declared.
    pub fn is_expected_error(&self, status: u16) -> bool {
        match &self.error_codes {
            Some(codes) => codes.contains(&status),
            None => !self.is_ok(status),
        }
    }

    /// Codes present in both `ok_codes` and `error_codes`
    pub fn overlapping_codes(&self) -> Vec<u16> {
        match &self.error_codes {
            Some(errors) => self.ok_codes.intersection(errors).copied().collect(),
            None => Vec::new(),
        }
    }
}
