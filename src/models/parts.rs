//! Header and query templates
//!
//! User-suppliable values injected into every request of a client

use serde::{Deserialize, Serialize};

/// Part of the HTTP header sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPart {
    pub key: String,
    /// `None`: the value is mandatory at instantiation
    pub default: Option<String>,
}

/// Part of the query string sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPart {
    pub key: String,
    /// `None`: the value is mandatory at instantiation
    pub default: Option<String>,
}

/// Common view over header and query templates
pub trait FieldTemplate {
    fn key(&self) -> &str;
    fn default_value(&self) -> Option<&str>;

    fn is_required(&self) -> bool {
        self.default_value().is_none()
    }
}

macro_rules! field_part {
    ($part:ident) => {
        impl $part {
            pub fn required(key: impl Into<String>) -> Self {
                Self { key: key.into(), default: None }
            }

            pub fn with_default(key: impl Into<String>, default: impl Into<String>) -> Self {
                Self { key: key.into(), default: Some(default.into()) }
            }
        }

        impl FieldTemplate for $part {
            fn key(&self) -> &str {
                &self.key
            }

            fn default_value(&self) -> Option<&str> {
                self.default.as_deref()
            }
        }

        impl From<KeyOrDefault> for $part {
            fn from(value: KeyOrDefault) -> Self {
                match value {
                    KeyOrDefault::Key(key) => Self::required(key),
                    KeyOrDefault::WithDefault(key, default) => Self::with_default(key, default),
                }
            }
        }
    };
}

/// Either a bare key or a key with its default value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOrDefault {
    Key(String),
    WithDefault(String, String),
}

impl From<&str> for KeyOrDefault {
    fn from(key: &str) -> Self {
        KeyOrDefault::Key(key.to_string())
    }
}

impl From<String> for KeyOrDefault {
    fn from(key: String) -> Self {
        KeyOrDefault::Key(key)
    }
}

impl From<(&str, &str)> for KeyOrDefault {
    fn from((key, default): (&str, &str)) -> Self {
        KeyOrDefault::WithDefault(key.to_string(), default.to_string())
    }
}

field_part!(HeaderPart);
field_part!(QueryPart);

/// Header templates from keys and `(key, default)` pairs
///
/// ```
/// use api_requests::models::{header, KeyOrDefault};
///
/// let parts = header([KeyOrDefault::from("Api-Key"), ("Key-1", "default-value").into()]);
/// assert!(parts[0].default.is_none());
/// assert_eq!(parts[1].default.as_deref(), Some("default-value"));
/// ```
pub fn header<I, K>(keys: I) -> Vec<HeaderPart>
where
    I: IntoIterator<Item = K>,
    K: Into<KeyOrDefault>,
{
    keys.into_iter().map(|k| HeaderPart::from(k.into())).collect()
}

/// Query templates from keys and `(key, default)` pairs
pub fn query<I, K>(keys: I) -> Vec<QueryPart>
where
    I: IntoIterator<Item = K>,
    K: Into<KeyOrDefault>,
{
    keys.into_iter().map(|k| QueryPart::from(k.into())).collect()
}
