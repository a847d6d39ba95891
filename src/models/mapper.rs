//! Serde-backed node mapper

use crate::error::{Error, Result};
use crate::pagination::ModelMapper;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Maps a node by deserializing it into `T`
pub struct JsonModel<T>(PhantomData<fn() -> T>);

impl<T> JsonModel<T> {
    /// Create a mapper
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonModel<{}>", type_name::<T>())
    }
}

impl<T: DeserializeOwned> ModelMapper<T> for JsonModel<T> {
    fn map(&self, node: &Value) -> Result<T> {
        T::deserialize(node).map_err(|e| {
            let name = type_name::<T>().rsplit("::").next().unwrap_or("model");
            Error::protocol(format!("cannot map {name}: {e}"))
        })
    }
}

/// Ids arrive as strings on some endpoints and as numbers on others
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Unsigned(n) => n.to_string(),
        Id::Signed(n) => n.to_string(),
    })
}
