use crate::error::ProxyError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// `null` decodes to the zero value, like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_items_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().map(Option::unwrap_or_default).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Message {
    #[serde(deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
}

/// Chat request as sent by the caller and forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(deserialize_with = "null_items_as_default")]
    pub messages: Vec<Message>,
    #[serde(deserialize_with = "null_as_default")]
    pub stream: bool,
}

impl ChatRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        decode_first(body).map_err(|e| ProxyError::InvalidPayload(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.model.is_empty() || self.messages.is_empty() {
            return Err(ProxyError::MissingFields);
        }
        Ok(())
    }
}

/// Backend reply, relayed to the caller as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub done: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub message: Message,
}

impl ChatResponse {
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        decode_first(body).map_err(|e| ProxyError::ReadResponse(e.to_string()))
    }
}

/// Decodes the first JSON value in `body` and ignores whatever follows it.
/// A streamed (newline-delimited) backend body therefore yields its first chunk.
/// A bare `null` decodes to the zero value.
fn decode_first<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(body);
    Ok(Option::<T>::deserialize(&mut de)?.unwrap_or_default())
}
