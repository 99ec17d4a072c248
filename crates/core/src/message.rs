//! Message and attachment wire types for the webhook API.

use bytes::Bytes;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a remote message container (a snowflake).
///
/// The remote API emits ids as decimal strings while the persisted index
/// stores them as plain integers, so deserialization accepts both forms.
/// Serialization always produces an integer.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse from a decimal string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| crate::Error::InvalidContainerId(format!("{s:?}: {e}")))
    }
}

impl From<u64> for ContainerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for ContainerId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ContainerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct ContainerIdVisitor;

impl Visitor<'_> for ContainerIdVisitor {
    type Value = ContainerId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ContainerId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(ContainerId)
            .map_err(|_| E::custom(format!("negative container id: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<u64>()
            .map(ContainerId)
            .map_err(|e| E::custom(format!("invalid container id {v:?}: {e}")))
    }
}

impl<'de> Deserialize<'de> for ContainerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ContainerIdVisitor)
    }
}

/// An attachment on a remote message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment id.
    pub id: ContainerId,
    /// Filename as stored remotely.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Download URL for the attachment content.
    pub url: String,
}

/// A remote message container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: ContainerId,
    /// Text content (used as a human-visible label, never parsed back).
    #[serde(default)]
    pub content: String,
    /// Attachments carried by the message.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Declared attachment inside an outgoing payload.
///
/// Sending an empty `attachments` list on an edit removes every attachment
/// the message previously carried.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartialAttachment {
    /// Filename for the declared attachment.
    pub filename: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Outgoing message payload (the `payload_json` body).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Text content. `Some("")` clears existing content on edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Declared attachments. `Some(vec![])` clears existing attachments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<PartialAttachment>>,
}

impl MessagePayload {
    /// Payload carrying only text content.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            attachments: None,
        }
    }

    /// Payload that clears prior content and attachments on edit.
    pub fn clear() -> Self {
        Self {
            content: Some(String::new()),
            attachments: Some(Vec::new()),
        }
    }
}

/// A raw file part for a multipart upload.
#[derive(Clone)]
pub struct FilePart {
    /// Filename sent with the part.
    pub filename: String,
    /// Raw content bytes.
    pub bytes: Bytes,
}

impl FilePart {
    /// Create a new file part.
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Get the part size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .finish()
    }
}
