//! Core types for background-upload

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned to an upload by the native provider
///
/// When the caller supplies a custom upload id, providers use it verbatim as
/// the native id, which is what makes custom-id deduplication possible.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(pub String);

impl UploadId {
    /// Create a new UploadId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UploadId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UploadId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for UploadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for UploadId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for UploadId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-visible upload status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Created but not yet known to be running natively
    #[default]
    Pending,
    /// Transferring
    Running,
    /// Finished; the server responded
    Completed,
    /// Failed natively
    Error,
    /// Cancelled
    Cancelled,
}

impl UploadStatus {
    /// Whether no further transition can follow this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Completed | UploadStatus::Error | UploadStatus::Cancelled
        )
    }

    /// Map the state reported by a native listing to a client status
    pub fn from_native(state: NativeUploadState) -> Self {
        match state {
            NativeUploadState::Running => UploadStatus::Running,
            NativeUploadState::Pending => UploadStatus::Pending,
            NativeUploadState::Cancelled => UploadStatus::Cancelled,
            NativeUploadState::Completed => UploadStatus::Completed,
            NativeUploadState::Error => UploadStatus::Error,
            NativeUploadState::Unknown => UploadStatus::Pending,
        }
    }

    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Running => "running",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
            UploadStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload state as reported by the native provider's listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeUploadState {
    /// Transferring
    Running,
    /// Queued natively
    Pending,
    /// Cancelled
    Cancelled,
    /// Finished
    Completed,
    /// Failed
    Error,
    /// Any state string this crate does not recognise
    #[serde(other)]
    Unknown,
}

/// One entry of the native provider's upload listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeUploadInfo {
    /// Native upload id
    pub id: UploadId,
    /// Native state
    pub state: NativeUploadState,
}

impl NativeUploadInfo {
    /// Create a listing entry
    pub fn new(id: impl Into<UploadId>, state: NativeUploadState) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

/// The four native event kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Bytes transferred
    Progress,
    /// Upload finished with a server response
    Completed,
    /// Upload failed
    Error,
    /// Upload cancelled
    Cancelled,
}

impl EventKind {
    /// Every kind, in subscription order
    pub const ALL: [EventKind; 4] = [
        EventKind::Progress,
        EventKind::Completed,
        EventKind::Error,
        EventKind::Cancelled,
    ];

    /// Lowercase kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Progress => "progress",
            EventKind::Completed => "completed",
            EventKind::Error => "error",
            EventKind::Cancelled => "cancelled",
        }
    }

    /// Parse a lowercase kind name
    pub fn from_name(name: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Full native stream name for this kind under `prefix`
    pub fn stream_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.as_str())
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted by the native provider
///
/// Payload fields are camelCase on the wire; the variant is selected by the
/// stream the event arrived on (see [`EventEmitter::emit_raw`](crate::events::EventEmitter::emit_raw)).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum UploadEvent {
    /// Progress update
    Progress {
        /// Upload id
        id: UploadId,
        /// Progress, 0 to 100
        progress: f64,
        /// Bytes sent so far
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uploaded_bytes: Option<u64>,
        /// Total bytes to send
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
    },

    /// Upload finished
    Completed {
        /// Upload id
        id: UploadId,
        /// HTTP response status
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_code: Option<u16>,
        /// HTTP response body
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_body: Option<String>,
    },

    /// Upload failed
    Error {
        /// Upload id
        id: UploadId,
        /// Error message
        #[serde(default)]
        error: String,
    },

    /// Upload cancelled
    Cancelled {
        /// Upload id
        id: UploadId,
        /// Reason reported by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl UploadEvent {
    /// Id of the upload this event belongs to
    pub fn id(&self) -> &UploadId {
        match self {
            UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Error { id, .. }
            | UploadEvent::Cancelled { id, .. } => id,
        }
    }

    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            UploadEvent::Progress { .. } => EventKind::Progress,
            UploadEvent::Completed { .. } => EventKind::Completed,
            UploadEvent::Error { .. } => EventKind::Error,
            UploadEvent::Cancelled { .. } => EventKind::Cancelled,
        }
    }

    /// Status a task moves to when it receives this event
    pub fn status(&self) -> UploadStatus {
        match self {
            UploadEvent::Progress { .. } => UploadStatus::Running,
            UploadEvent::Completed { .. } => UploadStatus::Completed,
            UploadEvent::Error { .. } => UploadStatus::Error,
            UploadEvent::Cancelled { .. } => UploadStatus::Cancelled,
        }
    }

    /// Whether this event ends the upload
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Change notification delivered to `on_change` observers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadChangeEvent {
    /// Status after the change
    pub status: UploadStatus,
    /// Progress, 0 to 100 (progress updates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Bytes sent so far (progress updates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_bytes: Option<u64>,
    /// Total bytes (progress updates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Error or cancellation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP response status (completion only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    /// HTTP response body (completion only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl UploadChangeEvent {
    /// A bare status change with no payload
    pub fn status(status: UploadStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

impl From<&UploadEvent> for UploadChangeEvent {
    fn from(event: &UploadEvent) -> Self {
        match event {
            UploadEvent::Progress {
                progress,
                uploaded_bytes,
                total_bytes,
                ..
            } => Self {
                status: UploadStatus::Running,
                progress: Some(*progress),
                uploaded_bytes: *uploaded_bytes,
                total_bytes: *total_bytes,
                ..Default::default()
            },
            UploadEvent::Completed {
                response_code,
                response_body,
                ..
            } => Self {
                status: UploadStatus::Completed,
                response_code: *response_code,
                response_body: response_body.clone(),
                ..Default::default()
            },
            UploadEvent::Error { error, .. } => Self {
                status: UploadStatus::Error,
                error: Some(error.clone()),
                ..Default::default()
            },
            UploadEvent::Cancelled { error, .. } => Self {
                status: UploadStatus::Cancelled,
                error: error.clone(),
                ..Default::default()
            },
        }
    }
}

/// Terminal outcome of an upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Terminal status
    pub status: UploadStatus,
    /// Error or cancellation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP response status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    /// HTTP response body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl UploadResult {
    /// Outcome for a status with no payload
    pub fn bare(status: UploadStatus) -> Self {
        Self {
            status,
            error: None,
            response_code: None,
            response_body: None,
        }
    }

    /// Outcome carried by a terminal event, `None` for progress
    pub fn from_event(event: &UploadEvent) -> Option<Self> {
        match event {
            UploadEvent::Progress { .. } => None,
            UploadEvent::Completed {
                response_code,
                response_body,
                ..
            } => Some(Self {
                status: UploadStatus::Completed,
                error: None,
                response_code: *response_code,
                response_body: response_body.clone(),
            }),
            UploadEvent::Error { error, .. } => Some(Self {
                status: UploadStatus::Error,
                error: Some(error.clone()),
                response_code: None,
                response_body: None,
            }),
            UploadEvent::Cancelled { error, .. } => Some(Self {
                status: UploadStatus::Cancelled,
                error: error.clone(),
                response_code: None,
                response_body: None,
            }),
        }
    }

    /// Whether the upload completed
    pub fn is_success(&self) -> bool {
        self.status == UploadStatus::Completed
    }
}

/// File metadata reported by the native provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Whether the file exists
    pub exists: bool,
    /// File extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Size in bytes; providers may report it as a number or a numeric string
    #[serde(
        default,
        deserialize_with = "deserialize_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// File name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid file size: {}", n))),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| *f >= 0.0)
                        .map(|f| f as u64)
                })
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid file size: {:?}", s)))
        }
        Some(other) => Err(D::Error::custom(format!(
            "invalid file size type: {}",
            other
        ))),
    }
}

/// Platform family the native provider runs on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS: event streams need explicit activation, suspend hints apply
    Ios,
    /// Android
    Android,
    /// Anything else (tests, desktop shims)
    #[default]
    Other,
}

impl Platform {
    /// Whether each event stream must be activated before first use
    pub fn requires_event_activation(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}
