//! Configuration types for background-upload
//!
//! [`Config`] tunes the crate itself. [`UploadOptions`] describes one upload
//! and is handed to the native provider unchanged.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Crate-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Prefix of the native event stream names (default: "RNFileUploader-")
    ///
    /// Stream names are `<prefix><kind>`, e.g. `RNFileUploader-progress`.
    #[serde(default = "default_event_prefix")]
    pub event_prefix: String,

    /// Buffer size of the raw event broadcast channel (default: 1000)
    ///
    /// Subscribers that fall further behind than this receive a lag gap.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Events held per task while a native start is in flight (default: 64)
    ///
    /// Events can race ahead of the id returned by `start_upload`. They are
    /// buffered and replayed once the id is known. This caps buffered
    /// progress events (terminal events are always kept); 0 disables
    /// buffering.
    #[serde(default = "default_early_event_capacity")]
    pub early_event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_prefix: default_event_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
            early_event_capacity: default_early_event_capacity(),
        }
    }
}

impl Config {
    /// Check the configuration for values the crate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.event_prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "event prefix must not be empty".into(),
                key: Some("event_prefix".into()),
            });
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::Config {
                message: "event channel capacity must be greater than 0".into(),
                key: Some("event_channel_capacity".into()),
            });
        }
        Ok(())
    }
}

fn default_event_prefix() -> String {
    "RNFileUploader-".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_early_event_capacity() -> usize {
    64
}

/// HTTP method used for the upload request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// PUT
    Put,
    /// POST
    #[default]
    Post,
}

/// How the file is placed in the request body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// File bytes are the whole body
    #[default]
    Raw,
    /// multipart/form-data; requires a field name
    Multipart,
}

/// Notification preferences for the native upload service
///
/// Every field is optional; the provider applies its own default for any
/// field left unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    /// File name shown in the notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Show notifications at all (ignored where the OS mandates one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Clear the notification on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_clear: Option<bool>,
    /// Notification channel (Android)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_channel: Option<String>,
    /// Play a sound on completion or error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ring_tone: Option<bool>,
    /// Title while uploading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_progress_title: Option<String>,
    /// Message while uploading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_progress_message: Option<String>,
    /// Title on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_complete_title: Option<String>,
    /// Message on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_complete_message: Option<String>,
    /// Title on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error_title: Option<String>,
    /// Message on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error_message: Option<String>,
    /// Title on cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_cancelled_title: Option<String>,
    /// Message on cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_cancelled_message: Option<String>,
}

/// Description of one upload
///
/// Serialized in camelCase, which is the shape native bridges expect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    /// Target URL
    pub url: String,
    /// Source file path or platform URI
    pub path: String,
    /// HTTP method (default: POST)
    #[serde(default)]
    pub method: HttpMethod,
    /// Body encoding (default: raw)
    #[serde(default, rename = "type")]
    pub upload_type: UploadType,
    /// Multipart field name for the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Caller-supplied id used to track the upload globally and avoid duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_upload_id: Option<String>,
    /// Extra form parameters (multipart)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, String>,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Notification preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOptions>,
    /// App group for share-extension file access (iOS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_group: Option<String>,
}

impl UploadOptions {
    /// Options for a raw POST of `path` to `url`
    pub fn new(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP method
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Send as multipart/form-data with the file under `field`
    pub fn multipart(mut self, field: impl Into<String>) -> Self {
        self.upload_type = UploadType::Multipart;
        self.field = Some(field.into());
        self
    }

    /// Set the custom upload id
    pub fn custom_upload_id(mut self, id: impl Into<String>) -> Self {
        self.custom_upload_id = Some(id.into());
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a form parameter
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Set notification preferences
    pub fn notification(mut self, notification: NotificationOptions) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Set the app group
    pub fn app_group(mut self, app_group: impl Into<String>) -> Self {
        self.app_group = Some(app_group.into());
        self
    }

    /// Reject options the native provider could not act on
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::invalid_parameter("path", "path must not be empty"));
        }

        // Scheme support is up to the native service
        url::Url::parse(&self.url)
            .map_err(|e| Error::invalid_parameter("url", format!("{}: {}", self.url, e)))?;

        if self.upload_type == UploadType::Multipart
            && self.field.as_deref().is_none_or(|f| f.trim().is_empty())
        {
            return Err(Error::invalid_parameter(
                "field",
                "multipart uploads require a field name",
            ));
        }

        if let Some(id) = &self.custom_upload_id
            && id.trim().is_empty()
        {
            return Err(Error::invalid_parameter(
                "custom_upload_id",
                "custom upload id must not be empty",
            ));
        }

        Ok(())
    }

    /// JSON payload in the shape native bridges expect
    pub fn to_native_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
