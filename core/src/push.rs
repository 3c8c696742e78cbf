//! Push payload and push result types.
//!
//! These mirror the push service's v3 JSON schema. Optional blocks are
//! omitted from the wire when unset so the service applies its defaults.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::RateLimit;
use crate::response::ErrorDetail;

/// A complete push request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub platform: Platform,
    pub audience: Audience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<PushOptions>,
}

impl PushPayload {
    pub fn new(platform: Platform, audience: Audience) -> Self {
        Self {
            platform,
            audience,
            notification: None,
            message: None,
            options: None,
        }
    }

    /// Broadcast a plain alert to every device on every platform.
    pub fn broadcast_alert(alert: impl Into<String>) -> Self {
        Self::new(Platform::All, Audience::All).with_notification(Notification::alert(alert))
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_options(mut self, options: PushOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Android,
    Ios,
    Winphone,
}

/// Target platforms: `"all"` or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    All,
    Only(Vec<DevicePlatform>),
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Platform::All => serializer.serialize_str("all"),
            Platform::Only(platforms) => platforms.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            List(Vec<DevicePlatform>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(word) if word == "all" => Ok(Platform::All),
            Repr::Keyword(word) => Err(de::Error::custom(format!(
                "expected \"all\" or a platform list, got \"{word}\""
            ))),
            Repr::List(platforms) => Ok(Platform::Only(platforms)),
        }
    }
}

/// Which devices receive the push: `"all"` or a set of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    Targets(AudienceTargets),
}

impl Audience {
    pub fn registration_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Targets(AudienceTargets {
            registration_id: ids.into_iter().map(Into::into).collect(),
            ..AudienceTargets::default()
        })
    }

    pub fn aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Targets(AudienceTargets {
            alias: aliases.into_iter().map(Into::into).collect(),
            ..AudienceTargets::default()
        })
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Targets(AudienceTargets {
            tag: tags.into_iter().map(Into::into).collect(),
            ..AudienceTargets::default()
        })
    }
}

/// Audience selectors. Selectors are ANDed by the service; values within a
/// selector are ORed, except `tag_and`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceTargets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_and: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registration_id: Vec<String>,
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Audience::All => serializer.serialize_str("all"),
            Audience::Targets(targets) => targets.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            Targets(AudienceTargets),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(word) if word == "all" => Ok(Audience::All),
            Repr::Keyword(word) => Err(de::Error::custom(format!(
                "expected \"all\" or an audience object, got \"{word}\""
            ))),
            Repr::Targets(targets) => Ok(Audience::Targets(targets)),
        }
    }
}

/// Notification shown by the device's system tray.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosNotification>,
}

impl Notification {
    pub fn alert(alert: impl Into<String>) -> Self {
        Self {
            alert: Some(alert.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidNotification {
    pub alert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IosNotification {
    pub alert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

/// In-app message delivered to the application, not the system tray.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub msg_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sendno: Option<u32>,
    /// Seconds an offline message is kept. `0` means online devices only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_msg_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns_production: Option<bool>,
}

/// Outcome of an accepted push or push validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushResult {
    #[serde(default, deserialize_with = "string_or_number_opt")]
    pub sendno: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub msg_id: String,
    /// Per-audience failures reported alongside an accepted push.
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(skip)]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn string_or_number_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}
