//! Device metadata: what the service knows about one registration id, and
//! partial updates to it.

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Tags, alias and mobile number bound to a registration id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfoResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

impl DeviceInfoResult {
    pub fn has_alias(&self) -> bool {
        self.alias.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn has_mobile(&self) -> bool {
        self.mobile.as_deref().is_some_and(|m| !m.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A partial update. Fields left as `None` are not sent and stay unchanged
/// on the service; `Some("")` clears an alias or mobile number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

impl DeviceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags.into_iter().map(Into::into);
        match &mut self.tags {
            Some(TagUpdate::Change { add, .. }) => add.extend(tags),
            _ => {
                self.tags = Some(TagUpdate::Change {
                    add: tags.collect(),
                    remove: Vec::new(),
                })
            }
        }
        self
    }

    pub fn remove_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags.into_iter().map(Into::into);
        match &mut self.tags {
            Some(TagUpdate::Change { remove, .. }) => remove.extend(tags),
            _ => {
                self.tags = Some(TagUpdate::Change {
                    add: Vec::new(),
                    remove: tags.collect(),
                })
            }
        }
        self
    }

    pub fn clear_tags(mut self) -> Self {
        self.tags = Some(TagUpdate::Clear);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }
}

/// Tag changes: remove every tag (`""` on the wire) or add/remove some.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagUpdate {
    Clear,
    Change { add: Vec<String>, remove: Vec<String> },
}

impl Serialize for TagUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TagUpdate::Clear => serializer.serialize_str(""),
            TagUpdate::Change { add, remove } => {
                let len = usize::from(!add.is_empty()) + usize::from(!remove.is_empty());
                let mut state = serializer.serialize_struct("TagUpdate", len)?;
                if add.is_empty() {
                    state.skip_field("add")?;
                } else {
                    state.serialize_field("add", add)?;
                }
                if remove.is_empty() {
                    state.skip_field("remove")?;
                } else {
                    state.serialize_field("remove", remove)?;
                }
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TagUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Clear(String),
            Change {
                #[serde(default)]
                add: Vec<String>,
                #[serde(default)]
                remove: Vec<String>,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Clear(s) if s.is_empty() => Ok(TagUpdate::Clear),
            Repr::Clear(s) => Err(D::Error::custom(format!(
                "tags must be \"\" or an add/remove object, got \"{s}\""
            ))),
            Repr::Change { add, remove } => Ok(TagUpdate::Change { add, remove }),
        }
    }
}
