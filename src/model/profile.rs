use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::layout_engine::LayoutKind;
use crate::sys::window_server::WindowServerId;

pub const NEW_PROFILE_NAME: &str = "New profile";
pub const UNTITLED_PROFILE_NAME: &str = "Untitled profile";
pub const NEW_GROUP_NAME: &str = "New group";
pub const UNTITLED_GROUP_NAME: &str = "Untitled";

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a fresh identifier from the current time and random bits.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::now_v7()))
            }

            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self { Self(s.to_string()) }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self { Self(s) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }
    };
}

entity_id!(
    /// Identifies a profile. Assigned once at creation, never reused.
    ProfileId,
    "profile"
);
entity_id!(
    /// Identifies a group across all profiles.
    GroupId,
    "group"
);

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "ProfileId::generate")]
    pub id: ProfileId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Group>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::generate(),
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups(name: impl Into<String>, groups: Vec<Group>) -> Self {
        Self { groups, ..Self::new(name) }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { UNTITLED_PROFILE_NAME } else { &self.name }
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> { self.groups.iter().find(|g| &g.id == id) }

    pub fn group_mut(&mut self, id: &GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| &g.id == id)
    }

    pub fn first_group_id(&self) -> Option<GroupId> { self.groups.first().map(|g| g.id.clone()) }
}

/// A named list of URLs opened together, plus the windows currently showing them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default = "GroupId::generate")]
    pub id: GroupId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: Vec<String>,
    /// Host windows opened for this group that have not been closed through it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub window_ids: Vec<WindowServerId>,
}

impl Group {
    pub fn new(name: impl Into<String>, layout: LayoutKind, urls: Vec<String>) -> Self {
        Self {
            id: GroupId::generate(),
            name: name.into(),
            layout,
            urls,
            window_ids: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { UNTITLED_GROUP_NAME } else { &self.name }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = ProfileId::generate();
        let b = ProfileId::generate();
        assert!(a.as_str().starts_with("profile-"));
        assert_ne!(a, b);
        assert!(GroupId::generate().as_str().starts_with("group-"));
    }

    #[test]
    fn groups_use_the_stored_field_names() {
        let mut group = Group::new("Mail", LayoutKind::Grid2x2, vec!["https://a.com".into()]);
        group.window_ids.push(WindowServerId::new(7));
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(
            value,
            json!({
                "id": group.id.as_str(),
                "name": "Mail",
                "layout": "grid2x2",
                "urls": ["https://a.com"],
                "windowIds": [7],
            })
        );
    }

    #[test]
    fn sparse_records_are_filled_with_defaults() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "profile-1",
            "name": null,
            "groups": [{ "id": "group-1", "urls": null }, { "name": "Chat", "layout": "horizontal" }],
        }))
        .unwrap();
        assert_eq!(profile.id, ProfileId::from("profile-1"));
        assert_eq!(profile.display_name(), UNTITLED_PROFILE_NAME);
        assert_eq!(profile.groups.len(), 2);
        let first = &profile.groups[0];
        assert_eq!(first.display_name(), UNTITLED_GROUP_NAME);
        assert_eq!(first.layout, LayoutKind::Vertical);
        assert!(first.urls.is_empty() && first.window_ids.is_empty());
        let second = &profile.groups[1];
        assert!(second.id.as_str().starts_with("group-"));
        assert_eq!(second.layout, LayoutKind::Horizontal);
    }

    #[test]
    fn group_lookup_by_id() {
        let chat = Group::new("Chat", LayoutKind::Vertical, Vec::new());
        let chat_id = chat.id.clone();
        let mut profile = Profile::with_groups("Work", vec![chat]);
        assert_eq!(profile.first_group_id(), Some(chat_id.clone()));
        profile.group_mut(&chat_id).unwrap().name = "Chats".into();
        assert_eq!(profile.group(&chat_id).unwrap().name, "Chats");
        assert!(profile.group(&GroupId::from("group-missing")).is_none());
    }
}
