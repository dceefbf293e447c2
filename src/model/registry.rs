//! The in-memory profile collection and the transient selection on top of it.
//!
//! Every mutation here is synchronous; persisting the result is the caller's
//! job (see `actor::reactor`).

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::layout_engine::LayoutKind;
use crate::model::profile::{
    Group, GroupId, NEW_GROUP_NAME, NEW_PROFILE_NAME, Profile, ProfileId, UNTITLED_GROUP_NAME,
};
use crate::model::url::urls_from_text;
use crate::sys::window_server::WindowServerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Name cannot be empty.")]
    EmptyName,
    #[error("Cannot delete the last profile.")]
    LastProfile,
    #[error("Profile not found.")]
    ProfileNotFound(ProfileId),
    #[error("Group not found.")]
    GroupNotFound(GroupId),
}

/// Replacement values for a group's editable fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupEdits {
    pub name: String,
    pub layout: Option<LayoutKind>,
    /// Newline separated, unnormalized.
    pub urls_text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub profile: Option<ProfileId>,
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    profiles: Vec<Profile>,
    active_profile: Option<ProfileId>,
    active_group: Option<GroupId>,
}

impl Registry {
    /// Takes ownership of a loaded collection. An empty collection gets a
    /// fresh profile so there is always something to select.
    pub fn new(mut profiles: Vec<Profile>) -> Self {
        if profiles.is_empty() {
            profiles.push(Profile::new(NEW_PROFILE_NAME));
        }
        let mut registry = Self {
            profiles,
            active_profile: None,
            active_group: None,
        };
        registry.fix_selection();
        registry
    }

    pub fn profiles(&self) -> &[Profile] { &self.profiles }

    pub fn profile(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub fn groups(&self, profile_id: &ProfileId) -> Result<&[Group], RegistryError> {
        self.profile(profile_id)
            .map(|p| p.groups.as_slice())
            .ok_or_else(|| RegistryError::ProfileNotFound(profile_id.clone()))
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.profiles.iter().find_map(|p| p.group(id))
    }

    pub fn group_mut(&mut self, id: &GroupId) -> Option<&mut Group> {
        self.profiles.iter_mut().find_map(|p| p.group_mut(id))
    }

    pub fn active_selection(&self) -> Selection {
        Selection {
            profile: self.active_profile.clone(),
            group: self.active_group.clone(),
        }
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active_profile.as_ref().and_then(|id| self.profile(id))
    }

    pub fn create_profile(&mut self) -> ProfileId {
        let profile = Profile::new(NEW_PROFILE_NAME);
        let id = profile.id.clone();
        self.profiles.push(profile);
        self.active_profile = Some(id.clone());
        self.active_group = None;
        id
    }

    pub fn rename_profile(&mut self, id: &ProfileId, name: &str) -> Result<(), RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let profile = self.profile_mut(id)?;
        profile.name = name.to_string();
        Ok(())
    }

    /// Removes a profile and its groups. Windows opened for those groups are
    /// left alone.
    pub fn delete_profile(&mut self, id: &ProfileId) -> Result<Profile, RegistryError> {
        let index = self
            .profiles
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| RegistryError::ProfileNotFound(id.clone()))?;
        if self.profiles.len() <= 1 {
            return Err(RegistryError::LastProfile);
        }
        let removed = self.profiles.remove(index);
        if self.active_profile.as_ref() == Some(id) {
            let first = &self.profiles[0];
            self.active_profile = Some(first.id.clone());
            self.active_group = first.first_group_id();
        }
        self.fix_selection();
        Ok(removed)
    }

    /// Appends a new group to `profile_id` and makes it the active group.
    pub fn create_group(&mut self, profile_id: &ProfileId) -> Result<GroupId, RegistryError> {
        let profile = self.profile_mut(profile_id)?;
        let group = Group::new(NEW_GROUP_NAME, LayoutKind::default(), Vec::new());
        let id = group.id.clone();
        profile.groups.push(group);
        self.active_profile = Some(profile_id.clone());
        self.active_group = Some(id.clone());
        Ok(id)
    }

    /// Overwrites name, layout and URLs together. Tracked windows are kept.
    pub fn save_group_edits(
        &mut self,
        id: &GroupId,
        edits: GroupEdits,
    ) -> Result<&Group, RegistryError> {
        let group = self.group_mut(id).ok_or_else(|| RegistryError::GroupNotFound(id.clone()))?;
        let name = edits.name.trim();
        group.name = if name.is_empty() { UNTITLED_GROUP_NAME.to_string() } else { name.to_string() };
        group.layout = edits.layout.unwrap_or_default();
        group.urls = urls_from_text(&edits.urls_text);
        Ok(&*group)
    }

    pub fn select_profile(&mut self, id: &ProfileId) -> Result<(), RegistryError> {
        let first_group = self
            .profile(id)
            .ok_or_else(|| RegistryError::ProfileNotFound(id.clone()))?
            .first_group_id();
        self.active_profile = Some(id.clone());
        self.active_group = first_group;
        Ok(())
    }

    /// Activates a group and the profile that owns it.
    pub fn select_group(&mut self, id: &GroupId) -> Result<(), RegistryError> {
        let owner = self
            .profiles
            .iter()
            .find(|p| p.group(id).is_some())
            .map(|p| p.id.clone())
            .ok_or_else(|| RegistryError::GroupNotFound(id.clone()))?;
        self.active_profile = Some(owner);
        self.active_group = Some(id.clone());
        Ok(())
    }

    /// Forgets the windows tracked for a group and returns them.
    pub fn take_windows(&mut self, id: &GroupId) -> Result<Vec<WindowServerId>, RegistryError> {
        let group = self.group_mut(id).ok_or_else(|| RegistryError::GroupNotFound(id.clone()))?;
        Ok(std::mem::take(&mut group.window_ids))
    }

    /// Returns false when the group no longer exists.
    pub fn record_window(&mut self, id: &GroupId, window: WindowServerId) -> bool {
        match self.group_mut(id) {
            Some(group) => {
                group.window_ids.push(window);
                true
            }
            None => {
                debug!(%id, %window, "window created for a group that is gone");
                false
            }
        }
    }

    fn profile_mut(&mut self, id: &ProfileId) -> Result<&mut Profile, RegistryError> {
        self.profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RegistryError::ProfileNotFound(id.clone()))
    }

    /// Points the selection back at existing entities.
    fn fix_selection(&mut self) {
        let profile_ok = self.active_profile.as_ref().is_some_and(|id| self.profile(id).is_some());
        if !profile_ok {
            self.active_profile = self.profiles.first().map(|p| p.id.clone());
            self.active_group = None;
        }
        let Some(profile) = self.active_profile() else {
            self.active_group = None;
            return;
        };
        let group_ok = self.active_group.as_ref().is_some_and(|id| profile.group(id).is_some());
        if !group_ok {
            let first = profile.first_group_id();
            self.active_group = first;
        }
    }
}
