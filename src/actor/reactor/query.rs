use crate::actor::reactor::{Event, Reactor, ReactorError};
use crate::model::{Group, ProfileId};

impl Reactor {
    pub(super) fn handle_query(&mut self, event: Event) {
        match event {
            Event::QueryProfiles(response) => {
                _ = response.send(self.registry.profiles().to_vec());
            }
            Event::QueryGroups { profile, response } => {
                _ = response.send(self.handle_groups_query(profile));
            }
            Event::QueryGroup { group, response } => {
                _ = response.send(self.registry.group(&group).cloned());
            }
            Event::QuerySelection(response) => {
                _ = response.send(self.registry.active_selection());
            }
            _ => {}
        }
    }

    fn handle_groups_query(&self, profile: Option<ProfileId>) -> Result<Vec<Group>, ReactorError> {
        let profile = profile
            .or_else(|| self.registry.active_selection().profile)
            .ok_or(ReactorError::NoActiveProfile)?;
        Ok(self.registry.groups(&profile)?.to_vec())
    }
}
