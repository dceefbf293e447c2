use tracing::{info, instrument};

use crate::actor::reactor::{
    Command, PendingOpen, Reactor, ReactorError, Responder, Severity, Status, respond,
};
use crate::actor::window_host;
use crate::model::{GroupEdits, GroupId, ProfileId, RegistryError};

pub struct CommandEventHandler;

impl CommandEventHandler {
    #[instrument(skip(reactor, response))]
    pub fn handle_command(reactor: &mut Reactor, command: Command, response: Option<Responder>) {
        info!(?command);
        let result = match command {
            Command::CreateProfile => {
                reactor.registry.create_profile();
                Ok(Some("Profile created".to_string()))
            }
            Command::RenameProfile { profile, name } => reactor
                .registry
                .rename_profile(&profile, &name)
                .map(|()| Some("Profile renamed".to_string()))
                .map_err(ReactorError::from),
            Command::DeleteProfile(profile) => reactor
                .registry
                .delete_profile(&profile)
                .map(|_| Some("Profile deleted".to_string()))
                .map_err(ReactorError::from),
            Command::CreateGroup(profile) => Self::create_group(reactor, profile),
            Command::SaveGroup { group, edits } => Self::save_group(reactor, &group, edits),
            Command::SelectProfile(profile) => Self::select_profile(reactor, &profile),
            Command::SelectGroup(group) => Self::select_group(reactor, &group),
            Command::OpenGroup(group) => return Self::open_group(reactor, group, response),
            Command::CloseGroup(group) => return Self::close_group(reactor, &group, response),
        };

        match result {
            Ok(Some(success)) => reactor.persist(Some(success), response),
            Ok(None) => respond(response, Ok(())),
            Err(e) => reactor.fail(e, response),
        }
    }

    fn create_group(
        reactor: &mut Reactor,
        profile: Option<ProfileId>,
    ) -> Result<Option<String>, ReactorError> {
        let profile = profile
            .or_else(|| reactor.registry.active_selection().profile)
            .ok_or(ReactorError::NoActiveProfile)?;
        reactor.registry.create_group(&profile)?;
        Ok(Some("New group created".to_string()))
    }

    fn save_group(
        reactor: &mut Reactor,
        group: &GroupId,
        edits: GroupEdits,
    ) -> Result<Option<String>, ReactorError> {
        reactor.registry.save_group_edits(group, edits)?;
        Ok(Some("Group saved".to_string()))
    }

    // Selection is not persisted, so these answer right away.

    fn select_profile(
        reactor: &mut Reactor,
        profile: &ProfileId,
    ) -> Result<Option<String>, ReactorError> {
        reactor.registry.select_profile(profile)?;
        let name = reactor.registry.profile(profile).map(|p| p.display_name().to_string());
        if let Some(name) = name {
            reactor.report(Status::new(format!("Selected “{name}”"), Severity::Neutral));
        }
        Ok(None)
    }

    fn select_group(
        reactor: &mut Reactor,
        group: &GroupId,
    ) -> Result<Option<String>, ReactorError> {
        reactor.registry.select_group(group)?;
        let name = reactor.registry.group(group).map(|g| g.display_name().to_string());
        if let Some(name) = name {
            reactor.report(Status::new(format!("Selected “{name}”"), Severity::Neutral));
        }
        Ok(None)
    }

    /// Asks the host for the frame to tile into; the rest happens when it
    /// answers.
    fn open_group(reactor: &mut Reactor, group: GroupId, response: Option<Responder>) {
        let urls_empty = match reactor.registry.group(&group) {
            Some(g) => g.urls.is_empty(),
            None => {
                let error = RegistryError::GroupNotFound(group);
                return reactor.fail(error.into(), response);
            }
        };
        if urls_empty {
            return reactor.fail(ReactorError::NoUrls, response);
        }
        reactor.pending_opens.push(PendingOpen { group: group.clone(), response });
        reactor.host_tx.send(window_host::Request::QueryFrame { group });
    }

    /// Removal failures are only logged; the group stops tracking every
    /// window either way.
    fn close_group(reactor: &mut Reactor, group: &GroupId, response: Option<Responder>) {
        let name = match reactor.registry.group(group) {
            Some(g) if g.window_ids.is_empty() => {
                return reactor.fail(ReactorError::NothingToClose, response);
            }
            Some(g) => g.display_name().to_string(),
            None => {
                let error = RegistryError::GroupNotFound(group.clone());
                return reactor.fail(error.into(), response);
            }
        };
        let windows = match reactor.registry.take_windows(group) {
            Ok(windows) => windows,
            Err(e) => return reactor.fail(e.into(), response),
        };
        reactor.pending_removals += windows.len();
        for id in windows {
            reactor.host_tx.send(window_host::Request::RemoveWindow(id));
        }
        reactor.persist(Some(format!("Closed windows for “{name}”")), response);
    }
}
