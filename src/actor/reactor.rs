//! The reactor owns the profile registry and is the only place it is
//! mutated. Commands arrive as events; work that needs the host or the store
//! is sent to those actors and resumed when their answer comes back as
//! another event.

mod error;
mod events;
mod query;


pub use error::{ErrorKind, ReactorError};
use events::command::CommandEventHandler;
use events::window::WindowEventHandler;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, instrument, trace};

use crate::actor::storage::{self, SaveTicket};
use crate::actor::{self, window_host};
use crate::common::collections::HashMap;
use crate::layout_engine::TilingLimits;
use crate::model::{Group, GroupEdits, GroupId, Profile, ProfileId, Registry, Selection};
use crate::sys::geometry::Rect;
use crate::sys::window_server::WindowServerId;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;
pub type StatusSender = actor::Sender<Status>;
pub type StatusReceiver = actor::Receiver<Status>;

/// Resolved once a command has fully taken effect, including its save.
pub type Responder = oneshot::Sender<Result<(), ReactorError>>;

#[derive(Debug)]
pub enum Event {
    Command {
        command: Command,
        response: Option<Responder>,
    },

    HostFrame {
        group: GroupId,
        frame: Option<Rect>,
    },
    WindowCreated {
        group: GroupId,
        url: String,
        result: Result<WindowServerId, String>,
    },
    WindowRemoved {
        id: WindowServerId,
        result: Result<(), String>,
    },
    SaveFinished {
        ticket: SaveTicket,
        result: Result<(), String>,
    },

    QueryProfiles(oneshot::Sender<Vec<Profile>>),
    QueryGroups {
        /// Defaults to the active profile.
        profile: Option<ProfileId>,
        response: oneshot::Sender<Result<Vec<Group>, ReactorError>>,
    },
    QueryGroup {
        group: GroupId,
        response: oneshot::Sender<Option<Group>>,
    },
    QuerySelection(oneshot::Sender<Selection>),

    /// Answered once no host request or save is outstanding.
    WaitForIdle(oneshot::Sender<()>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateProfile,
    RenameProfile { profile: ProfileId, name: String },
    /// Callers are expected to have confirmed with the user.
    DeleteProfile(ProfileId),
    SelectProfile(ProfileId),
    /// Defaults to the active profile.
    CreateGroup(Option<ProfileId>),
    SaveGroup { group: GroupId, edits: GroupEdits },
    SelectGroup(GroupId),
    OpenGroup(GroupId),
    CloseGroup(GroupId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Neutral,
    Ok,
    Error,
}

/// One line of feedback for the user after an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Status {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self { message: message.into(), severity }
    }
}

struct PendingSave {
    success: Option<String>,
    response: Option<Responder>,
}

struct PendingOpen {
    group: GroupId,
    response: Option<Responder>,
}

pub struct Reactor {
    registry: Registry,
    limits: TilingLimits,
    host_tx: window_host::Sender,
    storage_tx: storage::Sender,
    status_tx: StatusSender,
    next_ticket: u64,
    pending_saves: HashMap<SaveTicket, PendingSave>,
    pending_opens: Vec<PendingOpen>,
    pending_creates: usize,
    pending_removals: usize,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl Reactor {
    pub fn new(
        registry: Registry,
        limits: TilingLimits,
        host_tx: window_host::Sender,
        storage_tx: storage::Sender,
        status_tx: StatusSender,
    ) -> Self {
        Self {
            registry,
            limits,
            host_tx,
            storage_tx,
            status_tx,
            next_ticket: 0,
            pending_saves: HashMap::default(),
            pending_opens: Vec::new(),
            pending_creates: 0,
            pending_removals: 0,
            idle_waiters: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub async fn run(mut self, mut events: Receiver) {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Command { command, response } => {
                CommandEventHandler::handle_command(self, command, response)
            }
            Event::HostFrame { group, frame } => {
                WindowEventHandler::handle_host_frame(self, group, frame)
            }
            Event::WindowCreated { group, url, result } => {
                WindowEventHandler::handle_window_created(self, group, url, result)
            }
            Event::WindowRemoved { id, result } => {
                WindowEventHandler::handle_window_removed(self, id, result)
            }
            Event::SaveFinished { ticket, result } => self.handle_save_finished(ticket, result),
            Event::WaitForIdle(waiter) => self.idle_waiters.push(waiter),
            query => self.handle_query(query),
        }
        self.notify_if_idle();
    }

    pub fn is_idle(&self) -> bool {
        self.pending_saves.is_empty()
            && self.pending_opens.is_empty()
            && self.pending_creates == 0
            && self.pending_removals == 0
    }

    fn notify_if_idle(&mut self) {
        if !self.is_idle() || self.idle_waiters.is_empty() {
            return;
        }
        trace!(waiters = self.idle_waiters.len(), "idle");
        for waiter in self.idle_waiters.drain(..) {
            _ = waiter.send(());
        }
    }

    /// Writes the whole collection. `success` is reported and `response`
    /// resolved once the store has answered.
    fn persist(&mut self, success: Option<String>, response: Option<Responder>) {
        self.next_ticket += 1;
        let ticket = SaveTicket(self.next_ticket);
        debug!(?ticket, "saving");
        self.pending_saves.insert(ticket, PendingSave { success, response });
        self.storage_tx.send(storage::Request::Save {
            ticket,
            profiles: self.registry.profiles().to_vec(),
        });
    }

    fn handle_save_finished(&mut self, ticket: SaveTicket, result: Result<(), String>) {
        let Some(PendingSave { success, response }) = self.pending_saves.remove(&ticket) else {
            debug!(?ticket, "unknown save ticket");
            return;
        };
        match result {
            Ok(()) => {
                if let Some(message) = success {
                    self.report(Status::new(message, Severity::Ok));
                }
                respond(response, Ok(()));
            }
            // The in-memory state stays as it is; the next save carries it again.
            Err(message) => self.fail(ReactorError::Persistence(message), response),
        }
    }

    fn report(&self, status: Status) {
        debug!(severity = %status.severity, message = %status.message, "status");
        self.status_tx.send(status);
    }

    fn fail(&self, error: ReactorError, response: Option<Responder>) {
        self.report(Status::new(error.to_string(), Severity::Error));
        respond(response, Err(error));
    }
}

fn respond(response: Option<Responder>, result: Result<(), ReactorError>) {
    if let Some(response) = response {
        _ = response.send(result);
    }
}
