//! Owns the store and writes the profile collection on request.
//!
//! Requests are handled strictly in arrival order, so the last save issued
//! is the last one written.

use tracing::{debug, instrument, warn};

use crate::actor::{self, reactor};
use crate::model::persistence::Persistence;
use crate::model::profile::Profile;
use crate::sys::storage::Store;

pub type Sender = actor::Sender<Request>;
pub type Receiver = actor::Receiver<Request>;

/// Identifies one save so its completion can be matched to whoever asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SaveTicket(pub u64);

#[derive(Debug)]
pub enum Request {
    Save { ticket: SaveTicket, profiles: Vec<Profile> },
}

pub struct StorageActor<S> {
    persistence: Persistence<S>,
    reactor_tx: reactor::Sender,
}

impl<S: Store> StorageActor<S> {
    pub fn new(persistence: Persistence<S>, reactor_tx: reactor::Sender) -> Self {
        Self { persistence, reactor_tx }
    }

    pub async fn run(mut self, mut requests: Receiver) {
        while let Some((span, request)) = requests.recv().await {
            let _guard = span.enter();
            self.handle_request(request);
        }
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Save { ticket, profiles } => self.save(ticket, &profiles),
        }
    }

    #[instrument(skip(self, profiles), fields(profiles = profiles.len()))]
    fn save(&mut self, ticket: SaveTicket, profiles: &[Profile]) {
        let result = self.persistence.save(profiles).map_err(|e| e.to_string());
        match &result {
            Ok(()) => debug!("saved"),
            Err(e) => warn!("Save failed: {e}"),
        }
        self.reactor_tx.send(reactor::Event::SaveFinished { ticket, result });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::persistence::PROFILES_KEY;
    use crate::sys::storage::MemoryStore;

    #[tokio::test(flavor = "current_thread")]
    async fn saves_in_order_and_reports_each() {
        let (reactor_tx, mut reactor_rx) = actor::channel();
        let (tx, mut rx) = actor::channel();
        let mut actor = StorageActor::new(Persistence::new(MemoryStore::new(), vec![]), reactor_tx);

        let last = vec![Profile::new("Last")];
        tx.send(Request::Save { ticket: SaveTicket(1), profiles: vec![Profile::new("First")] });
        tx.send(Request::Save { ticket: SaveTicket(2), profiles: last.clone() });
        drop(tx);

        while let Some((_, request)) = rx.recv().await {
            actor.handle_request(request);
        }

        let mut tickets = vec![];
        while let Ok((_, event)) = reactor_rx.try_recv() {
            match event {
                reactor::Event::SaveFinished { ticket, result } => {
                    assert_eq!(result, Ok(()));
                    tickets.push(ticket);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(tickets, vec![SaveTicket(1), SaveTicket(2)]);

        let stored: Vec<Profile> = serde_json::from_value(
            actor.persistence.store().entry(PROFILES_KEY).cloned().unwrap(),
        )
        .unwrap();
        assert_eq!(stored, last);
    }

    #[test]
    fn failed_save_carries_store_message() {
        let (reactor_tx, mut reactor_rx) = actor::channel();
        let mut store = MemoryStore::new();
        store.fail_writes(Some("QUOTA_BYTES quota exceeded"));
        let mut actor = StorageActor::new(Persistence::new(store, vec![]), reactor_tx);

        actor.handle_request(Request::Save { ticket: SaveTicket(7), profiles: vec![] });

        let (_, event) = reactor_rx.try_recv().unwrap();
        let reactor::Event::SaveFinished { ticket, result } = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(ticket, SaveTicket(7));
        assert_eq!(result, Err("QUOTA_BYTES quota exceeded".to_string()));
    }
}
