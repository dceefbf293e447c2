//! Drives a [`WindowHost`] on behalf of the reactor. Every request is
//! answered with an event, including removals whose failures the reactor
//! only logs.

use tracing::{debug, instrument};

use crate::actor::{self, reactor};
use crate::model::profile::GroupId;
use crate::sys::window_server::{WindowHost, WindowServerId, WindowSpec};

pub type Sender = actor::Sender<Request>;
pub type Receiver = actor::Receiver<Request>;

#[derive(Debug)]
pub enum Request {
    QueryFrame { group: GroupId },
    CreateWindow { group: GroupId, spec: WindowSpec },
    RemoveWindow(WindowServerId),
}

pub struct HostActor<H> {
    host: H,
    reactor_tx: reactor::Sender,
}

impl<H: WindowHost> HostActor<H> {
    pub fn new(host: H, reactor_tx: reactor::Sender) -> Self { Self { host, reactor_tx } }

    pub async fn run(mut self, mut requests: Receiver) {
        while let Some((span, request)) = requests.recv().await {
            let _guard = span.enter();
            self.handle_request(request);
        }
    }

    #[instrument(skip(self))]
    fn handle_request(&mut self, request: Request) {
        let event = match request {
            Request::QueryFrame { group } => {
                let frame = self.host.current_frame();
                reactor::Event::HostFrame { group, frame }
            }
            Request::CreateWindow { group, spec } => {
                let result = self.host.create_window(&spec).map_err(|e| e.to_string());
                if let Err(e) = &result {
                    debug!(url = %spec.url, "Window creation failed: {e}");
                }
                reactor::Event::WindowCreated { group, url: spec.url, result }
            }
            Request::RemoveWindow(id) => {
                let result = self.host.remove_window(id).map_err(|e| e.to_string());
                if let Err(e) = &result {
                    debug!(%id, "Ignoring failed removal: {e}");
                }
                reactor::Event::WindowRemoved { id, result }
            }
        };
        self.reactor_tx.send(event);
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::testing::FakeHost;
    use super::*;
    use crate::sys::geometry::Rect;

    fn spec(url: &str) -> WindowSpec {
        WindowSpec { url: url.into(), frame: Rect::new(0, 0, 100, 100), focused: false }
    }

    #[test]
    fn answers_every_request() {
        let (reactor_tx, mut reactor_rx) = actor::channel();
        let mut actor = HostActor::new(FakeHost::with_frame(Rect::new(0, 0, 800, 600)), reactor_tx);
        actor.host.fail_urls.push("https://bad.example".into());
        let group = GroupId::from("group-1");

        actor.handle_request(Request::QueryFrame { group: group.clone() });
        actor.handle_request(Request::CreateWindow { group: group.clone(), spec: spec("https://a.com") });
        actor.handle_request(Request::CreateWindow {
            group: group.clone(),
            spec: spec("https://bad.example"),
        });
        actor.handle_request(Request::RemoveWindow(WindowServerId::new(1)));
        actor.handle_request(Request::RemoveWindow(WindowServerId::new(1)));

        let events: Vec<_> = std::iter::from_fn(|| reactor_rx.try_recv().ok()).map(|(_, e)| e).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            reactor::Event::HostFrame { frame: Some(f), .. } if *f == Rect::new(0, 0, 800, 600)
        ));
        assert!(matches!(
            &events[1],
            reactor::Event::WindowCreated { result: Ok(id), .. } if *id == WindowServerId::new(1)
        ));
        assert!(matches!(&events[2], reactor::Event::WindowCreated { result: Err(_), .. }));
        assert!(matches!(&events[3], reactor::Event::WindowRemoved { result: Ok(()), .. }));
        assert!(matches!(&events[4], reactor::Event::WindowRemoved { result: Err(_), .. }));
        assert_eq!(actor.host.created, vec![spec("https://a.com")]);
    }
}
