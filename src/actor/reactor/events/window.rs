use tracing::{debug, instrument, warn};

use crate::actor::reactor::{Reactor, ReactorError};
use crate::actor::window_host;
use crate::layout_engine::tile;
use crate::model::{GroupId, RegistryError};
use crate::sys::geometry::Rect;
use crate::sys::window_server::{WindowServerId, WindowSpec};

pub struct WindowEventHandler;

impl WindowEventHandler {
    /// Continues an open once the host has reported where to tile.
    #[instrument(skip(reactor))]
    pub fn handle_host_frame(reactor: &mut Reactor, group: GroupId, frame: Option<Rect>) {
        let Some(index) = reactor.pending_opens.iter().position(|p| p.group == group) else {
            debug!("frame arrived for a group nobody is opening");
            return;
        };
        let response = reactor.pending_opens.remove(index).response;
        match Self::open(reactor, &group, frame) {
            Ok(success) => reactor.persist(Some(success), response),
            Err(e) => reactor.fail(e, response),
        }
    }

    /// Tiles the group's URLs over `frame` and requests one window per URL,
    /// without waiting for any of them.
    fn open(
        reactor: &mut Reactor,
        group_id: &GroupId,
        frame: Option<Rect>,
    ) -> Result<String, ReactorError> {
        let group = reactor
            .registry
            .group(group_id)
            .ok_or_else(|| RegistryError::GroupNotFound(group_id.clone()))?;
        if group.urls.is_empty() {
            return Err(ReactorError::NoUrls);
        }
        let frame = frame.ok_or(ReactorError::HostUnavailable)?;

        let name = group.display_name().to_string();
        let urls = group.urls.clone();
        let rects = tile(frame, group.layout, urls.len(), &reactor.limits);

        // Windows tracked from an earlier open are forgotten, not closed.
        let abandoned = reactor.registry.take_windows(group_id)?;
        if !abandoned.is_empty() {
            debug!(?abandoned, "no longer tracking windows");
        }

        let count = urls.len();
        reactor.pending_creates += count;
        for (i, (url, rect)) in urls.into_iter().zip(rects).enumerate() {
            reactor.host_tx.send(window_host::Request::CreateWindow {
                group: group_id.clone(),
                spec: WindowSpec { url, frame: rect, focused: i == 0 },
            });
        }
        Ok(format!("Opened {count} windows for “{name}”"))
    }

    #[instrument(skip(reactor))]
    pub fn handle_window_created(
        reactor: &mut Reactor,
        group: GroupId,
        url: String,
        result: Result<WindowServerId, String>,
    ) {
        reactor.pending_creates = reactor.pending_creates.saturating_sub(1);
        match result {
            Ok(id) => {
                if reactor.registry.record_window(&group, id) {
                    reactor.persist(None, None);
                }
            }
            Err(e) => warn!("Skipping {url}: {e}"),
        }
    }

    pub fn handle_window_removed(
        reactor: &mut Reactor,
        id: WindowServerId,
        result: Result<(), String>,
    ) {
        reactor.pending_removals = reactor.pending_removals.saturating_sub(1);
        if let Err(e) = result {
            debug!(%id, "Window was already gone: {e}");
        }
    }
}
