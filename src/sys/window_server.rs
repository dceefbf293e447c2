//! The windowing host: whatever can report the host rectangle and open or
//! close positioned windows.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sys::geometry::Rect;

/// A window identifier handed out by the host.
///
/// Only meaningful to the host that created the window; it may become stale
/// at any time when the user closes the window by other means.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowServerId(u32);

impl WindowServerId {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<WindowServerId> for u32 {
    #[inline]
    fn from(id: WindowServerId) -> Self {
        id.0
    }
}

impl fmt::Display for WindowServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Everything needed to open one window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub url: String,
    pub frame: Rect,
    pub focused: bool,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Launch command is empty")]
    EmptyCommand,
    #[error("Failed to launch window: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("No such window: {0}")]
    NoSuchWindow(WindowServerId),
    #[error("Window {id} could not be removed: {source}")]
    Remove {
        id: WindowServerId,
        #[source]
        source: nix::Error,
    },
    #[error("{0}")]
    Rejected(String),
}

pub trait WindowHost {
    /// The rectangle new windows are tiled into, if it can be determined.
    fn current_frame(&mut self) -> Option<Rect>;

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowServerId, HostError>;

    fn remove_window(&mut self, id: WindowServerId) -> Result<(), HostError>;
}

impl<H: WindowHost + ?Sized> WindowHost for Box<H> {
    fn current_frame(&mut self) -> Option<Rect> { (**self).current_frame() }

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowServerId, HostError> {
        (**self).create_window(spec)
    }

    fn remove_window(&mut self, id: WindowServerId) -> Result<(), HostError> {
        (**self).remove_window(id)
    }
}
