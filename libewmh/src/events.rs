//! Translates raw X11 events into the window lifecycle events scripts care about.
//!
//! The window manager announces new and vanished clients through `_NET_CLIENT_LIST` and focus
//! through `_NET_ACTIVE_WINDOW` on the root window, so most of the work here is diffing those
//! properties against what was seen last.
use crate::{model::Rect, WindowManager, WindowManagerResult};
use std::collections::HashMap;
use tracing::{debug, trace};
use x11rb::protocol::Event;

/// Window level events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent {
    /// A client window appeared
    Opened(u32),
    /// A client window went away
    Closed(u32),
    /// Focus moved between windows, either side may be nothing
    ActiveChanged { previous: Option<u32>, current: Option<u32> },
    /// One of the window's name properties changed
    NameChanged(u32),
    /// The window's frame moved or changed size
    GeometryChanged(u32),
}

/// Remembers the last known client list, active window and window geometry
#[derive(Debug, Default)]
pub struct EventTracker {
    clients: Vec<u32>,
    active: Option<u32>,
    geometry: HashMap<u32, Rect>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening on the root window and report every window that already exists followed
    /// by the currently focused one
    pub fn prime(&mut self, wm: &WindowManager) -> WindowManagerResult<Vec<WmEvent>> {
        wm.watch_root()?;
        let mut events = self.diff_clients(wm.client_list()?);
        self.seed_geometry(wm, &events);
        if let Some(event) = self.update_active(wm.active_win()?) {
            events.push(event);
        }
        debug!("prime: {} events", events.len());
        Ok(events)
    }

    /// Turn one X11 event into zero or more window events
    pub fn translate(&mut self, wm: &WindowManager, event: &Event) -> Vec<WmEvent> {
        match event {
            Event::PropertyNotify(e) if e.window == wm.root() => {
                if e.atom == wm.atoms._NET_CLIENT_LIST {
                    match wm.client_list() {
                        Ok(list) => {
                            let events = self.diff_clients(list);
                            self.seed_geometry(wm, &events);
                            events
                        },
                        Err(e) => {
                            debug!("translate: client list unavailable: {}", e);
                            vec![]
                        },
                    }
                } else if e.atom == wm.atoms._NET_ACTIVE_WINDOW {
                    wm.active_win().ok().and_then(|active| self.update_active(active)).into_iter().collect()
                } else {
                    vec![]
                }
            },
            Event::PropertyNotify(e) if wm.is_name_atom(e.atom) && self.clients.contains(&e.window) => {
                vec![WmEvent::NameChanged(e.window)]
            },
            Event::ConfigureNotify(e) if self.clients.contains(&e.window) => {
                // Event coordinates are relative to the frame, ask for the real thing
                match wm.win_frame_geometry(e.window) {
                    Ok(rect) => self.update_geometry(e.window, rect).into_iter().collect(),
                    Err(_) => vec![],
                }
            },
            _ => {
                trace!("translate: ignoring {:?}", event);
                vec![]
            },
        }
    }

    /// Compare a fresh client list against the last one. Closed windows are reported before
    /// opened ones and each group keeps the list's order.
    pub fn diff_clients(&mut self, list: Vec<u32>) -> Vec<WmEvent> {
        let mut events: Vec<WmEvent> =
            self.clients.iter().filter(|w| !list.contains(w)).map(|w| WmEvent::Closed(*w)).collect();
        for event in &events {
            if let WmEvent::Closed(win) = event {
                self.geometry.remove(win);
            }
        }
        events.extend(list.iter().filter(|w| !self.clients.contains(w)).map(|w| WmEvent::Opened(*w)));
        self.clients = list;
        events
    }

    /// Record the new active window, reporting only real changes
    pub fn update_active(&mut self, active: Option<u32>) -> Option<WmEvent> {
        if active == self.active {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, active);
        Some(WmEvent::ActiveChanged { previous, current: active })
    }

    /// Record the window's frame rectangle, reporting only real changes
    pub fn update_geometry(&mut self, win: u32, rect: Rect) -> Option<WmEvent> {
        match self.geometry.insert(win, rect) {
            Some(old) if old == rect => None,
            _ => Some(WmEvent::GeometryChanged(win)),
        }
    }

    fn seed_geometry(&mut self, wm: &WindowManager, events: &[WmEvent]) {
        for event in events {
            if let WmEvent::Opened(win) = event {
                if let Ok(rect) = wm.win_frame_geometry(*win) {
                    self.geometry.insert(*win, rect);
                }
            }
        }
    }
}
