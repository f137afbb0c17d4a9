//! The window system as the rule engine sees it.
//!
//! Everything scripts can ask about or do to a window goes through [`WindowSystem`]. The real
//! implementation forwards to `libewmh`; tests swap in an in-memory fake.
use libewmh::prelude::*;
use tracing::debug;

/// X11 window id
pub type WindowId = u32;

/// Queries answer `None` when the window or the property is gone, requests report failures
/// so the caller can decide how loud to be about them.
pub trait WindowSystem {
    fn name(&self, win: WindowId) -> Option<String>;
    fn app_name(&self, win: WindowId) -> Option<String>;
    fn class(&self, win: WindowId) -> Option<String>;
    fn instance(&self, win: WindowId) -> Option<String>;
    fn role(&self, win: WindowId) -> Option<String>;
    fn window_type(&self, win: WindowId) -> Option<WinType>;
    fn pid(&self, win: WindowId) -> Option<u32>;

    /// Geometry including the decorations
    fn frame_geometry(&self, win: WindowId) -> Option<Rect>;

    /// Geometry of the client area only
    fn client_geometry(&self, win: WindowId) -> Option<Rect>;

    fn screen_size(&self) -> (i32, i32);
    fn states(&self, win: WindowId) -> Vec<WinState>;
    fn is_decorated(&self, win: WindowId) -> bool;

    /// Zero based desktop, `ALL_DESKTOPS` when pinned
    fn desktop(&self, win: WindowId) -> Option<u32>;
    fn current_desktop(&self) -> Option<u32>;
    fn desktop_count(&self) -> Option<u32>;
    fn monitors(&self) -> Vec<Rect>;
    fn workarea(&self) -> Option<Rect>;
    fn viewport(&self) -> Option<(i32, i32)>;
    fn property(&self, win: WindowId, name: &str) -> Option<String>;

    /// Move and resize through the window manager, coordinates and size describe the frame
    fn move_resize(
        &self, win: WindowId, x: Option<i32>, y: Option<i32>, w: Option<i32>, h: Option<i32>,
    ) -> WindowManagerResult<()>;

    /// Move and optionally resize with a plain configure request
    fn configure(&self, win: WindowId, x: i32, y: i32, size: Option<(i32, i32)>) -> WindowManagerResult<()>;

    fn change_state(
        &self, win: WindowId, add: bool, first: WinState, second: Option<WinState>, source: u32,
    ) -> WindowManagerResult<()>;
    fn minimize(&self, win: WindowId) -> WindowManagerResult<()>;
    fn activate(&self, win: WindowId) -> WindowManagerResult<()>;
    fn close(&self, win: WindowId) -> WindowManagerResult<()>;
    fn set_desktop(&self, win: WindowId, desktop: u32) -> WindowManagerResult<()>;
    fn switch_desktop(&self, desktop: u32) -> WindowManagerResult<()>;
    fn set_decorated(&self, win: WindowId, decorated: bool) -> WindowManagerResult<()>;
    fn set_window_type(&self, win: WindowId, name: &str) -> WindowManagerResult<()>;
    fn set_opacity(&self, win: WindowId, opacity: f64) -> WindowManagerResult<()>;
    fn set_strut(&self, win: WindowId, strut: &[u32; 12]) -> WindowManagerResult<()>;
    fn set_property(&self, win: WindowId, name: &str, value: &PropertyValue) -> WindowManagerResult<()>;
    fn delete_property(&self, win: WindowId, name: &str) -> WindowManagerResult<()>;

    /// Start receiving name and geometry notifications for the window
    fn subscribe(&self, win: WindowId) -> WindowManagerResult<()>;
}

// Swallow query failures, a window can vanish between the event and the script asking about it
fn quiet<T>(op: &str, win: WindowId, result: WindowManagerResult<T>) -> Option<T> {
    match result {
        Ok(val) => Some(val),
        Err(e) => {
            debug!("{}: id: {}, {}", op, win, e);
            None
        },
    }
}

// Frame size minus the decorations on both sides, never below one pixel
fn client_size(frame: i32, before: u32, after: u32) -> u32 {
    let borders = i32::try_from(before.saturating_add(after)).unwrap_or(i32::MAX);
    frame.saturating_sub(borders).max(1) as u32
}

impl WindowSystem for WindowManager {
    fn name(&self, win: WindowId) -> Option<String> {
        quiet("name", win, self.win_name(win)).flatten()
    }

    fn app_name(&self, win: WindowId) -> Option<String> {
        quiet("app_name", win, self.win_app_name(win)).flatten()
    }

    fn class(&self, win: WindowId) -> Option<String> {
        quiet("class", win, self.win_class(win))
    }

    fn instance(&self, win: WindowId) -> Option<String> {
        quiet("instance", win, self.win_instance(win))
    }

    fn role(&self, win: WindowId) -> Option<String> {
        quiet("role", win, self.win_role(win)).flatten()
    }

    fn window_type(&self, win: WindowId) -> Option<WinType> {
        quiet("window_type", win, self.win_type(win))
    }

    fn pid(&self, win: WindowId) -> Option<u32> {
        quiet("pid", win, self.win_pid(win)).filter(|pid| *pid != 0)
    }

    fn frame_geometry(&self, win: WindowId) -> Option<Rect> {
        quiet("frame_geometry", win, self.win_frame_geometry(win))
    }

    fn client_geometry(&self, win: WindowId) -> Option<Rect> {
        quiet("client_geometry", win, self.win_geometry(win))
    }

    fn screen_size(&self) -> (i32, i32) {
        (self.width() as i32, self.height() as i32)
    }

    fn states(&self, win: WindowId) -> Vec<WinState> {
        quiet("states", win, self.win_state(win)).unwrap_or_default()
    }

    fn is_decorated(&self, win: WindowId) -> bool {
        quiet("is_decorated", win, self.win_decorated(win)).unwrap_or(true)
    }

    fn desktop(&self, win: WindowId) -> Option<u32> {
        quiet("desktop", win, self.win_desktop(win))
    }

    fn current_desktop(&self) -> Option<u32> {
        quiet("current_desktop", self.root(), WindowManager::current_desktop(self))
    }

    fn desktop_count(&self) -> Option<u32> {
        quiet("desktop_count", self.root(), self.desktops())
    }

    fn monitors(&self) -> Vec<Rect> {
        quiet("monitors", self.root(), WindowManager::monitors(self)).unwrap_or_default()
    }

    fn workarea(&self) -> Option<Rect> {
        quiet("workarea", self.root(), WindowManager::workarea(self))
    }

    fn viewport(&self) -> Option<(i32, i32)> {
        quiet("viewport", self.root(), WindowManager::viewport(self))
    }

    fn property(&self, win: WindowId, name: &str) -> Option<String> {
        let atom = quiet("property", win, self.atom(name))?;
        quiet("property", win, self.text_property(win, atom)).flatten()
    }

    fn move_resize(
        &self, win: WindowId, x: Option<i32>, y: Option<i32>, w: Option<i32>, h: Option<i32>,
    ) -> WindowManagerResult<()> {
        // The message carries the client size while scripts think in frame sizes
        let (l, r, t, b) = self.win_borders(win).unwrap_or((0, 0, 0, 0));
        let w = w.map(|w| client_size(w, l, r));
        let h = h.map(|h| client_size(h, t, b));
        let gravity = if x.is_some() || y.is_some() { WinGravity::NorthWest } else { WinGravity::Current };
        self.move_resize_win(win, Some(gravity), x, y, w, h)
    }

    fn configure(&self, win: WindowId, x: i32, y: i32, size: Option<(i32, i32)>) -> WindowManagerResult<()> {
        let size = size.map(|(w, h)| (w.max(1) as u32, h.max(1) as u32));
        self.configure_win(win, x, y, size)
    }

    fn change_state(
        &self, win: WindowId, add: bool, first: WinState, second: Option<WinState>, source: u32,
    ) -> WindowManagerResult<()> {
        WindowManager::change_state(self, win, add, first, second, source)
    }

    fn minimize(&self, win: WindowId) -> WindowManagerResult<()> {
        self.minimize_win(win)
    }

    fn activate(&self, win: WindowId) -> WindowManagerResult<()> {
        self.activate_win(win)
    }

    fn close(&self, win: WindowId) -> WindowManagerResult<()> {
        self.close_win(win)
    }

    fn set_desktop(&self, win: WindowId, desktop: u32) -> WindowManagerResult<()> {
        self.set_win_desktop(win, desktop)
    }

    fn switch_desktop(&self, desktop: u32) -> WindowManagerResult<()> {
        WindowManager::switch_desktop(self, desktop)
    }

    fn set_decorated(&self, win: WindowId, decorated: bool) -> WindowManagerResult<()> {
        self.set_win_decorated(win, decorated)
    }

    fn set_window_type(&self, win: WindowId, name: &str) -> WindowManagerResult<()> {
        self.set_win_type(win, name)
    }

    fn set_opacity(&self, win: WindowId, opacity: f64) -> WindowManagerResult<()> {
        self.set_win_opacity(win, opacity)
    }

    fn set_strut(&self, win: WindowId, strut: &[u32; 12]) -> WindowManagerResult<()> {
        self.set_win_strut(win, strut)
    }

    fn set_property(&self, win: WindowId, name: &str, value: &PropertyValue) -> WindowManagerResult<()> {
        let atom = self.atom(name)?;
        WindowManager::set_property(self, win, atom, value)
    }

    fn delete_property(&self, win: WindowId, name: &str) -> WindowManagerResult<()> {
        let atom = self.atom(name)?;
        WindowManager::delete_property(self, win, atom)
    }

    fn subscribe(&self, win: WindowId) -> WindowManagerResult<()> {
        self.watch_win(win)
    }
}

#[cfg(test)]
pub mod fake;
