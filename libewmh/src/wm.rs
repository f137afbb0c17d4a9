//! `WindowManager` uses the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! as a way to integrate with EWMH compatible window managers. The EWHM spec builds on the lower
//! level Inter Client Communication Conventions Manual (ICCCM) to define interactions between
//! window managers, compositing managers and applications.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! The EWMH spec defines a number of properties that EWHM compliant window managers will maintain
//! and return to clients requesting information. `WindowManager` taps into the message queue to retrieve
//! details about a given window and to than manipulate the given window as desired.
//!
//! `wmscript` drives `WindowManager` from user scripts: every query and request a script can make
//! ends up as one of the methods below.
use crate::{atoms::AtomCollection, model::*, ErrorWrapper, WindowManagerError, WindowManagerResult};
use std::{cell::RefCell, collections::HashMap, str, sync::Arc};
use tracing::{debug, trace, warn};

use x11rb::{
    connection::Connection,
    protocol::{
        randr::ConnectionExt as _,
        xproto::{
            self, Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux,
            ConnectionExt as _, EventMask, GetPropertyReply, PropMode,
        },
        Event,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

// Define the second byte of the move resize flags 32bit value
// Used to indicate that the associated value has been changed and needs to be acted upon
pub type MoveResizeWindowFlags = u32;
pub const MOVE_RESIZE_WINDOW_X: MoveResizeWindowFlags = 1 << 8;
pub const MOVE_RESIZE_WINDOW_Y: MoveResizeWindowFlags = 1 << 9;
pub const MOVE_RESIZE_WINDOW_WIDTH: MoveResizeWindowFlags = 1 << 10;
pub const MOVE_RESIZE_WINDOW_HEIGHT: MoveResizeWindowFlags = 1 << 11;

pub type WindowStateAction = u32;
pub const WINDOW_STATE_ACTION_REMOVE: WindowStateAction = 0;
pub const WINDOW_STATE_ACTION_ADD: WindowStateAction = 1;

// Source indication carried by client messages
pub type SourceIndication = u32;
pub const SOURCE_APPLICATION: SourceIndication = 1;
pub const SOURCE_PAGER: SourceIndication = 2;

/// `_NET_WM_DESKTOP` value meaning "on every desktop"
pub const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

// ICCCM constants
const ICONIC_STATE: u32 = 3;
const WM_HINTS_WINDOW_GROUP: u32 = 1 << 6;
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

/// Window Manager control implements the EWMH protocol using x11rb to provide a simplified access
/// layer to EWHM compatible window managers.
pub struct WindowManager {
    conn: Arc<RustConnection>,                // x11 connection
    pub atoms: AtomCollection,                // atom cache
    interned: RefCell<HashMap<String, Atom>>, // atoms interned on demand by name
    supported: HashMap<u32, bool>,            // cache for supported functions
    root: u32,                                // root window id
    width: u32,                               // screen width
    height: u32,                              // screen height
}

pub struct GetPropertyResult {
    property: Atom,
    boxed: WindowManagerResult<GetPropertyReply>,
}

impl TryInto<u32> for GetPropertyResult {
    type Error = ErrorWrapper;
    fn try_into(self) -> WindowManagerResult<u32> {
        let property = self.property;
        self.boxed?
            .value32()
            .and_then(|mut x| x.next())
            .ok_or_else(|| WindowManagerError::PropertyNotFound(property.to_string()).into())
    }
}

impl TryInto<i32> for GetPropertyResult {
    type Error = ErrorWrapper;
    fn try_into(self) -> WindowManagerResult<i32> {
        Ok(TryInto::<u32>::try_into(self)? as i32)
    }
}

impl TryInto<Vec<u32>> for GetPropertyResult {
    type Error = ErrorWrapper;
    fn try_into(self) -> WindowManagerResult<Vec<u32>> {
        let property = self.property;
        self.boxed?
            .value32()
            .map(|x| x.collect())
            .ok_or_else(|| WindowManagerError::PropertyNotFound(property.to_string()).into())
    }
}

impl WindowManager {
    /// Create the window manager control instance and connect to the X11 server
    pub fn connect() -> WindowManagerResult<Self> {
        let (conn, screen) = x11rb::connect(None)?;

        // Get the screen size
        let (width, height, root) = {
            let screen = &conn.setup().roots[screen];
            (screen.width_in_pixels as u32, screen.height_in_pixels as u32, screen.root)
        };

        // Populate the supported functions cache
        let (atoms, supported) = WindowManager::init_caching(&conn, root)?;

        let wm = WindowManager {
            conn: Arc::new(conn),
            atoms,
            interned: RefCell::new(HashMap::new()),
            supported,
            root,
            width,
            height,
        };

        debug!("connect: screen: {}, root: {}, w: {}, h: {}", screen, root, width, height);
        Ok(wm)
    }

    fn init_caching(
        conn: &RustConnection, root: u32,
    ) -> WindowManagerResult<(AtomCollection, HashMap<u32, bool>)> {
        debug!("initializing caching...");

        // Cache atoms
        let atoms = AtomCollection::new(conn)?.reply()?;

        // Cache supported functions, a window manager without _NET_SUPPORTED just gets the
        // fallbacks everywhere
        let mut supported = HashMap::<u32, bool>::new();
        let reply = conn.get_property(false, root, atoms._NET_SUPPORTED, AtomEnum::ATOM, 0, u32::MAX)?.reply()?;
        match reply.value32() {
            Some(values) => {
                for atom in values {
                    trace!("supported: {}", atom);
                    supported.insert(atom, true);
                }
            },
            None => warn!("init_caching: window manager does not publish _NET_SUPPORTED"),
        }
        debug!("caching initialized");
        Ok((atoms, supported))
    }

    /// Get the root window
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Get the screen full width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get screen full height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Look up an atom by name, interning it on first use
    ///
    /// ### Arguments
    /// * `name` - atom name e.g. `_NET_WM_STRUT`
    pub fn atom(&self, name: &str) -> WindowManagerResult<Atom> {
        if name.is_empty() {
            return Err(WindowManagerError::InvalidAtom(name.to_owned()).into());
        }
        if let Some(atom) = self.interned.borrow().get(name) {
            return Ok(*atom);
        }
        let atom = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        trace!("atom: {} => {}", name, atom);
        self.interned.borrow_mut().insert(name.to_owned(), atom);
        Ok(atom)
    }

    fn _get_window_property<A: Into<Atom>, B: Into<Atom>>(
        &self, window_id: u32, property: A, type_: B,
    ) -> Result<GetPropertyReply, ErrorWrapper> {
        Ok(self.conn.get_property(false, window_id, property, type_, 0, u32::MAX)?.reply()?)
    }

    pub fn get_window_property<A: Into<Atom>, B: Into<Atom>>(
        &self, window_id: u32, property: A, type_: B,
    ) -> GetPropertyResult {
        let property = property.into();
        GetPropertyResult {
            property,
            boxed: self._get_window_property(window_id, property, type_),
        }
    }

    pub fn get_root_property<A: Into<Atom>, B: Into<Atom>>(&self, property: A, type_: B) -> GetPropertyResult {
        self.get_window_property(self.root, property, type_)
    }

    /// Get the active window id, `None` when nothing has focus
    pub fn active_win(&self) -> WindowManagerResult<Option<u32>> {
        // Defined as: _NET_ACTIVE_WINDOW, WINDOW/32
        let win: u32 = match self.get_root_property(self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW).try_into() {
            Ok(win) => win,
            Err(e) if e.is_missing() => 0,
            Err(e) => return Err(e),
        };
        Ok(if win == x11rb::NONE { None } else { Some(win) })
    }

    /// Get the windows the window manager is managing in mapping order
    pub fn client_list(&self) -> WindowManagerResult<Vec<u32>> {
        // Defined as: _NET_CLIENT_LIST, WINDOW[]/32
        match self.get_root_property(self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW).try_into() {
            Ok(list) => Ok(list),
            Err(e) if e.is_missing() => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    /// Get number of desktops
    pub fn desktops(&self) -> WindowManagerResult<u32> {
        // Defined as: _NET_NUMBER_OF_DESKTOPS, CARDINAL/32
        self.get_root_property(self.atoms._NET_NUMBER_OF_DESKTOPS, AtomEnum::CARDINAL).try_into()
    }

    /// Get the zero based index of the current desktop
    pub fn current_desktop(&self) -> WindowManagerResult<u32> {
        // Defined as: _NET_CURRENT_DESKTOP desktop, CARDINAL/32
        self.get_root_property(self.atoms._NET_CURRENT_DESKTOP, AtomEnum::CARDINAL).try_into()
    }

    /// Get window manager's window id and name
    pub fn winmgr(&self) -> WindowManagerResult<(u32, String)> {
        let win: u32 = self.get_root_property(self.atoms._NET_SUPPORTING_WM_CHECK, AtomEnum::WINDOW).try_into()?;
        let name = self.win_name(win)?.unwrap_or_default();
        Ok((win, name))
    }

    /// Determine if the given function is supported by the window manager
    ///
    /// ### Arguments
    /// * `atom` - atom to lookup to see if its supported
    ///
    /// ### Examples
    /// ```ignore
    /// use libewmh::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// wm.supported(wm.atoms._NET_MOVERESIZE_WINDOW);
    /// ```
    pub fn supported(&self, atom: u32) -> bool {
        self.supported.get(&atom).is_some()
    }

    /// Get desktop work area of the current desktop
    ///
    /// ### Examples
    /// ```ignore
    /// use libewmh::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let area = wm.workarea().unwrap();
    /// ```
    pub fn workarea(&self) -> WindowManagerResult<Rect> {
        // Defined as: _NET_WORKAREA, x, y, width, height CARDINAL[][4]/32
        // which means when retrieving the value via `get_property` that we need to use a `self.atoms._NET_WORKAREA`
        // request message with a `AtomEnum::CARDINAL` type response and we can use the `reply.value32()` accessor to
        // retrieve the values of which there will be 4 for each desktop as defined (x, y, width, height).
        let values: Vec<u32> = self.get_root_property(self.atoms._NET_WORKAREA, AtomEnum::CARDINAL).try_into()?;
        let desktop = self.current_desktop().unwrap_or(0) as usize;
        let area = values
            .chunks_exact(4)
            .nth(desktop)
            .or_else(|| values.chunks_exact(4).next())
            .map(|v| Rect::new(v[0] as i32, v[1] as i32, v[2] as i32, v[3] as i32))
            .ok_or_else(|| WindowManagerError::PropertyNotFound("_NET_WORKAREA".to_owned()))?;
        debug!("workarea: desktop: {}, area: {}", desktop, area);
        Ok(area)
    }

    /// Get the top left corner of the current desktop's viewport
    pub fn viewport(&self) -> WindowManagerResult<(i32, i32)> {
        // Defined as: _NET_DESKTOP_VIEWPORT x, y, CARDINAL[][2]/32
        let values: Vec<u32> =
            self.get_root_property(self.atoms._NET_DESKTOP_VIEWPORT, AtomEnum::CARDINAL).try_into()?;
        let desktop = self.current_desktop().unwrap_or(0) as usize;
        let origin = values
            .chunks_exact(2)
            .nth(desktop)
            .map(|v| (v[0] as i32, v[1] as i32))
            .ok_or_else(|| WindowManagerError::PropertyNotFound("_NET_DESKTOP_VIEWPORT".to_owned()))?;
        debug!("viewport: desktop: {}, x: {}, y: {}", desktop, origin.0, origin.1);
        Ok(origin)
    }

    /// Get the geometry of every connected monitor. Falls back to a single monitor covering the
    /// whole screen when RandR is not available.
    pub fn monitors(&self) -> WindowManagerResult<Vec<Rect>> {
        let reply = self.conn.randr_get_monitors(self.root, true).map_err(ErrorWrapper::from).and_then(|c| Ok(c.reply()?));
        let monitors = match reply {
            Ok(reply) if !reply.monitors.is_empty() => reply
                .monitors
                .iter()
                .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
                .collect(),
            Ok(_) => vec![Rect::new(0, 0, self.width as i32, self.height as i32)],
            Err(e) => {
                debug!("monitors: randr unavailable: {}", e);
                vec![Rect::new(0, 0, self.width as i32, self.height as i32)]
            },
        };
        trace!("monitors: {:?}", monitors);
        Ok(monitors)
    }

    /// Move and resize the given window through the window manager
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    /// * `gravity` - gravity to use when resizing the window, defaults to the window's own gravity
    /// * `x` - x coordinate to use for the window during positioning
    /// * `y` - y coordinate to use for the window during positioning
    /// * `w` - width to resize the window to
    /// * `h` - height to resize the window to
    ///
    /// ### Examples
    /// ```ignore
    /// use libewmh::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// wm.move_resize_win(12345, None, Some(0), Some(0), Some(500), Some(500)).unwrap();
    /// ```
    pub fn move_resize_win(
        &self, win: xproto::Window, gravity: Option<WinGravity>, x: Option<i32>, y: Option<i32>, w: Option<u32>,
        h: Option<u32>,
    ) -> WindowManagerResult<()> {
        // Window managers that don't understand the message get a plain configure request
        if !self.supported(self.atoms._NET_MOVERESIZE_WINDOW) {
            debug!("move_resize_win: _NET_MOVERESIZE_WINDOW unsupported, configuring directly");
            let mut aux = ConfigureWindowAux::new();
            aux = if let Some(x) = x { aux.x(x) } else { aux };
            aux = if let Some(y) = y { aux.y(y) } else { aux };
            aux = if let Some(w) = w { aux.width(w) } else { aux };
            aux = if let Some(h) = h { aux.height(h) } else { aux };
            self.conn.configure_window(win, &aux)?.check()?;
            return Ok(());
        }

        // Gravity is defined as the lower byte of the move resize flags 32bit value
        // https://tronche.com/gui/x/xlib/window/attributes/gravity.html
        // Defines how the window will shift as it grows or shrinks during a shape change operation.
        let mut flags: u32 = gravity.map(u32::from).unwrap_or(0);

        // Define the second byte of the move resize flags 32bit value
        // Used to indicate that the associated value has been changed and needs to be acted upon
        if x.is_some() {
            flags |= MOVE_RESIZE_WINDOW_X;
        }
        if y.is_some() {
            flags |= MOVE_RESIZE_WINDOW_Y;
        }
        if w.is_some() {
            flags |= MOVE_RESIZE_WINDOW_WIDTH;
        }
        if h.is_some() {
            flags |= MOVE_RESIZE_WINDOW_HEIGHT;
        }

        self.send_event(ClientMessageEvent::new(
            32,
            win,
            self.atoms._NET_MOVERESIZE_WINDOW,
            [flags, x.unwrap_or(0) as u32, y.unwrap_or(0) as u32, w.unwrap_or(0), h.unwrap_or(0)],
        ))?;

        debug!("move_resize_win: id: {}, g: {:?}, x: {:?}, y: {:?}, w: {:?}, h: {:?}", win, gravity, x, y, w, h);
        Ok(())
    }

    /// Move and optionally resize the window with a plain ConfigureWindow request, bypassing the
    /// window manager's own move/resize protocol.
    pub fn configure_win(
        &self, win: xproto::Window, x: i32, y: i32, size: Option<(u32, u32)>,
    ) -> WindowManagerResult<()> {
        let mut aux = ConfigureWindowAux::new().x(x).y(y);
        if let Some((w, h)) = size {
            aux = aux.width(w).height(h);
        }
        self.conn.configure_window(win, &aux)?.check()?;
        debug!("configure_win: id: {}, x: {}, y: {}, size: {:?}", win, x, y, size);
        Ok(())
    }

    /// Send the event ensuring that a flush is called and that the message was precisely
    /// executed in the case of a resize/move.
    ///
    /// ### Arguments
    /// * `msg` - the client message event to send
    pub fn send_event(&self, msg: ClientMessageEvent) -> WindowManagerResult<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        self.conn.send_event(false, self.root, mask, &msg)?.check()?;
        self.conn.flush()?;
        trace!("send_event: win: {}", msg.window);

        // I've found that Xfwm4 does not precisely resize a window on the first request. It may be
        // this is a function of decorating the window during a redraw. At any rate because of this
        // unfortunate shortcoming we have to send the event a second time.
        if msg.type_ == self.atoms._NET_MOVERESIZE_WINDOW {
            std::thread::sleep(std::time::Duration::from_millis(50));
            self.conn.send_event(false, self.root, mask, &msg)?.check()?;
            self.conn.flush()?;
            trace!("send_event: win: {}", msg.window);
        }
        Ok(())
    }

    /// Add or remove up to two `_NET_WM_STATE` flags in one request
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    /// * `add` - add the states when true, remove them otherwise
    /// * `first` - state to change
    /// * `second` - optional second state changed in the same message
    /// * `source` - source indication, `SOURCE_PAGER` for pager style requests
    ///
    /// ### Examples
    /// ```ignore
    /// use libewmh::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// wm.change_state(12345, true, WinState::MaxHorz, Some(WinState::MaxVert), SOURCE_PAGER).unwrap();
    /// ```
    pub fn change_state(
        &self, win: xproto::Window, add: bool, first: WinState, second: Option<WinState>,
        source: SourceIndication,
    ) -> WindowManagerResult<()> {
        let action = if add { WINDOW_STATE_ACTION_ADD } else { WINDOW_STATE_ACTION_REMOVE };
        self.send_event(ClientMessageEvent::new(
            32,
            win,
            self.atoms._NET_WM_STATE,
            [action, first.atom(&self.atoms), second.map(|s| s.atom(&self.atoms)).unwrap_or(0), source, 0],
        ))?;
        debug!("change_state: id: {}, add: {}, states: {} {:?}", win, add, first, second);
        Ok(())
    }

    /// Iconify the window (ICCCM `WM_CHANGE_STATE`)
    pub fn minimize_win(&self, win: xproto::Window) -> WindowManagerResult<()> {
        self.send_event(ClientMessageEvent::new(32, win, self.atoms.WM_CHANGE_STATE, [ICONIC_STATE, 0, 0, 0, 0]))?;
        debug!("minimize: id: {}", win);
        Ok(())
    }

    /// Ask the window manager to activate the window, which also de-iconifies it
    pub fn activate_win(&self, win: xproto::Window) -> WindowManagerResult<()> {
        self.send_event(ClientMessageEvent::new(
            32,
            win,
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        ))?;
        debug!("activate: id: {}", win);
        Ok(())
    }

    /// Ask the window manager to close the window
    pub fn close_win(&self, win: xproto::Window) -> WindowManagerResult<()> {
        self.send_event(ClientMessageEvent::new(
            32,
            win,
            self.atoms._NET_CLOSE_WINDOW,
            [x11rb::CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
        ))?;
        debug!("close: id: {}", win);
        Ok(())
    }

    /// Move the window to the given zero based desktop, `ALL_DESKTOPS` pins it
    pub fn set_win_desktop(&self, win: xproto::Window, desktop: u32) -> WindowManagerResult<()> {
        self.send_event(ClientMessageEvent::new(
            32,
            win,
            self.atoms._NET_WM_DESKTOP,
            [desktop, SOURCE_PAGER, 0, 0, 0],
        ))?;
        debug!("set_win_desktop: id: {}, desktop: {}", win, desktop);
        Ok(())
    }

    /// Make the given zero based desktop the current one
    pub fn switch_desktop(&self, desktop: u32) -> WindowManagerResult<()> {
        self.send_event(ClientMessageEvent::new(
            32,
            self.root,
            self.atoms._NET_CURRENT_DESKTOP,
            [desktop, x11rb::CURRENT_TIME, 0, 0, 0],
        ))?;
        debug!("switch_desktop: desktop: {}", desktop);
        Ok(())
    }

    /// Get window class which ends up being the applications name
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_class(&self, win: xproto::Window) -> WindowManagerResult<String> {
        let reply =
            self.conn.get_property(false, win, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, u32::MAX)?.reply()?;

        // Skip the first null terminated string and extract the second
        let iter = reply.value.into_iter().skip_while(|x| *x != 0).skip(1).take_while(|x| *x != 0);

        // Extract the second null terminated string
        let class = str::from_utf8(&iter.collect::<Vec<_>>())?.to_owned();
        debug!("win_class: id: {}, class: {}", win, class);
        Ok(class)
    }

    /// Get window class instance, the first half of `WM_CLASS`
    pub fn win_instance(&self, win: xproto::Window) -> WindowManagerResult<String> {
        let reply =
            self.conn.get_property(false, win, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, u32::MAX)?.reply()?;
        let iter = reply.value.into_iter().take_while(|x| *x != 0);
        let instance = str::from_utf8(&iter.collect::<Vec<_>>())?.to_owned();
        debug!("win_instance: id: {}, instance: {}", win, instance);
        Ok(instance)
    }

    /// Get window desktop
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_desktop(&self, win: xproto::Window) -> WindowManagerResult<u32> {
        // Defined as: _NET_WM_DESKTOP desktop, CARDINAL/32
        self.get_window_property(win, self.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL).try_into()
    }

    /// Get window frame border values added by the window manager
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    ///
    /// ### Examples
    /// ```ignore
    /// use libewmh::prelude::*;
    /// let wm = WindowManager::connect().unwrap();
    /// let (l, r, t, b) = wm.win_borders(12345).unwrap();
    /// ```
    pub fn win_borders(&self, win: xproto::Window) -> WindowManagerResult<(u32, u32, u32, u32)> {
        // Defined as: _NET_FRAME_EXTENTS, left, right, top, bottom, CARDINAL[4]/32
        let values: Vec<u32> =
            self.get_window_property(win, self.atoms._NET_FRAME_EXTENTS, AtomEnum::CARDINAL).try_into()?;
        match values[..] {
            [l, r, t, b, ..] => {
                trace!("win_borders: id: {}, l: {}, r: {}, t: {}, b: {}", win, l, r, t, b);
                Ok((l, r, t, b))
            },
            _ => Err(WindowManagerError::PropertyNotFound("_NET_FRAME_EXTENTS".to_owned()).into()),
        }
    }

    /// Get window geometry of the client area in root coordinates
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_geometry(&self, win: xproto::Window) -> WindowManagerResult<Rect> {
        // The returned x, y location is relative to its parent window making the values completely
        // useless. However using `translate_coordinates` we can have the window manager map the
        // window's own origin into real world cordinates by passing it the root as the relative window.
        let g = self.conn.get_geometry(win)?.reply()?;
        let t = self.conn.translate_coordinates(win, self.root, 0, 0)?.reply()?;

        let rect = Rect::new(t.dst_x as i32, t.dst_y as i32, g.width as i32, g.height as i32);
        trace!("win_geometry: id: {}, {}", win, rect);
        Ok(rect)
    }

    /// Get window geometry including the decorations drawn by the window manager
    pub fn win_frame_geometry(&self, win: xproto::Window) -> WindowManagerResult<Rect> {
        let client = self.win_geometry(win)?;
        let (l, r, t, b) = self.win_borders(win).unwrap_or((0, 0, 0, 0));
        Ok(client.grow(l, r, t, b))
    }

    /// Get the direct child of the root window that contains the window, with reparenting
    /// window managers this is the frame around the client
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_toplevel(&self, win: xproto::Window) -> WindowManagerResult<xproto::Window> {
        let toplevel = toplevel_of(win, self.root, |w| Ok(self.conn.query_tree(w)?.reply()?.parent))?;
        trace!("win_toplevel: id: {}, toplevel: {}", win, toplevel);
        Ok(toplevel)
    }

    /// Get window name
    ///
    /// Tries `_NET_WM_VISIBLE_NAME`, `_NET_WM_NAME` and finally `WM_NAME`. Returns `None` when the
    /// window carries none of them and `Some("")` when it does but they are all empty.
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_name(&self, win: xproto::Window) -> WindowManagerResult<Option<String>> {
        let candidates = [
            (self.atoms._NET_WM_VISIBLE_NAME, self.atoms.UTF8_STRING),
            (self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING),
            (AtomEnum::WM_NAME.into(), AtomEnum::STRING.into()),
        ];

        let mut present = false;
        for (property, type_) in candidates {
            let reply = self.conn.get_property(false, win, property, type_, 0, u32::MAX)?.reply()?;
            if reply.type_ == x11rb::NONE {
                continue;
            }
            present = true;
            let value = if type_ == self.atoms.UTF8_STRING {
                str::from_utf8(&reply.value).map(str::to_owned).unwrap_or_default()
            } else {
                latin1_decode(&reply.value)
            };
            if !value.is_empty() {
                trace!("win_name: id: {}, name: {}", win, value);
                return Ok(Some(value));
            }
        }
        Ok(if present { Some(String::new()) } else { None })
    }

    /// Get the window group leader from `WM_HINTS`
    pub fn win_group_leader(&self, win: xproto::Window) -> WindowManagerResult<Option<u32>> {
        let values: Vec<u32> = match self.get_window_property(win, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS).try_into() {
            Ok(values) => values,
            Err(e) if e.is_missing() => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match values[..] {
            [flags, _, _, _, _, _, _, _, group, ..] if flags & WM_HINTS_WINDOW_GROUP != 0 && group != 0 => Some(group),
            _ => None,
        })
    }

    /// Get the application name which is the name of the group leader, or the window's own name
    /// when it has no leader
    pub fn win_app_name(&self, win: xproto::Window) -> WindowManagerResult<Option<String>> {
        if let Some(leader) = self.win_group_leader(win)? {
            if leader != win {
                if let Ok(Some(name)) = self.win_name(leader) {
                    if !name.is_empty() {
                        return Ok(Some(name));
                    }
                }
            }
        }
        self.win_name(win)
    }

    /// Get window pid
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_pid(&self, win: xproto::Window) -> WindowManagerResult<u32> {
        // Defined as: _NET_WM_PID, CARDINAL/32
        self.get_window_property(win, self.atoms._NET_WM_PID, AtomEnum::CARDINAL).try_into()
    }

    /// Get window role
    pub fn win_role(&self, win: xproto::Window) -> WindowManagerResult<Option<String>> {
        self.text_property(win, self.atoms.WM_WINDOW_ROLE)
    }

    /// Get window state
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_state(&self, win: xproto::Window) -> WindowManagerResult<Vec<WinState>> {
        // Defined as: _NET_WM_STATE, ATOM[]
        let reply =
            self.conn.get_property(false, win, self.atoms._NET_WM_STATE, AtomEnum::ATOM, 0, u32::MAX)?.reply()?;
        let states: Vec<WinState> =
            reply.value32().map(|values| values.map(|v| WinState::from(&self.atoms, v)).collect()).unwrap_or_default();
        trace!("win_state: id: {}, states: {:?}", win, states);
        Ok(states)
    }

    /// Get window type, windows without a type are normal windows
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    pub fn win_type(&self, win: xproto::Window) -> WindowManagerResult<WinType> {
        // Defined as: _NET_WM_WINDOW_TYPE, ATOM[]/32
        match self.get_window_property(win, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM).try_into() {
            Ok(atom) => Ok(WinType::from(&self.atoms, atom)),
            Err(e) if e.is_missing() => Ok(WinType::Normal),
            Err(e) => Err(e),
        }
    }

    /// Check the Motif hints for whether the window wants decorations
    pub fn win_decorated(&self, win: xproto::Window) -> WindowManagerResult<bool> {
        let reply = self._get_window_property(win, self.atoms._MOTIF_WM_HINTS, self.atoms._MOTIF_WM_HINTS)?;
        let values: Vec<u32> = reply.value32().map(|v| v.collect()).unwrap_or_default();
        Ok(match values[..] {
            [flags, _, decorations, ..] if flags & MWM_HINTS_DECORATIONS != 0 => decorations != 0,
            _ => true,
        })
    }

    /// Turn window manager decorations on or off through the Motif hints
    pub fn set_win_decorated(&self, win: xproto::Window, decorated: bool) -> WindowManagerResult<()> {
        let hints = [MWM_HINTS_DECORATIONS, 0, decorated as u32, 0, 0];
        self.conn
            .change_property32(PropMode::REPLACE, win, self.atoms._MOTIF_WM_HINTS, self.atoms._MOTIF_WM_HINTS, &hints)?
            .check()?;
        debug!("set_win_decorated: id: {}, decorated: {}", win, decorated);
        Ok(())
    }

    /// Override the window type
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    /// * `name` - `WINDOW_TYPE_DOCK`, `_NET_WM_WINDOW_TYPE_DOCK` or just `dock`
    pub fn set_win_type(&self, win: xproto::Window, name: &str) -> WindowManagerResult<()> {
        let atom = self.atom(&window_type_atom_name(name))?;
        self.conn
            .change_property32(PropMode::REPLACE, win, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM, &[atom])?
            .check()?;
        debug!("set_win_type: id: {}, type: {}", win, name);
        Ok(())
    }

    /// Set the compositor opacity hint on the window and on its frame
    ///
    /// ### Arguments
    /// * `win` - id of the window to manipulate
    /// * `opacity` - 0.0 fully transparent to 1.0 opaque
    pub fn set_win_opacity(&self, win: xproto::Window, opacity: f64) -> WindowManagerResult<()> {
        if opacity.is_nan() {
            return Err(WindowManagerError::InvalidOpacity(opacity.to_string()).into());
        }
        let value = (opacity.clamp(0.0, 1.0) * f64::from(u32::MAX)) as u32;
        let mut targets = vec![win];
        if let Ok(frame) = self.win_toplevel(win) {
            if frame != win {
                targets.push(frame);
            }
        }
        for target in targets {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    target,
                    self.atoms._NET_WM_WINDOW_OPACITY,
                    AtomEnum::CARDINAL,
                    &[value],
                )?
                .check()?;
        }
        debug!("set_win_opacity: id: {}, opacity: {}", win, opacity);
        Ok(())
    }

    /// Reserve screen space along the edges with `_NET_WM_STRUT_PARTIAL`
    pub fn set_win_strut(&self, win: xproto::Window, strut: &[u32; 12]) -> WindowManagerResult<()> {
        self.conn
            .change_property32(
                PropMode::REPLACE,
                win,
                self.atoms._NET_WM_STRUT_PARTIAL,
                AtomEnum::CARDINAL,
                strut,
            )?
            .check()?;
        debug!("set_win_strut: id: {}, strut: {:?}", win, strut);
        Ok(())
    }

    /// Read an 8 bit property as Latin-1 text
    pub fn text_property(&self, win: xproto::Window, property: Atom) -> WindowManagerResult<Option<String>> {
        let reply = self._get_window_property(win, property, AtomEnum::ANY)?;
        if reply.type_ == x11rb::NONE || reply.format != 8 {
            return Ok(None);
        }
        Ok(Some(latin1_decode(&reply.value)))
    }

    /// Write a property
    pub fn set_property(&self, win: xproto::Window, property: Atom, value: &PropertyValue) -> WindowManagerResult<()> {
        match value {
            PropertyValue::Latin1(text) => self
                .conn
                .change_property8(PropMode::REPLACE, win, property, AtomEnum::STRING, &latin1_encode(text))?
                .check()?,
            PropertyValue::Cardinal(number) => self
                .conn
                .change_property32(PropMode::REPLACE, win, property, AtomEnum::CARDINAL, &[*number])?
                .check()?,
        }
        debug!("set_property: id: {}, property: {}, value: {:?}", win, property, value);
        Ok(())
    }

    /// Remove a property from the window
    pub fn delete_property(&self, win: xproto::Window, property: Atom) -> WindowManagerResult<()> {
        self.conn.delete_property(win, property)?.check()?;
        debug!("delete_property: id: {}, property: {}", win, property);
        Ok(())
    }

    /// Listen for property changes on the root window, this is where the client list and the
    /// active window are announced
    pub fn watch_root(&self) -> WindowManagerResult<()> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
        self.conn.change_window_attributes(self.root, &aux)?.check()?;
        debug!("watch_root: root: {}", self.root);
        Ok(())
    }

    /// Listen for name and geometry changes of a client window
    pub fn watch_win(&self, win: xproto::Window) -> WindowManagerResult<()> {
        let aux =
            ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY);
        self.conn.change_window_attributes(win, &aux)?.check()?;
        debug!("watch_win: id: {}", win);
        Ok(())
    }

    /// Return the next queued event without blocking
    pub fn poll_for_event(&self) -> WindowManagerResult<Option<Event>> {
        Ok(self.conn.poll_for_event()?)
    }

    /// True when the atom names one of the window name properties
    pub fn is_name_atom(&self, atom: Atom) -> bool {
        atom == self.atoms._NET_WM_VISIBLE_NAME || atom == self.atoms._NET_WM_NAME || atom == u32::from(AtomEnum::WM_NAME)
    }
}

// Walk up the tree until the parent is the root
fn toplevel_of<F>(win: xproto::Window, root: xproto::Window, mut parent: F) -> WindowManagerResult<xproto::Window>
where
    F: FnMut(xproto::Window) -> WindowManagerResult<xproto::Window>,
{
    let mut current = win;
    loop {
        let next = parent(current)?;
        if next == root || next == x11rb::NONE {
            return Ok(current);
        }
        current = next;
    }
}
