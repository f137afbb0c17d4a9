use std::fmt;

use crate::atoms::AtomCollection;

/// WinGravity
/// Gravity is defined as the lower byte of the move resize flags 32bit value
/// <https://tronche.com/gui/x/xlib/window/attributes/gravity.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinGravity {
    Current,
    NorthWest,
    Center,
    Static,
}

// Implement format! support
impl fmt::Display for WinGravity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl From<u32> for WinGravity {
    fn from(val: u32) -> Self {
        match val {
            1 => WinGravity::NorthWest,
            5 => WinGravity::Center,
            10 => WinGravity::Static,
            _ => WinGravity::Current,
        }
    }
}

impl From<WinGravity> for u32 {
    fn from(val: WinGravity) -> Self {
        match val {
            WinGravity::Current => 0,
            WinGravity::NorthWest => 1,
            WinGravity::Center => 5,
            WinGravity::Static => 10,
        }
    }
}

/// Rectangle in root window coordinates. Signed throughout so that monitor arithmetic can go
/// negative without wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Area shared by both rectangles, zero when they don't touch
    pub fn overlap(&self, other: &Rect) -> i64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0 || h <= 0 {
            0
        } else {
            w as i64 * h as i64
        }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// Grow the rectangle outward by the given border widths
    pub fn grow(&self, left: u32, right: u32, top: u32, bottom: u32) -> Rect {
        Rect::new(
            self.x - left as i32,
            self.y - top as i32,
            self.width + (left + right) as i32,
            self.height + (top + bottom) as i32,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// WinState provides an easy way to identify the different window states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinState {
    Above,
    Below,
    DemandsAttention,
    Focused,
    Fullscreen,
    Hidden,
    MaxVert,
    MaxHorz,
    Modal,
    Shaded,
    SkipPager,
    SkipTaskbar,
    Sticky,
    Other(u32),
}

// Convert from u32 to State
impl WinState {
    pub fn from(atoms: &AtomCollection, val: u32) -> WinState {
        match val {
            _ if val == atoms._NET_WM_STATE_ABOVE => WinState::Above,
            _ if val == atoms._NET_WM_STATE_BELOW => WinState::Below,
            _ if val == atoms._NET_WM_STATE_DEMANDS_ATTENTION => WinState::DemandsAttention,
            _ if val == atoms._NET_WM_STATE_FOCUSED => WinState::Focused,
            _ if val == atoms._NET_WM_STATE_FULLSCREEN => WinState::Fullscreen,
            _ if val == atoms._NET_WM_STATE_HIDDEN => WinState::Hidden,
            _ if val == atoms._NET_WM_STATE_MAXIMIZED_VERT => WinState::MaxVert,
            _ if val == atoms._NET_WM_STATE_MAXIMIZED_HORZ => WinState::MaxHorz,
            _ if val == atoms._NET_WM_STATE_MODAL => WinState::Modal,
            _ if val == atoms._NET_WM_STATE_SHADED => WinState::Shaded,
            _ if val == atoms._NET_WM_STATE_SKIP_PAGER => WinState::SkipPager,
            _ if val == atoms._NET_WM_STATE_SKIP_TASKBAR => WinState::SkipTaskbar,
            _ if val == atoms._NET_WM_STATE_STICKY => WinState::Sticky,
            _ => WinState::Other(val),
        }
    }

    /// Atom to send in a `_NET_WM_STATE` client message
    pub fn atom(&self, atoms: &AtomCollection) -> u32 {
        match self {
            WinState::Above => atoms._NET_WM_STATE_ABOVE,
            WinState::Below => atoms._NET_WM_STATE_BELOW,
            WinState::DemandsAttention => atoms._NET_WM_STATE_DEMANDS_ATTENTION,
            WinState::Focused => atoms._NET_WM_STATE_FOCUSED,
            WinState::Fullscreen => atoms._NET_WM_STATE_FULLSCREEN,
            WinState::Hidden => atoms._NET_WM_STATE_HIDDEN,
            WinState::MaxVert => atoms._NET_WM_STATE_MAXIMIZED_VERT,
            WinState::MaxHorz => atoms._NET_WM_STATE_MAXIMIZED_HORZ,
            WinState::Modal => atoms._NET_WM_STATE_MODAL,
            WinState::Shaded => atoms._NET_WM_STATE_SHADED,
            WinState::SkipPager => atoms._NET_WM_STATE_SKIP_PAGER,
            WinState::SkipTaskbar => atoms._NET_WM_STATE_SKIP_TASKBAR,
            WinState::Sticky => atoms._NET_WM_STATE_STICKY,
            WinState::Other(atom) => *atom,
        }
    }
}

// Implement format! support
impl fmt::Display for WinState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinState::Other(_) => write!(f, ""),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}

/// WinType provides an easy way to identify the different window types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinType {
    Combo,
    Desktop,
    Dialog,
    DND,
    Dock,
    DropDownMenu,
    Menu,
    Normal,
    Notification,
    PopupMenu,
    Splash,
    Toolbar,
    ToolTip,
    Utility,
    Other(u32),
}

// Convert from u32 to Type
impl WinType {
    pub fn from(atoms: &AtomCollection, val: u32) -> WinType {
        match val {
            _ if val == atoms._NET_WM_WINDOW_TYPE_COMBO => WinType::Combo,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DESKTOP => WinType::Desktop,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DIALOG => WinType::Dialog,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DND => WinType::DND,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DOCK => WinType::Dock,
            _ if val == atoms._NET_WM_WINDOW_TYPE_DROPDOWN_MENU => WinType::DropDownMenu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_MENU => WinType::Menu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_NORMAL => WinType::Normal,
            _ if val == atoms._NET_WM_WINDOW_TYPE_NOTIFICATION => WinType::Notification,
            _ if val == atoms._NET_WM_WINDOW_TYPE_POPUP_MENU => WinType::PopupMenu,
            _ if val == atoms._NET_WM_WINDOW_TYPE_SPLASH => WinType::Splash,
            _ if val == atoms._NET_WM_WINDOW_TYPE_TOOLBAR => WinType::Toolbar,
            _ if val == atoms._NET_WM_WINDOW_TYPE_TOOLTIP => WinType::ToolTip,
            _ if val == atoms._NET_WM_WINDOW_TYPE_UTILITY => WinType::Utility,
            _ => WinType::Other(val),
        }
    }

    /// Name scripts compare against. Only the classic pager categories are distinguished, the
    /// rest collapse into `WINDOW_TYPE_UNRECOGNIZED`.
    pub fn script_name(&self) -> &'static str {
        match self {
            WinType::Normal => "WINDOW_TYPE_NORMAL",
            WinType::Desktop => "WINDOW_TYPE_DESKTOP",
            WinType::Dock => "WINDOW_TYPE_DOCK",
            WinType::Dialog => "WINDOW_TYPE_DIALOG",
            WinType::Toolbar => "WINDOW_TYPE_TOOLBAR",
            WinType::Menu => "WINDOW_TYPE_MENU",
            WinType::Utility => "WINDOW_TYPE_UTILITY",
            WinType::Splash => "WINDOW_TYPE_SPLASHSCREEN",
            _ => "WINDOW_TYPE_UNRECOGNIZED",
        }
    }
}

// Implement format! support
impl fmt::Display for WinType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinType::Other(_) => write!(f, ""),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}

/// Expand the short spellings scripts use for window types into the full atom name
///
/// ### Examples
/// ```
/// use libewmh::prelude::*;
/// assert_eq!(window_type_atom_name("WINDOW_TYPE_DOCK"), "_NET_WM_WINDOW_TYPE_DOCK");
/// assert_eq!(window_type_atom_name("dialog"), "_NET_WM_WINDOW_TYPE_DIALOG");
/// ```
pub fn window_type_atom_name(name: &str) -> String {
    if name.starts_with("_NET_WM_WINDOW_TYPE_") {
        name.to_owned()
    } else if name.starts_with("WINDOW_TYPE_") {
        format!("_NET_WM_{}", name)
    } else {
        format!("_NET_WM_WINDOW_TYPE_{}", name.to_uppercase())
    }
}

/// PropertyValue is the encoded form of a window property write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// `STRING`/8, Latin-1 text
    Latin1(String),
    /// `CARDINAL`/32
    Cardinal(u32),
}

/// Encode text as Latin-1, replacing anything outside the range with `?`
pub fn latin1_encode(text: &str) -> Vec<u8> {
    text.chars().map(|c| if (c as u32) < 0x100 { c as u32 as u8 } else { b'?' }).collect()
}

/// Decode Latin-1 bytes, every byte maps straight onto a code point
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
