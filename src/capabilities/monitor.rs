//! Monitor selection and the geometry arithmetic built on it.
use libewmh::Rect;

/// Which monitor a script means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorSelector {
    /// Every connected monitor treated as one desktop
    AllMonitorsAsOne,
    /// The monitor the window is mostly on
    CurrentWindowMonitor,
    /// Zero based monitor index
    Index(usize),
}

impl MonitorSelector {
    /// Scripts number monitors from 1, use 0 for the window's own monitor and -1 for all of
    /// them together. Anything below -1 selects nothing.
    pub fn from_script(n: i32) -> Option<Self> {
        match n {
            -1 => Some(MonitorSelector::AllMonitorsAsOne),
            0 => Some(MonitorSelector::CurrentWindowMonitor),
            n if n > 0 => Some(MonitorSelector::Index((n - 1) as usize)),
            _ => None,
        }
    }

    /// Indexes past the last monitor fall back to the window's own monitor
    pub fn clamp(self, count: usize) -> Self {
        match self {
            MonitorSelector::Index(i) if i >= count => MonitorSelector::CurrentWindowMonitor,
            other => other,
        }
    }
}

/// Index of the monitor showing the largest part of the window, the first one wins ties
pub fn monitor_index(monitors: &[Rect], window: &Rect) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, monitor) in monitors.iter().enumerate() {
        let overlap = monitor.overlap(window);
        if overlap > 0 && best.map_or(true, |(_, area)| overlap > area) {
            best = Some((i, overlap));
        }
    }
    best.map(|(i, _)| i)
}

/// Bounding box of every monitor
pub fn combined(monitors: &[Rect]) -> Option<Rect> {
    let (first, rest) = monitors.split_first()?;
    Some(rest.iter().fold(*first, |acc, m| acc.union(m)))
}

/// Geometry of the selected monitor, `None` when it doesn't exist
pub fn monitor_geometry(selector: MonitorSelector, monitors: &[Rect], window: Option<&Rect>) -> Option<Rect> {
    match selector {
        MonitorSelector::AllMonitorsAsOne => combined(monitors),
        MonitorSelector::CurrentWindowMonitor => {
            window.and_then(|w| monitor_index(monitors, w)).and_then(|i| monitors.get(i).copied())
        },
        MonitorSelector::Index(i) => monitors.get(i).copied(),
    }
}

/// Which axes `center` works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    Both,
}

impl Axis {
    /// Only the first letter counts, case insensitive
    pub fn from_script(s: &str) -> Self {
        match s.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('H') => Axis::Horizontal,
            Some('V') => Axis::Vertical,
            _ => Axis::Both,
        }
    }

    fn horizontal(&self) -> bool {
        matches!(self, Axis::Horizontal | Axis::Both)
    }

    fn vertical(&self) -> bool {
        matches!(self, Axis::Vertical | Axis::Both)
    }
}

/// Position that centers the window in `bounds` along the chosen axes. The other axis is only
/// pulled back inside the bounds if the window sticks out.
pub fn centered(window: &Rect, bounds: &Rect, axis: Axis) -> (i32, i32) {
    let x = if axis.horizontal() {
        bounds.x + (bounds.width - window.width) / 2
    } else {
        keep_inside(window.x, window.width, bounds.x, bounds.width)
    };
    let y = if axis.vertical() {
        bounds.y + (bounds.height - window.height) / 2
    } else {
        keep_inside(window.y, window.height, bounds.y, bounds.height)
    };
    (x, y)
}

fn keep_inside(pos: i32, len: i32, start: i32, span: i32) -> i32 {
    if pos < start {
        start
    } else if pos + len >= start + span {
        start + span - len
    } else {
        pos
    }
}

/// Move the window from one monitor to another keeping its offset from the top left corner,
/// then pull it back inside the target if it doesn't fit
pub fn relocate(window: &Rect, from: &Rect, to: &Rect) -> (i32, i32) {
    let x = to.x + (window.x - from.x);
    let y = to.y + (window.y - from.y);
    let x = x.min(to.right() - window.width).max(to.x);
    let y = y.min(to.bottom() - window.height).max(to.y);
    (x, y)
}
