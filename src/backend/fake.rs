//! In-memory window system for tests. Requests are recorded and, where it makes sense, applied
//! so that later queries see their effect.
use super::{WindowId, WindowSystem};
use libewmh::prelude::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    MoveResize { win: WindowId, x: Option<i32>, y: Option<i32>, w: Option<i32>, h: Option<i32> },
    Configure { win: WindowId, x: i32, y: i32, size: Option<(i32, i32)> },
    State { win: WindowId, add: bool, first: WinState, second: Option<WinState>, source: u32 },
    Minimize(WindowId),
    Activate(WindowId),
    Close(WindowId),
    Desktop(WindowId, u32),
    SwitchDesktop(u32),
    Decorated(WindowId, bool),
    Type(WindowId, String),
    Opacity(WindowId, f64),
    Strut(WindowId, [u32; 12]),
    SetProperty(WindowId, String, PropertyValue),
    DeleteProperty(WindowId, String),
    Subscribe(WindowId),
}

impl Request {
    /// True for everything that changes a window or the desktop
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Request::Subscribe(_))
    }
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub name: Option<String>,
    pub app_name: Option<String>,
    pub class: String,
    pub instance: String,
    pub role: Option<String>,
    pub window_type: WinType,
    pub pid: Option<u32>,
    pub frame: Rect,
    pub borders: (i32, i32, i32, i32),
    pub states: Vec<WinState>,
    pub decorated: bool,
    pub desktop: u32,
    pub properties: HashMap<String, String>,
}

impl FakeWindow {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            app_name: None,
            class: "Fake".to_owned(),
            instance: "fake".to_owned(),
            role: None,
            window_type: WinType::Normal,
            pid: None,
            frame: Rect::new(0, 0, 640, 480),
            borders: (0, 0, 0, 0),
            states: vec![],
            decorated: true,
            desktop: 0,
            properties: HashMap::new(),
        }
    }

    pub fn at(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }
}

pub struct FakeWindowSystem {
    windows: RefCell<HashMap<WindowId, FakeWindow>>,
    requests: RefCell<Vec<Request>>,
    failing: Cell<bool>,
    pub screen: (i32, i32),
    pub monitors: Vec<Rect>,
    pub workarea: Option<Rect>,
    pub viewport: Option<(i32, i32)>,
    pub desktops: u32,
    pub current_desktop: u32,
}

impl Default for FakeWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeWindowSystem {
    /// Single 1920x1080 monitor with a 32 pixel panel at the top and four desktops
    pub fn new() -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            requests: RefCell::new(vec![]),
            failing: Cell::new(false),
            screen: (1920, 1080),
            monitors: vec![Rect::new(0, 0, 1920, 1080)],
            workarea: Some(Rect::new(0, 32, 1920, 1048)),
            viewport: Some((0, 0)),
            desktops: 4,
            current_desktop: 0,
        }
    }

    pub fn with_window(self, win: WindowId, window: FakeWindow) -> Self {
        self.add_window(win, window);
        self
    }

    pub fn add_window(&self, win: WindowId, window: FakeWindow) {
        self.windows.borrow_mut().insert(win, window);
    }

    pub fn window(&self, win: WindowId) -> Option<FakeWindow> {
        self.windows.borrow().get(&win).cloned()
    }

    pub fn rename(&self, win: WindowId, name: &str) {
        if let Some(window) = self.windows.borrow_mut().get_mut(&win) {
            window.name = Some(name.to_owned());
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<Request> {
        self.requests.borrow().iter().filter(|r| r.is_mutation()).cloned().collect()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    /// Make every following request fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn record(&self, request: Request) -> WindowManagerResult<()> {
        self.requests.borrow_mut().push(request);
        if self.failing.get() {
            return Err(WindowManagerError::PropertyNotFound("fake".to_owned()).into());
        }
        Ok(())
    }

    // Requests for unknown windows go nowhere, like client messages sent for a window that is gone
    fn update<F: FnOnce(&mut FakeWindow)>(&self, win: WindowId, f: F) -> WindowManagerResult<()> {
        if let Some(window) = self.windows.borrow_mut().get_mut(&win) {
            f(window);
        }
        Ok(())
    }

    fn read<T, F: FnOnce(&FakeWindow) -> T>(&self, win: WindowId, f: F) -> Option<T> {
        self.windows.borrow().get(&win).map(f)
    }
}

impl WindowSystem for FakeWindowSystem {
    fn name(&self, win: WindowId) -> Option<String> {
        self.read(win, |w| w.name.clone()).flatten()
    }

    fn app_name(&self, win: WindowId) -> Option<String> {
        self.read(win, |w| w.app_name.clone().or_else(|| w.name.clone())).flatten()
    }

    fn class(&self, win: WindowId) -> Option<String> {
        self.read(win, |w| w.class.clone())
    }

    fn instance(&self, win: WindowId) -> Option<String> {
        self.read(win, |w| w.instance.clone())
    }

    fn role(&self, win: WindowId) -> Option<String> {
        self.read(win, |w| w.role.clone()).flatten()
    }

    fn window_type(&self, win: WindowId) -> Option<WinType> {
        self.read(win, |w| w.window_type)
    }

    fn pid(&self, win: WindowId) -> Option<u32> {
        self.read(win, |w| w.pid).flatten()
    }

    fn frame_geometry(&self, win: WindowId) -> Option<Rect> {
        self.read(win, |w| w.frame)
    }

    fn client_geometry(&self, win: WindowId) -> Option<Rect> {
        self.read(win, |w| {
            let (l, r, t, b) = w.borders;
            Rect::new(w.frame.x + l, w.frame.y + t, w.frame.width - l - r, w.frame.height - t - b)
        })
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn states(&self, win: WindowId) -> Vec<WinState> {
        self.read(win, |w| w.states.clone()).unwrap_or_default()
    }

    fn is_decorated(&self, win: WindowId) -> bool {
        self.read(win, |w| w.decorated).unwrap_or(true)
    }

    fn desktop(&self, win: WindowId) -> Option<u32> {
        self.read(win, |w| w.desktop)
    }

    fn current_desktop(&self) -> Option<u32> {
        Some(self.current_desktop)
    }

    fn desktop_count(&self) -> Option<u32> {
        Some(self.desktops)
    }

    fn monitors(&self) -> Vec<Rect> {
        self.monitors.clone()
    }

    fn workarea(&self) -> Option<Rect> {
        self.workarea
    }

    fn viewport(&self) -> Option<(i32, i32)> {
        self.viewport
    }

    fn property(&self, win: WindowId, name: &str) -> Option<String> {
        self.read(win, |w| w.properties.get(name).cloned()).flatten()
    }

    fn move_resize(
        &self, win: WindowId, x: Option<i32>, y: Option<i32>, w: Option<i32>, h: Option<i32>,
    ) -> WindowManagerResult<()> {
        self.record(Request::MoveResize { win, x, y, w, h })?;
        self.update(win, |window| {
            let f = &mut window.frame;
            *f = Rect::new(x.unwrap_or(f.x), y.unwrap_or(f.y), w.unwrap_or(f.width), h.unwrap_or(f.height));
        })
    }

    fn configure(&self, win: WindowId, x: i32, y: i32, size: Option<(i32, i32)>) -> WindowManagerResult<()> {
        self.record(Request::Configure { win, x, y, size })?;
        self.update(win, |window| {
            let (w, h) = size.unwrap_or((window.frame.width, window.frame.height));
            window.frame = Rect::new(x, y, w, h);
        })
    }

    fn change_state(
        &self, win: WindowId, add: bool, first: WinState, second: Option<WinState>, source: u32,
    ) -> WindowManagerResult<()> {
        self.record(Request::State { win, add, first, second, source })?;
        self.update(win, |window| {
            for state in std::iter::once(first).chain(second) {
                window.states.retain(|s| *s != state);
                if add {
                    window.states.push(state);
                }
            }
        })
    }

    fn minimize(&self, win: WindowId) -> WindowManagerResult<()> {
        self.record(Request::Minimize(win))?;
        self.update(win, |window| window.states.push(WinState::Hidden))
    }

    fn activate(&self, win: WindowId) -> WindowManagerResult<()> {
        self.record(Request::Activate(win))?;
        self.update(win, |window| window.states.retain(|s| *s != WinState::Hidden))
    }

    fn close(&self, win: WindowId) -> WindowManagerResult<()> {
        self.record(Request::Close(win))
    }

    fn set_desktop(&self, win: WindowId, desktop: u32) -> WindowManagerResult<()> {
        self.record(Request::Desktop(win, desktop))?;
        self.update(win, |window| window.desktop = desktop)
    }

    fn switch_desktop(&self, desktop: u32) -> WindowManagerResult<()> {
        self.record(Request::SwitchDesktop(desktop))
    }

    fn set_decorated(&self, win: WindowId, decorated: bool) -> WindowManagerResult<()> {
        self.record(Request::Decorated(win, decorated))?;
        self.update(win, |window| window.decorated = decorated)
    }

    fn set_window_type(&self, win: WindowId, name: &str) -> WindowManagerResult<()> {
        self.record(Request::Type(win, name.to_owned()))
    }

    fn set_opacity(&self, win: WindowId, opacity: f64) -> WindowManagerResult<()> {
        self.record(Request::Opacity(win, opacity))
    }

    fn set_strut(&self, win: WindowId, strut: &[u32; 12]) -> WindowManagerResult<()> {
        self.record(Request::Strut(win, *strut))
    }

    fn set_property(&self, win: WindowId, name: &str, value: &PropertyValue) -> WindowManagerResult<()> {
        self.record(Request::SetProperty(win, name.to_owned(), value.clone()))?;

        // Only 8 bit text reads back, numbers replace the property but can't be read as text
        self.update(win, |window| match value {
            PropertyValue::Latin1(text) => {
                window.properties.insert(name.to_owned(), text.clone());
            },
            PropertyValue::Cardinal(_) => {
                window.properties.remove(name);
            },
        })
    }

    fn delete_property(&self, win: WindowId, name: &str) -> WindowManagerResult<()> {
        self.record(Request::DeleteProperty(win, name.to_owned()))?;
        self.update(win, |window| {
            window.properties.remove(name);
        })
    }

    fn subscribe(&self, win: WindowId) -> WindowManagerResult<()> {
        self.record(Request::Subscribe(win))
    }
}
