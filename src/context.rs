use crate::backend::WindowId;
use std::cell::Cell;

/// The window scripts are currently acting on.
///
/// The slot is shared by the dispatcher and every capability closure. Writers go through
/// [`ExecutionContext::enter`] which hands back a guard that puts the previous window back when
/// it is dropped, so nested invocations such as a geometry callback fired from inside a focus
/// script leave the outer script's window intact.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    current: Cell<Option<WindowId>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<WindowId> {
        self.current.get()
    }

    /// Make `win` current until the returned guard goes out of scope
    #[must_use = "the previous window is restored as soon as the guard is dropped"]
    pub fn enter(&self, win: Option<WindowId>) -> ContextGuard<'_> {
        let previous = self.current.replace(win);
        ContextGuard { ctx: self, previous }
    }
}

pub struct ContextGuard<'a> {
    ctx: &'a ExecutionContext,
    previous: Option<WindowId>,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.ctx.current.set(self.previous);
    }
}
