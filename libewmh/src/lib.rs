//! `libewmh` implements the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! as a way to integrate with EWMH compatible window managers. The EWHM spec builds on the lower
//! level Inter Client Communication Conventions Manual (ICCCM) to define interactions between
//! window managers, compositing managers and applications.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! The EWMH spec defines a number of properties that EWHM compliant window managers will maintain
//! and return to clients requesting information. `libewmh` taps into the message queue to retrieve
//! details about a given window and to than manipulate the given window as desired.
//!
//! `wmscript` uses `libewmh` to hand window details to user scripts and to carry out whatever the
//! scripts ask for; the [`EventTracker`] turns the raw X11 event stream into window lifecycle
//! events that decide which scripts run.
mod atoms;
mod error;
mod events;
mod model;
mod wm;
pub use error::*;
pub use events::{EventTracker, WmEvent};
pub use model::*;
pub use wm::{WindowManager, ALL_DESKTOPS, SOURCE_APPLICATION, SOURCE_PAGER};

/// All essential symbols in a simple consumable form
///
/// ### Examples
/// ```
/// use libewmh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::*;
}
