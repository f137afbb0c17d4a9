//! `wmscript` runs small Lua scripts against X11 windows as they open, close, gain or lose focus
//! and change their title. It works along side any [EWMH](https://specifications.freedesktop.org/wm-spec/latest/)
//! compatible window manager, scripts ask about the window they were started for and can move,
//! resize, maximize, pin, decorate or otherwise change it.
//!
//! Scripts live in a single folder, `~/.config/wmscript` by default. The rules script
//! `wmscript.lua` in that folder decides which script runs for which event; every script it
//! doesn't mention runs when a window opens.
//!
//! ## Command line examples
//!
//! ### Run the scripts
//! ```bash
//! wmscript
//! ```
//!
//! ### Try out new scripts
//! Run the scripts from another folder with debug output but leave every window alone.
//! ```bash
//! wmscript --debug --emulate --folder ~/scripts
//! ```
//!
//! ### Rules script
//! ```lua
//! scripts_window_focus = { "focus.lua" }
//! scripts_window_close = { "goodbye.lua" }
//! scripts_modules = { "helpers.lua" }
//! ```
mod backend;
mod capabilities;
mod config;
mod context;
mod dispatch;
mod engine;
mod error;
mod registry;
mod watch;

use std::env;
use std::process;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};
use config::Options;
use dispatch::Dispatcher;
use error::EngineError;
use libewmh::{EventTracker, WindowManager};
use signal_hook::consts::SIGINT;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;
use watch::FolderWatcher;
use witcher::prelude::*;

/// How long to wait on the script folder before checking for window events again
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn cli() -> Command {
    Command::new("wmscript")
        .about(crate_description!())
        .version(crate_version!())
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version and quit"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Print debug info and script output to stdout"),
        )
        .arg(
            Arg::new("emulate")
                .short('e')
                .long("emulate")
                .action(ArgAction::SetTrue)
                .help("Run the scripts but don't change any window"),
        )
        .arg(
            Arg::new("folder")
                .short('f')
                .long("folder")
                .value_name("FOLDER")
                .help("Search for scripts in this folder instead of the default"),
        )
        .arg(
            Arg::new("lua-version")
                .short('l')
                .long("lua-version")
                .action(ArgAction::SetTrue)
                .help("Print the Lua version and quit"),
        )
}

fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).wrap("Failed to set up logging")
}

// Point Wayland users at the actual problem
fn display_error() -> EngineError {
    if env::var_os("WAYLAND_DISPLAY").is_some() {
        EngineError::WaylandSession
    } else {
        EngineError::NoDisplay
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("lua-version") {
        println!("{}", engine::lua_version().wrap("Failed to start the Lua interpreter")?);
        return Ok(());
    }

    let debug = matches.get_flag("debug");
    init_logging(debug)?;

    let folder = matches.get_one::<String>("folder").map(|x| x.as_str());
    let folder = config::resolve_folder(folder).wrap("Failed to find the script folder")?;
    let opts = Options { folder, debug, emulate: matches.get_flag("emulate") };
    debug!("run: {:?}", opts);

    // Ctrl-C ends the process right away, whatever script is running
    signal_hook::flag::register_conditional_shutdown(SIGINT, 1, Arc::new(AtomicBool::new(true)))
        .wrap("Failed to register the interrupt handler")?;

    let wm = WindowManager::connect().map_err(|e| {
        debug!("connect: {}", e);
        display_error()
    });
    let wm = Rc::new(wm.wrap("Failed to connect to the window manager")?);
    match wm.winmgr() {
        Ok((_, name)) => debug!("run: window manager: {}", name),
        Err(e) => warn!("run: no EWMH compatible window manager found: {}", e),
    }

    let mut dispatcher = match Dispatcher::start(&opts, wm.clone()).wrap("Failed to load the scripts")? {
        Some(dispatcher) => dispatcher,
        None => return Ok(()),
    };

    // Windows that already exist get the same treatment as new ones
    let mut tracker = EventTracker::new();
    for event in tracker.prime(&wm).wrap("Failed to watch the root window")? {
        dispatcher.handle_window_event(event);
    }

    let watcher = FolderWatcher::new(&opts.folder).wrap("Failed to watch the script folder")?;
    loop {
        while let Some(event) = wm.poll_for_event().wrap("Lost the connection to the X11 server")? {
            for event in tracker.translate(&wm, &event) {
                dispatcher.handle_window_event(event);
            }
        }
        for change in watcher.wait(POLL_INTERVAL) {
            dispatcher.handle_fs_change(&change);
        }
    }
}

fn main() {
    if let Err(err) = run(&cli().get_matches()) {
        eprintln!("{:?}", err);
        process::exit(1);
    }
}
