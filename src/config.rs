use crate::error::{EngineError, EngineResult};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rules script every script folder must contain
pub const RULES_SCRIPT: &str = "wmscript.lua";

/// Name of the folder created under the user's config dir
pub const APP_FOLDER: &str = "wmscript";

/// Run mode switches the capability surface cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode {
    /// Echo `debug_print` output and bucket listings
    pub debug: bool,
    /// Run scripts but leave every window untouched
    pub emulate: bool,
}

/// Options parsed from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub folder: PathBuf,
    pub debug: bool,
    pub emulate: bool,
}

impl Options {
    pub fn new<T: Into<PathBuf>>(folder: T) -> Self {
        Self { folder: folder.into(), debug: false, emulate: false }
    }

    pub fn mode(&self) -> Mode {
        Mode { debug: self.debug, emulate: self.emulate }
    }
}

/// Default script folder i.e. `~/.config/wmscript`
pub fn default_folder() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_FOLDER))
}

/// Resolve the script folder. A folder given on the command line has to exist already while
/// the default one is created on first run.
pub fn resolve_folder(arg: Option<&str>) -> EngineResult<PathBuf> {
    match arg {
        Some(folder) => {
            let path = PathBuf::from(folder);
            if !path.is_dir() {
                return Err(EngineError::FolderNotFound(path).into());
            }
            Ok(path)
        },
        None => {
            let path = default_folder().ok_or_else(|| EngineError::FolderNotFound(PathBuf::from(APP_FOLDER)))?;
            ensure_folder(&path)?;
            Ok(path)
        },
    }
}

/// Create the folder, readable by the owner only, if it doesn't exist yet
pub fn ensure_folder(path: &Path) -> EngineResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    DirBuilder::new().recursive(true).mode(0o700).create(path)?;
    debug!("ensure_folder: created {}", path.display());
    Ok(())
}
