use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// `EngineResult<T>` provides a simplified result type with a common error type
pub type EngineResult<T> = std::result::Result<T, ErrorWrapper>;

/// EngineError defines the failures of the rule engine itself
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EngineError {
    FolderNotFound(PathBuf),
    FolderUnreadable(PathBuf),
    RulesScriptMissing(PathBuf),
    RulesScriptFailed(PathBuf, String),
    NoDisplay,
    WaylandSession,
}
impl std::error::Error for EngineError {}
impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EngineError::FolderNotFound(ref path) => write!(f, "script folder {} does not exist", path.display()),
            EngineError::FolderUnreadable(ref path) => write!(f, "script folder {} could not be read", path.display()),
            EngineError::RulesScriptMissing(ref path) => write!(f, "rules script {} was not found", path.display()),
            EngineError::RulesScriptFailed(ref path, ref msg) => {
                write!(f, "rules script {} failed: {}", path.display(), msg)
            },
            EngineError::NoDisplay => write!(f, "could not connect to the X11 display"),
            EngineError::WaylandSession => write!(f, "wayland sessions are not supported, an X11 display is required"),
        }
    }
}

/// Message of a failed Lua call. `mlua::Error` itself can't cross threads, this can.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LuaError(pub String);
impl std::error::Error for LuaError {}
impl fmt::Display for LuaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ErrorWrapper collects every error the engine can surface behind one type
#[derive(Debug)]
pub enum ErrorWrapper {
    Engine(EngineError),
    Io(std::io::Error),
    Lua(LuaError),
    Watch(notify::Error),
    WindowManager(libewmh::ErrorWrapper),
}
impl ErrorWrapper {
    /// Implemented directly on the `Error` type to reduce casting required
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.as_ref().is::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.as_ref().downcast_ref::<T>()
    }
}
impl StdError for ErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.as_ref())
    }
}

impl fmt::Display for ErrorWrapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorWrapper::Engine(ref err) => write!(f, "{}", err),
            ErrorWrapper::Io(ref err) => write!(f, "{}", err),
            ErrorWrapper::Lua(ref err) => write!(f, "{}", err),
            ErrorWrapper::Watch(ref err) => write!(f, "{}", err),
            ErrorWrapper::WindowManager(ref err) => write!(f, "{}", err),
        }
    }
}

impl AsRef<dyn StdError> for ErrorWrapper {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        match *self {
            ErrorWrapper::Engine(ref err) => err,
            ErrorWrapper::Io(ref err) => err,
            ErrorWrapper::Lua(ref err) => err,
            ErrorWrapper::Watch(ref err) => err,
            ErrorWrapper::WindowManager(ref err) => err,
        }
    }
}

impl From<EngineError> for ErrorWrapper {
    fn from(err: EngineError) -> ErrorWrapper {
        ErrorWrapper::Engine(err)
    }
}

impl From<std::io::Error> for ErrorWrapper {
    fn from(err: std::io::Error) -> ErrorWrapper {
        ErrorWrapper::Io(err)
    }
}

impl From<mlua::Error> for ErrorWrapper {
    fn from(err: mlua::Error) -> ErrorWrapper {
        ErrorWrapper::Lua(LuaError(err.to_string()))
    }
}

impl From<notify::Error> for ErrorWrapper {
    fn from(err: notify::Error) -> ErrorWrapper {
        ErrorWrapper::Watch(err)
    }
}

impl From<libewmh::ErrorWrapper> for ErrorWrapper {
    fn from(err: libewmh::ErrorWrapper) -> ErrorWrapper {
        ErrorWrapper::WindowManager(err)
    }
}
