use std::error::Error as StdError;
use std::fmt;

/// `WindowManagerResult<T>` provides a simplified result type with a common error type
pub type WindowManagerResult<T> = std::result::Result<T, ErrorWrapper>;

/// WindowManagerError defines all the internal errors that `libewmh` might return
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WindowManagerError {
    InvalidAtom(String),
    InvalidOpacity(String),
    PropertyNotFound(String),
}
impl std::error::Error for WindowManagerError {}
impl fmt::Display for WindowManagerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WindowManagerError::InvalidAtom(ref err) => write!(f, "invalid atom was given: {}", err),
            WindowManagerError::InvalidOpacity(ref err) => write!(f, "invalid opacity was given: {}", err),
            WindowManagerError::PropertyNotFound(ref err) => write!(f, "property {} was not found", err),
        }
    }
}

/// ErrorWrapper provides wrapper around all the underlying library dependencys that `libewmh` uses
/// such that we can easily surface all errors from `libewmh` in a single easy way.
#[derive(Debug)]
pub enum ErrorWrapper {
    WindowManager(WindowManagerError),

    // std::str::Utf8Error
    Utf8(std::str::Utf8Error),

    // x11rb errors
    Connect(x11rb::errors::ConnectError),
    Connection(x11rb::errors::ConnectionError),
    Reply(x11rb::errors::ReplyError),
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

    /// True when the error only says that a window or one of its properties is gone. Script
    /// queries treat these as "no value" rather than as failures worth reporting.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ErrorWrapper::WindowManager(WindowManagerError::PropertyNotFound(_))
                | ErrorWrapper::Reply(x11rb::errors::ReplyError::X11Error(_))
        )
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
            ErrorWrapper::WindowManager(ref err) => write!(f, "{}", err),
            ErrorWrapper::Utf8(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connect(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connection(ref err) => write!(f, "{}", err),
            ErrorWrapper::Reply(ref err) => write!(f, "{}", err),
        }
    }
}

impl AsRef<dyn StdError> for ErrorWrapper {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        match *self {
            ErrorWrapper::WindowManager(ref err) => err,
            ErrorWrapper::Utf8(ref err) => err,
            ErrorWrapper::Connect(ref err) => err,
            ErrorWrapper::Connection(ref err) => err,
            ErrorWrapper::Reply(ref err) => err,
        }
    }
}

impl From<WindowManagerError> for ErrorWrapper {
    fn from(err: WindowManagerError) -> ErrorWrapper {
        ErrorWrapper::WindowManager(err)
    }
}

impl From<std::str::Utf8Error> for ErrorWrapper {
    fn from(err: std::str::Utf8Error) -> ErrorWrapper {
        ErrorWrapper::Utf8(err)
    }
}

// x11rb errors
//--------------------------------------------------------------------------------------------------
impl From<x11rb::errors::ConnectError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectError) -> ErrorWrapper {
        ErrorWrapper::Connect(err)
    }
}

impl From<x11rb::errors::ConnectionError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectionError) -> ErrorWrapper {
        ErrorWrapper::Connection(err)
    }
}

impl From<x11rb::errors::ReplyError> for ErrorWrapper {
    fn from(err: x11rb::errors::ReplyError) -> ErrorWrapper {
        ErrorWrapper::Reply(err)
    }
}
