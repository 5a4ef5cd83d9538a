use thiserror::Error;

/// Errors surfaced by the SDK bindings.
///
/// Lookups that may legitimately find nothing (`find`, `lookup`) return `Option` instead.
#[derive(Debug, Error)]
pub enum XplmError {
    #[error("host library not available: {0}")]
    LibraryUnavailable(String),
    #[error("host symbol not exported: {symbol}")]
    MissingSymbol { symbol: &'static str },
    #[error("host function table already installed")]
    AlreadyInstalled,
    #[error("host refused to create {what}")]
    CreateFailed { what: &'static str },
    #[error("unsupported host: {0}")]
    Unsupported(String),
    #[error("string contains an interior NUL byte")]
    InteriorNul,
    #[error("string of {len} bytes does not fit a {capacity} byte host buffer")]
    StringTooLong { len: usize, capacity: usize },
    #[error("request cancelled by a newer request")]
    Cancelled,
    #[error("host error: {0}")]
    Host(String),
    #[error("config: {0}")]
    Config(String),
}

pub type XplmResult<T> = Result<T, XplmError>;

impl XplmError {
    #[inline]
    pub(crate) fn create_failed(what: &'static str) -> Self {
        log::warn!(target: "fbw_xplm", "host refused to create {what}");
        Self::CreateFailed { what }
    }
}

impl From<std::ffi::NulError> for XplmError {
    #[inline]
    fn from(_: std::ffi::NulError) -> Self {
        Self::InteriorNul
    }
}
