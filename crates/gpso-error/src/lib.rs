use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

pub type GpsoResult<T> = Result<T, GpsoError>;

/// Coarse classification of a [GpsoError], mirroring the four error kinds
/// the optimizer distinguishes: bad configuration, numerical failure in the
/// surrogate, an exhausted search frontier, and an observer hook that
/// propagated an error of its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Configuration,
    Numerical,
    SearchExhausted,
    Observer,
    Multiple,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

/// The error type surfaced by every fallible gpso operation.
///
/// `Configuration` and `SearchExhausted` are reported as-is; `Numerical`
/// is only ever surfaced after the surrogate's internal noise-bump retry
/// ramp (see `GPConfig::LIK_BND`) has been exhausted. `Observer` wraps an
/// error raised from inside a `PostInitialise`/`PostIteration`/`PostUpdate`/
/// `PreFinalise` hook.
#[derive(Debug)]
pub enum GpsoError {
    Configuration {
        message: ErrString,
    },
    Numerical {
        message: ErrString,
    },
    SearchExhausted {
        message: ErrString,
    },
    Observer {
        message: ErrString,
    },

    Multiple(MultiDisplay),

    Context {
        context: ErrorContext,
        source: Box<GpsoError>,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
}

impl GpsoError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { .. } => ErrorCode::Configuration,
            Self::Numerical { .. } => ErrorCode::Numerical,
            Self::SearchExhausted { .. } => ErrorCode::SearchExhausted,
            Self::Observer { .. } => ErrorCode::Observer,
            Self::Multiple(_) => ErrorCode::Multiple,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        GpsoError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        }
    }

    /// `false` only for `SearchExhausted`: spec.md §7 kind 3 treats an
    /// exhausted search frontier as a warning that ends the run early with
    /// whatever has been found, not a fatal condition. Every other variant
    /// — including `Numerical`, which is only ever constructed once the
    /// log-noise retry ramp has already failed — is surfaced as fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SearchExhausted { .. })
    }
}

impl Display for GpsoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "configuration error: {}", message),
            Self::Numerical { message } => write!(f, "numerical-stability error: {}", message),
            Self::SearchExhausted { message } => write!(f, "search exhausted: {}", message),
            Self::Observer { message } => write!(f, "observer error: {}", message),
            Self::Multiple(m) => write!(f, "multiple errors:\n{}", m),
            Self::Context {
                context, source, ..
            } => write!(f, "{}\nCaused by: {}", context, source),
        }
    }
}

impl std::error::Error for GpsoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}
impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}
impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for ErrorContext {}

#[derive(Debug)]
pub struct MultiDisplay(Vec<GpsoError>);
impl Display for MultiDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {} (code: {:?})", i, e, e.code())?;
        }
        Ok(())
    }
}
impl From<Vec<GpsoError>> for MultiDisplay {
    fn from(v: Vec<GpsoError>) -> Self {
        Self(v)
    }
}

// Ergonomic Result extensions (context)
pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> GpsoResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> GpsoResult<T>;
}

impl<T, E: Into<GpsoError>> ResultExt<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> GpsoResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> GpsoResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

pub trait IntoGpsoError<T> {
    fn into_gpso_error(self) -> GpsoResult<T>;
}
impl<T, E: Into<GpsoError>> IntoGpsoError<T> for Result<T, E> {
    fn into_gpso_error(self) -> GpsoResult<T> {
        self.map_err(Into::into)
    }
}

#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! gpso_err {
    (Configuration: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::GpsoError::Configuration { message: format!($fmt, $($arg),*).into() })
    };
    (Numerical: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::GpsoError::Numerical { message: format!($fmt, $($arg),*).into() })
    };
    (SearchExhausted: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::GpsoError::SearchExhausted { message: format!($fmt, $($arg),*).into() })
    };
    (Observer: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::GpsoError::Observer { message: format!($fmt, $($arg),*).into() })
    };
    ($variant:ident: $msg:expr $(,)?) => {{
        $crate::__private::must_use($crate::GpsoError::Configuration { message: $msg.into() })
    }};
}

#[macro_export]
macro_rules! gpso_bail {
    ($($tt:tt)+) => { return Err($crate::gpso_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::gpso_bail!($($tt)+); }
    };
}
