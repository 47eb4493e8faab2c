//! Error types and the driver diagnostic formatter.
//!
//! Every state-mutating or object-creating driver call is followed by a
//! [`check_gl!`](crate::check_gl) which turns a raised driver error flag into an
//! [`Error::Driver`] carrying the call expression and the source location.

use std::fmt;

use thiserror::Error;

use crate::driver::Gl;

/// Symbolic name of a driver error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    InvalidValue,
    InvalidEnum,
    InvalidOperation,
    InvalidFramebufferOperation,
    Unknown(u32),
}

impl DriverErrorKind {
    /// Maps a `glGetError` code to its kind. `GL_NO_ERROR` maps to `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            glow::NO_ERROR => None,
            glow::INVALID_VALUE => Some(Self::InvalidValue),
            glow::INVALID_ENUM => Some(Self::InvalidEnum),
            glow::INVALID_OPERATION => Some(Self::InvalidOperation),
            glow::INVALID_FRAMEBUFFER_OPERATION => Some(Self::InvalidFramebufferOperation),
            other => Some(Self::Unknown(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidValue => "GL_INVALID_VALUE",
            Self::InvalidEnum => "GL_INVALID_ENUM",
            Self::InvalidOperation => "GL_INVALID_OPERATION",
            Self::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            Self::Unknown(_) => "(UNKNOWN_OPENGL_ERROR)",
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type of every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A driver call raised the error flag.
    #[error("{file}:{line}: '{call}' -> {kind}")]
    Driver {
        kind: DriverErrorKind,
        call: &'static str,
        file: &'static str,
        line: u32,
    },
    /// A shader stage failed to compile. Carries the full source for
    /// line-correlated diagnostics.
    #[error("{path}: {log}")]
    ShaderCompile {
        log: String,
        path: String,
        source_text: String,
    },
    /// A program failed to link. Carries the link log.
    #[error("{0}")]
    Link(String),
    #[error("{0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Renders the error the way a host is expected to print it before
    /// aborting: compile errors get the log followed by the delimited source.
    pub fn report(&self) -> String {
        match self {
            Self::ShaderCompile {
                log,
                path,
                source_text,
            } => format!("{path}: {log}\n---\n{source_text}\n---"),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line.
        Self::Runtime(format!("{err:#}"))
    }
}

/// Reads the driver error flag and converts a raised flag into an
/// [`Error::Driver`] for the call at `file:line`.
pub fn check(gl: &dyn Gl, call: &'static str, file: &'static str, line: u32) -> Result<()> {
    match DriverErrorKind::from_code(gl.get_error()) {
        None => Ok(()),
        Some(kind) => Err(Error::Driver {
            kind,
            call,
            file,
            line,
        }),
    }
}

/// Issues a driver call, then checks the error flag, returning early with
/// [`Error::Driver`] on failure. Evaluates to the call's value.
///
/// ```ignore
/// let texture = check_gl!(gl, gl.gen_texture());
/// check_gl!(gl, gl.bind_texture(glow::TEXTURE_2D, texture));
/// ```
#[macro_export]
macro_rules! check_gl {
    ($gl:expr, $call:expr) => {{
        let value = $call;
        $crate::error::check(&*$gl, stringify!($call), file!(), line!())?;
        value
    }};
}
