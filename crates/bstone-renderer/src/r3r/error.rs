// error.rs -- renderer error type

use std::fmt;

/// Errors returned by renderer operations.
///
/// Capability absence is never an error; it is recorded in the device
/// features instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum R3rError {
    /// The renderer (or a path of it) could not be brought up.
    Initialization(String),
    /// The caller broke an API contract.
    Contract(String),
    ShaderCompile { message: String, info_log: String },
    ShaderLink { message: String, info_log: String },
    /// Shader stage input bindings are invalid.
    InvalidBinding(String),
    /// A uniform update does not match the variable's type or size.
    UniformMismatch(String),
    /// An id does not name a live resource of the given kind.
    UnknownResource(&'static str, u32),
    /// `glGetError` reported an error after a call (debug builds).
    Gl { call: &'static str, code: u32 },
}

pub type R3rResult<T> = Result<T, R3rError>;

impl R3rError {
    pub fn contract(msg: impl Into<String>) -> Self {
        R3rError::Contract(msg.into())
    }

    pub fn init(msg: impl Into<String>) -> Self {
        R3rError::Initialization(msg.into())
    }
}

impl fmt::Display for R3rError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            R3rError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            R3rError::Contract(msg) => write!(f, "{}", msg),
            R3rError::ShaderCompile { message, info_log } => {
                write!(f, "Shader compilation error: {}", message)?;
                if !info_log.is_empty() {
                    write!(f, "\n{}", info_log)?;
                }
                Ok(())
            }
            R3rError::ShaderLink { message, info_log } => {
                write!(f, "Shader linking error: {}", message)?;
                if !info_log.is_empty() {
                    write!(f, "\n{}", info_log)?;
                }
                Ok(())
            }
            R3rError::InvalidBinding(msg) => write!(f, "Invalid input binding: {}", msg),
            R3rError::UniformMismatch(msg) => write!(f, "Uniform mismatch: {}", msg),
            R3rError::UnknownResource(kind, id) => write!(f, "Unknown {} id {}.", kind, id),
            R3rError::Gl { call, code } => write!(f, "{} failed with GL error 0x{:04X}.", call, code),
        }
    }
}

impl std::error::Error for R3rError {}
