use thiserror::Error;

use crate::curve::CurveError;

/// Errors surfaced by the host-side plumbing around the engine. The control
/// path itself never fails: degraded inputs resolve to safe numeric outputs.
#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("input source error: {0}")]
    Input(String),
    #[error("tuning source error: {0}")]
    Tuning(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("interrupted after {cycles} cycles")]
    Interrupted { cycles: u64 },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing controller params")]
    MissingParams,
    #[error("invalid curve `{name}`: {source}")]
    Curve {
        name: &'static str,
        #[source]
        source: CurveError,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

impl BuildError {
    pub(crate) fn curve(name: &'static str) -> impl FnOnce(CurveError) -> Self {
        move |source| Self::Curve { name, source }
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
