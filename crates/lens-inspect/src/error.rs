//! Error types for the inspection core.

use lens_dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InspectError>;

#[derive(Error, Debug)]
pub enum InspectError {
    /// Mounting or removing overlay elements failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("unknown inspect mode {0:?}")]
    UnknownMode(String),
}
