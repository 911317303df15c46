//! The `utils` module provides the pieces shared across `pullsub`: the error
//! type used outside the broker core and the tracing setup.

pub mod error;
pub mod logging;

pub use error::{PubSubError, Result};
