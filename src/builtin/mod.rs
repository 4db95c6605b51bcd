//! Built-in leaf actions
//!
//! General-purpose leaves that every suite needs regardless of transport:
//! logging, delays, stopwatches, explicit failures, variable handling and
//! failure assertions.

mod assert;
mod echo;
mod fail;
mod properties;
mod sleep;
mod timer;
mod variables;

pub use assert::AssertFailure;
pub use echo::Echo;
pub use fail::Fail;
pub use properties::LoadProperties;
pub use sleep::Sleep;
pub use timer::{StopTime, DEFAULT_TIMER_ID};
pub use variables::{CreateVariables, TraceVariables};
