//! The alerting engine: intake, cooldown throttling and dispatch.

pub mod clock;
pub mod intake;
pub mod throttler;

pub use clock::{Clock, SystemClock};
pub use intake::{AlertOutcome, IntakeError, IntakePipeline};
pub use throttler::{AlertThrottler, ThrottleError};
