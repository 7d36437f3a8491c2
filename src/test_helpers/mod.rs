//! A set of helpers for testing

mod clock;
mod error_record;
mod notifier;

pub use clock::ManualClock;
pub use error_record::ErrorRecordBuilder;
pub use notifier::RecordingNotifier;
