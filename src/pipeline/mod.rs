//! Background workers feeding the search index and notifications.
//!
//! Two loops run beside the request path. [`ChangeCaptureWorker`] tails
//! the store's change feed and keeps the search index current;
//! [`EventFanOut`] receives published envelopes and hands each one to the
//! indexer's event path and the notification dispatcher. Both stop when
//! the shared shutdown flag flips to `true`.

mod change_capture;
mod fan_out;

pub use change_capture::{
    ChangeCaptureWorker, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, DeadLetter,
};
pub use fan_out::{EventFanOut, FanOutOutcome};

#[cfg(test)]
mod tests;
