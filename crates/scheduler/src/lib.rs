//! Probe Scheduler Library
//!
//! Time-window primitives for the probe tool's render loop.
//!
//! The loop is frame driven: nothing here spawns timers. Callers pass the
//! current `Instant` in and poll pending work on later frames.
//!
//! # Example
//!
//! ```
//! use probe_scheduler::Throttle;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut throttle = Throttle::new(Duration::from_millis(110));
//!
//! // Leading edge runs immediately
//! assert_eq!(throttle.call(start, 1), Some(1));
//!
//! // Calls inside the window are coalesced, the latest value wins
//! assert_eq!(throttle.call(start + Duration::from_millis(20), 2), None);
//! assert_eq!(throttle.call(start + Duration::from_millis(40), 3), None);
//!
//! // Trailing edge fires once the window has elapsed
//! assert_eq!(throttle.poll(start + Duration::from_millis(110)), Some(3));
//! ```

mod throttle;

pub use throttle::{Throttle, DEFAULT_THROTTLE_INTERVAL};
