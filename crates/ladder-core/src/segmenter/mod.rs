//! Range math and segment planning for the concurrent strategy.
//!
//! Splits a file into N contiguous byte ranges fetched on separate connections.

mod range;

pub use range::{plan_segments, Segment};
