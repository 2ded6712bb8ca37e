pub mod metrics;
pub mod poll;

pub use metrics::*;
pub use poll::*;
