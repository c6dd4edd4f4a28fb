//! Domain entities - the counter record, the window policy and the decision it renders.

mod counter;
mod decision;
mod window;

pub use counter::CounterRecord;
pub use decision::RateLimitDecision;
pub use window::{FixedWindow, WindowState};
