/// Clock.
pub mod clock;


pub use clock::{Clock, ManualClock, SystemClock};

#[cfg(client)]
pub use clock::TokioClock;
