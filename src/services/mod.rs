// src/services/mod.rs

pub mod attempt;
pub mod clock;
pub mod generator;
pub mod scorer;

pub use attempt::AttemptService;
pub use clock::{Clock, ManualClock, SystemClock};
