pub mod calc;
pub mod calendar;
pub mod drift;
pub mod ticks;
