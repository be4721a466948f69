pub mod annotation;
pub mod grading;
pub mod timer;

pub use grading::{GradeReport, band_score, grade};
pub use timer::{TimerMode, TimerState};
