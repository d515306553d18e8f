//! Rolling performance statistics per tool.

pub mod window;

pub use window::{DEFAULT_WINDOW_CAPACITY, MetricsWindow, Sample, WindowStats};
