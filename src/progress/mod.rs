//! Optional terminal progress bars.
//!
//! - `style` - bar templates and options
//! - `display` - the [`ProgressDisplay`] queue listener

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
