//! Bar styles for [`ProgressDisplay`](super::ProgressDisplay).
//!
//! ```rust
//! use rangefetch::progress::{ProgressBarOpts, StyleOptions};
//!
//! let style = StyleOptions::new(
//!     ProgressBarOpts::new(
//!         Some("{pos}/{len} downloads".to_string()),
//!         None,
//!         true,
//!         false,
//!     ),
//!     ProgressBarOpts::transfer(),
//! );
//! assert!(style.is_enabled());
//! assert!(!StyleOptions::hidden().is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Styles of the overall bar and of the per-entry bars.
///
/// By default the overall bar stays on screen once every entry is done while
/// entry bars are cleared as soon as their transfer finishes.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub(crate) main: ProgressBarOpts,
    pub(crate) child: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_QUEUE.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            child: ProgressBarOpts::transfer(),
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(main: ProgressBarOpts, child: ProgressBarOpts) -> Self {
        Self { main, child }
    }

    /// Nothing is drawn.
    pub fn hidden() -> Self {
        Self::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
    }

    /// `false` if neither bar kind is drawn.
    pub fn is_enabled(&self) -> bool {
        self.main.enabled || self.child.enabled
    }

    /// Options of the overall bar.
    pub fn main(&self) -> &ProgressBarOpts {
        &self.main
    }

    /// Options of the per-entry bars.
    pub fn child(&self) -> &ProgressBarOpts {
        &self.child
    }
}

/// Options of a single bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    template: Option<String>,
    /// At least three characters: filled, current and to do.
    progress_chars: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// Entries done out of entries submitted.
    ///
    /// `██████████████████████▌                  3/5 (60%)`
    pub const TEMPLATE_QUEUE: &'static str = "{bar:40.blue} {pos:>}/{len} ({percent}%)";
    /// File name, bytes and throughput of one transfer.
    ///
    /// `big.iso ━━━━━━━━━━━━━━━╾──── 211.23 MiB/300.00 MiB 11.31 MiB/s eta 8s`
    pub const TEMPLATE_TRANSFER: &'static str =
        "{msg:.bold} {bar:40.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} eta {eta:.blue}";
    /// `"█▉▊▋▌▍▎▏  "`
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    /// `"━╾╴─"`
    pub const CHARS_LINE: &'static str = "━╾╴─";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// The default per-entry style.
    pub fn transfer() -> Self {
        Self {
            template: Some(Self::TEMPLATE_TRANSFER.into()),
            progress_chars: Some(Self::CHARS_LINE.into()),
            enabled: true,
            clear: true,
        }
    }

    /// A bar that is never drawn.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set to `true` to clear the bar once done.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Build the [`ProgressStyle`]. An invalid template falls back to the default bar.
    pub fn to_progress_style(&self) -> ProgressStyle {
        let mut style = ProgressStyle::default_bar();
        if let Some(template) = &self.template {
            match style.clone().template(template) {
                Ok(templated) => style = templated,
                Err(e) => warn!(template = %template, error = %e, "Invalid progress template"),
            }
        }
        if let Some(progress_chars) = &self.progress_chars {
            style = style.progress_chars(progress_chars);
        }
        style
    }

    /// Build a bar of length `len`, hidden if disabled.
    pub fn to_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.enabled {
            let bar = ProgressBar::hidden();
            bar.set_length(len);
            return bar;
        }
        ProgressBar::new(len).with_style(self.to_progress_style())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_keeps_length() {
        let bar = ProgressBarOpts::hidden().to_progress_bar(10);
        assert!(bar.is_hidden());
        assert_eq!(bar.length(), Some(10));
    }

    #[test]
    fn test_invalid_template_falls_back() {
        let opts = ProgressBarOpts::new(Some("{bar:40.blue".into()), None, true, true);
        // Must not panic.
        let _ = opts.to_progress_style();
    }
}
