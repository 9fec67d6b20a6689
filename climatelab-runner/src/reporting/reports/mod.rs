//! Report generators.

mod charts;
mod markdown;

pub use charts::{downsample, heat, scaled, sparkline};
pub use markdown::MarkdownReportGenerator;
