//! Domain types for ClimateLab

pub mod indicator;
pub mod period;
pub mod series;
pub mod table;

pub use indicator::Indicator;
pub use period::{Granularity, Period, PeriodError};
pub use series::{Observation, SeriesViolation, TimeSeries};
pub use table::{Cell, ClimateRecord, MergePolicy, MergedRow, MergedTable};
