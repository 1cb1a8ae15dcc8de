use clap::ValueEnum;

pub const DEFAULT_THRESHOLD_MINUTES: u64 = 1800;
pub const DEFAULT_WINDOW_MONTHS: usize = 6;

/// What to do with a record whose duration text cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnparseablePolicy {
    /// Keep the record with no minutes, log it and list it in the run summary.
    #[default]
    Skip,
    /// Abort the run.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub threshold_minutes: u64,
    pub window_months: usize,
    pub unparseable: UnparseablePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_minutes: DEFAULT_THRESHOLD_MINUTES,
            window_months: DEFAULT_WINDOW_MONTHS,
            unparseable: UnparseablePolicy::default(),
        }
    }
}
