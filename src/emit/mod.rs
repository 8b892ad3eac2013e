mod partitioned;
mod statements;

pub use partitioned::{PartitionedEmitter, Statement, PROCESS_ID_VAR};
pub use statements::{element_statement, node_statement, stage_update_statement};

/// Formats coordinates for the solver script.
pub trait FormatNumber {
    fn format(&self, value: f64) -> String;
}

impl<F> FormatNumber for F
where
    F: Fn(f64) -> String,
{
    fn format(&self, value: f64) -> String {
        self(value)
    }
}

/// Fixed number of digits after the decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPrecision {
    digits: usize,
}

impl FixedPrecision {
    #[must_use]
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    #[must_use]
    pub fn digits(&self) -> usize {
        self.digits
    }
}

impl Default for FixedPrecision {
    fn default() -> Self {
        Self::new(6)
    }
}

impl FormatNumber for FixedPrecision {
    fn format(&self, value: f64) -> String {
        let text = format!("{:.*}", self.digits, value);
        // "-0.000" after rounding
        if let Some(rest) = text.strip_prefix('-') {
            if rest.bytes().all(|b| b == b'0' || b == b'.') {
                return rest.to_string();
            }
        }
        text
    }
}
