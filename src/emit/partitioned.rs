use std::collections::BTreeMap;
use std::fmt;

use crate::mesh::PartitionId;

/// Script variable holding the rank of the running solver process.
pub const PROCESS_ID_VAR: &str = "PID";

/// One script line and the partitions that must execute it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Ascending, without duplicates.
    pub partitions: Vec<PartitionId>,
    pub text: String,
}

impl Statement {
    #[must_use]
    pub fn new(partitions: impl IntoIterator<Item = PartitionId>, text: impl Into<String>) -> Self {
        let mut partitions: Vec<PartitionId> = partitions.into_iter().collect();
        partitions.sort_unstable();
        partitions.dedup();
        Self {
            partitions,
            text: text.into(),
        }
    }
}

/// Writes statements either unconditionally (one process) or grouped into
/// one `if`/`elseif` chain on the process id.
///
/// Branches appear in ascending partition order and only for partitions
/// that have statements; inside a branch, statements keep their input
/// order.
#[derive(Debug, Clone, Copy)]
pub struct PartitionedEmitter {
    process_count: u32,
}

impl PartitionedEmitter {
    #[must_use]
    pub fn new(process_count: u32) -> Self {
        Self { process_count }
    }

    /// Returns `true` if output is wrapped in process conditionals.
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        self.process_count > 1
    }

    /// Writes `statements` to `out`.
    ///
    /// # Errors
    ///
    /// Propagates errors of the underlying writer.
    pub fn write<W: fmt::Write>(&self, out: &mut W, statements: &[Statement]) -> fmt::Result {
        if !self.is_partitioned() {
            for statement in statements {
                writeln!(out, "{}", statement.text)?;
            }
            return Ok(());
        }

        let mut blocks: BTreeMap<PartitionId, Vec<&str>> = BTreeMap::new();
        for statement in statements {
            for &partition in &statement.partitions {
                blocks.entry(partition).or_default().push(&statement.text);
            }
        }

        let mut keyword = "if";
        for (partition, lines) in &blocks {
            writeln!(out, "{keyword} {{${PROCESS_ID_VAR} == {partition}}} {{")?;
            for line in lines {
                writeln!(out, "\t{line}")?;
            }
            keyword = "} elseif";
        }
        if !blocks.is_empty() {
            writeln!(out, "}}")?;
        }
        Ok(())
    }
}
