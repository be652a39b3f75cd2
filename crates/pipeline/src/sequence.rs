use crate::error::{PipelineError, Result};

/// Allocates stable, monotonically increasing external identifiers of the
/// form `<prefix><zero-padded integer>`.
///
/// The next id is always `max(existing numeric suffixes) + 1`; ids are never
/// reused and gaps left by deleted items are never filled. Ids whose prefix
/// does not match, or whose suffix is not numeric, are ignored when scanning
/// for the maximum.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    prefix: String,
    pad_width: usize,
    seed: Option<u64>,
}

impl SequenceAllocator {
    pub fn new(prefix: impl Into<String>, pad_width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad_width,
            seed: None,
        }
    }

    /// Starting value for first-ever runs, when there is no existing maximum
    /// to increment from.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Allocate the next id after the existing set.
    pub fn allocate_next<I, S>(&self, existing: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.format(self.next_value(existing)?))
    }

    /// Allocate `count` strictly increasing ids, in order, for `count` new
    /// items.
    pub fn allocate_batch<I, S>(&self, existing: I, count: usize) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let first = self.next_value(existing)?;
        Ok((first..first + count as u64)
            .map(|value| self.format(value))
            .collect())
    }

    fn next_value<I, S>(&self, existing: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let max = existing
            .into_iter()
            .filter_map(|id| self.numeric_suffix(id.as_ref()))
            .max();
        match (max, self.seed) {
            (Some(max), _) => Ok(max + 1),
            (None, Some(seed)) => Ok(seed),
            (None, None) => Err(PipelineError::Allocation(format!(
                "no existing '{}' ids and no seed; first-ever runs must supply a starting value",
                self.prefix
            ))),
        }
    }

    fn numeric_suffix(&self, id: &str) -> Option<u64> {
        id.strip_prefix(&self.prefix)
            .and_then(|suffix| suffix.parse::<u64>().ok())
    }

    fn format(&self, value: u64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.pad_width)
    }
}
