//! How much of a batch to process: a leading fraction and/or a hard cap.

use super::FetchSetupError;

/// Limits applied to a batch before dispatch. Both limits are optional;
/// the fraction is applied first, then the cap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSelection {
    pub max_items: Option<usize>,
    /// Fraction of the batch to keep, in (0, 1].
    pub sample_fraction: Option<f64>,
}

impl BatchSelection {
    pub fn new(max_items: Option<usize>, sample_fraction: Option<f64>) -> Result<Self, FetchSetupError> {
        if let Some(fraction) = sample_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(FetchSetupError::InvalidSampleFraction(fraction));
            }
        }
        Ok(Self {
            max_items,
            sample_fraction,
        })
    }

    /// Number of items kept out of `len`.
    pub fn selected_len(&self, len: usize) -> usize {
        let by_fraction = match self.sample_fraction {
            Some(fraction) => ((len as f64) * fraction).floor() as usize,
            None => len,
        };
        match self.max_items {
            Some(max) => by_fraction.min(max),
            None => by_fraction,
        }
        .min(len)
    }

    /// Keeps the leading `selected_len` items.
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let keep = self.selected_len(items.len());
        items.truncate(keep);
        items
    }
}
