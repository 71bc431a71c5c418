//! Deterministic block reduction for loss/gradient sums.
//!
//! Events are cut into fixed blocks of [`REDUCTION_BLOCK`] consecutive rows.
//! The block layout depends only on the number of events, never on the
//! number of workers, and block partials are combined by a pairwise tree in
//! block-index order. Floating-point results are therefore bit-identical
//! whether the blocks run on one thread or many.
use ndarray::Array1;
use std::ops::Range;

/// Rows per reduction block.
pub const REDUCTION_BLOCK: usize = 256;

/// Number of blocks covering `n` rows.
pub fn block_count(n: usize) -> usize {
    n.div_ceil(REDUCTION_BLOCK)
}

/// Row range of block `b` among `n` rows.
pub fn block_range(b: usize, n: usize) -> Range<usize> {
    let start = b * REDUCTION_BLOCK;
    start.min(n)..(start + REDUCTION_BLOCK).min(n)
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    /// Compensated total. A non-finite running sum is returned as is.
    pub fn value(&self) -> f64 {
        if self.sum.is_finite() { self.sum + self.compensation } else { self.sum }
    }
}

/// Loss (and optionally gradient) accumulated over one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPartial {
    pub loss: f64,
    pub grad: Option<Array1<f64>>,
}

impl BlockPartial {
    fn merge(self, other: BlockPartial) -> BlockPartial {
        let grad = match (self.grad, other.grad) {
            (Some(mut left), Some(right)) => {
                left += &right;
                Some(left)
            }
            (left, right) => left.or(right),
        };
        BlockPartial { loss: self.loss + other.loss, grad }
    }
}

/// Combine partials pairwise, level by level, in index order.
///
/// `[p0, p1, p2, p3, p4]` reduces as `((p0 + p1) + (p2 + p3)) + p4`.
/// Returns `None` for an empty input.
pub fn pairwise_combine(mut partials: Vec<BlockPartial>) -> Option<BlockPartial> {
    while partials.len() > 1 {
        let mut next = Vec::with_capacity(partials.len().div_ceil(2));
        let mut level = partials.into_iter();
        while let Some(left) = level.next() {
            next.push(match level.next() {
                Some(right) => left.merge(right),
                None => left,
            });
        }
        partials = next;
    }
    partials.pop()
}
