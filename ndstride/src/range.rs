/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::position::PositionIter;
use crate::position::Positions;

/// An arithmetic progression of indices.
///
/// A `LinearRange` visits `start, start + step, start + 2 × step, ...`
/// and stops before `stop`. The step may be negative (reverse
/// traversal) but never zero. On construction `stop` is aligned so
/// that
///
/// ```text
/// stop = start + step × ⌈(stop - start) / step⌉
/// ```
///
/// which makes [`len`](LinearRange::len) an exact division and lets
/// iteration terminate exactly at `stop`.
///
/// ```
/// # use ndstride::LinearRange;
/// let r = LinearRange::new(10, 0, -2);
/// assert_eq!(r.len(), 5);
/// assert!(r.iter().eq([10, 8, 6, 4, 2]));
/// ```
///
/// A range of length zero is *closed*: it carries no positions, only
/// the anchor `start`, which records the index an axis was collapsed
/// at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinearRange {
    start: isize,
    stop: isize,
    step: isize,
}

impl LinearRange {
    /// Create a range from `start` towards `stop` (exclusive) in
    /// increments of `step`. A `stop` on the wrong side of `start`
    /// yields an empty range anchored at `start`.
    pub fn new(start: isize, stop: isize, step: isize) -> Self {
        debug_assert!(step != 0, "range step must be nonzero");
        let span = stop - start;
        let count = if span != 0 && (span > 0) == (step > 0) {
            // ⌈span / step⌉ for span and step of the same sign.
            (span - step.signum()) / step + 1
        } else {
            0
        };
        Self {
            start,
            stop: start + step * count,
            step,
        }
    }

    /// The range `0..len` with unit step.
    pub fn full(len: usize) -> Self {
        Self::new(0, len as isize, 1)
    }

    /// A closed (zero-length) range anchored at `at`.
    pub fn closed(at: usize) -> Self {
        let at = at as isize;
        Self {
            start: at,
            stop: at,
            step: 1,
        }
    }

    pub fn start(&self) -> isize {
        self.start
    }

    /// The aligned, exclusive end of the range.
    pub fn stop(&self) -> isize {
        self.stop
    }

    pub fn step(&self) -> isize {
        self.step
    }

    /// The number of positions in the range.
    #[inline]
    pub fn len(&self) -> usize {
        ((self.stop - self.start) / self.step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// The index at position `pos`: `start + step × pos`.
    ///
    /// For a closed range, `value(0)` is the anchor.
    #[inline]
    pub fn value(&self, pos: usize) -> usize {
        let value = self.start + self.step * pos as isize;
        debug_assert!(value >= 0, "negative index {} in {}", value, self);
        value as usize
    }

    /// The last index visited, if any.
    pub fn last(&self) -> Option<isize> {
        (!self.is_empty()).then(|| self.stop - self.step)
    }

    /// Compose two ranges: the result maps `pos` to
    /// `self.value(inner.value(pos))`.
    ///
    /// Selection is function composition, not a reinterpretation of
    /// absolute indices: `inner` is expressed in this range's
    /// positions. A closed `inner` yields a range closed at
    /// `self.value(inner.start())`.
    pub fn select(&self, inner: &LinearRange) -> Self {
        let start = self.start + self.step * inner.start;
        if inner.is_empty() {
            return Self::closed(start as usize);
        }
        let step = self.step * inner.step;
        Self {
            start,
            stop: start + step * inner.len() as isize,
            step,
        }
    }

    /// Collapse the range to the single index at `pos`.
    pub fn close_at(&self, pos: usize) -> Self {
        Self::closed(self.value(pos))
    }

    /// Whether this range is exactly `0..total` with unit step. A
    /// single index spans `0..1` whatever its step.
    pub fn complete(&self, total: usize) -> bool {
        self.len() == total && self.contiguous_from_zero()
    }

    /// Whether position `i` holds index `i` for every position.
    pub fn contiguous_from_zero(&self) -> bool {
        self.start == 0 && (self.step == 1 || self.len() <= 1)
    }

    /// The number of leading indices that are mutually offset by
    /// exactly [`step`](LinearRange::step); for an arithmetic range
    /// that is every index.
    pub fn ranged_element_count(&self) -> usize {
        self.len()
    }

    /// A cursor positioned at the first index.
    pub fn positions(&self) -> PositionIter {
        PositionIter::linear(self.start, self.step)
    }

    /// Iterate over the indices of the range.
    pub fn iter(&self) -> Positions {
        Positions::new(self.positions(), self.len())
    }
}

impl fmt::Display for LinearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.stop, self.step)
    }
}

impl From<std::ops::Range<usize>> for LinearRange {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start as isize, r.end as isize, 1)
    }
}

impl From<std::ops::RangeInclusive<usize>> for LinearRange {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Self::new(*r.start() as isize, *r.end() as isize + 1, 1)
    }
}

/// A range over an arbitrary sequence of indices: gather lists,
/// permutations, repeated indices.
///
/// The sequence is shared, so cloning a `GeneralRange` is cheap.
/// Derived properties are computed by scanning the sequence and cost
/// O(n).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneralRange {
    indices: Arc<[usize]>,
}

impl GeneralRange {
    pub fn new(indices: impl Into<Arc<[usize]>>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The index at position `pos`.
    #[inline]
    pub fn value(&self, pos: usize) -> usize {
        self.indices[pos]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Gather: the result holds `self.value(p)` for each `p` produced
    /// by `positions`.
    pub fn gather(&self, positions: impl IntoIterator<Item = usize>) -> Self {
        positions.into_iter().map(|p| self.value(p)).collect()
    }

    /// True iff the index at every position `i` is `i`.
    pub fn contiguous_from_zero(&self) -> bool {
        self.indices.iter().enumerate().all(|(i, &v)| i == v)
    }

    /// The detected step: the difference between the first two
    /// indices, or 1 for sequences shorter than two.
    pub fn step(&self) -> isize {
        match self.indices[..] {
            [a, b, ..] => b as isize - a as isize,
            _ => 1,
        }
    }

    /// True iff all consecutive differences are equal.
    pub fn has_step(&self) -> bool {
        let step = self.step();
        self.differences().all(|d| d == step)
    }

    /// The length of the leading run of indices that are mutually
    /// offset by exactly the detected step.
    ///
    /// Only the run at the front of the sequence is measured; a longer
    /// run further in is not reported.
    pub fn ranged_element_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let step = self.step();
        1 + self.differences().take_while(|&d| d == step).count()
    }

    /// The largest `r` such that the sequence splits into consecutive
    /// chunks of `r` indices, each chunk a unit-step run. This never
    /// exceeds the leading run, and is at least 1 for a nonempty
    /// sequence.
    pub fn unit_run_length(&self) -> usize {
        let len = self.len();
        if len == 0 {
            return 0;
        }
        let leading = if self.step() == 1 {
            self.ranged_element_count()
        } else {
            1
        };
        let bound = gcd(leading, len);
        (1..=bound)
            .rev()
            .filter(|r| bound % r == 0)
            .find(|&r| {
                self.indices
                    .chunks(r)
                    .all(|chunk| chunk.iter().tuple_windows().all(|(a, b)| *b == a + 1))
            })
            .unwrap_or(1)
    }

    /// Whether this sequence is exactly `0..total`.
    pub fn complete(&self, total: usize) -> bool {
        self.len() == total && self.contiguous_from_zero()
    }

    /// A cursor positioned at the first index.
    pub fn positions(&self) -> PositionIter {
        PositionIter::general(Arc::clone(&self.indices), 0)
    }

    /// Iterate over the indices of the range.
    pub fn iter(&self) -> Positions {
        Positions::new(self.positions(), self.len())
    }

    fn differences(&self) -> impl Iterator<Item = isize> + '_ {
        self.indices
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| b as isize - a as isize)
    }
}

impl FromIterator<usize> for GeneralRange {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>())
    }
}

impl From<Vec<usize>> for GeneralRange {
    fn from(indices: Vec<usize>) -> Self {
        Self::new(indices)
    }
}

impl fmt::Display for GeneralRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.indices.iter().join(","))
    }
}

/// A range of indices along one axis: either an arithmetic
/// progression or an arbitrary index sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexRange {
    Linear(LinearRange),
    General(GeneralRange),
}

impl IndexRange {
    pub fn len(&self) -> usize {
        match self {
            IndexRange::Linear(r) => r.len(),
            IndexRange::General(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn value(&self, pos: usize) -> usize {
        match self {
            IndexRange::Linear(r) => r.value(pos),
            IndexRange::General(r) => r.value(pos),
        }
    }

    /// The index a closed range is anchored at. For a nonempty range
    /// this is its first index.
    pub fn anchor(&self) -> usize {
        match self {
            IndexRange::Linear(r) => r.value(0),
            IndexRange::General(r) => r.as_slice().first().copied().unwrap_or(0),
        }
    }

    /// Compose: the result maps `pos` to `self.value(inner.value(pos))`.
    /// A closed `inner` closes the result at `self.value(inner.anchor())`.
    ///
    /// Two arithmetic ranges compose into an arithmetic range; any
    /// composition involving a general range is materialized as a
    /// general range.
    pub fn select(&self, inner: &IndexRange) -> IndexRange {
        if inner.is_empty() {
            return IndexRange::Linear(LinearRange::closed(self.value(inner.anchor())));
        }
        match (self, inner) {
            (IndexRange::Linear(outer), IndexRange::Linear(inner)) => {
                IndexRange::Linear(outer.select(inner))
            }
            (IndexRange::Linear(outer), IndexRange::General(inner)) => {
                IndexRange::General(inner.iter().map(|i| outer.value(i)).collect())
            }
            (IndexRange::General(outer), inner) => IndexRange::General(outer.gather(inner.iter())),
        }
    }

    /// Collapse the range to the single index at `pos`.
    pub fn close_at(&self, pos: usize) -> IndexRange {
        IndexRange::Linear(LinearRange::closed(self.value(pos)))
    }

    /// Whether the range is exactly `0..total` with unit step.
    pub fn complete(&self, total: usize) -> bool {
        match self {
            IndexRange::Linear(r) => r.complete(total),
            IndexRange::General(r) => r.complete(total),
        }
    }

    pub fn contiguous_from_zero(&self) -> bool {
        match self {
            IndexRange::Linear(r) => r.contiguous_from_zero(),
            IndexRange::General(r) => r.contiguous_from_zero(),
        }
    }

    pub fn has_step(&self) -> bool {
        match self {
            IndexRange::Linear(_) => true,
            IndexRange::General(r) => r.has_step(),
        }
    }

    pub fn step(&self) -> isize {
        match self {
            IndexRange::Linear(r) => r.step(),
            IndexRange::General(r) => r.step(),
        }
    }

    pub fn ranged_element_count(&self) -> usize {
        match self {
            IndexRange::Linear(r) => r.ranged_element_count(),
            IndexRange::General(r) => r.ranged_element_count(),
        }
    }

    /// The length of the unit-step runs this range tiles into; see
    /// [`GeneralRange::unit_run_length`]. An arithmetic range with a
    /// step other than 1 has runs of a single index.
    pub fn unit_run_length(&self) -> usize {
        match self {
            IndexRange::Linear(r) if r.step() == 1 => r.len(),
            IndexRange::Linear(r) => r.len().min(1),
            IndexRange::General(r) => r.unit_run_length(),
        }
    }

    /// A cursor positioned at the first index.
    pub fn positions(&self) -> PositionIter {
        match self {
            IndexRange::Linear(r) => r.positions(),
            IndexRange::General(r) => r.positions(),
        }
    }

    /// Iterate over the indices of the range.
    pub fn iter(&self) -> Positions {
        Positions::new(self.positions(), self.len())
    }
}

impl From<LinearRange> for IndexRange {
    fn from(r: LinearRange) -> Self {
        IndexRange::Linear(r)
    }
}

impl From<GeneralRange> for IndexRange {
    fn from(r: GeneralRange) -> Self {
        IndexRange::General(r)
    }
}

impl From<std::ops::Range<usize>> for IndexRange {
    fn from(r: std::ops::Range<usize>) -> Self {
        IndexRange::Linear(r.into())
    }
}

impl From<Vec<usize>> for IndexRange {
    fn from(indices: Vec<usize>) -> Self {
        IndexRange::General(indices.into())
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRange::Linear(r) => r.fmt(f),
            IndexRange::General(r) => r.fmt(f),
        }
    }
}

/// Greatest common divisor; `gcd(0, n) == n`.
pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
