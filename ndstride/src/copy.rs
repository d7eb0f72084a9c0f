/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Strided copy and fill.
//!
//! [`copy`] moves elements from a [`Source`] into a [`Sink`] in
//! logical order, issuing as few bulk slice transfers as the two
//! layouts allow. [`fill`] does the same with a single broadcast
//! value.
//!
//! The engine first builds a [`CopyPlan`]:
//!
//! 1. The transfer length is the element count both operands agree
//!    on. Operands that cannot say how many elements they hold defer
//!    to the other one.
//! 2. The step is the number of elements moved per bulk transfer. It
//!    is reconciled from each operand's contiguous run (for a shaped
//!    operand, [`Shape::contiguous_data_length`]): when one run
//!    divides the other, the smaller run is used.
//! 3. If the step covers the whole length, one transfer is issued.
//!    Otherwise `len / step` transfers of `step` elements each are
//!    issued, at logical positions `0, step, 2 × step, ...`.
//!
//! Every check happens while planning, so a failed copy or fill
//! leaves the destination untouched.
//!
//! ```
//! # use ndstride::{copy, Range, ShapedMut};
//! let src = [1, 2, 3, 4];
//! let mut buf = [0; 8];
//! let mut dst = ShapedMut::new(ndstride::shape![8], &mut buf).unwrap();
//! let mut dst = dst.select(&[Range(Some(0), Some(8), 2).into()]).unwrap();
//! let plan = copy::copy(&mut dst, &src[..]).unwrap();
//! assert_eq!(plan.transfers(), 4);
//! assert_eq!(buf, [1, 0, 2, 0, 3, 0, 4, 0]);
//! ```
//!
//! [`Shape::contiguous_data_length`]: crate::Shape::contiguous_data_length

use crate::position::PositionIter;
use crate::position::Positions;
use crate::range::gcd;
use crate::view::Shaped;
use crate::view::ShapedMut;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CopyError {
    #[error("length mismatch: destination holds {dst} elements, source {src}")]
    LengthMismatch { dst: usize, src: usize },

    #[error("step mismatch: destination runs of {dst} and source runs of {src} do not divide")]
    StepMismatch { dst: usize, src: usize },

    #[error("neither operand knows its length")]
    UnknownLength,
}

/// What the engine needs to know about an operand to plan a
/// transfer.
pub trait Operand {
    /// The number of elements, if known.
    fn elem_count(&self) -> Option<usize>;

    /// The length `r` such that every aligned block of logical
    /// positions `k × r .. (k + 1) × r` is physically contiguous.
    /// `None` means the whole operand is one run.
    fn contiguous_run(&self) -> Option<usize>;
}

/// An operand elements can be read from.
pub trait Source<T>: Operand {
    /// The `len` elements starting at logical position `pos`. The
    /// engine only asks for chunks that lie within one contiguous run.
    fn chunk(&self, pos: usize, len: usize) -> &[T];
}

/// An operand elements can be written to.
pub trait Sink<T>: Operand {
    /// Mutable access to the `len` elements starting at logical
    /// position `pos`, within one contiguous run.
    fn chunk_mut(&mut self, pos: usize, len: usize) -> &mut [T];
}

impl<T> Operand for [T] {
    fn elem_count(&self) -> Option<usize> {
        Some(self.len())
    }

    fn contiguous_run(&self) -> Option<usize> {
        None
    }
}

impl<T> Source<T> for [T] {
    fn chunk(&self, pos: usize, len: usize) -> &[T] {
        &self[pos..pos + len]
    }
}

impl<T> Sink<T> for [T] {
    fn chunk_mut(&mut self, pos: usize, len: usize) -> &mut [T] {
        &mut self[pos..pos + len]
    }
}

impl<T> Operand for Vec<T> {
    fn elem_count(&self) -> Option<usize> {
        self.as_slice().elem_count()
    }

    fn contiguous_run(&self) -> Option<usize> {
        None
    }
}

impl<T> Source<T> for Vec<T> {
    fn chunk(&self, pos: usize, len: usize) -> &[T] {
        self.as_slice().chunk(pos, len)
    }
}

impl<T> Sink<T> for Vec<T> {
    fn chunk_mut(&mut self, pos: usize, len: usize) -> &mut [T] {
        self.as_mut_slice().chunk_mut(pos, len)
    }
}

impl<T> Operand for Shaped<'_, T> {
    fn elem_count(&self) -> Option<usize> {
        Some(self.size())
    }

    fn contiguous_run(&self) -> Option<usize> {
        Some(self.shape().contiguous_data_length(0))
    }
}

impl<T> Source<T> for Shaped<'_, T> {
    fn chunk(&self, pos: usize, len: usize) -> &[T] {
        let offset = self.shape().at(pos);
        &self.data()[offset..offset + len]
    }
}

impl<T> Operand for ShapedMut<'_, T> {
    fn elem_count(&self) -> Option<usize> {
        Some(self.size())
    }

    fn contiguous_run(&self) -> Option<usize> {
        Some(self.shape().contiguous_data_length(0))
    }
}

impl<T> Sink<T> for ShapedMut<'_, T> {
    fn chunk_mut(&mut self, pos: usize, len: usize) -> &mut [T] {
        let offset = self.shape().at(pos);
        &mut self.data_mut()[offset..offset + len]
    }
}

// A single value broadcast to any length.
struct Broadcast;

impl Operand for Broadcast {
    fn elem_count(&self) -> Option<usize> {
        None
    }

    fn contiguous_run(&self) -> Option<usize> {
        None
    }
}

/// `CopyOpts` controls how [`copy_with`] and [`fill_with`] reconcile
/// the operands' contiguous runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOpts {
    /// When neither run divides the other, transfer in chunks of
    /// their greatest common divisor instead of failing.
    pub lenient_steps: bool,

    /// Upper bound on the number of elements per bulk transfer.
    pub max_step: Option<usize>,
}

impl CopyOpts {
    // Irreconcilable runs are an error.
    pub fn strict() -> Self {
        Self {
            lenient_steps: false,
            max_step: None,
        }
    }

    // Irreconcilable runs fall back to their gcd.
    pub fn lenient() -> Self {
        Self {
            lenient_steps: true,
            ..Self::strict()
        }
    }
}

impl Default for CopyOpts {
    fn default() -> Self {
        Self::strict()
    }
}

/// The transfers a copy or fill issues: `len / step` bulk transfers
/// of `step` elements each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyPlan {
    pub len: usize,
    pub step: usize,
}

impl CopyPlan {
    /// Whether a single bulk transfer moves everything.
    pub fn is_plain(&self) -> bool {
        self.step == self.len
    }

    /// The number of bulk transfers issued.
    pub fn transfers(&self) -> usize {
        if self.step == 0 {
            0
        } else {
            self.len / self.step
        }
    }

    // The logical position each transfer starts at.
    fn starts(&self) -> Positions {
        Positions::new(
            PositionIter::linear(0, self.step.max(1) as isize),
            self.transfers(),
        )
    }
}

/// Plan a copy from `src` into `dst` with strict options.
pub fn plan<D, S>(dst: &D, src: &S) -> Result<CopyPlan, CopyError>
where
    D: Operand + ?Sized,
    S: Operand + ?Sized,
{
    plan_with(&CopyOpts::strict(), dst, src)
}

/// Plan a copy from `src` into `dst`.
pub fn plan_with<D, S>(opts: &CopyOpts, dst: &D, src: &S) -> Result<CopyPlan, CopyError>
where
    D: Operand + ?Sized,
    S: Operand + ?Sized,
{
    let len = match (dst.elem_count(), src.elem_count()) {
        (Some(dst), Some(src)) if dst != src => {
            return Err(CopyError::LengthMismatch { dst, src });
        }
        (Some(len), _) | (None, Some(len)) => len,
        (None, None) => return Err(CopyError::UnknownLength),
    };
    if len == 0 {
        return Ok(CopyPlan { len: 0, step: 0 });
    }

    let dst_run = dst.contiguous_run().unwrap_or(len).clamp(1, len);
    let src_run = src.contiguous_run().unwrap_or(len).clamp(1, len);
    let step = if dst_run % src_run == 0 {
        src_run
    } else if src_run % dst_run == 0 {
        dst_run
    } else if opts.lenient_steps {
        let step = gcd(dst_run, src_run);
        tracing::debug!(
            dst_run,
            src_run,
            step,
            "contiguous runs do not divide; falling back to their gcd"
        );
        step
    } else {
        return Err(CopyError::StepMismatch {
            dst: dst_run,
            src: src_run,
        });
    };

    // Every transfer must be whole.
    let mut step = gcd(step, len);
    if let Some(max_step) = opts.max_step {
        let max_step = max_step.max(1);
        if step > max_step {
            step = (1..=max_step)
                .rev()
                .find(|d| step % d == 0)
                .unwrap_or(1);
        }
    }
    Ok(CopyPlan { len, step })
}

/// Copy `src` into `dst` in logical order with strict options,
/// returning the plan that was executed.
pub fn copy<T, D, S>(dst: &mut D, src: &S) -> Result<CopyPlan, CopyError>
where
    T: Clone,
    D: Sink<T> + ?Sized,
    S: Source<T> + ?Sized,
{
    copy_with(&CopyOpts::strict(), dst, src)
}

/// Copy `src` into `dst` in logical order.
pub fn copy_with<T, D, S>(opts: &CopyOpts, dst: &mut D, src: &S) -> Result<CopyPlan, CopyError>
where
    T: Clone,
    D: Sink<T> + ?Sized,
    S: Source<T> + ?Sized,
{
    let plan = plan_with(opts, dst, src)?;
    if plan.transfers() == 0 {
        return Ok(plan);
    }
    if plan.is_plain() {
        tracing::trace!(strategy = "plain", len = plan.len, "copy");
        dst.chunk_mut(0, plan.len)
            .clone_from_slice(src.chunk(0, plan.len));
    } else {
        tracing::trace!(strategy = "step", len = plan.len, step = plan.step, "copy");
        for pos in plan.starts() {
            dst.chunk_mut(pos, plan.step)
                .clone_from_slice(src.chunk(pos, plan.step));
        }
    }
    Ok(plan)
}

/// Set every element of `dst` to `value` with strict options,
/// returning the plan that was executed.
pub fn fill<T, D>(dst: &mut D, value: &T) -> Result<CopyPlan, CopyError>
where
    T: Clone,
    D: Sink<T> + ?Sized,
{
    fill_with(&CopyOpts::strict(), dst, value)
}

/// Set every element of `dst` to `value`.
pub fn fill_with<T, D>(opts: &CopyOpts, dst: &mut D, value: &T) -> Result<CopyPlan, CopyError>
where
    T: Clone,
    D: Sink<T> + ?Sized,
{
    let plan = plan_with(opts, dst, &Broadcast)?;
    if plan.transfers() == 0 {
        return Ok(plan);
    }
    if plan.is_plain() {
        tracing::trace!(strategy = "plain", len = plan.len, "fill");
        dst.chunk_mut(0, plan.len).fill(value.clone());
    } else {
        tracing::trace!(strategy = "step", len = plan.len, step = plan.step, "fill");
        for pos in plan.starts() {
            dst.chunk_mut(pos, plan.step).fill(value.clone());
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;
    use crate::Selector;
    use crate::shape;

    // An operand that reports nothing about itself.
    struct Opaque;

    impl Operand for Opaque {
        fn elem_count(&self) -> Option<usize> {
            None
        }

        fn contiguous_run(&self) -> Option<usize> {
            None
        }
    }

    // An operand with a fixed length and run.
    struct Runs {
        len: usize,
        run: usize,
    }

    impl Operand for Runs {
        fn elem_count(&self) -> Option<usize> {
            Some(self.len)
        }

        fn contiguous_run(&self) -> Option<usize> {
            Some(self.run)
        }
    }

    #[test]
    fn test_plain_copy() {
        let src = vec![1, 2, 3, 4];
        let mut dst = vec![0; 4];
        let plan = copy(&mut dst, &src).unwrap();
        assert!(plan.is_plain());
        assert_eq!(plan.transfers(), 1);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_into_every_other_slot() {
        let src = [1, 2, 3, 4];
        let mut buf = [0; 8];
        let mut view = ShapedMut::new(shape![8], &mut buf).unwrap();
        let mut dst = view.select(&[Range(Some(0), Some(8), 2).into()]).unwrap();
        let plan = copy(&mut dst, &src[..]).unwrap();
        assert_eq!(plan, CopyPlan { len: 4, step: 1 });
        assert_eq!(buf, [1, 0, 2, 0, 3, 0, 4, 0]);
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let src = [1, 2, 3, 4];
        let mut dst = [0; 3];
        assert_eq!(
            copy(&mut dst[..], &src[..]),
            Err(CopyError::LengthMismatch { dst: 3, src: 4 })
        );
        assert_eq!(dst, [0; 3]);
    }

    #[test]
    fn test_unknown_length() {
        assert_eq!(plan(&Opaque, &Opaque), Err(CopyError::UnknownLength));
        assert_eq!(
            plan(&Opaque, &[1, 2, 3][..]),
            Ok(CopyPlan { len: 3, step: 3 })
        );
    }

    #[test]
    fn test_step_reconciliation() {
        let dst = Runs { len: 12, run: 6 };
        let src = Runs { len: 12, run: 2 };
        assert_eq!(plan(&dst, &src), Ok(CopyPlan { len: 12, step: 2 }));
        assert_eq!(plan(&src, &dst), Ok(CopyPlan { len: 12, step: 2 }));

        let src = Runs { len: 12, run: 4 };
        assert_eq!(
            plan(&dst, &src),
            Err(CopyError::StepMismatch { dst: 6, src: 4 })
        );
        assert_eq!(
            plan_with(&CopyOpts::lenient(), &dst, &src),
            Ok(CopyPlan { len: 12, step: 2 })
        );
    }

    #[test]
    fn test_step_divides_length() {
        // A run that does not divide the length is cut down.
        let dst = Runs { len: 6, run: 4 };
        let src = Runs { len: 6, run: 4 };
        let p = plan(&dst, &src).unwrap();
        assert_eq!(p, CopyPlan { len: 6, step: 2 });
        assert_eq!(p.transfers(), 3);
    }

    #[test]
    fn test_max_step() {
        let opts = CopyOpts {
            max_step: Some(4),
            ..CopyOpts::strict()
        };
        let dst = vec![0u8; 12];
        let src = vec![0u8; 12];
        assert_eq!(
            plan_with(&opts, &dst, &src),
            Ok(CopyPlan { len: 12, step: 4 })
        );
        let opts = CopyOpts {
            max_step: Some(5),
            ..CopyOpts::strict()
        };
        assert_eq!(
            plan_with(&opts, &dst, &src),
            Ok(CopyPlan { len: 12, step: 4 })
        );
        let opts = CopyOpts {
            max_step: Some(0),
            ..CopyOpts::strict()
        };
        assert_eq!(
            plan_with(&opts, &dst, &src),
            Ok(CopyPlan { len: 12, step: 1 })
        );
    }

    #[test]
    fn test_copy_between_views() {
        let data: Vec<i32> = (0..24).collect();
        let src = Shaped::new(shape![2, 3, 4], &data)
            .unwrap()
            .select(&[Selector::All, (1..3).into()])
            .unwrap();
        let mut buf = vec![0; 16];
        let mut dst = ShapedMut::new(shape![4, 4], &mut buf).unwrap();
        let plan = copy(&mut dst, &src).unwrap();
        assert_eq!(plan, CopyPlan { len: 16, step: 8 });
        assert_eq!(
            buf,
            vec![4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 20, 21, 22, 23]
        );
    }

    #[test]
    fn test_copy_with_capped_step_matches() {
        let data: Vec<i32> = (0..24).collect();
        let src = Shaped::new(shape![2, 3, 4], &data).unwrap();
        let expected: Vec<i32> = src.iter().copied().collect();
        for max_step in [1, 2, 3, 4, 6, 8, 12, 24] {
            let opts = CopyOpts {
                max_step: Some(max_step),
                ..CopyOpts::strict()
            };
            let mut dst = vec![0; 24];
            let plan = copy_with(&opts, &mut dst, &src).unwrap();
            assert_eq!(plan.step, max_step);
            assert_eq!(dst, expected);
        }
    }

    #[test]
    fn test_fill() {
        let mut buf = [0; 12];
        let mut view = ShapedMut::new(shape![3, 4], &mut buf).unwrap();
        let mut dst = view.select(&[Selector::All, (1..3).into()]).unwrap();
        let plan = fill(&mut dst, &7).unwrap();
        assert_eq!(plan, CopyPlan { len: 6, step: 2 });
        assert_eq!(buf, [0, 7, 7, 0, 0, 7, 7, 0, 0, 7, 7, 0]);

        let mut flat = vec![0; 5];
        let plan = fill(&mut flat, &1).unwrap();
        assert!(plan.is_plain());
        assert_eq!(flat, vec![1; 5]);
    }

    #[test]
    fn test_empty() {
        let mut dst: Vec<u8> = Vec::new();
        let plan = copy(&mut dst, &Vec::new()).unwrap();
        assert_eq!(plan.transfers(), 0);
        assert_eq!(fill(&mut dst, &1).unwrap().transfers(), 0);
    }
}
