/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for ranges, shapes and selections.
//!
//! Every generator produces *valid* values: ranges are nonempty and
//! stay inside the requested bounds, and selectors never fail to
//! resolve against the shape they are generated for.
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::range::LinearRange;
use crate::shape::Selector;
use crate::shape::Shape;

/// Generates a nonempty [`LinearRange`] whose indices all lie in
/// `0..n`, with a step between -3 and 3 (never 0).
pub fn gen_linear_range(n: usize) -> impl Strategy<Value = LinearRange> {
    assert!(n > 0, "cannot generate a nonempty range below 0");
    let n = n as isize;
    let step = prop_oneof![1isize..=3, -3isize..=-1];
    (0..n, step).prop_flat_map(move |(start, step)| {
        let stop = if step > 0 {
            (start + 1..=n).boxed()
        } else {
            (-1..start).boxed()
        };
        stop.prop_map(move |stop| LinearRange::new(start, stop, step))
    })
}

/// Generates a pair `(outer, inner)` of nonempty linear ranges where
/// every index of `inner` is a valid position of `outer`, so that
/// `outer.select(&inner)` is well defined.
pub fn gen_nested_linear_ranges(n: usize) -> impl Strategy<Value = (LinearRange, LinearRange)> {
    gen_linear_range(n).prop_flat_map(|outer| (Just(outer), gen_linear_range(outer.len())))
}

/// Generates a full [`Shape`] with between 1 and `max_dims` axes,
/// each of extent between 1 and `max_len` (inclusive).
pub fn gen_shape(max_dims: usize, max_len: usize) -> impl Strategy<Value = Shape> {
    prop::collection::vec(1..=max_len, 1..=max_dims)
        .prop_map(|extents| Shape::new(extents).expect("positive extents"))
}

/// Generates a valid selector for an axis of `size` positions:
/// a single index, a linear range, the whole axis, a permutation of
/// the axis, or a short gather list that may repeat indices.
pub fn gen_selector(size: usize) -> BoxedStrategy<Selector> {
    prop_oneof![
        1 => (0..size).prop_map(Selector::Index),
        3 => gen_linear_range(size).prop_map(Selector::from),
        1 => Just(Selector::All),
        1 => Just((0..size).collect::<Vec<_>>())
            .prop_shuffle()
            .prop_map(Selector::List),
        1 => prop::collection::vec(0..size, 1..=size).prop_map(Selector::List),
    ]
    .boxed()
}

/// Generates a pair `(shape, selectors)` where `selectors` holds one
/// selector for each of a leading subset of the shape's axes.
pub fn gen_shape_and_selectors(
    max_dims: usize,
    max_len: usize,
) -> impl Strategy<Value = (Shape, Vec<Selector>)> {
    gen_shape(max_dims, max_len).prop_flat_map(|shape| {
        let per_axis: Vec<_> = shape.extents().into_iter().map(gen_selector).collect();
        let num_axes = shape.num_dim();
        (Just(shape), per_axis, 0..=num_axes).prop_map(|(shape, mut selectors, keep)| {
            selectors.truncate(keep);
            (shape, selectors)
        })
    })
}

#[cfg(test)]
mod tests {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    use super::*;

    #[test]
    fn test_generated_ranges_are_in_bounds() {
        let mut runner = TestRunner::default();
        for _ in 0..256 {
            let r = gen_linear_range(7).new_tree(&mut runner).unwrap().current();
            assert!(!r.is_empty());
            assert!(r.iter().all(|i| i < 7));
        }
    }

    #[test]
    fn test_generated_selections_resolve() {
        let mut runner = TestRunner::default();
        for _ in 0..256 {
            let (shape, selectors) = gen_shape_and_selectors(4, 5)
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(selectors.len() <= shape.num_dim());
            assert!(shape.sub_shape(&selectors).is_ok());
        }
    }
}
