// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual modifiers that enclose a layer at paint time.
//!
//! A tree walker keeps a [`MutatorStack`] of everything enclosing the layer it
//! is visiting: transforms, clips, opacity, and filters. When a layer is
//! appended to the damage context, the non-transform entries are copied into
//! the contribution's [`MutatorChain`]. Transforms are left out because the
//! contribution's bounds are already in screen space.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, BezPath, Rect, RoundedRect};
use smallvec::SmallVec;

/// Opaque content id of a color or image filter.
///
/// Two filters with the same key are assumed to produce identical output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterKey(pub u64);

impl fmt::Debug for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterKey({})", self.0)
    }
}

/// One entry of a mutator stack.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutator {
    /// An affine transform into the parent's coordinate space.
    Transform(Affine),
    /// Axis-aligned rectangular clip.
    ClipRect(Rect),
    /// Rounded-rectangle clip.
    ClipRoundedRect(RoundedRect),
    /// Arbitrary path clip.
    ClipPath(Rc<BezPath>),
    /// Group opacity as an 8-bit alpha.
    Opacity(u8),
    /// Color filter applied to the subtree.
    ColorFilter(FilterKey),
    /// Image filter applied to the subtree.
    ImageFilter(FilterKey),
}

impl Mutator {
    /// Returns `true` for [`Mutator::Transform`].
    #[inline]
    #[must_use]
    pub const fn is_transform(&self) -> bool {
        matches!(self, Self::Transform(_))
    }
}

/// The walker-side stack of enclosing mutators.
#[derive(Clone, Debug, Default)]
pub struct MutatorStack {
    entries: Vec<Mutator>,
}

impl MutatorStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Pushes a mutator for the subtree being entered.
    pub fn push(&mut self, mutator: Mutator) {
        self.entries.push(mutator);
    }

    /// Pops the innermost mutator.
    pub fn pop(&mut self) -> Option<Mutator> {
        self.entries.pop()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates from the outermost entry to the innermost.
    pub fn iter(&self) -> core::slice::Iter<'_, Mutator> {
        self.entries.iter()
    }

    /// Product of all pushed transforms, outermost first.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.entries
            .iter()
            .filter_map(|m| match m {
                Mutator::Transform(t) => Some(*t),
                _ => None,
            })
            .fold(Affine::IDENTITY, |acc, t| acc * t)
    }
}

impl<'a> IntoIterator for &'a MutatorStack {
    type Item = &'a Mutator;
    type IntoIter = core::slice::Iter<'a, Mutator>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The non-transform mutators enclosing one contribution, outermost first.
///
/// Equality is pairwise and length-sensitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutatorChain {
    entries: SmallVec<[Mutator; 4]>,
}

impl MutatorChain {
    /// Copies the non-transform entries of `stack`.
    #[must_use]
    pub fn from_stack(stack: &MutatorStack) -> Self {
        Self {
            entries: stack.iter().filter(|m| !m.is_transform()).cloned().collect(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the layer had no non-transform mutators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Mutator] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_skips_transforms() {
        let mut stack = MutatorStack::new();
        stack.push(Mutator::Transform(Affine::translate((10.0, 0.0))));
        stack.push(Mutator::Opacity(128));
        stack.push(Mutator::Transform(Affine::scale(2.0)));
        stack.push(Mutator::ClipRect(Rect::new(0.0, 0.0, 5.0, 5.0)));

        let chain = MutatorChain::from_stack(&stack);
        assert_eq!(
            chain.as_slice(),
            &[
                Mutator::Opacity(128),
                Mutator::ClipRect(Rect::new(0.0, 0.0, 5.0, 5.0)),
            ]
        );
    }

    #[test]
    fn chain_equality_is_pairwise_and_length_sensitive() {
        let mut a = MutatorStack::new();
        a.push(Mutator::Opacity(255));
        let mut b = a.clone();
        assert_eq!(MutatorChain::from_stack(&a), MutatorChain::from_stack(&b));

        b.push(Mutator::ColorFilter(FilterKey(3)));
        assert_ne!(MutatorChain::from_stack(&a), MutatorChain::from_stack(&b));

        b.pop();
        b.pop();
        b.push(Mutator::Opacity(254));
        assert_ne!(MutatorChain::from_stack(&a), MutatorChain::from_stack(&b));
    }

    #[test]
    fn clip_paths_compare_by_value() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((0.0, 10.0));
        path.close_path();

        let a = Mutator::ClipPath(Rc::new(path.clone()));
        let b = Mutator::ClipPath(Rc::new(path));
        assert_eq!(a, b);
    }

    #[test]
    fn stack_transform_composes_outermost_first() {
        let mut stack = MutatorStack::new();
        stack.push(Mutator::Transform(Affine::translate((10.0, 0.0))));
        stack.push(Mutator::ClipRect(Rect::new(0.0, 0.0, 1.0, 1.0)));
        stack.push(Mutator::Transform(Affine::scale(2.0)));

        let t = stack.transform();
        assert_eq!(t * kurbo::Point::new(1.0, 1.0), kurbo::Point::new(12.0, 2.0));
        assert_eq!(stack.len(), 3);
        assert!(!stack.is_empty());
    }
}
