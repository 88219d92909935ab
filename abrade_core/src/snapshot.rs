// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable record of what a frame painted.

use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::contribution::{Contribution, ContributionKey};
use crate::geometry::OutputSize;

/// Everything one frame painted, for diffing against the next frame.
///
/// Produced by [`DamageContext::finish`](crate::context::DamageContext::finish)
/// and handed back to the following
/// [`init`](crate::context::DamageContext::init) for the same render target.
/// A snapshot is never modified after it is produced. Dropping it forces full
/// damage on the next frame.
#[derive(Debug)]
pub struct FrameSnapshot {
    output_size: OutputSize,
    /// Contributions sorted by strictly increasing paint order.
    contributions: Vec<Contribution>,
    /// Key to positions in `contributions`, ascending.
    index: HashMap<ContributionKey, SmallVec<[usize; 1]>>,
}

impl FrameSnapshot {
    /// Builds a snapshot from contributions already sorted by paint order.
    pub(crate) fn new(output_size: OutputSize, contributions: Vec<Contribution>) -> Self {
        debug_assert!(
            contributions
                .windows(2)
                .all(|w| w[0].paint_order < w[1].paint_order),
            "snapshot contributions must be in paint order"
        );
        let mut index: HashMap<ContributionKey, SmallVec<[usize; 1]>> =
            HashMap::with_capacity(contributions.len());
        for (i, c) in contributions.iter().enumerate() {
            index.entry(c.key()).or_default().push(i);
        }
        Self {
            output_size,
            contributions,
            index,
        }
    }

    /// Size of the render target this frame was computed for.
    #[inline]
    #[must_use]
    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }

    /// Number of contributions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    /// Returns `true` if the frame painted nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Iterates contributions in paint order.
    pub fn iter(&self) -> core::slice::Iter<'_, Contribution> {
        self.contributions.iter()
    }

    /// The contribution with paint order `paint_order`, if it was kept.
    #[must_use]
    pub fn get(&self, paint_order: usize) -> Option<&Contribution> {
        self.contributions
            .binary_search_by_key(&paint_order, |c| c.paint_order)
            .ok()
            .map(|i| &self.contributions[i])
    }

    /// Contributions in paint order, as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Returns the first contribution (in paint order) equivalent to `c`.
    #[must_use]
    pub fn find_equivalent(&self, c: &Contribution) -> Option<&Contribution> {
        self.candidates(c)
            .map(|i| &self.contributions[i])
            .find(|prev| prev.is_equivalent(c))
    }

    /// Claims the first equivalent contribution not yet marked in `taken`.
    ///
    /// Feeding a frame's contributions through this in paint order assigns
    /// each previous contribution to at most one current one. Returns the
    /// claimed position.
    pub(crate) fn claim_equivalent(&self, c: &Contribution, taken: &mut [bool]) -> Option<usize> {
        let found = self
            .candidates(c)
            .find(|&i| !taken[i] && self.contributions[i].is_equivalent(c))?;
        taken[found] = true;
        Some(found)
    }

    /// Positions of contributions sharing `c`'s hash key, ascending.
    ///
    /// Candidates still have to be confirmed with
    /// [`Contribution::is_equivalent`].
    pub(crate) fn candidates(&self, c: &Contribution) -> impl Iterator<Item = usize> + '_ {
        self.index
            .get(&c.key())
            .map(|bucket| bucket.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }
}

impl<'a> IntoIterator for &'a FrameSnapshot {
    type Item = &'a Contribution;
    type IntoIter = core::slice::Iter<'a, Contribution>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
