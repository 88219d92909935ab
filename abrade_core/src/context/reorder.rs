// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detection of unchanged contributions whose stacking changed.
//!
//! Two contributions that are equivalent across frames can still damage the
//! screen when they swap paint order and overlap: the one on top changed.
//! Given the matched contributions in current paint order together with their
//! ranks in the previous frame, [`flag_reordered`] finds every inverted pair
//! (`i < j` now, but `j` painted before `i` previously) and flags both members
//! of each inverted pair that overlaps.
//!
//! Both sequences are walked from the top in lock-step. Elements seen in one
//! sequence but not yet in the other wait in a pending list per side, in the
//! order they were seen. When an element is reached in the second sequence,
//! exactly the entries pending ahead of it on the other side are inverted with
//! it. So every inverted pair is visited once and non-inverted pairs are never
//! compared.

use alloc::vec;
use alloc::vec::Vec;

/// Flags matched elements that changed order relative to an overlapping one.
///
/// `previous_rank[i]` is the previous-frame rank of the element at current
/// position `i`; ranks must be distinct. `overlaps(i, j)` reports whether the
/// elements at current positions `i` and `j` overlap on screen.
pub(crate) fn flag_reordered(
    previous_rank: &[usize],
    mut overlaps: impl FnMut(usize, usize) -> bool,
) -> Vec<bool> {
    let n = previous_rank.len();
    let mut by_previous: Vec<usize> = (0..n).collect();
    by_previous.sort_unstable_by_key(|&i| previous_rank[i]);

    let mut flagged = vec![false; n];
    let mut pending_current: Vec<usize> = Vec::new();
    let mut pending_previous: Vec<usize> = Vec::new();

    for depth in (0..n).rev() {
        visit(
            depth,
            &mut pending_current,
            &mut pending_previous,
            &mut flagged,
            &mut overlaps,
        );
        visit(
            by_previous[depth],
            &mut pending_previous,
            &mut pending_current,
            &mut flagged,
            &mut overlaps,
        );
    }

    debug_assert!(
        pending_current.is_empty() && pending_previous.is_empty(),
        "both sequences must hold the same elements"
    );
    flagged
}

/// Reaches `x` in one sequence. `own` holds elements seen only in this
/// sequence, `other` those seen only in the other one.
fn visit(
    x: usize,
    own: &mut Vec<usize>,
    other: &mut Vec<usize>,
    flagged: &mut [bool],
    overlaps: &mut impl FnMut(usize, usize) -> bool,
) {
    match other.iter().position(|&e| e == x) {
        Some(k) => {
            // Entries pending ahead of `x` were above it in the other
            // sequence and are below it in this one.
            for &y in &other[..k] {
                check(x, y, flagged, overlaps);
            }
            other.remove(k);
        }
        None => {
            // `x` is above everything still pending on the other side here,
            // and below it there.
            for &y in other.iter() {
                check(x, y, flagged, overlaps);
            }
            own.push(x);
        }
    }
}

fn check(
    x: usize,
    y: usize,
    flagged: &mut [bool],
    overlaps: &mut impl FnMut(usize, usize) -> bool,
) {
    if flagged[x] && flagged[y] {
        return;
    }
    if overlaps(x, y) {
        flagged[x] = true;
        flagged[y] = true;
    }
}
