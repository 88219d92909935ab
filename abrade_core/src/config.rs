// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration for [`DamageContext`](crate::context::DamageContext).

/// Default cap on delegate convergence passes.
pub const DEFAULT_MAX_DELEGATE_PASSES: u32 = 64;

/// Configuration for a [`DamageContext`](crate::context::DamageContext).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageConfig {
    /// Upper bound on passes of the delegate fixed-point loop.
    ///
    /// Delegates may report damage that depends on damage reported by other
    /// delegates, so the loop runs until a full pass changes nothing. When the
    /// cap is reached first, the whole output is treated as damaged. `None`
    /// runs the loop without a cap; delegates must then guarantee convergence
    /// themselves.
    pub max_delegate_passes: Option<u32>,
}

impl DamageConfig {
    /// Default configuration: delegate passes capped at
    /// [`DEFAULT_MAX_DELEGATE_PASSES`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_delegate_passes: Some(DEFAULT_MAX_DELEGATE_PASSES),
        }
    }

    /// Configuration with no cap on delegate passes.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_delegate_passes: None,
        }
    }

    /// Returns a copy with the given delegate pass cap.
    #[must_use]
    pub const fn with_max_delegate_passes(mut self, passes: u32) -> Self {
        self.max_delegate_passes = Some(passes);
        self
    }
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self::new()
    }
}
