//! Atomic integer types used throughout the crate
//!
//! On platforms without native atomic support, enable the `portable-atomic`
//! feature to fall back to [`portable_atomic`]'s software-emulated types.

#[cfg(not(feature = "portable-atomic"))]
pub(crate) use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

#[cfg(feature = "portable-atomic")]
pub(crate) use portable_atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
