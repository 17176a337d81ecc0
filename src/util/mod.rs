//! Utilities used by the rest of the crate.

/// Address arithmetic.
pub mod address;
/// Size constants for cards and regions.
pub mod constants;
/// Install the built-in logger.
pub mod logger;
/// Runtime options.
pub mod options;
/// Safepoint state.
pub mod safepoint;

#[cfg(test)]
pub(crate) mod test_util;

pub use self::address::Address;
