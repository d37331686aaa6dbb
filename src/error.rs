use thiserror::Error;

/// Errors surfaced by fallible cache construction.
///
/// Lookup misses are not errors: `get` on an absent key returns `None`.
/// The only failure mode is constructing a cache that could never hold an
/// entry, which is rejected before any state is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested capacity was zero. A cache must be able to hold at
    /// least one entry.
    #[error("cache capacity must be at least 1")]
    InvalidCapacity,
}
