//! Read model trait for query-side views.

/// Query access to data a projection keeps denormalized.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of entries currently held.
    fn count(&self) -> usize;
}
