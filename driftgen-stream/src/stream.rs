//! The generator seam consumed by downstream harnesses.

use std::sync::Arc;

use crate::{example::Example, header::StreamHeader};

/// A source of labeled examples.
///
/// Generators are infinite unless stated otherwise; `estimated_remaining`
/// returns `None` for unbounded streams.
pub trait InstanceStream {
    /// Returns the header describing the columns of upcoming examples.
    fn header(&self) -> &Arc<StreamHeader>;

    /// Produces the next example.
    fn next_example(&mut self) -> Example;

    /// Returns whether more examples can be produced.
    #[must_use]
    fn has_more(&self) -> bool {
        true
    }

    /// Returns the number of remaining examples, `None` when unbounded.
    #[must_use]
    fn estimated_remaining(&self) -> Option<u64> {
        None
    }

    /// Rewinds the stream to its initial seeded state.
    fn restart(&mut self);
}
