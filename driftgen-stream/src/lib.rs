//! Stream harness over the driftgen mixture engine.
//!
//! Wraps sampled points into labeled example records stamped with a stream
//! header, and provides three generators: a single-concept stream, a drifting
//! stream whose pre/post concepts sit a controlled Hellinger distance apart,
//! and a class-imbalanced stream with majority/minority component blocks.

mod drift;
mod error;
mod example;
mod header;
mod imbalanced;
mod mixture;
mod stream;

pub use crate::{
    drift::{DriftStream, DriftStreamConfig, DriftTransition},
    error::{StreamError, StreamErrorCode},
    example::Example,
    header::StreamHeader,
    imbalanced::{ImbalancedStream, ImbalancedStreamConfig},
    mixture::{MixtureStream, MixtureStreamConfig},
    stream::InstanceStream,
};
