//! Single-concept stream backed by one mixture model.

use std::sync::Arc;

use driftgen_core::MixtureModel;

use crate::{
    error::StreamError, example::Example, header::StreamHeader, stream::InstanceStream,
};

/// Configuration for a [`MixtureStream`].
#[derive(Clone, Copy, Debug)]
pub struct MixtureStreamConfig {
    /// Number of mixture components, one class per component.
    pub num_components: usize,
    /// Dimensionality of the attribute space.
    pub dimensions: usize,
    /// Seed of the instance stream.
    pub instance_seed: u64,
    /// Seed of the model stream.
    pub model_seed: u64,
}

impl Default for MixtureStreamConfig {
    fn default() -> Self {
        Self {
            num_components: 2,
            dimensions: 10,
            instance_seed: 1,
            model_seed: 1,
        }
    }
}

/// An endless stream of examples drawn from one mixture model.
///
/// # Examples
/// ```
/// use driftgen_stream::{InstanceStream, MixtureStream, MixtureStreamConfig};
///
/// let mut stream = MixtureStream::new(MixtureStreamConfig {
///     num_components: 3,
///     dimensions: 2,
///     instance_seed: 1,
///     model_seed: 1,
/// })
/// .expect("configuration is valid");
/// let example = stream.next_example();
/// assert_eq!(example.values().len(), 2);
/// assert!(example.class() < 3);
/// ```
#[derive(Clone, Debug)]
pub struct MixtureStream {
    header: Arc<StreamHeader>,
    model: MixtureModel,
}

impl MixtureStream {
    /// Builds the mixture and its header.
    ///
    /// # Errors
    /// Returns [`StreamError::Model`] when the mixture shape is invalid.
    pub fn new(config: MixtureStreamConfig) -> Result<Self, StreamError> {
        let model = MixtureModel::new(
            config.num_components,
            config.dimensions,
            config.instance_seed,
            config.model_seed,
        )?;
        let header = Arc::new(StreamHeader::numeric(
            config.dimensions,
            config.num_components,
        ));
        Ok(Self { header, model })
    }

    /// Returns the underlying mixture for introspection.
    #[must_use]
    pub fn model(&self) -> &MixtureModel {
        &self.model
    }
}

impl InstanceStream for MixtureStream {
    fn header(&self) -> &Arc<StreamHeader> {
        &self.header
    }

    fn next_example(&mut self) -> Example {
        let (values, class) = self.model.sample().into_parts();
        Example::new(Arc::clone(&self.header), values, class)
    }

    fn restart(&mut self) {
        let (instance_seed, model_seed) = self.model.seeds();
        self.model.restart(instance_seed, model_seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_replays_the_example_sequence() {
        let mut stream = MixtureStream::new(MixtureStreamConfig {
            num_components: 2,
            dimensions: 3,
            instance_seed: 5,
            model_seed: 7,
        })
        .expect("stream");
        let first: Vec<Example> = (0..8).map(|_| stream.next_example()).collect();
        stream.restart();
        let second: Vec<Example> = (0..8).map(|_| stream.next_example()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn stream_is_unbounded() {
        let stream = MixtureStream::new(MixtureStreamConfig::default()).expect("stream");
        assert!(stream.has_more());
        assert_eq!(stream.estimated_remaining(), None);
    }
}
