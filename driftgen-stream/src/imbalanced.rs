//! Class-imbalanced stream with majority/minority component blocks.
//!
//! The mixture's first components form the majority class and receive a
//! caller-chosen share of the sampling mass; the rest form the minority
//! class. Labels are collapsed to binary (majority → 0, minority → 1), and an
//! optional concept attribute records which sub-concept produced each
//! example.

use std::sync::Arc;

use driftgen_core::MixtureModel;

use crate::{
    error::StreamError, example::Example, header::StreamHeader, stream::InstanceStream,
};

/// Configuration for an [`ImbalancedStream`].
#[derive(Clone, Copy, Debug)]
pub struct ImbalancedStreamConfig {
    /// Dimensionality of the attribute space.
    pub dimensions: usize,
    /// Number of components forming the majority class.
    pub majority_components: usize,
    /// Number of components forming the minority class.
    pub minority_components: usize,
    /// Share of the sampling mass given to the majority class, in
    /// `[0.51, 1.0)`.
    pub percent_majority: f64,
    /// Whether each example carries a leading concept attribute.
    pub concept_marked: bool,
    /// Seed of the instance stream.
    pub instance_seed: u64,
    /// Seed of the model stream.
    pub model_seed: u64,
}

impl Default for ImbalancedStreamConfig {
    fn default() -> Self {
        Self {
            dimensions: 10,
            majority_components: 1,
            minority_components: 2,
            percent_majority: 0.9,
            concept_marked: false,
            instance_seed: 1,
            model_seed: 1,
        }
    }
}

/// A binary-class stream where the majority class dominates the sampling
/// mass.
///
/// # Examples
/// ```
/// use driftgen_stream::{ImbalancedStream, ImbalancedStreamConfig, InstanceStream};
///
/// let mut stream = ImbalancedStream::new(ImbalancedStreamConfig {
///     dimensions: 2,
///     majority_components: 1,
///     minority_components: 2,
///     percent_majority: 0.9,
///     concept_marked: true,
///     instance_seed: 1,
///     model_seed: 1,
/// })
/// .expect("configuration is valid");
/// let example = stream.next_example();
/// assert_eq!(example.values().len(), 3); // concept + att1 + att2
/// assert!(example.class() <= 1);
/// ```
#[derive(Clone, Debug)]
pub struct ImbalancedStream {
    header: Arc<StreamHeader>,
    model: MixtureModel,
    majority_components: usize,
    concept_assignments: Option<Vec<f64>>,
}

impl ImbalancedStream {
    /// Builds the mixture, splits the weight mass, and prepares the header.
    ///
    /// # Errors
    /// Returns [`StreamError::InvalidMajorityFraction`] when
    /// `percent_majority` lies outside `[0.51, 1.0)`, and
    /// [`StreamError::Model`] when the component split is invalid.
    pub fn new(config: ImbalancedStreamConfig) -> Result<Self, StreamError> {
        if !(0.51..1.0).contains(&config.percent_majority) {
            return Err(StreamError::InvalidMajorityFraction {
                got: config.percent_majority,
            });
        }

        let num_components = config.majority_components + config.minority_components;
        let mut model = MixtureModel::new(
            num_components,
            config.dimensions,
            config.instance_seed,
            config.model_seed,
        )?;
        model.set_weights(config.majority_components, config.percent_majority)?;
        let concept_assignments = if config.concept_marked {
            Some(model.concept_assignments(config.majority_components)?)
        } else {
            None
        };

        Ok(Self {
            header: Arc::new(StreamHeader::binary(
                config.dimensions,
                config.concept_marked,
            )),
            model,
            majority_components: config.majority_components,
            concept_assignments,
        })
    }

    /// Returns the underlying mixture for introspection.
    #[must_use]
    pub fn model(&self) -> &MixtureModel {
        &self.model
    }
}

impl InstanceStream for ImbalancedStream {
    fn header(&self) -> &Arc<StreamHeader> {
        &self.header
    }

    fn next_example(&mut self) -> Example {
        let (attributes, component) = self.model.sample().into_parts();
        let class = usize::from(component >= self.majority_components);
        let values = match &self.concept_assignments {
            Some(assignments) => {
                let mut values = Vec::with_capacity(attributes.len() + 1);
                values.push(assignments[component]);
                values.extend(attributes);
                values
            }
            None => attributes,
        };
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

    fn config() -> ImbalancedStreamConfig {
        ImbalancedStreamConfig {
            dimensions: 2,
            majority_components: 2,
            minority_components: 3,
            percent_majority: 0.8,
            concept_marked: false,
            instance_seed: 3,
            model_seed: 5,
        }
    }

    #[test]
    fn rejects_balanced_majority_fractions() {
        let err = ImbalancedStream::new(ImbalancedStreamConfig {
            percent_majority: 0.5,
            ..config()
        })
        .expect_err("a balanced split is not imbalanced");
        assert!(matches!(err, StreamError::InvalidMajorityFraction { .. }));
    }

    #[test]
    fn labels_are_binary_and_majority_heavy() {
        let mut stream = ImbalancedStream::new(config()).expect("stream");
        let draws = 20_000;
        let mut majority = 0_u32;
        for _ in 0..draws {
            let example = stream.next_example();
            assert!(example.class() <= 1);
            if example.class() == 0 {
                majority += 1;
            }
        }
        let fraction = f64::from(majority) / f64::from(draws);
        assert!(
            (fraction - 0.8).abs() < 0.02,
            "majority fraction {fraction} must approach 0.8"
        );
    }

    #[test]
    fn concept_marking_prepends_the_generating_component() {
        let mut stream = ImbalancedStream::new(ImbalancedStreamConfig {
            concept_marked: true,
            ..config()
        })
        .expect("stream");
        for _ in 0..64 {
            let example = stream.next_example();
            assert_eq!(example.values().len(), 3);
            let concept = example.values()[0];
            assert!(concept >= 0.0 && concept < 5.0);
            assert_eq!(concept.fract(), 0.0, "concept ids are integral");
        }
    }
}
