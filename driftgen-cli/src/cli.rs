//! Command-line interface orchestration for the driftgen generators.
//!
//! The CLI offers a `generate` command that configures one of the stream
//! generators and writes its examples as CSV: a header row naming the columns
//! followed by one row per example, the class label last.

use std::io::{self, Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use driftgen_core::DriftSearchParams;
use driftgen_stream::{
    DriftStream, DriftStreamConfig, DriftTransition, ImbalancedStream, ImbalancedStreamConfig,
    InstanceStream, MixtureStream, MixtureStreamConfig, StreamError,
};
use thiserror::Error;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "driftgen", about = "Generate synthetic mixture-model data streams.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a stream of labeled examples as CSV on stdout.
    Generate(GenerateCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Number of examples to generate.
    #[arg(long, default_value_t = 1_000)]
    pub count: u64,

    /// Stream configuration.
    #[command(subcommand)]
    pub source: GenerateSource,
}

/// Stream generators supported by the CLI.
#[derive(Debug, Subcommand, Clone)]
pub enum GenerateSource {
    /// A single-concept stream from one mixture model.
    Mixture(MixtureArgs),
    /// A drifting stream whose concepts sit a target Hellinger distance
    /// apart.
    Drift(DriftArgs),
    /// A class-imbalanced stream with majority/minority component blocks.
    Imbalanced(ImbalancedArgs),
}

/// Arguments for the single-concept stream.
#[derive(Debug, Args, Clone)]
pub struct MixtureArgs {
    /// Number of mixture components (one class per component).
    #[arg(long, default_value_t = 2)]
    pub components: usize,

    /// Number of attributes to generate.
    #[arg(long, default_value_t = 10)]
    pub dimensions: usize,

    /// Seed for random generation of instances.
    #[arg(long, default_value_t = 1)]
    pub instance_seed: u64,

    /// Seed for random generation of the model.
    #[arg(long, default_value_t = 1)]
    pub model_seed: u64,
}

/// Arguments for the drifting stream.
#[derive(Debug, Args, Clone)]
pub struct DriftArgs {
    /// Number of attributes to generate.
    #[arg(long, default_value_t = 10)]
    pub dimensions: usize,

    /// Component count of the pre-drift concept.
    #[arg(long, default_value_t = 2)]
    pub pre_components: usize,

    /// Component count of the post-drift concept.
    #[arg(long, default_value_t = 2)]
    pub post_components: usize,

    /// Instances drawn from the pre-drift concept before the transition.
    #[arg(long, default_value_t = 10_000)]
    pub burn_in: u64,

    /// Width of the transition window in instances.
    #[arg(long, default_value_t = 0)]
    pub drift_duration: u64,

    /// Drift magnitude as a Hellinger distance in (0, 0.9].
    #[arg(long, default_value_t = 0.5)]
    pub magnitude: f64,

    /// Acceptable deviation from the drift magnitude.
    #[arg(long, default_value_t = 0.01)]
    pub precision: f64,

    /// Transition function across the drift window.
    #[arg(long, value_enum, default_value_t = TransitionArg::Incremental)]
    pub transition: TransitionArg,

    /// Seed for random generation of instances.
    #[arg(long, default_value_t = 1)]
    pub instance_seed: u64,

    /// Seed for random generation of the models.
    #[arg(long, default_value_t = 1)]
    pub model_seed: u64,
}

/// Arguments for the class-imbalanced stream.
#[derive(Debug, Args, Clone)]
pub struct ImbalancedArgs {
    /// Number of attributes to generate.
    #[arg(long, default_value_t = 10)]
    pub dimensions: usize,

    /// Number of components forming the majority class.
    #[arg(long, default_value_t = 1)]
    pub majority_components: usize,

    /// Number of components forming the minority class.
    #[arg(long, default_value_t = 2)]
    pub minority_components: usize,

    /// Share of instances drawn from the majority class, in [0.51, 1.0).
    #[arg(long, default_value_t = 0.9)]
    pub percent_majority: f64,

    /// Prepend a concept attribute naming the generating sub-concept.
    #[arg(long)]
    pub concept_marked: bool,

    /// Seed for random generation of instances.
    #[arg(long, default_value_t = 1)]
    pub instance_seed: u64,

    /// Seed for random generation of the model.
    #[arg(long, default_value_t = 1)]
    pub model_seed: u64,
}

/// Transition shapes exposed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransitionArg {
    /// Linear ramp across the drift window.
    Incremental,
    /// Logistic ramp across the drift window.
    Gradual,
}

impl From<TransitionArg> for DriftTransition {
    fn from(value: TransitionArg) -> Self {
        match value {
            TransitionArg::Incremental => Self::Incremental,
            TransitionArg::Gradual => Self::Gradual,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Writing the CSV payload failed.
    #[error("failed to write output: {source}")]
    Io {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Stream construction or generation failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl CliError {
    /// Returns the stable stream error code when one applies.
    #[must_use]
    pub fn stream_code(&self) -> Option<&'static str> {
        match self {
            Self::Stream(error) => Some(error.code().as_str()),
            Self::Io { .. } => None,
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name of the generator that produced the stream.
    pub generator: &'static str,
    /// Number of examples written.
    pub examples: u64,
}

/// Executes the CLI command, writing CSV to `writer`.
///
/// # Errors
/// Returns [`CliError`] when stream construction or output fails.
///
/// # Examples
/// ```
/// use driftgen_cli::cli::{Cli, run_cli};
/// use clap::Parser;
///
/// let cli = Cli::parse_from([
///     "driftgen", "generate", "--count", "5", "mixture",
///     "--components", "2", "--dimensions", "2",
/// ]);
/// let mut buffer = Vec::new();
/// let summary = run_cli(cli, &mut buffer).expect("generation succeeds");
/// assert_eq!(summary.examples, 5);
/// let csv = String::from_utf8(buffer).expect("utf-8");
/// assert_eq!(csv.lines().count(), 6); // header + 5 rows
/// ```
pub fn run_cli(cli: Cli, writer: &mut impl Write) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Generate(generate) => run_generate(generate, writer),
    }
}

fn run_generate(
    command: GenerateCommand,
    writer: &mut impl Write,
) -> Result<ExecutionSummary, CliError> {
    match command.source {
        GenerateSource::Mixture(args) => {
            let stream = MixtureStream::new(MixtureStreamConfig {
                num_components: args.components,
                dimensions: args.dimensions,
                instance_seed: args.instance_seed,
                model_seed: args.model_seed,
            })?;
            write_examples("mixture", stream, command.count, writer)
        }
        GenerateSource::Drift(args) => {
            let search = DriftSearchParams::new(args.magnitude, args.precision)
                .map_err(StreamError::from)?;
            let stream = DriftStream::new(DriftStreamConfig {
                dimensions: args.dimensions,
                pre_components: args.pre_components,
                post_components: args.post_components,
                burn_in: args.burn_in,
                drift_duration: args.drift_duration,
                transition: args.transition.into(),
                search,
                instance_seed: args.instance_seed,
                model_seed: args.model_seed,
            })?;
            write_examples("drift", stream, command.count, writer)
        }
        GenerateSource::Imbalanced(args) => {
            let stream = ImbalancedStream::new(ImbalancedStreamConfig {
                dimensions: args.dimensions,
                majority_components: args.majority_components,
                minority_components: args.minority_components,
                percent_majority: args.percent_majority,
                concept_marked: args.concept_marked,
                instance_seed: args.instance_seed,
                model_seed: args.model_seed,
            })?;
            write_examples("imbalanced", stream, command.count, writer)
        }
    }
}

fn write_examples(
    generator: &'static str,
    mut stream: impl InstanceStream,
    count: u64,
    writer: &mut impl Write,
) -> Result<ExecutionSummary, CliError> {
    write_row(writer, stream.header().column_names().iter())?;
    for _ in 0..count {
        let example = stream.next_example();
        let mut fields: Vec<String> =
            example.values().iter().map(ToString::to_string).collect();
        fields.push(
            example
                .class_name()
                .map_or_else(|| example.class().to_string(), ToOwned::to_owned),
        );
        write_row(writer, fields.iter())?;
    }
    Ok(ExecutionSummary {
        generator,
        examples: count,
    })
}

fn write_row<'a>(
    writer: &mut impl Write,
    fields: impl Iterator<Item = &'a String>,
) -> Result<(), CliError> {
    let row = fields
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{row}").map_err(|source| CliError::Io { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args.iter().copied())
    }

    #[rstest]
    #[case(1)]
    #[case(25)]
    fn generate_mixture_writes_header_and_rows(#[case] count: usize) {
        let cli = parse(&[
            "driftgen",
            "generate",
            "--count",
            &count.to_string(),
            "mixture",
            "--components",
            "3",
            "--dimensions",
            "2",
        ]);
        let mut buffer = Vec::new();
        let summary = run_cli(cli, &mut buffer).expect("generation must succeed");
        assert_eq!(summary.generator, "mixture");
        assert_eq!(summary.examples as usize, count);

        let csv = String::from_utf8(buffer).expect("utf-8");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("att1,att2,class"));
        assert_eq!(lines.count(), count);
    }

    #[test]
    fn generate_imbalanced_marks_concepts() {
        let cli = parse(&[
            "driftgen",
            "generate",
            "--count",
            "10",
            "imbalanced",
            "--dimensions",
            "2",
            "--concept-marked",
        ]);
        let mut buffer = Vec::new();
        run_cli(cli, &mut buffer).expect("generation must succeed");

        let csv = String::from_utf8(buffer).expect("utf-8");
        let header = csv.lines().next().expect("header row");
        assert_eq!(header, "concept,att1,att2,class");
        for row in csv.lines().skip(1) {
            let class = row.rsplit(',').next().expect("class field");
            assert!(class == "class0" || class == "class1");
        }
    }

    #[test]
    fn generate_imbalanced_rejects_balanced_fractions() {
        let cli = parse(&[
            "driftgen",
            "generate",
            "imbalanced",
            "--percent-majority",
            "0.5",
        ]);
        let mut buffer = Vec::new();
        let err = run_cli(cli, &mut buffer).expect_err("balanced split must fail");
        assert!(matches!(
            err,
            CliError::Stream(StreamError::InvalidMajorityFraction { .. })
        ));
        assert_eq!(err.stream_code(), Some("STREAM_INVALID_MAJORITY_FRACTION"));
    }

    #[test]
    fn clap_rejects_unknown_transitions() {
        let result = Cli::try_parse_from([
            "driftgen",
            "generate",
            "drift",
            "--transition",
            "teleport",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_parses_drift_options() {
        let cli = parse(&[
            "driftgen",
            "generate",
            "drift",
            "--magnitude",
            "0.3",
            "--precision",
            "0.05",
            "--burn-in",
            "100",
            "--transition",
            "gradual",
        ]);
        let Command::Generate(generate) = cli.command;
        match generate.source {
            GenerateSource::Drift(args) => {
                assert!((args.magnitude - 0.3).abs() < 1e-12);
                assert_eq!(args.burn_in, 100);
                assert!(matches!(args.transition, TransitionArg::Gradual));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
