use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use lib_dpalign::{
    pairwise_alignment::{
        AlignmentScoring, SequenceAligner, needleman_wunsch::NeedlemanWunsch,
        smith_waterman::SmithWaterman,
    },
    sequence::Sequence,
    substitution_matrix::SubstitutionMatrix,
    symbol::Alphabet,
};
use log::{LevelFilter, debug, info};
use serde::Serialize;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

#[derive(Parser)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The alphabet of the sequences and the substitution matrix.
    #[clap(long, short = 'a', default_value = "dna")]
    alphabet: InputAlphabet,

    #[clap(long, short = 'm', default_value = "global")]
    mode: AlignmentMode,

    /// A substitution matrix file.
    ///
    /// The first line that starts with whitespace lists the column symbols,
    /// every following line starts with a row symbol followed by its scores.
    /// Lines starting with '#' describe the matrix.
    /// If no file is given, an identity matrix is used.
    #[clap(long, conflicts_with_all = ["identity_match", "identity_replace"])]
    matrix: Option<PathBuf>,

    /// The score of matching symbols in the identity matrix.
    #[clap(long, default_value = "1")]
    identity_match: i32,

    /// The score of mismatching symbols in the identity matrix.
    #[clap(long, default_value = "-1")]
    identity_replace: i32,

    /// A toml file containing all scores.
    ///
    /// Scores given as separate arguments override the ones from the file.
    #[clap(long, short = 'c')]
    scoring: Option<PathBuf>,

    #[command(flatten)]
    scores: CliScores,

    /// Print the filled DP matrices before the alignment.
    #[clap(long)]
    print_matrix: bool,

    /// The file to store the alignment statistics in toml format.
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,

    /// The first sequence.
    query: String,

    /// The second sequence.
    subject: String,
}

#[derive(Args)]
struct CliScores {
    /// Used for pairs without matrix entry whose symbols match.
    #[clap(long)]
    match_score: Option<f64>,

    /// Used for pairs without matrix entry whose symbols do not match.
    #[clap(long)]
    replace_score: Option<f64>,

    /// Opening a gap in the query.
    #[clap(long)]
    insert_score: Option<f64>,

    /// Opening a gap in the subject.
    #[clap(long)]
    delete_score: Option<f64>,

    /// Extending a gap.
    ///
    /// If it differs from the insert or delete score, affine gap scoring is used.
    #[clap(long)]
    gap_extend_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum AlignmentMode {
    /// Needleman-Wunsch.
    Global,
    /// Smith-Waterman.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputAlphabet {
    Dna,
    Protein,
}

#[derive(Debug, Serialize)]
struct AlignmentStatistics {
    mode: AlignmentMode,
    substitution_matrix: String,
    score: f64,
    length: usize,
    query_start: usize,
    query_end: usize,
    subject_start: usize,
    subject_end: usize,
    aligned_query: String,
    aligned_subject: String,
    runtime_ms: f64,
    scoring: AlignmentScoring,
}

pub fn cli(cli: Cli) -> Result<()> {
    TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let alphabet = Arc::new(match cli.alphabet {
        InputAlphabet::Dna => Alphabet::dna(),
        InputAlphabet::Protein => Alphabet::protein(),
    });
    let scoring = load_scoring(&cli)?;
    debug!("Using scores {scoring:?}");

    let matrix = Arc::new(if let Some(path) = &cli.matrix {
        info!("Loading substitution matrix {path:?}");
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)
            .with_context(|| format!("Unable to open substitution matrix {path:?}"))?;
        SubstitutionMatrix::read_plain(alphabet.clone(), name, BufReader::new(file))?
    } else {
        SubstitutionMatrix::identity(alphabet.clone(), cli.identity_match, cli.identity_replace)
    });
    info!(
        "Using substitution matrix {} with scores from {} to {}",
        matrix.name(),
        matrix.min(),
        matrix.max()
    );

    let query = Sequence::parse(alphabet.clone(), "query", &cli.query)
        .context("Query contains non-alphabet character")?;
    let subject = Sequence::parse(alphabet, "subject", &cli.subject)
        .context("Subject contains non-alphabet character")?;

    let matrix_name = matrix.name().to_string();
    let alignment = match cli.mode {
        AlignmentMode::Global => {
            let aligner = NeedlemanWunsch::new(scoring, matrix);
            if cli.print_matrix {
                println!("{}", aligner.fill(&query, &subject)?);
            }
            aligner.align(&query, &subject)?
        }
        AlignmentMode::Local => {
            let aligner = SmithWaterman::new(scoring, matrix);
            if cli.print_matrix {
                println!("{}", aligner.fill(&query, &subject)?);
            }
            aligner.align(&query, &subject)?
        }
    };

    println!("{alignment}");

    if let Some(output) = &cli.output {
        info!("Writing statistics to {output:?}");
        let statistics = AlignmentStatistics {
            mode: cli.mode,
            substitution_matrix: matrix_name,
            score: alignment.score(),
            length: alignment.len(),
            query_start: alignment.query_range().start,
            query_end: alignment.query_range().end,
            subject_start: alignment.subject_range().start,
            subject_end: alignment.subject_range().end,
            aligned_query: alignment.aligned_query().to_string(),
            aligned_subject: alignment.aligned_subject().to_string(),
            runtime_ms: alignment.elapsed().as_secs_f64() * 1e3,
            scoring,
        };
        std::fs::write(output, toml::to_string(&statistics)?)
            .with_context(|| format!("Unable to write statistics to {output:?}"))?;
    }

    Ok(())
}

fn load_scoring(cli: &Cli) -> Result<AlignmentScoring> {
    let mut scoring = if let Some(path) = &cli.scoring {
        info!("Loading scores from {path:?}");
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read scoring file {path:?}"))?;
        toml::from_str(&input).with_context(|| format!("Unable to parse scoring file {path:?}"))?
    } else {
        AlignmentScoring::default()
    };

    let CliScores {
        match_score,
        replace_score,
        insert_score,
        delete_score,
        gap_extend_score,
    } = &cli.scores;
    for (target, value) in [
        (&mut scoring.match_score, match_score),
        (&mut scoring.replace_score, replace_score),
        (&mut scoring.insert_score, insert_score),
        (&mut scoring.delete_score, delete_score),
        (&mut scoring.gap_extend_score, gap_extend_score),
    ] {
        if let Some(value) = value {
            *target = *value;
        }
    }

    Ok(scoring)
}
