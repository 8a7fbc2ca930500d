#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # rubric-grader
//!
//! Grades student submissions against a free-text rubric.
//!
//! Set `GRADER_API_KEY` (in the environment or a `.env` file), then run
//! `rubric-grader grade --rubric rubric.txt answers/*.pdf`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use rubric_grader::{
    GraderConfig, GradingClient, Submission, SubmissionProcessor,
    client::gemini::GenerateContentTransport, parse_rubric, report,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Arguments for the `grade` subcommand.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// Path to the rubric text file
    rubric:    PathBuf,
    /// Optional reference answer key
    reference: Option<PathBuf>,
    /// Subject override for the grading prompt
    subject:   Option<String>,
    /// Print JSON instead of tables
    json:      bool,
    /// Submission files, graded in order
    files:     Vec<PathBuf>,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade submissions against a rubric
    Grade(GradeArgs),
    /// Show how a rubric file is parsed
    Rubric(PathBuf),
}

/// Builds the `grade` / `rubric` command parser
fn options() -> Cmd {
    /// parses the rubric path
    fn rubric_path() -> impl Parser<PathBuf> {
        short('r')
            .long("rubric")
            .help("Rubric file with one `Criterion (NN%)` per line")
            .argument::<PathBuf>("PATH")
    }

    let rubric = rubric_path();
    let reference = short('k')
        .long("answer-key")
        .help("Reference answer key to compare each submission with")
        .argument::<PathBuf>("PATH")
        .optional();
    let subject = short('s')
        .long("subject")
        .help("Subject the grader is an expert in (defaults to GRADER_SUBJECT)")
        .argument::<String>("SUBJECT")
        .optional();
    let json = long("json").help("Print results as JSON").switch();
    let files = positional::<PathBuf>("FILE")
        .help("Submission files to grade")
        .some("at least one submission file is required");

    let grade = construct!(GradeArgs {
        rubric,
        reference,
        subject,
        json,
        files
    })
    .map(Cmd::Grade)
    .to_options()
    .command("grade")
    .help("Grade submissions against a rubric");

    let show_rubric = positional::<PathBuf>("PATH")
        .help("Rubric file to parse")
        .map(Cmd::Rubric)
        .to_options()
        .command("rubric")
        .help("Show the weighted criteria parsed from a rubric file");

    let cmd = construct!([grade, show_rubric]);

    cmd.to_options()
        .descr("Rubric-based grading with an external evaluation service")
        .run()
}

/// Runs a grading pass and prints the results.
async fn grade(args: GradeArgs) -> Result<()> {
    let rubric = std::fs::read_to_string(&args.rubric)
        .with_context(|| format!("Could not read rubric: {}", args.rubric.display()))?;
    let files = args
        .files
        .iter()
        .map(Submission::from_path)
        .collect::<Result<Vec<_>>>()?;
    let reference = args
        .reference
        .as_deref()
        .map(Submission::from_path)
        .transpose()?;

    let config = GraderConfig::from_env();
    let subject = args
        .subject
        .unwrap_or_else(|| config.subject().to_string());
    let client = GradingClient::new(move || GenerateContentTransport::connect(&config));
    let processor = SubmissionProcessor::new(client).with_subject(subject);

    let results = processor
        .process(&files, &rubric, reference.as_ref())
        .await
        .context("Grading run aborted")?;

    if args.json {
        println!("{}", report::to_json(&results)?);
    } else {
        for result in &results {
            println!("{}", report::student_table(result));
            println!("{}\n", report::summary_line(result));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::Grade(args) => grade(args).await?,
        Cmd::Rubric(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not read rubric: {}", path.display()))?;
            println!("{}", report::rubric_table(&parse_rubric(&text)));
        }
    }

    Ok(())
}
