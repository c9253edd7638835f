//! CLI entry point for the question generator.
//!
//! Provides commands for importing questions, building the similarity index,
//! querying it, and generating new questions from a retrieved example.

use anyhow::{Context, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use qgen::display::{
    THEME, Theme, create_import_summary_table, create_match_table, create_progress_bar,
    create_record_table, create_spinner, with_spinner,
};
use qgen::generator::{
    GeneratedQuestion, GenerationPipeline, OpenAiChatModel, Stage, Transition,
    example_from_record,
};
use qgen::import::{collect_records, import_all_with_progress};
use qgen::index::verify_against;
use qgen::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use qgen::{
    CsvSource, FastEmbedder, IndexBuilder, IndexError, Match, MetadataStore, QuestionId,
    QuestionRecord, Retriever, Settings, SimilarityIndex, SledStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Quick start section shown after the generated help
fn quick_start_help() -> String {
    let title = if Theme::should_disable_colors() {
        "Quick Start:".to_string()
    } else {
        console::style("Quick Start:").cyan().bold().to_string()
    };

    format!(
        "{title}\n  \
         $ qgen init                          # Create .qgen/settings.toml\n  \
         $ qgen import questions.csv          # Load questions into the store\n  \
         $ qgen build                         # Embed stored questions\n  \
         $ qgen query \"Plastic waste ...\" -k 3 # Find similar questions\n  \
         $ qgen generate --id 12              # Write a new question like #12"
    )
}

/// Similarity retrieval and generation of CSAT English questions
#[derive(Parser)]
#[command(
    name = "qgen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieve similar exam questions and generate new ones",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = quick_start_help()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .qgen directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "Import questions from a CSV file into the store")]
    Import {
        /// CSV file (defaults to source_csv from settings)
        csv: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Build the similarity index from stored questions")]
    Build {
        /// Embed the rows of this CSV instead of the whole store. Every row
        /// must already be imported.
        #[arg(long, value_name = "CSV")]
        from_csv: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Find the stored questions most similar to a text")]
    Query {
        /// Question text to search for
        text: String,

        /// Number of results (defaults to index.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Show a stored question")]
    Show {
        id: QuestionId,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Generate a new question modelled on a retrieved example")]
    Generate {
        /// Text used to retrieve the closest stored question as the example
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        text: Option<String>,

        /// Use this stored question as the example
        #[arg(long)]
        id: Option<QuestionId>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn output_format(&self) -> OutputFormat {
        let json = match self {
            Commands::Import { json, .. }
            | Commands::Build { json, .. }
            | Commands::Query { json, .. }
            | Commands::Show { json, .. }
            | Commands::Generate { json, .. } => *json,
            Commands::Init { .. } | Commands::Config => false,
        };
        OutputFormat::from_json_flag(json)
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let format = cli.command.output_format();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| {
            anyhow::anyhow!("Configuration error loading from {}: {e}", path.display())
        }),
        None => Settings::load().map_err(|e| anyhow::anyhow!("Configuration error: {e}")),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(error) => {
            report_error(&error, format);
            return ExitCode::ConfigError.into();
        }
    };

    init_tracing(settings.debug || cli.verbose);

    let start = Instant::now();
    let result = match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Config => run_config(&settings),
        Commands::Import { csv, .. } => run_import(&settings, csv, format, start),
        Commands::Build { from_csv, .. } => run_build(&settings, from_csv, format, start),
        Commands::Query { text, k, .. } => run_query(&settings, &text, k, format, start),
        Commands::Show { id, .. } => run_show(&settings, id, format),
        Commands::Generate { text, id, .. } => run_generate(&settings, text, id, format, start),
    };

    match result {
        Ok(code) => code.into(),
        Err(error) => report_error(&error, format).into(),
    }
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "qgen=debug" } else { "qgen=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    if format.is_json() {
        let response = JsonResponse::from_anyhow(error);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error writing output: {e}"),
        }
        return ExitCode::from_anyhow(error);
    }

    eprintln!("{}", THEME.error_with_icon(&format!("{error:#}")));
    if let Some(index_error) = error.chain().find_map(|c| c.downcast_ref::<IndexError>()) {
        for suggestion in index_error.recovery_suggestions() {
            eprintln!("  {}", THEME.apply(&THEME.dim, format!("hint: {suggestion}")));
        }
    }
    ExitCode::from_anyhow(error)
}

fn print_json<T: Serialize>(response: &JsonResponse<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn open_store(settings: &Settings) -> anyhow::Result<SledStore> {
    let path = settings.store_path();
    SledStore::open(&path)
        .with_context(|| format!("Failed to open question store at {}", path.display()))
}

fn load_embedder(settings: &Settings) -> anyhow::Result<FastEmbedder> {
    with_spinner("Loading embedding model", || {
        FastEmbedder::new(
            &settings.embedding.model,
            settings.model_cache_dir(),
            settings.embedding.show_download_progress,
        )
    })
    .context("Failed to load embedding model")
}

fn open_index(settings: &Settings) -> anyhow::Result<SimilarityIndex> {
    Ok(SimilarityIndex::open(settings.index_path())?)
}

fn run_init(force: bool) -> anyhow::Result<ExitCode> {
    let root = std::env::current_dir().context("Cannot determine current directory")?;
    let path = Settings::init_config_file(&root, force).map_err(|e| anyhow::anyhow!("{e}"))?;

    let message = if force {
        format!("Wrote configuration to {}", path.display())
    } else {
        format!("Created default configuration at {}", path.display())
    };
    println!("{}", THEME.success_with_icon(&message));
    println!("Edit this file to customize your settings.");
    Ok(ExitCode::Success)
}

fn run_config(settings: &Settings) -> anyhow::Result<ExitCode> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", settings.to_toml()?);
    Ok(ExitCode::Success)
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    source: PathBuf,
    imported: Vec<QuestionId>,
    failures: Vec<FailureInfo>,
}

#[derive(Debug, Serialize)]
struct FailureInfo {
    line: u64,
    code: &'static str,
    message: String,
}

fn run_import(
    settings: &Settings,
    csv: Option<PathBuf>,
    format: OutputFormat,
    start: Instant,
) -> anyhow::Result<ExitCode> {
    let path = csv
        .or_else(|| settings.source_csv.as_deref().map(|p| settings.resolve(p)))
        .context("No CSV file given and source_csv is not configured")?;

    let store = open_store(settings)?;
    let mut source = CsvSource::open(&path)?;

    let spinner = (!format.is_json()).then(|| create_spinner("Importing questions"));
    let report = import_all_with_progress(&mut source, &store, |rows| {
        if let Some(spinner) = &spinner {
            spinner.set_message(format!("Importing questions ({rows} rows read)"));
        }
    });
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let code = if report.is_clean() {
        ExitCode::Success
    } else {
        ExitCode::ValidationError
    };

    if format.is_json() {
        let summary = ImportSummary {
            source: path,
            imported: report.imported.clone(),
            failures: report
                .failures
                .iter()
                .map(|f| FailureInfo {
                    line: f.line,
                    code: f.error.status_code(),
                    message: f.error.to_string(),
                })
                .collect(),
        };
        let mut response = JsonResponse::success(summary)
            .with_message(format!(
                "Imported {} of {} rows",
                report.imported.len(),
                report.total_rows()
            ))
            .with_meta(ResponseMeta::timed(start.elapsed()));
        response.exit_code = code as u8;
        print_json(&response)?;
    } else {
        let message = format!(
            "Imported {} questions from {} in {:.2?}",
            report.imported.len(),
            path.display(),
            start.elapsed()
        );
        if report.is_clean() {
            println!("{}", THEME.success_with_icon(&message));
        } else {
            println!("{}", THEME.warning_with_icon(&message));
            println!("{}", create_import_summary_table(&report));
        }
    }

    Ok(code)
}

#[derive(Debug, Serialize)]
struct BuildSummary {
    path: PathBuf,
    vectors: usize,
    dimension: usize,
    model: String,
}

fn run_build(
    settings: &Settings,
    from_csv: Option<PathBuf>,
    format: OutputFormat,
    start: Instant,
) -> anyhow::Result<ExitCode> {
    let store = open_store(settings)?;

    let records: Vec<QuestionRecord> = match from_csv {
        Some(path) => {
            let mut source = CsvSource::open(&path)?;
            let (records, failures) = collect_records(&mut source);
            if !failures.is_empty() {
                warn!(
                    "Skipped {} invalid rows from {}",
                    failures.len(),
                    path.display()
                );
            }
            verify_against(&records, &store)?;
            records
        }
        None => store.records().context("Failed to read stored questions")?,
    };

    let embedder = load_embedder(settings)?;

    let pb = (!format.is_json())
        .then(|| create_progress_bar(records.len() as u64, "Embedding questions"));
    let index = IndexBuilder::new()
        .with_batch_size(settings.index.batch_size)
        .build_with_progress(&records, &embedder, |done| {
            if let Some(pb) = &pb {
                pb.set_position(done as u64);
            }
        });
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let index = index?;

    let path = settings.index_path();
    index.save(&path)?;
    info!("Wrote similarity index to {}", path.display());

    if index.is_empty() {
        warn!("No questions to index; queries will fail until questions are imported");
    }

    let summary = BuildSummary {
        path,
        vectors: index.len(),
        dimension: index.dimension(),
        model: index.model_name().to_string(),
    };

    if format.is_json() {
        print_json(&JsonResponse::success(summary).with_meta(ResponseMeta::timed(start.elapsed())))?;
    } else {
        println!(
            "{}",
            THEME.success_with_icon(&format!(
                "Indexed {} questions ({} dimensions, {}) in {:.2?}",
                summary.vectors,
                summary.dimension,
                summary.model,
                start.elapsed()
            ))
        );
        println!("  {}", THEME.apply(&THEME.path, summary.path.display()));
    }

    Ok(ExitCode::Success)
}

fn run_query(
    settings: &Settings,
    text: &str,
    k: Option<usize>,
    format: OutputFormat,
    start: Instant,
) -> anyhow::Result<ExitCode> {
    let index = open_index(settings)?;
    // Fail before paying for model initialization.
    if index.is_empty() {
        return Err(IndexError::EmptyIndex.into());
    }
    let store = open_store(settings)?;
    let embedder = load_embedder(settings)?;

    let k = k.unwrap_or(settings.index.default_k);
    let matches = Retriever::new(&index, &store).find_similar(text, &embedder, k)?;

    if format.is_json() {
        print_json(&JsonResponse::success(&matches).with_meta(ResponseMeta::timed(start.elapsed())))?;
    } else if matches.is_empty() {
        println!("No results (k = {k})");
    } else {
        println!("{}", create_match_table(&matches));
    }

    Ok(ExitCode::Success)
}

fn run_show(settings: &Settings, id: QuestionId, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let store = open_store(settings)?;
    let record = store.get(id)?;
    let code = ExitCode::from_retrieve_result(&record);

    match (record, format.is_json()) {
        (Some(record), true) => print_json(&JsonResponse::success(record))?,
        (Some(record), false) => println!("{}", create_record_table(&record)),
        (None, true) => print_json(&JsonResponse::not_found("Question", &id.to_string()))?,
        (None, false) => eprintln!("{}", THEME.warning_with_icon(&format!("Question {id} not found"))),
    }

    Ok(code)
}

#[derive(Debug, Serialize)]
struct GenerationSummary {
    example: QuestionRecord,
    /// Distance from the query text, when the example was retrieved by text
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f32>,
    generated: GeneratedQuestion,
}

fn stage_message(transition: &Transition) -> String {
    match transition.to {
        Stage::Generating if transition.round > 1 => {
            format!("Regenerating (round {})", transition.round)
        }
        Stage::Generating => "Generating question".to_string(),
        Stage::Validating => format!("Validating (round {})", transition.round),
        Stage::Analyzing => "Analyzing example".to_string(),
        Stage::Done | Stage::Failed => "Finishing".to_string(),
    }
}

fn run_generate(
    settings: &Settings,
    text: Option<String>,
    id: Option<QuestionId>,
    format: OutputFormat,
    start: Instant,
) -> anyhow::Result<ExitCode> {
    let store = open_store(settings)?;

    let (example, distance) = match (id, text) {
        (Some(id), _) => match store.get(id)? {
            Some(record) => (record, None),
            None => bail!("Question {id} not found in the store"),
        },
        (None, Some(text)) => {
            let index = open_index(settings)?;
            if index.is_empty() {
                return Err(IndexError::EmptyIndex.into());
            }
            let embedder = load_embedder(settings)?;
            let Match { record, distance } = Retriever::new(&index, &store)
                .find_similar(&text, &embedder, 1)?
                .into_iter()
                .next()
                .ok_or(IndexError::EmptyIndex)?;
            (record, Some(distance))
        }
        (None, None) => bail!("Provide question text or --id"),
    };
    info!("Using question {} as the example", example.id);

    let model = OpenAiChatModel::from_config(&settings.generator)?;
    let pipeline = GenerationPipeline::new(&model, settings.generator.max_rounds);

    let spinner = (!format.is_json()).then(|| create_spinner("Analyzing example"));
    let generated = pipeline.run_with_observer(&example_from_record(&example), |transition| {
        if let Some(spinner) = &spinner {
            spinner.set_message(stage_message(transition));
        }
    });
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let generated = generated?;

    if format.is_json() {
        let summary = GenerationSummary {
            example,
            distance,
            generated,
        };
        print_json(&JsonResponse::success(summary).with_meta(ResponseMeta::timed(start.elapsed())))?;
    } else {
        let heading = |text: &str| THEME.apply(&THEME.header, text);
        println!("{}", heading(&format!("Example question #{}", example.id)));
        println!("{}\n", example.as_prompt_text());
        println!("{}", heading("Analysis"));
        println!("{}\n", generated.analysis);
        println!("{}", heading("Generated question"));
        println!("{}\n", generated.question);
        if !generated.review.is_empty() {
            println!("{}", heading("Review"));
            println!("{}\n", generated.review);
        }
        println!(
            "{}",
            THEME.success_with_icon(&format!(
                "Accepted after {} round(s) in {:.1?}",
                generated.rounds,
                start.elapsed()
            ))
        );
    }

    Ok(ExitCode::Success)
}
