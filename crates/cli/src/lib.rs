use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kbqa_chunker::{ChunkerConfig, SectionSplitter, SourceDocument};
use kbqa_search::{BatchQueryRunner, RetrievalConfig, TwoStageRetriever};
use kbqa_vector_store::{
    load_questions, save_query_result, save_questions, Corpus, EmbedPurpose, Embedder,
    EmbeddingRun, QueryResult, StubEmbedder,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod report;

use report::{render_query_result, DEFAULT_MAX_TEXT_CHARS};

const DEFAULT_DIMENSION: usize = 64;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "kbqa")]
#[command(about = "Two-stage semantic retrieval over an embedded knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split scraped pages into sections and embed titles and chunks
    #[command(name = "embed-corpus")]
    EmbedCorpus(EmbedCorpusArgs),

    /// Embed questions for a later `query` run
    #[command(name = "embed-questions")]
    EmbedQuestions(EmbedQuestionsArgs),

    /// Rank corpus chunks for every embedded question
    Query(QueryArgs),

    /// Embed one question and rank the corpus for it
    Ask(AskArgs),
}

#[derive(Args)]
struct EmbedCorpusArgs {
    /// JSON array of {title, content, url?, images?} records
    #[arg(long)]
    input: PathBuf,

    /// Where to write the embedded corpus
    #[arg(long)]
    output: PathBuf,

    /// Strip header/footer lines and markup noise before splitting
    #[arg(long)]
    clean: bool,

    /// Drop lines shorter than this many characters
    #[arg(long, default_value_t = 1)]
    min_chunk_chars: usize,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

#[derive(Args)]
struct EmbedQuestionsArgs {
    /// Where to write the embedded questions
    #[arg(long)]
    output: PathBuf,

    /// Question texts
    #[arg(required = true)]
    questions: Vec<String>,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

#[derive(Args)]
struct EmbeddingArgs {
    /// Embedding dimension of the offline embedder
    #[arg(long, default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    /// Texts per embedding request
    #[arg(long, default_value_t = kbqa_vector_store::DEFAULT_MAX_BATCH)]
    batch_size: usize,

    /// Pause between embedding requests (milliseconds)
    #[arg(long, default_value_t = 0)]
    pause_ms: u64,
}

impl EmbeddingArgs {
    fn embedder(&self) -> Result<StubEmbedder> {
        anyhow::ensure!(self.dimension > 0, "--dimension must be > 0");
        Ok(StubEmbedder::new(self.dimension))
    }

    fn run<'a>(&self, embedder: &'a StubEmbedder) -> EmbeddingRun<'a, StubEmbedder> {
        EmbeddingRun::new(embedder)
            .batch_size(self.batch_size)
            .pause(Duration::from_millis(self.pause_ms))
    }
}

#[derive(Args)]
struct TuningArgs {
    /// TOML file with title_top_k / chunk_top_k / include_titles
    #[arg(long)]
    config: Option<PathBuf>,

    /// Titles kept by the first stage
    #[arg(long)]
    title_top_k: Option<usize>,

    /// Chunks returned per question
    #[arg(long)]
    chunk_top_k: Option<usize>,

    /// Skip the title stage and rank every chunk
    #[arg(long)]
    no_titles: bool,
}

impl TuningArgs {
    fn resolve(&self, defaults: RetrievalConfig) -> Result<RetrievalConfig> {
        let mut config = match &self.config {
            Some(path) => RetrievalConfig::load(path)?,
            None => defaults,
        };
        if let Some(k) = self.title_top_k {
            config.title_top_k = k;
        }
        if let Some(k) = self.chunk_top_k {
            config.chunk_top_k = k;
        }
        if self.no_titles {
            config.include_titles = false;
        }
        config.validate()?;
        log::debug!("Retrieval config: {:?}", config);
        Ok(config)
    }
}

#[derive(Args)]
struct QueryArgs {
    /// Embedded corpus JSON
    #[arg(long)]
    corpus: PathBuf,

    /// Embedded questions JSON
    #[arg(long)]
    questions: PathBuf,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Also write results JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AskArgs {
    /// Embedded corpus JSON
    #[arg(long)]
    corpus: PathBuf,

    /// Embedding dimension (defaults to the corpus dimension)
    #[arg(long)]
    dimension: Option<usize>,

    /// Rank section titles instead of chunks
    #[arg(long)]
    titles_only: bool,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Question text
    question: String,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Query(args) => args.json,
        Commands::Ask(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::EmbedCorpus(args) => run_embed_corpus(args).await?,
        Commands::EmbedQuestions(args) => run_embed_questions(args).await?,
        Commands::Query(args) => run_query(args).await?,
        Commands::Ask(args) => run_ask(args).await?,
    }

    Ok(())
}

async fn run_embed_corpus(args: EmbedCorpusArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Cannot read documents {}", args.input.display()))?;
    let docs = SourceDocument::parse_list(&raw)
        .with_context(|| format!("Invalid documents in {}", args.input.display()))?;

    let splitter = SectionSplitter::new(ChunkerConfig {
        clean_text: args.clean,
        min_chunk_chars: args.min_chunk_chars,
    })?;
    let sections = splitter.split_all(&docs);

    let embedder = args.embedding.embedder()?;
    let corpus = args.embedding.run(&embedder).embed_sections(sections).await?;
    corpus
        .save(&args.output)
        .await
        .with_context(|| format!("Cannot write corpus {}", args.output.display()))?;

    let stats = corpus.validate();
    print_stdout(&format!(
        "Embedded {} sections / {} chunks -> {}",
        stats.sections,
        stats.chunks,
        args.output.display()
    ))
}

async fn run_embed_questions(args: EmbedQuestionsArgs) -> Result<()> {
    let embedder = args.embedding.embedder()?;
    let questions = args.embedding.run(&embedder).embed_questions(&args.questions).await?;
    save_questions(&args.output, &questions)
        .await
        .with_context(|| format!("Cannot write questions {}", args.output.display()))?;
    print_stdout(&format!(
        "Embedded {} questions -> {}",
        questions.len(),
        args.output.display()
    ))
}

async fn run_query(args: QueryArgs) -> Result<()> {
    let config = args.tuning.resolve(RetrievalConfig::default())?;
    let corpus = Corpus::load(&args.corpus)
        .await
        .with_context(|| format!("Cannot load corpus {}", args.corpus.display()))?;
    let questions = load_questions(&args.questions)
        .await
        .with_context(|| format!("Cannot load questions {}", args.questions.display()))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    let runner = BatchQueryRunner::new(TwoStageRetriever::new(config)).with_cancel_flag(cancel);
    let (result, summary) =
        tokio::task::spawn_blocking(move || runner.run_with_summary(&questions, &corpus))
            .await
            .context("Batch task failed")??;

    if let Some(path) = &args.output {
        save_query_result(path, &result)
            .await
            .with_context(|| format!("Cannot write results {}", path.display()))?;
    }

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&result)?)?;
    } else {
        print_stdout(&render_query_result(&result, DEFAULT_MAX_TEXT_CHARS))?;
        print_stdout(&format!("Successfully processed {} questions", summary.processed))?;
    }
    Ok(())
}

async fn run_ask(args: AskArgs) -> Result<()> {
    let config = args.tuning.resolve(RetrievalConfig::single_query())?;
    let corpus = Corpus::load(&args.corpus)
        .await
        .with_context(|| format!("Cannot load corpus {}", args.corpus.display()))?;

    let dimension = match args.dimension {
        Some(dimension) => dimension,
        None => corpus
            .validate()
            .dimension
            .context("Corpus has no embeddings; pass --dimension")?,
    };
    let embedder = StubEmbedder::new(dimension);
    let query = embedder.embed(&args.question, EmbedPurpose::Query).await?;

    let retriever = TwoStageRetriever::new(config);
    let items = if args.titles_only {
        retriever.rank_titles(&query, &corpus)?
    } else {
        retriever.retrieve(&query, &corpus)?
    };

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&items)?)?;
    } else {
        let mut result = QueryResult::new();
        result.insert(args.question, items);
        print_stdout(&render_query_result(&result, DEFAULT_MAX_TEXT_CHARS))?;
    }
    Ok(())
}
