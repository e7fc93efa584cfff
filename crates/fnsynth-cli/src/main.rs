//! CLI binary for fnsynth: generate a TypeScript callable from a goal, and
//! inspect the signature, test corpus, and harness for existing code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fnsynth_core::{Signature, SynthConfig};
use fnsynth_engine::{Pipeline, SynthesisRequest};
use fnsynth_oracle::{CodeOracle, LlmClient};
use fnsynth_testgen::{DomainTestEnhancer, assemble, synthesize_generic};
use fnsynth_tools::{CommandExecutor, EslintLinter, Linter, TscChecker};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fnsynth", about = "Oracle-driven TypeScript function synthesis")]
struct Cli {
    /// Project root holding .fnsynth/config.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, type-check, and test a callable for a goal
    Generate {
        /// Natural-language description of the callable
        #[arg(short, long)]
        goal: String,

        /// Test hint such as "input 2, 3 should return 5" (repeatable)
        #[arg(short = 't', long = "test-case")]
        test_cases: Vec<String>,

        /// Retry budget after the initial attempt
        #[arg(long)]
        max_retries: Option<i64>,

        /// Label attached to the test result
        #[arg(long)]
        label: Option<String>,

        /// Use fallback domain tests instead of asking the oracle
        #[arg(long)]
        skip_oracle: bool,
    },

    /// Print the signature of the first callable in a file
    Signature {
        /// TypeScript or JavaScript source file
        file: PathBuf,
    },

    /// Print the test corpus for the callable in a file
    Tests {
        file: PathBuf,

        /// Also ask the oracle for domain tests for this goal
        #[arg(short, long)]
        goal: Option<String>,
    },

    /// Print the executable test unit for the generic corpus
    Harness { file: PathBuf },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = SynthConfig::load(&project_root)
        .with_context(|| format!("failed to load config from {}", project_root.display()))?;

    match cli.command {
        Commands::Generate {
            goal,
            test_cases,
            max_retries,
            label,
            skip_oracle,
        } => cmd_generate(config, goal, test_cases, max_retries, label, skip_oracle).await,
        Commands::Signature { file } => cmd_signature(&file),
        Commands::Tests { file, goal } => cmd_tests(&config, &file, goal.as_deref()).await,
        Commands::Harness { file } => cmd_harness(&file),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_signature(file: &Path) -> Result<(String, Signature)> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let signature = fnsynth_parser::extract_signature(&source)
        .with_context(|| format!("no signature in {}", file.display()))?;
    Ok((source, signature))
}

async fn cmd_generate(
    mut config: SynthConfig,
    goal: String,
    test_cases: Vec<String>,
    max_retries: Option<i64>,
    label: Option<String>,
    skip_oracle: bool,
) -> Result<()> {
    if let Some(n) = max_retries {
        config.generation.max_retries = n;
    }
    if let Some(label) = label {
        config.testing.label = label;
    }
    config.enhancer.skip_oracle |= skip_oracle;

    let client = LlmClient::from_config(&config.llm)
        .await
        .context("no usable oracle; set ANTHROPIC_API_KEY, OPENAI_API_KEY, or run Ollama")?;
    eprintln!("  Oracle: {}", client.describe());

    let linter = EslintLinter::from_config(&config.tools).map(|l| Arc::new(l) as Arc<dyn Linter>);
    let pipeline = Pipeline::builder()
        .oracle(Arc::new(client))
        .type_checker(Arc::new(TscChecker::from_config(&config.tools)))
        .executor(Arc::new(CommandExecutor::from_config(&config.tools)))
        .linter(linter)
        .config(config)
        .build()?;

    let request = SynthesisRequest::new(goal).with_hints(test_cases);
    let response = pipeline.run(request).await;
    print_json(&response)?;

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_signature(file: &Path) -> Result<()> {
    let (_, signature) = read_signature(file)?;
    eprintln!("  {}", signature);
    print_json(&signature)
}

async fn cmd_tests(config: &SynthConfig, file: &Path, goal: Option<&str>) -> Result<()> {
    let (source, signature) = read_signature(file)?;
    let mut cases = synthesize_generic(&signature);

    if let Some(goal) = goal {
        let enhancer = match LlmClient::from_config(&config.llm).await {
            Ok(client) => DomainTestEnhancer::new(Arc::new(client), config.enhancer.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "no oracle available; using fallback domain tests");
                DomainTestEnhancer::offline(config.enhancer.clone())
            }
        };
        let domain = enhancer.enhance(goal, &source, &signature, &cases).await;
        cases.extend(domain);
    }

    eprintln!("  {} test cases for {}", cases.len(), signature);
    print_json(&cases)
}

fn cmd_harness(file: &Path) -> Result<()> {
    let (source, signature) = read_signature(file)?;
    let cases = synthesize_generic(&signature);
    let unit = assemble(&source, &signature, &cases);
    print!("{}", unit.source);
    Ok(())
}
