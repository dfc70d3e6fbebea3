use anyhow::{Context, Result};
use clap::Parser;
use commit_audit::audit::{AuditSettings, Auditor, watch_interrupts};
use commit_audit::config::Config;
use commit_audit::git::{CommitOrder, DateRange, GitWalker};
use commit_audit::inference::{InteractiveSelector, OllamaClient, resolve_model};
use commit_audit::notify::SlackNotifier;
use commit_audit::paths::PlatformPaths;
use commit_audit::prompt::{PromptTemplate, SAMPLE_PROMPT_FILE, write_sample_prompt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "commit-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("GIT_COMMIT_HASH"), ", built ", env!("BUILD_TIMESTAMP"), ")"
))]
#[command(about = "Security audit of git commits using a local LLM", long_about = None)]
struct Cli {
    /// Path to the git repository
    #[arg(long, required_unless_present = "create_sample_prompt")]
    repo: Option<PathBuf>,

    /// First day to analyze (inclusive), e.g. 2024-01-31 or "Jan 31, 2024"
    #[arg(long, required_unless_present = "create_sample_prompt")]
    start_date: Option<String>,

    /// Last day to analyze (inclusive) [default: today]
    #[arg(long)]
    end_date: Option<String>,

    /// Model name; lists the available models when omitted
    #[arg(long)]
    model: Option<String>,

    /// Inference endpoint [default: http://localhost:11434/api/generate]
    #[arg(long)]
    api_url: Option<String>,

    /// Report path [default: {repo-name}-report.json]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-commit inference timeout in seconds [default: 120]
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep raw model responses next to the report
    #[arg(long)]
    debug: bool,

    /// Custom prompt template file (must contain {diff})
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Write the built-in prompt to custom_prompt.txt and exit
    #[arg(long)]
    create_sample_prompt: bool,

    /// Slack webhook URL for an end-of-run summary
    #[arg(long)]
    slack_webhook: Option<String>,

    /// Processing order: newest-first or oldest-first
    #[arg(long)]
    order: Option<CommitOrder>,

    /// Configuration file [default: {config_dir}/commit-audit/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(
        cli.json_logs,
        if cli.verbose { Level::DEBUG } else { Level::INFO },
    );

    if cli.create_sample_prompt {
        write_sample_prompt(Path::new(SAMPLE_PROMPT_FILE))?;
        println!("Sample prompt written to {}", SAMPLE_PROMPT_FILE);
        return Ok(());
    }

    let config = merge_cli(Config::new(cli.config.as_deref())?, &cli)?;

    let (Some(repo), Some(start_date)) = (cli.repo.as_deref(), cli.start_date.as_deref()) else {
        anyhow::bail!("--repo and --start-date are required");
    };

    let range = DateRange::parse(start_date, cli.end_date.as_deref())?;
    if range.is_empty() {
        tracing::warn!(
            "Start date {} is after end date {}; no commits will be analyzed",
            range.start,
            range.end
        );
    }

    let walker = GitWalker::open(repo)?.with_max_diff_bytes(config.git.max_diff_bytes);
    let repo_name = walker.repo_name();
    let output = config
        .report
        .output
        .clone()
        .unwrap_or_else(|| PlatformPaths::default_report_path(&repo_name));

    let template = PromptTemplate::load(config.prompt.template_path.as_deref())?;

    let client = OllamaClient::new(
        config.inference.api_url.clone(),
        Duration::from_secs(config.inference.timeout_secs),
    )?
    .with_list_timeout(Duration::from_secs(config.inference.list_timeout_secs));

    // Picked before the interrupt handler exists, so Ctrl-C at the prompt still ends the process
    let model = resolve_model(
        config.inference.model.as_deref(),
        &client,
        &mut InteractiveSelector::stdio(),
    )
    .await
    .context("Model selection failed")?;

    tracing::info!(
        "Auditing {} ({}) from {} to {}",
        repo_name,
        walker.repo_path().display(),
        range.start,
        range.end
    );

    let settings = AuditSettings {
        range,
        order: config.git.order,
        model: Some(model),
        output: output.clone(),
        checkpoint: config.report.checkpoint,
        debug: config.report.debug,
        repo_name,
    };

    let cancel_token = CancellationToken::new();
    let mut auditor =
        Auditor::new(walker, client, template, settings).with_cancellation(cancel_token.clone());
    if let Some(webhook) = &config.notify.slack_webhook {
        auditor = auditor.with_notifier(SlackNotifier::new(
            webhook.clone(),
            Duration::from_secs(config.notify.timeout_secs),
        ));
    }

    tokio::spawn(async move {
        if watch_interrupts(cancel_token, tokio::signal::ctrl_c).await {
            eprintln!("\nInterrupted again; exiting without waiting for the current commit.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let outcome = auditor
        .run(&mut InteractiveSelector::stdio())
        .await
        .context("Audit run failed")?;

    print!("{}", outcome.render_summary(&output));

    if outcome.interrupted {
        println!("\nAnalysis interrupted; partial report saved.");
        std::process::exit(EXIT_INTERRUPTED);
    }

    Ok(())
}

/// Apply command-line flags on top of file and environment configuration
fn merge_cli(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(model) = &cli.model {
        config.inference.model = Some(model.clone());
    }
    if let Some(api_url) = &cli.api_url {
        config.inference.api_url = api_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.inference.timeout_secs = timeout;
    }
    if let Some(order) = cli.order {
        config.git.order = order;
    }
    if let Some(prompt) = &cli.prompt {
        config.prompt.template_path = Some(prompt.clone());
    }
    if let Some(output) = &cli.output {
        config.report.output = Some(output.clone());
    }
    if cli.debug {
        config.report.debug = true;
    }
    if let Some(webhook) = &cli.slack_webhook {
        config.notify.slack_webhook = Some(webhook.clone());
    }

    config.validate()?;
    Ok(config)
}
