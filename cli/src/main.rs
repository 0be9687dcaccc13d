//! CLI entrypoint for interconsult
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use interconsult_application::{
    ConsultationProgressNotifier, KnowledgeRetriever, LiteratureFilters,
    LiteratureSearch, NoProgress, RetryPolicy, RunConsultationUseCase, RunEventLogger,
};
use interconsult_domain::{ConfigIssue, OutputFormat, Question, Specialty};
use interconsult_infrastructure::{
    ConfigLoader, FileConfig, InMemoryKnowledgeBase, JsonlRunEventLogger, OpenAiGateway,
    OpenAiSettings, ResearchSources, build_router,
};
use interconsult_presentation::{
    Cli, MarkdownFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Initialize logging based on verbosity level, plus a daily log file when configured
fn init_tracing(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file, guard) = match &config.logging.dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "interconsult.log"));
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(stderr).with(file).init();
    guard
}

fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("config: {}", issue);
    }
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(ToString::to_string)
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

fn research_sources(config: &FileConfig) -> Result<ResearchSources> {
    let knowledge: Option<Arc<dyn KnowledgeRetriever>> = match &config.knowledge.dir {
        Some(dir) => {
            let kb = InMemoryKnowledgeBase::load_dir(dir)
                .with_context(|| format!("loading knowledge base from {}", dir.display()))?;
            if kb.is_empty() {
                warn!(dir = %dir.display(), "Knowledge base directory has no documents");
            }
            Some(Arc::new(kb))
        }
        None => None,
    };

    let literature = literature_search(config)?;

    Ok(ResearchSources {
        knowledge,
        top_k: config.knowledge.top_k,
        literature,
        literature_defaults: LiteratureFilters {
            years_back: Some(config.literature.years_back),
            max_results: config.literature.max_results,
        },
        literature_retry: RetryPolicy {
            max_attempts: config.literature.rate_limit_retries.max(1),
            ..RetryPolicy::default()
        },
    })
}

#[cfg(feature = "pubmed")]
fn literature_search(config: &FileConfig) -> Result<Option<Arc<dyn LiteratureSearch>>> {
    use interconsult_infrastructure::PubMedClient;

    let literature = &config.literature;
    if !literature.enabled {
        return Ok(None);
    }
    let client = PubMedClient::new(
        literature.base_url.clone(),
        std::time::Duration::from_secs(config.engine.tool_timeout_secs),
    )?
    .with_email(literature.email.clone())
    .with_api_key(std::env::var(&literature.api_key_env).ok());
    Ok(Some(Arc::new(client)))
}

#[cfg(not(feature = "pubmed"))]
fn literature_search(config: &FileConfig) -> Result<Option<Arc<dyn LiteratureSearch>>> {
    if config.literature.enabled {
        warn!("Literature search is enabled but this build has no PubMed support");
    }
    Ok(None)
}

fn generation_gateway(config: &FileConfig) -> Result<Arc<OpenAiGateway>> {
    let provider = &config.provider;
    let Some(api_key) = provider.resolve_api_key() else {
        bail!(
            "no API key for the generation provider: set {} or [provider] api_key",
            provider.api_key_env
        );
    };
    let gateway = OpenAiGateway::new(OpenAiSettings {
        base_url: provider.base_url.clone(),
        api_key,
        max_tokens: provider.max_tokens,
        temperature: provider.temperature,
        request_timeout: std::time::Duration::from_secs(provider.request_timeout_secs),
    })?;
    Ok(Arc::new(gateway))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    let _log_guard = init_tracing(cli.verbose, &config);
    info!("Starting interconsult");

    if !config.output.color {
        colored::control::set_override(false);
    }
    report_issues(&config.validate())?;

    let question = match cli.question.as_deref() {
        Some(q) => Question::try_new(q)?,
        None => bail!("A clinical question is required."),
    };

    let mut engine = config.to_engine_config();
    if !cli.specialty.is_empty() {
        let specialties = cli
            .specialty
            .iter()
            .map(|s| s.parse::<Specialty>())
            .collect::<Result<Vec<_>, _>>()?;
        engine = engine.with_specialties(specialties);
    }
    if let Some(max) = cli.max_specialists {
        engine = engine.with_max_specialists(max);
    }
    if cli.no_citations {
        engine = engine.with_require_citations(false);
    }

    // === Dependency Injection ===
    let router = Arc::new(build_router(engine.tool_timeout, research_sources(&config)?));
    let gateway = generation_gateway(&config)?;

    let progress: Arc<dyn ConsultationProgressNotifier> = if cli.quiet || !config.output.show_progress {
        Arc::new(NoProgress)
    } else if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                warn!("Received Ctrl+C, cancelling the consultation");
                cancel.cancel();
            }
        });
    }

    let mut use_case = RunConsultationUseCase::new(gateway, router, engine)
        .with_progress(progress)
        .with_cancellation(cancel);
    if let Some(dir) = &config.logging.transcript_dir {
        match JsonlRunEventLogger::in_dir(dir) {
            Some(logger) => {
                info!(path = %logger.path().display(), "Writing run transcript");
                let logger: Arc<dyn RunEventLogger> = Arc::new(logger);
                use_case = use_case.with_event_logger(logger);
            }
            None => warn!(dir = %dir.display(), "Could not create run transcript"),
        }
    }

    let record = use_case.execute(&question).await?;

    // Output results
    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();
    println!("{}", MarkdownFormatter.render(&record, format)?);

    Ok(())
}
