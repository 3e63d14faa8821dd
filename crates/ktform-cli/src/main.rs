//! ktform CLI: fill in a knowledge-transfer exit form from files and submit it.
//!
//! Configuration comes from the environment or a `.env` file. `WEBHOOK_URL` or
//! `RELAY_URL` is required for `submit`; object storage is optional.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use ktform_cli::{
    fill_signature_date, load_attachment, load_form, load_signature, render_rejections,
    ConsoleFeedback, ListingView,
};
use ktform_core::models::{Attachment, FormState};
use ktform_core::{collect, AttachmentAccumulator, Config};
use ktform_infra::{init_telemetry, TelemetryFormat};
use ktform_processing::{DocumentRenderer, PdfRenderer};
use ktform_services::{ReqwestHttpClient, SubmissionOrchestrator, SubmissionOutcome};
use ktform_storage::create_storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ktform", version, about = "Knowledge-transfer exit form submission")]
struct Cli {
    /// Print every pipeline stage as it starts
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, render, persist and deliver a form
    Submit {
        /// Form state as camelCase JSON
        #[arg(long)]
        form: PathBuf,
        /// Files to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
        /// PNG of the drawn signature; overrides any signature in the form file
        #[arg(long)]
        signature: Option<PathBuf>,
        /// Write the session analytics export here after submitting
        #[arg(long)]
        analytics: Option<PathBuf>,
    },
    /// Render the summary PDF locally without submitting
    Render {
        #[arg(long)]
        form: PathBuf,
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
        #[arg(long)]
        signature: Option<PathBuf>,
        /// Output path; defaults to the generated document name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show which files would be accepted as attachments
    Attachments {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    init_telemetry(
        "ktform-cli",
        TelemetryFormat::for_environment(config.environment()),
    )?;

    match cli.command {
        Commands::Submit {
            form,
            attachments,
            signature,
            analytics,
        } => {
            submit(
                &config,
                &form,
                &attachments,
                signature.as_deref(),
                analytics.as_deref(),
                cli.verbose,
            )
            .await
        }
        Commands::Render {
            form,
            attachments,
            signature,
            output,
        } => render(
            &config,
            &form,
            &attachments,
            signature.as_deref(),
            output.as_deref(),
        ),
        Commands::Attachments { files } => list_attachments(&config, &files),
    }
}

/// Form file plus signature override and a defaulted signature date.
fn prepare_form(form: &Path, signature: Option<&Path>) -> anyhow::Result<FormState> {
    let mut state = load_form(form)?;
    if let Some(path) = signature {
        state.signature = Some(load_signature(path)?);
    }
    if fill_signature_date(&mut state, Utc::now().date_naive()) {
        tracing::debug!(
            date = %state.fields.employee_signature_date,
            "Signature date defaulted to today"
        );
    }
    Ok(state)
}

fn read_attachments(paths: &[PathBuf]) -> anyhow::Result<Vec<Attachment>> {
    paths.iter().map(|p| load_attachment(p)).collect()
}

async fn submit(
    config: &Config,
    form: &Path,
    attachments: &[PathBuf],
    signature: Option<&Path>,
    analytics: Option<&Path>,
    verbose: bool,
) -> anyhow::Result<()> {
    let state = prepare_form(form, signature)?;
    let files = read_attachments(attachments)?;

    let storage = create_storage(config)
        .await
        .context("Failed to initialize object storage")?;
    let http = Arc::new(ReqwestHttpClient::from_config(config)?);
    let accumulator =
        AttachmentAccumulator::new(config.max_attachment_bytes()).with_view(Box::new(ListingView));
    let orchestrator = SubmissionOrchestrator::from_config(config, storage, http)
        .context("Submission pipeline is not configured")?
        .with_accumulator(accumulator)
        .with_feedback(Arc::new(ConsoleFeedback { verbose }));
    orchestrator.mark_ready();

    let report = orchestrator.add_attachments(files);
    for line in render_rejections(&report, config.max_attachment_bytes()) {
        eprintln!("{}", line);
    }

    let outcome = orchestrator.submit(&state).await;

    if let Some(path) = analytics {
        let export = serde_json::to_string_pretty(&orchestrator.analytics())
            .context("Failed to serialize analytics")?;
        std::fs::write(path, export)
            .with_context(|| format!("Failed to write analytics to {}", path.display()))?;
    }

    match outcome {
        SubmissionOutcome::Succeeded(_) | SubmissionOutcome::Ignored => Ok(()),
        SubmissionOutcome::Invalid(errors) => {
            anyhow::bail!("Form is incomplete ({} field(s))", errors.len())
        }
        SubmissionOutcome::Failed { error, .. } => Err(error).context("Submission failed"),
    }
}

fn render(
    config: &Config,
    form: &Path,
    attachments: &[PathBuf],
    signature: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let state = prepare_form(form, signature)?;
    let files = read_attachments(attachments)?;

    let record = collect(&state, &files, Utc::now()).context("Form is incomplete")?;
    let renderer = PdfRenderer::new(config.organization_name().map(str::to_string));
    let document = renderer
        .render(&record)
        .context("Failed to render the summary document")?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&document.file_name));
    std::fs::write(&path, &document.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "Wrote {} ({} page(s))",
        path.display(),
        document.page_count
    );
    Ok(())
}

fn list_attachments(config: &Config, paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = read_attachments(paths)?;
    let mut accumulator =
        AttachmentAccumulator::new(config.max_attachment_bytes()).with_view(Box::new(ListingView));

    let report = accumulator.add(files);
    for line in render_rejections(&report, accumulator.max_file_bytes()) {
        eprintln!("{}", line);
    }
    if accumulator.is_empty() {
        println!("No files selected");
    }
    Ok(())
}
