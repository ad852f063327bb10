use std::cell::RefCell;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use weaver_common::telemetry::{self, TelemetryConfig};
use weaver_common::{FileStore, MediaConfig};
use weaver_richtext::{
    DocumentEngine, Inline, MediaSchema, PlainDocument, Selection, UrlPolicy,
};
use weaver_upload::{HttpTransport, PendingFile, TracingNotifier, UploadPipeline};

#[derive(Parser)]
#[command(version, about = "Weaver - linkable media tools for rich-text documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a media configuration file (.toml or .json)
    #[arg(long, global = true, env = "WEAVER_MEDIA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse HTML into document content (JSON)
    Parse {
        /// HTML file to read; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Render document content (JSON) as HTML
    Render {
        /// JSON file to read; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Validate and normalize a link destination
    CheckUrl {
        url: String,

        /// Report whether the URL would be auto-linked while typing
        #[arg(long)]
        auto_link: bool,
    },
    /// Upload images into a document and print the resulting HTML
    Upload {
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// HTML document to insert into; starts empty when omitted
        #[arg(long)]
        document: Option<PathBuf>,

        /// Insertion position; defaults to the end of the document
        #[arg(long)]
        at: Option<usize>,

        /// Upload endpoint, overriding the configuration
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init(TelemetryConfig::from_env("weaver-media"));

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Parse { input } => {
            let html = read_input(input.as_deref())?;
            let schema = MediaSchema::new(&config.schema);
            let content = schema.parse_content(&html);
            println!(
                "{}",
                serde_json::to_string_pretty(&content).into_diagnostic()?
            );
        }
        Commands::Render { input } => {
            let json = read_input(input.as_deref())?;
            let content: Vec<Inline> = serde_json::from_str(&json).into_diagnostic()?;
            let schema = MediaSchema::new(&config.schema);
            println!("{}", PlainDocument::from_content(content).to_html(&schema));
        }
        Commands::CheckUrl { url, auto_link } => {
            let policy = UrlPolicy::from_config(&config.links);
            if auto_link {
                println!("{}", policy.should_auto_link(&url));
            } else {
                println!("{}", policy.validate(&url)?);
            }
        }
        Commands::Upload {
            files,
            document,
            at,
            endpoint,
        } => {
            upload(&config, files, document, at, endpoint).await?;
        }
    }

    Ok(())
}

async fn upload(
    config: &MediaConfig,
    files: Vec<PathBuf>,
    document: Option<PathBuf>,
    at: Option<usize>,
    endpoint: Option<String>,
) -> Result<()> {
    let schema = MediaSchema::new(&config.schema);
    let mut doc = match document {
        Some(path) => {
            let html = std::fs::read_to_string(&path).into_diagnostic()?;
            PlainDocument::from_html(&html, &schema)
        }
        None => PlainDocument::new(),
    };
    let position = at.unwrap_or(doc.len());
    if position > doc.len() {
        return Err(miette::miette!(
            "Position {position} is past the end of the document (length {})",
            doc.len()
        ));
    }
    doc.set_selection(Selection::collapsed(position));

    let transport = match endpoint {
        Some(endpoint) => HttpTransport::new(endpoint),
        None => HttpTransport::from_config(&config.upload)?,
    };

    let mut pending = Vec::with_capacity(files.len());
    for path in &files {
        pending.push(PendingFile::from_path(path).await?);
    }

    let pipeline = UploadPipeline::new(&config.upload, transport, TracingNotifier);
    let doc = Rc::new(RefCell::new(doc));
    let Some(uploads) = pipeline.handle_picker(&doc, pending) else {
        return Err(miette::miette!("None of the files is a supported image type"));
    };
    let report = uploads.await;
    tracing::info!(
        inserted = report.inserted.len(),
        failed = report.failed.len(),
        rejected = report.rejected.len(),
        "upload finished"
    );

    println!("{}", doc.borrow().to_html(&schema));
    if !report.failed.is_empty() {
        return Err(miette::miette!(
            "Failed to upload: {}",
            report.failed.join(", ")
        ));
    }
    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<MediaConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(MediaConfig::default()),
        },
    };
    tracing::debug!(path = %path.display(), "loading configuration");
    MediaConfig::load(&FileStore::new(path)).await
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("weaver").join("media.toml"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()?;
            Ok(input)
        }
    }
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
