use anyhow::Context;
use clap::{Parser, Subcommand};
use followup_core::{
    converter_from_config, plan_uploads, CoreConfig, DocumentRequest, DocumentService,
    PhysicianRegistry,
};
use followup_portal::{DocumentUploader, PortalConfig, PortalDocument, WebDriverUploader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "followup")]
#[command(about = "Follow-up visit document CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Say hi
    Hi,
    /// Manage the physician registry
    Physicians {
        #[command(subcommand)]
        command: PhysicianCommands,
    },
    /// Render a follow-up note from a JSON document description
    Generate {
        /// Path to the JSON request body
        request: PathBuf,
        /// Also copy the DOCX here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a patient's PDFs to the portal
    Upload {
        /// Document folder name (usually the patient name)
        #[arg(long)]
        file_name: String,
        /// Date shown in the portal titles
        #[arg(long)]
        date_of_evaluation: String,
        /// Prefix of the RAW PDF to upload first (optional)
        #[arg(long)]
        raw_file_name: Option<String>,
    },
}

#[derive(Subcommand)]
enum PhysicianCommands {
    /// List registered physicians
    List,
    /// Register a physician
    Add {
        /// Physician name
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("followup_core=warn".parse()?)
                .add_directive("followup_portal=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let lookup = |key: &str| std::env::var(key).ok();

    match cli.command {
        Some(Commands::Hi) => {
            println!("hi");
        }
        Some(Commands::Physicians { command }) => {
            let cfg = CoreConfig::from_lookup(lookup)?;
            let registry = PhysicianRegistry::open(cfg.physicians_file())?;
            match command {
                PhysicianCommands::List => {
                    let names = registry.list()?;
                    if names.is_empty() {
                        println!("No physicians registered.");
                    }
                    for name in names {
                        println!("{}", name);
                    }
                }
                PhysicianCommands::Add { name } => {
                    let outcome = registry.add(&name)?;
                    println!("{}", outcome.message());
                }
            }
        }
        Some(Commands::Generate { request, out }) => {
            let cfg = Arc::new(CoreConfig::from_lookup(lookup)?);
            cfg.ensure_dirs()?;

            let body = std::fs::read_to_string(&request)
                .with_context(|| format!("reading {}", request.display()))?;
            let value: serde_json::Value = serde_json::from_str(&body)
                .with_context(|| format!("parsing {}", request.display()))?;

            let service = DocumentService::new(cfg.clone(), converter_from_config(&cfg));
            let doc = service.generate(DocumentRequest::from_value(value)?).await?;

            println!("DOCX: {}", doc.docx_path.display());
            match &doc.pdf_path {
                Some(pdf) => println!("PDF:  {}", pdf.display()),
                None => println!("PDF:  not generated"),
            }
            if doc.reused_existing {
                println!("Identical document already existed; nothing new written.");
            }
            if let Some(out) = out {
                std::fs::write(&out, &doc.bytes)
                    .with_context(|| format!("writing {}", out.display()))?;
                println!("Copied to {}", out.display());
            }
        }
        Some(Commands::Upload {
            file_name,
            date_of_evaluation,
            raw_file_name,
        }) => {
            let cfg = CoreConfig::from_lookup(lookup)?;
            let portal_cfg = Arc::new(PortalConfig::from_lookup(lookup)?);

            let documents: Vec<PortalDocument> = plan_uploads(
                &cfg,
                &file_name,
                &date_of_evaluation,
                raw_file_name.as_deref(),
            )?
            .into_iter()
            .map(|planned| PortalDocument::titled(planned.title, planned.path))
            .collect();

            let uploader = WebDriverUploader::new(portal_cfg);
            for report in uploader.upload(documents).await? {
                let status = if report.confirmed {
                    "uploaded"
                } else {
                    "submitted (unconfirmed)"
                };
                println!("{}: {} ({})", status, report.title, report.path.display());
            }
        }
        None => {
            println!("Use 'followup --help' for commands");
        }
    }

    Ok(())
}
