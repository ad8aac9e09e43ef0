//! findoc CLI and server
//!
//! Sends financial documents to the Landing AI ADE parse API and draws the
//! returned regions onto the page images.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! LANDINGAI_API_KEY=... findoc analyze --file statement.pdf --out-dir out/
//! findoc analyze --file receipt.png --api-key ... --output json
//! ```
//!
//! ## Server Mode
//! ```bash
//! LANDINGAI_API_KEY=... findoc serve --port 8080
//! ```

mod cli;
mod config;
mod response;
mod server;

use clap::{Args, Parser, Subcommand};
use config::{AnalysisConfig, OutputFormat, ServerConfig};
use findoc::core::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use findoc::processors::ScalingReference;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "findoc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Financial document extraction with bounding box overlays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single document via CLI
    Analyze {
        /// Local path of the PNG, JPEG or PDF document
        #[arg(long)]
        file: PathBuf,

        /// Directory receiving page_<n>.png and page_<n>.md
        #[arg(long = "out-dir", default_value = "findoc-output")]
        out_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        output: OutputFormat,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "8080", env = "FINDOC_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "FINDOC_HOST")]
        host: String,

        /// Largest accepted upload, in megabytes
        #[arg(long = "max-upload-mb", default_value = "50")]
        max_upload_mb: usize,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Landing AI API key
    #[arg(long = "api-key", env = "LANDINGAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// ADE parse endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "LANDINGAI_ENDPOINT")]
    endpoint: String,

    /// Extraction model identifier
    #[arg(long, default_value = DEFAULT_MODEL, env = "LANDINGAI_MODEL")]
    model: String,

    /// TrueType/OpenType font for box labels
    #[arg(long, env = "FINDOC_LABEL_FONT")]
    font: Option<PathBuf>,

    /// Scale every box by the first page's size instead of its own page's
    #[arg(long = "scale-by-first-page")]
    scale_by_first_page: bool,

    /// Directory holding the PDFium shared library
    #[arg(long = "pdfium-dir", env = "FINDOC_PDFIUM_DIR")]
    pdfium_dir: Option<PathBuf>,
}

impl From<AnalysisArgs> for AnalysisConfig {
    fn from(args: AnalysisArgs) -> Self {
        Self {
            api_key: args.api_key,
            endpoint: args.endpoint,
            model: args.model,
            font: args.font,
            scaling: if args.scale_by_first_page {
                ScalingReference::FirstPage
            } else {
                ScalingReference::PerPage
            },
            pdfium_dir: args.pdfium_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    findoc::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            out_dir,
            output,
            analysis,
        } => {
            info!("Analyzing file: {}", file.display());
            cli::analyze_file(&file, &out_dir, &analysis.into(), output).await?;
        }
        Commands::Serve {
            port,
            host,
            max_upload_mb,
            analysis,
        } => {
            let config = ServerConfig {
                analysis: analysis.into(),
                host,
                port,
                max_upload_bytes: max_upload_mb.max(1) * 1024 * 1024,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
