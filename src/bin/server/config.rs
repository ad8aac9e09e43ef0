//! Configuration types for the findoc CLI and server.

use findoc::core::config::ExtractionConfig;
use findoc::core::errors::ConfigError;
use findoc::document::{LazyPdfRasterizer, PdfRenderSettings};
use findoc::processors::ScalingReference;
use findoc::utils::visualization::BoxRenderer;
use std::path::PathBuf;

/// Settings shared by the `analyze` and `serve` commands.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// API key given on the command line or through the environment.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Label font; system fonts are searched when unset.
    pub font: Option<PathBuf>,
    pub scaling: ScalingReference,
    /// Directory holding the PDFium shared library.
    pub pdfium_dir: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Extraction settings for a request, `override_key` taking precedence
    /// over the configured key.
    pub fn extraction(&self, override_key: Option<String>) -> Result<ExtractionConfig, ConfigError> {
        let config = ExtractionConfig::resolve_with(override_key, self.api_key.clone())?
            .with_endpoint(self.endpoint.clone())
            .with_model(self.model.clone());
        config.validate()?;
        Ok(config)
    }

    pub fn renderer(&self) -> BoxRenderer {
        BoxRenderer::with_system_font(self.font.as_deref())
    }

    pub fn rasterizer(&self) -> LazyPdfRasterizer {
        LazyPdfRasterizer::new(PdfRenderSettings {
            library_dir: self.pdfium_dir.clone(),
            ..Default::default()
        })
    }
}

/// Output format of the `analyze` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Text,
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub analysis: AnalysisConfig,
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}
