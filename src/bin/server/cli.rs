//! CLI mode for document analysis.

use crate::config::{AnalysisConfig, OutputFormat};
use crate::response::AnalysisResponse;
use findoc::analyzer::{DocumentAnalysis, DocumentAnalyzer};
use findoc::client::AdeClient;
use findoc::document::load_pages;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Analyze a local file (image or PDF) and write the page outputs
pub async fn analyze_file(
    path: &Path,
    out_dir: &Path,
    config: &AnalysisConfig,
    output_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // fail on a missing credential before touching the document
    let client = AdeClient::new(config.extraction(None)?)?;

    let start = Instant::now();
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();

    info!("Rendering document pages...");
    let rasterizer = config.rasterizer();
    let pages = {
        let bytes = bytes.clone();
        let filename = filename.clone();
        tokio::task::spawn_blocking(move || load_pages(&bytes, &filename, &rasterizer)).await??
    };
    info!(
        "Rendered {} pages in {:.2}ms",
        pages.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let analyzer = DocumentAnalyzer::new(client)
        .with_renderer(config.renderer())
        .with_scaling(config.scaling);

    let analysis_start = Instant::now();
    let analysis = analyzer.analyze(pages, &bytes, &filename).await?;
    let processing_time_ms = analysis_start.elapsed().as_secs_f64() * 1000.0;
    info!("Analysis completed in {:.2}ms", processing_time_ms);

    let written = write_outputs(&analysis, out_dir)?;
    info!("Wrote {} files to {}", written.len(), out_dir.display());

    output_result(&analysis, output_format, processing_time_ms, &written)?;
    Ok(())
}

/// Writes `page_<n>.png` for every page and `page_<n>.md` for pages with markdown.
fn write_outputs(analysis: &DocumentAnalysis, out_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    for page in &analysis.pages {
        let number = page.page_number();

        let image_path = out_dir.join(format!("page_{number}.png"));
        page.display_image()
            .save(&image_path)
            .map_err(std::io::Error::other)?;
        written.push(image_path);

        if let Some(markdown) = &page.markdown {
            let markdown_path = out_dir.join(format!("page_{number}.md"));
            std::fs::write(&markdown_path, markdown)?;
            written.push(markdown_path);
        }
    }

    Ok(written)
}

/// Output the analysis in the specified format
fn output_result(
    analysis: &DocumentAnalysis,
    format: OutputFormat,
    processing_time_ms: f64,
    written: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        OutputFormat::Json => {
            let response = AnalysisResponse::from_analysis(analysis, false, processing_time_ms)?;
            println!("{}", serde_json::to_string(&response)?);
        }
        OutputFormat::Text => {
            for page in &analysis.pages {
                if page.page_index > 0 {
                    println!("\n--- Page {} ---\n", page.page_number());
                }
                println!("{}", page.markdown.as_deref().unwrap_or_default());
            }
        }
        OutputFormat::Pretty => {
            println!("\n=== Analysis Results ===");
            println!("Processing time: {:.2}ms", processing_time_ms);
            print!("{analysis}");
            println!();

            println!("--- Files ---");
            for path in written {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
