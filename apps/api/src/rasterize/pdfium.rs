//! PDFium-backed rasterizer.
//!
//! PDFium runs on one dedicated render thread that owns the library binding
//! for the life of the process. Jobs reach it over a channel and each job
//! gets its answer back on a oneshot.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use pdfium_render::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::{png_file_name, LazyEngine, RasterizeError, RasterizedPage, Rasterizer, RENDER_SCALE};

struct RenderJob {
    pdf: Bytes,
    reply: oneshot::Sender<Result<RenderedPage, RasterizeError>>,
}

struct RenderedPage {
    png: Vec<u8>,
    width: u32,
    height: u32,
    page_count: u16,
}

/// Handle to the running render thread.
struct RenderWorker {
    jobs: mpsc::UnboundedSender<RenderJob>,
}

pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    engine: LazyEngine<RenderWorker>,
}

impl PdfiumRasterizer {
    /// Nothing is loaded until the first render.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self {
            library_path,
            engine: LazyEngine::new(),
        }
    }

    async fn worker(&self) -> Result<&RenderWorker, RasterizeError> {
        self.engine
            .get_or_start(|| start_worker(self.library_path.clone()))
            .await
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize_first_page(
        &self,
        pdf: Bytes,
        file_name: &str,
    ) -> Result<RasterizedPage, RasterizeError> {
        let worker = self.worker().await?;

        let (reply, answer) = oneshot::channel();
        worker
            .jobs
            .send(RenderJob { pdf, reply })
            .map_err(|_| RasterizeError::Engine("render thread has stopped".to_string()))?;

        let rendered = answer
            .await
            .map_err(|_| RasterizeError::Engine("render thread dropped the job".to_string()))??;

        if rendered.png.is_empty() {
            return Err(RasterizeError::NoOutput);
        }

        Ok(RasterizedPage {
            png: Bytes::from(rendered.png),
            width: rendered.width,
            height: rendered.height,
            page_count: rendered.page_count,
            file_name: png_file_name(file_name),
        })
    }
}

/// Spawns the render thread and waits until PDFium is bound on it.
async fn start_worker(library_path: Option<PathBuf>) -> Result<RenderWorker, RasterizeError> {
    info!("Starting PDF render engine...");

    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), RasterizeError>>();
    let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<RenderJob>();

    std::thread::Builder::new()
        .name("pdf-render".to_string())
        .spawn(move || {
            let pdfium = match bind_pdfium(library_path.as_deref()) {
                Ok(pdfium) => {
                    let _ = ready_tx.send(Ok(()));
                    pdfium
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while let Some(job) = jobs_rx.blocking_recv() {
                let result = render_first_page(&pdfium, &job.pdf);
                if job.reply.send(result).is_err() {
                    debug!("Render result discarded: caller went away");
                }
            }
        })
        .map_err(|e| RasterizeError::Engine(format!("failed to spawn render thread: {e}")))?;

    ready_rx
        .await
        .map_err(|_| RasterizeError::Engine("render thread exited during startup".to_string()))??;

    info!("PDF render engine ready");
    Ok(RenderWorker { jobs: jobs_tx })
}

/// Binds libpdfium from the configured path, then `./`, then system paths.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, RasterizeError> {
    let local = library_path.unwrap_or_else(|| Path::new("./"));
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(local))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| {
            error!("Failed to load PDFium library: {e:?}");
            RasterizeError::Engine(format!("failed to load PDFium library: {e:?}"))
        })?;

    Ok(Pdfium::new(bindings))
}

fn render_first_page(pdfium: &Pdfium, pdf: &[u8]) -> Result<RenderedPage, RasterizeError> {
    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| RasterizeError::Load(e.to_string()))?;

    let pages = document.pages();
    let page_count = pages.len();
    let page = pages
        .get(0)
        .map_err(|e| RasterizeError::Render(e.to_string()))?;

    let config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| RasterizeError::Render(e.to_string()))?;

    let image = bitmap.as_image();
    let (width, height) = (image.width(), image.height());

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RasterizeError::Encode(e.to_string()))?;

    debug!(
        page_count = page_count,
        width = width,
        height = height,
        png_bytes = png.len(),
        "Rendered page 1"
    );

    Ok(RenderedPage {
        png,
        width,
        height,
        page_count,
    })
}
