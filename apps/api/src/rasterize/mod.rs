//! Document Rasterizer: renders page 1 of an uploaded PDF to a PNG.
//!
//! The rendering engine is started lazily, at most once per process. Callers
//! that arrive while the engine is still starting wait on the same startup
//! instead of launching a second one.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::OnceCell;

pub mod pdfium;

pub use self::pdfium::PdfiumRasterizer;

/// Upscale applied to the page before encoding. Recognition quality matters
/// more downstream than file size.
pub const RENDER_SCALE: f32 = 4.0;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("rendering engine unavailable: {0}")]
    Engine(String),

    #[error("could not open PDF: {0}")]
    Load(String),

    #[error("could not render page 1: {0}")]
    Render(String),

    #[error("could not encode PNG: {0}")]
    Encode(String),

    #[error("renderer produced no output")]
    NoOutput,
}

/// Page 1 of a PDF, rendered and PNG-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedPage {
    pub png: Bytes,
    pub width: u32,
    pub height: u32,
    /// Total pages in the source document. Only page 1 is ever rendered.
    pub page_count: u16,
    /// Upload name with its `.pdf` extension swapped for `.png`.
    pub file_name: String,
}

impl RasterizedPage {
    pub const MIME_TYPE: &'static str = "image/png";
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize_first_page(
        &self,
        pdf: Bytes,
        file_name: &str,
    ) -> Result<RasterizedPage, RasterizeError>;
}

/// `resume.pdf` → `resume.png`; names without a PDF extension just gain `.png`.
pub fn png_file_name(upload_name: &str) -> String {
    let stem = match upload_name.len().checked_sub(4) {
        Some(cut)
            if upload_name.is_char_boundary(cut)
                && upload_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &upload_name[..cut]
        }
        _ => upload_name,
    };
    format!("{stem}.png")
}

// ────────────────────────────────────────────────────────────────────────────
// Lazily started engine
// ────────────────────────────────────────────────────────────────────────────

/// An engine handle started on first use and shared for the life of its owner.
///
/// A failed start is not cached; the next caller tries again.
pub struct LazyEngine<T> {
    cell: OnceCell<T>,
}

impl<T> LazyEngine<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub async fn get_or_start<F, Fut, E>(&self, start: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_try_init(start).await
    }

    pub fn is_started(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T> Default for LazyEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}
