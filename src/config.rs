//! Configuration types for page editing and recompression.
//!
//! Every knob lives in [`EditConfig`], built via its [`EditConfigBuilder`].
//! Setters clamp out-of-range values; [`EditConfigBuilder::build`] rejects
//! combinations that cannot work.

use crate::error::PdfEditError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for an editing session.
///
/// # Example
/// ```rust
/// use privatepdf::{CompressionLevel, EditConfig};
///
/// let config = EditConfig::builder()
///     .compression(CompressionLevel::High)
///     .render_scale(1.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.compression.jpeg_quality(), 50);
/// ```
#[derive(Clone)]
pub struct EditConfig {
    /// JPEG compression level applied on save. Default: [`CompressionLevel::Medium`].
    pub compression: CompressionLevel,

    /// Rasterise and re-encode pages on save. Default: true.
    ///
    /// When false, the saved file is the reordered document as pdfium wrote
    /// it, with text and vector content intact.
    pub recompress: bool,

    /// Keep the uncompressed reordered document when compression fails. Default: true.
    pub fallback_to_uncompressed: bool,

    /// Scale factor used when rasterising pages for compression. Range: 0.5–4.0. Default: 2.0.
    ///
    /// A scale of 2.0 renders a US-Letter page at 1224 × 1584 px.
    pub render_scale: f32,

    /// Scale factor for thumbnails. Range: 0.1–2.0. Default: 0.7.
    pub thumbnail_scale: f32,

    /// PDF user password for encrypted inputs.
    pub password: Option<String>,

    /// Suffix inserted before the extension of the output file name. Default: "-modified".
    pub output_suffix: String,

    /// Optional progress callback for save operations.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            recompress: true,
            fallback_to_uncompressed: true,
            render_scale: 2.0,
            thumbnail_scale: 0.7,
            password: None,
            output_suffix: "-modified".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditConfig")
            .field("compression", &self.compression)
            .field("recompress", &self.recompress)
            .field("fallback_to_uncompressed", &self.fallback_to_uncompressed)
            .field("render_scale", &self.render_scale)
            .field("thumbnail_scale", &self.thumbnail_scale)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("output_suffix", &self.output_suffix)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SaveProgressCallback>"),
            )
            .finish()
    }
}

impl EditConfig {
    /// Create a new builder for `EditConfig`.
    pub fn builder() -> EditConfigBuilder {
        EditConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EditConfig`].
#[derive(Debug)]
pub struct EditConfigBuilder {
    config: EditConfig,
}

impl EditConfigBuilder {
    pub fn compression(mut self, level: CompressionLevel) -> Self {
        self.config.compression = level;
        self
    }

    pub fn recompress(mut self, v: bool) -> Self {
        self.config.recompress = v;
        self
    }

    pub fn fallback_to_uncompressed(mut self, v: bool) -> Self {
        self.config.fallback_to_uncompressed = v;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 4.0);
        self
    }

    pub fn thumbnail_scale(mut self, scale: f32) -> Self {
        self.config.thumbnail_scale = scale.clamp(0.1, 2.0);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.output_suffix = suffix.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EditConfig, PdfEditError> {
        let c = &self.config;
        if !c.render_scale.is_finite() || !c.thumbnail_scale.is_finite() {
            return Err(PdfEditError::InvalidConfig(
                "Scale factors must be finite numbers".into(),
            ));
        }
        if c.output_suffix.trim().is_empty() {
            return Err(PdfEditError::InvalidConfig(
                "Output suffix must not be empty; the output would replace its input".into(),
            ));
        }
        if c.output_suffix.contains(['/', '\\']) {
            return Err(PdfEditError::InvalidConfig(format!(
                "Output suffix must not contain path separators, got '{}'",
                c.output_suffix
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How aggressively saved pages are recompressed.
///
/// The level names describe file size, so a *higher* level means *lower*
/// JPEG fidelity:
///
/// | Level | JPEG quality | Use case |
/// |-------|--------------|----------|
/// | Low    | 90 | Scans that must stay legible |
/// | Medium | 70 | Balanced (default) |
/// | High   | 50 | Smallest files |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Minimal compression, best quality.
    Low,
    /// Balanced. (default)
    #[default]
    Medium,
    /// Maximum compression, smallest files.
    High,
}

impl CompressionLevel {
    /// JPEG quality (1–100) used for this level.
    pub fn jpeg_quality(self) -> u8 {
        match self {
            CompressionLevel::Low => 90,
            CompressionLevel::Medium => 70,
            CompressionLevel::High => 50,
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = PdfEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(PdfEditError::InvalidConfig(format!(
                "Unknown compression level '{other}' (expected low, medium or high)"
            ))),
        }
    }
}
