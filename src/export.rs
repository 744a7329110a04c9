//! Export surface: PNG encoding plus the places a finished frame can go.

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};

use crate::error::{PipelineError, Result};
use crate::log_info;

/// File name offered for every export.
pub const EXPORT_FILE_NAME: &str = "screenshot.png";

/// Receives an encoded frame.
pub trait ExportSink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<()>;
}

pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(frame.as_raw(), frame.width(), frame.height(), ColorType::Rgba8)
        .map_err(|e| PipelineError::Encode(e.to_string()))?;
    Ok(out)
}

/// Asks the user where to save, pre-filling the fixed file name.  A
/// cancelled dialog is not an error.
#[derive(Debug, Default)]
pub struct DialogExportSink {
    last_dir: Option<PathBuf>,
}

impl DialogExportSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExportSink for DialogExportSink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<()> {
        let mut dialog = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("PNG", &["png"]);
        if let Some(dir) = &self.last_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            log_info!("export: save dialog cancelled");
            return Ok(());
        };
        fs::write(&path, png).map_err(|e| PipelineError::Export(format!("{}: {}", path.display(), e)))?;
        log_info!("export: wrote {} ({} bytes)", path.display(), png.len());
        self.last_dir = path.parent().map(Path::to_path_buf);
        Ok(())
    }
}

/// Writes straight to disk.  Used by the command line.
///
/// With a fixed `target` every save goes to that exact path; otherwise the
/// offered file name is joined onto `dir`.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
    target: Option<PathBuf>,
    written: Vec<PathBuf>,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), target: None, written: Vec::new() }
    }

    /// Direct the next saves to `path` instead of `dir/<file name>`.
    pub fn set_target(&mut self, path: Option<PathBuf>) {
        self.target = path;
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectoryExportSink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> Result<()> {
        let path = self.target.clone().unwrap_or_else(|| self.dir.join(file_name));
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PipelineError::Export(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(&path, png).map_err(|e| PipelineError::Export(format!("{}: {}", path.display(), e)))?;
        self.written.push(path);
        Ok(())
    }
}
