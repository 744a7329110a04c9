// ============================================================================
// IMAGE ACQUISITION — decode, fit and hand images to the controller
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use image::{Rgba, RgbaImage};
use rfd::FileDialog;

use crate::effects::ImageHandle;
use crate::gpu::chain::fit_within;
use crate::{log_info, log_warn};

/// Extensions accepted from drag-and-drop and the open dialog (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "avif", "bmp", "gif", "webp"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image file to RGBA.  With `max_size`, images whose longer side
/// exceeds it are downscaled, keeping the aspect ratio.
pub fn load_image_sync(path: &Path, max_size: Option<u32>) -> Result<ImageHandle, String> {
    if !is_supported_image(path) {
        return Err(format!("{}: unsupported file type", path.display()));
    }
    let mut img = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(format!("{}: image is empty", path.display()));
    }
    if let Some(max) = max_size {
        let (w, h) = fit_within(img.width(), img.height(), max.max(1));
        if (w, h) != img.dimensions() {
            img = image::imageops::resize(&img, w, h, image::imageops::FilterType::Lanczos3);
        }
    }
    Ok(ImageHandle::new(img))
}

/// Native open dialog restricted to supported images.
pub fn pick_image_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", SUPPORTED_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Largest `(w, h)` with the image's aspect ratio that fits the container.
pub fn fit_rect(container_w: f32, container_h: f32, image_aspect: f32) -> (f32, f32) {
    let container_h = container_h.max(f32::EPSILON);
    let aspect = if image_aspect.is_finite() && image_aspect > 0.0 { image_aspect } else { 1.0 };
    if aspect >= container_w / container_h {
        (container_w, container_w / aspect)
    } else {
        (container_h * aspect, container_h)
    }
}

/// Render-target size for a container: the fitted rect floored to whole
/// pixels, never below 1x1.
pub fn render_size(container_w: f32, container_h: f32, image_aspect: f32) -> (u32, u32) {
    let (w, h) = fit_rect(container_w.max(1.0), container_h.max(1.0), image_aspect);
    ((w.floor() as u32).max(1), (h.floor() as u32).max(1))
}

// ============================================================================
// BACKGROUND DECODING
// ============================================================================

/// Outcome of one background decode.
pub struct LoadResult {
    pub path: PathBuf,
    pub image: Result<ImageHandle, String>,
}

/// Decodes files on the rayon pool.  Results are collected with `poll`
/// from the UI thread, so the controller only ever sees finished images.
pub struct ImageLoader {
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    in_flight: usize,
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, in_flight: 0 }
    }

    pub fn request(&mut self, path: PathBuf) {
        log_info!("loading image {}", path.display());
        let tx = self.tx.clone();
        self.in_flight += 1;
        rayon::spawn(move || {
            let image = load_image_sync(&path, None);
            let _ = tx.send(LoadResult { path, image });
        });
    }

    /// Next finished decode, if any.
    pub fn poll(&mut self) -> Option<LoadResult> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if let Err(e) = &result.image {
                    log_warn!("image load failed: {}", e);
                }
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DEFAULT IMAGE — procedural snow field shown at startup
// ============================================================================

/// A snowy landscape: dusk sky, two ridges of hills, falling snow.
/// Deterministic so every launch shows the same picture.
pub fn default_image(width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width.max(1), height.max(1));
    let mut img = RgbaImage::new(w, h);

    let far_ridge = |x: f32| 0.58 + 0.06 * (x * 7.0).sin() + 0.03 * (x * 17.0 + 1.3).sin();
    let near_ridge = |x: f32| 0.72 + 0.05 * (x * 4.0 + 2.0).sin() + 0.02 * (x * 23.0).cos();

    for (px, py, pixel) in img.enumerate_pixels_mut() {
        let x = px as f32 / w as f32;
        let y = py as f32 / h as f32;
        let c = if y > near_ridge(x) {
            let shade = 0.88 + 0.1 * (1.0 - y);
            [shade, shade, shade + 0.04]
        } else if y > far_ridge(x) {
            [0.62, 0.68, 0.78]
        } else {
            let t = y / 0.7;
            [0.16 + 0.5 * t, 0.22 + 0.45 * t, 0.42 + 0.38 * t]
        };
        *pixel = Rgba([to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), 255]);
    }

    // Snowflakes from a fixed-seed LCG.
    let mut seed: u32 = 0x2545_f491;
    let mut next = || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed
    };
    let flakes = (w as u64 * h as u64 / 600).max(1);
    for _ in 0..flakes {
        let cx = next() % w;
        let cy = next() % h;
        let r = 1 + (next() % 3) as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let (x, y) = (cx as i64 + dx, cy as i64 + dy);
                if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                    img.put_pixel(x as u32, y as u32, Rgba([250, 250, 255, 255]));
                }
            }
        }
    }
    img
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported_image(Path::new("a/b/photo.JPG")));
        assert!(is_supported_image(Path::new("x.webp")));
        assert!(is_supported_image(Path::new("x.avif")));
        assert!(!is_supported_image(Path::new("x.tiff")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn fit_rect_contains_the_image() {
        // Wider than the container: full width.
        assert_eq!(fit_rect(400.0, 400.0, 2.0), (400.0, 200.0));
        // Taller: full height.
        assert_eq!(fit_rect(400.0, 400.0, 0.5), (200.0, 400.0));
        // Degenerate aspect falls back to square.
        assert_eq!(fit_rect(300.0, 100.0, 0.0), (100.0, 100.0));
    }

    #[test]
    fn render_size_is_at_least_one_pixel() {
        assert_eq!(render_size(0.0, 0.0, 1.0), (1, 1));
        assert_eq!(render_size(1000.0, 10.0, 1000.0), (1000, 1));
        assert_eq!(render_size(640.5, 480.9, 4.0 / 3.0), (640, 480));
    }

    #[test]
    fn default_image_is_deterministic() {
        let a = default_image(64, 48);
        let b = default_image(64, 48);
        assert_eq!(a.dimensions(), (64, 48));
        assert_eq!(a, b);
        assert!(a.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn loads_and_downscales_from_disk() {
        let dir = std::env::temp_dir().join(format!("shaderfx-io-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wide.png");
        default_image(400, 100).save(&path).unwrap();

        let full = load_image_sync(&path, None).unwrap();
        assert_eq!((full.width(), full.height()), (400, 100));
        let small = load_image_sync(&path, Some(200)).unwrap();
        assert_eq!((small.width(), small.height()), (200, 50));

        assert!(load_image_sync(&dir.join("missing.png"), None).is_err());
        assert!(load_image_sync(&dir.join("notes.txt"), None).unwrap_err().contains("unsupported"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn loader_reports_failures_without_panicking() {
        let mut loader = ImageLoader::new();
        loader.request(PathBuf::from("/definitely/not/here.png"));
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(r) = loader.poll() {
                break r;
            }
            assert!(Instant::now() < deadline, "loader never answered");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(result.image.is_err());
        assert!(!loader.is_busy());
    }
}
