//! Background PNG export
//!
//! The render thread hands a private copy of the composed pixels to a
//! worker thread and polls the task once per frame.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use super::bitmap::RgbaBitmap;
use super::ImageError;

/// Result of a non-blocking poll
#[derive(Debug)]
pub enum ExportStatus {
    Pending,
    Done(Result<PathBuf, ImageError>),
}

/// One in-flight export. Not cancellable; drop it to ignore the result.
pub struct ExportTask {
    path: PathBuf,
    result_rx: mpsc::Receiver<Result<PathBuf, ImageError>>,
    _thread: std::thread::JoinHandle<()>,
}

impl ExportTask {
    /// Start encoding `bitmap` to `path` on a worker thread
    pub fn spawn(path: PathBuf, bitmap: &RgbaBitmap) -> Result<Self, ImageError> {
        let (width, height) = bitmap.size();
        let bytes = bitmap.to_rgba_bytes();
        let (result_tx, result_rx) = mpsc::channel();

        let worker_path = path.clone();
        let thread = std::thread::Builder::new()
            .name("tzbanner-export".into())
            .spawn(move || {
                let result = encode_png(&worker_path, width, height, &bytes).map(|_| worker_path);
                // Receiver gone means nobody is waiting
                let _ = result_tx.send(result);
            })
            .map_err(|e| ImageError::Write {
                path: path.clone(),
                reason: format!("failed to start export thread: {}", e),
            })?;

        debug!("Export dispatched: {} ({}x{})", path.display(), width, height);
        Ok(Self {
            path,
            result_rx,
            _thread: thread,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check for completion without blocking
    pub fn poll(&self) -> ExportStatus {
        match self.result_rx.try_recv() {
            Ok(result) => ExportStatus::Done(result),
            Err(mpsc::TryRecvError::Empty) => ExportStatus::Pending,
            Err(mpsc::TryRecvError::Disconnected) => ExportStatus::Done(Err(ImageError::Write {
                path: self.path.clone(),
                reason: "export thread exited without a result".into(),
            })),
        }
    }

    /// Block until the export finishes
    pub fn wait(self) -> Result<PathBuf, ImageError> {
        self.result_rx.recv().unwrap_or_else(|_| {
            Err(ImageError::Write {
                path: self.path.clone(),
                reason: "export thread exited without a result".into(),
            })
        })
    }
}

/// Write RGBA8 pixels as a PNG file
pub fn encode_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), ImageError> {
    let write_err = |reason: String| ImageError::Write {
        path: path.to_path_buf(),
        reason,
    };

    if width == 0 || height == 0 {
        return Err(write_err(format!("cannot encode a {}x{} image", width, height)));
    }
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(write_err(format!(
            "pixel buffer size mismatch: expected {}, got {}",
            width as usize * height as usize * 4,
            rgba.len()
        )));
    }

    let file = std::fs::File::create(path).map_err(|e| write_err(e.to_string()))?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(|e| write_err(e.to_string()))?;
    writer
        .write_image_data(rgba)
        .map_err(|e| write_err(e.to_string()))?;
    writer.finish().map_err(|e| write_err(e.to_string()))?;

    info!("Exported: {}", path.display());
    Ok(())
}

/// Log the outcome of a finished export
pub fn report(result: &Result<PathBuf, ImageError>) {
    match result {
        Ok(path) => info!("Export finished: {}", path.display()),
        Err(e) => warn!("Export failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::bitmap::decode_image;
    use crate::utils::ColorRGBA;
    use std::time::Duration;

    fn temp_png(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tzbanner_{}_{}.png", name, std::process::id()))
    }

    fn poll_until_done(task: &ExportTask) -> Result<PathBuf, ImageError> {
        for _ in 0..500 {
            if let ExportStatus::Done(result) = task.poll() {
                return result;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("export did not finish");
    }

    #[test]
    fn test_export_round_trip() {
        let path = temp_png("export");
        let mut bitmap = RgbaBitmap::filled(3, 2, ColorRGBA::new(1, 2, 3, 255));
        bitmap.put(2, 1, ColorRGBA::new(200, 100, 50, 25));

        let task = ExportTask::spawn(path.clone(), &bitmap).unwrap();
        // The task owns its copy
        bitmap.put(0, 0, ColorRGBA::BLACK);

        let written = poll_until_done(&task).unwrap();
        assert_eq!(written, path);

        let decoded = decode_image(&path, 1.0).unwrap();
        assert_eq!(decoded.size(), (3, 2));
        assert_eq!(decoded.get(0, 0), Some(ColorRGBA::new(1, 2, 3, 255)));
        assert_eq!(decoded.get(2, 1), Some(ColorRGBA::new(200, 100, 50, 25)));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_export_to_missing_directory() {
        let path = PathBuf::from("/nonexistent/dir/out.png");
        let task = ExportTask::spawn(path, &RgbaBitmap::filled(1, 1, ColorRGBA::WHITE)).unwrap();
        assert!(matches!(task.wait(), Err(ImageError::Write { .. })));
    }

    #[test]
    fn test_encode_rejects_empty_and_mismatched() {
        let path = temp_png("reject");
        assert!(encode_png(&path, 0, 0, &[]).is_err());
        assert!(encode_png(&path, 2, 2, &[0; 4]).is_err());
        assert!(!path.exists());
    }
}
