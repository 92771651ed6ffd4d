//! Immediate-mode 2D rendering core: batched blits, fills and atlas-packed
//! glyphs onto off-screen surfaces, composited onto a window with wgpu.

pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod glyph;
pub mod gpu;
pub mod renderer;
pub mod window;

use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

pub use error::{DeviceError, InitError};
pub use geometry::Rect;
pub use glyph::GlyphHandle;
pub use renderer::{FrameStats, Renderer, SurfaceHandle};

/// Path of the debug log, next to the executable.
pub fn log_path() -> std::path::PathBuf {
    std::env::current_exe()
        .unwrap_or_default()
        .parent()
        .unwrap_or(std::path::Path::new("."))
        .join("blitcore_debug.log")
}

/// `log` backend writing `[LEVEL] target: message` lines to a file, or to
/// stderr when the file cannot be opened.
pub struct FileLogger {
    file: Option<Mutex<File>>,
}

impl FileLogger {
    pub fn new(file: Option<File>) -> Self {
        Self {
            file: file.map(Mutex::new),
        }
    }
}

fn format_line(record: &log::Record<'_>) -> String {
    format!("[{}] {}: {}", record.level(), record.target(), record.args())
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        match &self.file {
            Some(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{line}");
                }
            }
            None => eprintln!("{line}"),
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut f)) = self.file.as_ref().map(Mutex::lock) {
            let _ = f.flush();
        }
    }
}

/// Install the file logger, truncating any previous log. The level can be
/// changed later with [`log::set_max_level`].
pub fn init_logging(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let logger = FileLogger::new(File::create(log_path()).ok());
    log::set_logger(Box::leak(Box::new(logger)))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_format() {
        let line = format_line(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("blitcore::renderer")
                .args(format_args!("atlas {} full", 3))
                .build(),
        );
        assert_eq!(line, "[WARN] blitcore::renderer: atlas 3 full");
    }

    #[test]
    fn log_path_is_next_to_executable() {
        assert_eq!(
            log_path().file_name().and_then(|n| n.to_str()),
            Some("blitcore_debug.log")
        );
    }
}
