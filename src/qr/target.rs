//! 预览挂载目标。
//!
//! 每次挂载前都会先清空目标，保证同一目标上只显示一个二维码。

use std::io::Write;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use super::RenderError;
use super::style::HexColor;

/// 一帧待挂载的预览。
pub struct PreviewFrame<'a> {
    pub image: &'a RgbaImage,
    pub background: HexColor,
}

pub trait RenderTarget {
    /// 清除目标上已有的内容。
    fn clear(&mut self) -> Result<(), RenderError>;

    fn mount(&mut self, frame: &PreviewFrame<'_>) -> Result<(), RenderError>;
}

/// 将预览写成磁盘上的 PNG 文件，重复挂载会覆盖。
pub struct FilePreview {
    path: PathBuf,
}

impl FilePreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderTarget for FilePreview {
    fn clear(&mut self) -> Result<(), RenderError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RenderError::Target(format!("无法清除预览文件：{}", e))),
        }
    }

    fn mount(&mut self, frame: &PreviewFrame<'_>) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RenderError::Target(format!("无法创建预览目录：{}", e)))?;
        }

        frame
            .image
            .save_with_format(&self.path, image::ImageFormat::Png)
            .map_err(|e| RenderError::Target(format!("无法写入预览文件：{}", e)))?;

        log::debug!("🖼️ 预览已写入 {}", self.path.display());
        Ok(())
    }
}

/// 终端半块字符预览：每个字符格表示上下两个采样点。
pub struct TerminalPreview<W: Write> {
    writer: W,
    max_columns: u32,
    mounted_rows: usize,
}

impl<W: Write> TerminalPreview<W> {
    pub const DEFAULT_COLUMNS: u32 = 64;

    pub fn new(writer: W) -> Self {
        Self::with_columns(writer, Self::DEFAULT_COLUMNS)
    }

    pub fn with_columns(writer: W, max_columns: u32) -> Self {
        Self {
            writer,
            max_columns: max_columns.max(1),
            mounted_rows: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn is_ink(pixel: &image::Rgba<u8>, background: HexColor) -> bool {
        let [r, g, b, a] = pixel.0;
        if a < 128 {
            return false;
        }
        let distance = r.abs_diff(background.r) as u32
            + g.abs_diff(background.g) as u32
            + b.abs_diff(background.b) as u32;
        distance > 96
    }

    fn render_lines(&self, frame: &PreviewFrame<'_>) -> Vec<String> {
        let (width, height) = frame.image.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let columns = width.min(self.max_columns);
        let step = width as f64 / columns as f64;
        let rows = ((height as f64 / step).floor() as u32).max(1);

        let sample = |col: u32, row: u32| -> bool {
            if row >= rows {
                return false;
            }
            let x = (((col as f64) + 0.5) * step).min(width as f64 - 1.0) as u32;
            let y = (((row as f64) + 0.5) * step).min(height as f64 - 1.0) as u32;
            Self::is_ink(frame.image.get_pixel(x, y), frame.background)
        };

        (0..rows)
            .step_by(2)
            .map(|row| {
                (0..columns)
                    .map(|col| match (sample(col, row), sample(col, row + 1)) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    })
                    .collect()
            })
            .collect()
    }
}

impl<W: Write> RenderTarget for TerminalPreview<W> {
    fn clear(&mut self) -> Result<(), RenderError> {
        if self.mounted_rows > 0 {
            // 光标上移并清除到屏幕末尾
            write!(self.writer, "\x1b[{}A\x1b[J", self.mounted_rows)
                .map_err(|e| RenderError::Target(e.to_string()))?;
            self.mounted_rows = 0;
        }
        Ok(())
    }

    fn mount(&mut self, frame: &PreviewFrame<'_>) -> Result<(), RenderError> {
        let lines = self.render_lines(frame);
        for line in &lines {
            writeln!(self.writer, "{}", line).map_err(|e| RenderError::Target(e.to_string()))?;
        }
        self.writer.flush().map_err(|e| RenderError::Target(e.to_string()))?;
        self.mounted_rows = lines.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, _| {
            if x < size / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn terminal_preview_draws_ink_on_left_half() {
        let image = checker(8);
        let mut preview = TerminalPreview::with_columns(Vec::new(), 8);
        preview
            .mount(&PreviewFrame {
                image: &image,
                background: HexColor::WHITE,
            })
            .expect("mount");

        let output = String::from_utf8(preview.into_inner()).expect("utf8");
        let first = output.lines().next().expect("one line");
        assert_eq!(first, "████    ");
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn terminal_preview_clears_previous_frame() {
        let image = checker(4);
        let frame = PreviewFrame {
            image: &image,
            background: HexColor::WHITE,
        };
        let mut preview = TerminalPreview::with_columns(Vec::new(), 4);

        preview.mount(&frame).expect("mount");
        preview.clear().expect("clear");
        preview.mount(&frame).expect("mount");

        let output = String::from_utf8(preview.into_inner()).expect("utf8");
        assert!(output.contains("\x1b[2A\x1b[J"));
    }

    #[test]
    fn clearing_missing_preview_file_is_ok() {
        let path = std::env::temp_dir().join(format!("qr-preview-missing-{}.png", std::process::id()));
        let mut preview = FilePreview::new(&path);

        assert!(preview.clear().is_ok());
    }
}
