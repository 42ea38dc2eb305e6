use nesplay_core::host::FrameBuffer;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("{0}x{1} frames are too large for a GIF")]
    TooLarge(u32, u32),
}

/// Console refresh rate the recorded frames were captured at.
const RECORDING_FPS: f64 = 60.0;

/// Quantizer speed for `gif::Frame::from_rgb_speed`; 1 is best, 30 fastest.
const QUANTIZE_SPEED: i32 = 10;

fn frame_to_rgb(frame: &FrameBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.pixels.len() * 3);
    for &px in &frame.pixels {
        out.push(((px >> 16) & 0xFF) as u8);
        out.push(((px >> 8) & 0xFF) as u8);
        out.push((px & 0xFF) as u8);
    }
    out
}

pub fn write_png(path: &Path, frame: &FrameBuffer) -> Result<(), CaptureError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame_to_rgb(frame))?;
    writer.finish()?;
    Ok(())
}

fn stamp() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Save one frame as `<dir>/screenshot-<millis>.png`.
pub fn save_screenshot(dir: &Path, frame: &FrameBuffer) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("screenshot-{}.png", stamp()));
    write_png(&path, frame)?;
    Ok(path)
}

/// Per-frame delays in centiseconds whose running sum tracks the real
/// elapsed time, so 60 fps comes out as 2, 1, 2, 2, 1, 2, ...
fn frame_delays(count: usize) -> impl Iterator<Item = u16> {
    (1..=count).scan(0u64, |written, i| {
        let end = (i as f64 * 100.0 / RECORDING_FPS).round() as u64;
        let delay = end.saturating_sub(*written);
        *written = end;
        Some(u16::try_from(delay).unwrap_or(u16::MAX))
    })
}

/// Encode a recording as a looping GIF.
pub fn write_gif<W: Write>(out: W, frames: &[FrameBuffer]) -> Result<(), CaptureError> {
    let Some(first) = frames.first() else {
        return Ok(());
    };
    let (Ok(width), Ok(height)) = (u16::try_from(first.width), u16::try_from(first.height)) else {
        return Err(CaptureError::TooLarge(first.width, first.height));
    };

    let mut encoder = gif::Encoder::new(out, width, height, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;
    for (frame, delay) in frames.iter().zip(frame_delays(frames.len())) {
        let mut gif_frame =
            gif::Frame::from_rgb_speed(width, height, &frame_to_rgb(frame), QUANTIZE_SPEED);
        gif_frame.delay = delay;
        encoder.write_frame(&gif_frame)?;
    }
    Ok(())
}

/// Save a recording as `<dir>/recording-<millis>.gif`.
pub fn save_animation(dir: &Path, frames: &[FrameBuffer]) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("recording-{}.gif", stamp()));
    let file = File::create(&path)?;
    write_gif(BufWriter::new(file), frames)?;
    Ok(path)
}
