// SPDX-License-Identifier: GPL-3.0-only

//! Code decoding
//!
//! Frames are converted to grayscale and downscaled before being handed to
//! the `rqrr` QR decoder. Large camera frames rarely need their full
//! resolution for a code to be readable.

use super::{CameraFrame, CapturedCode, Symbology};
use crate::constants::capture;
use crate::errors::{ScannerError, ScannerResult};
use std::path::Path;
use tracing::{debug, trace};

/// Something that finds codes in a frame
pub trait CodeDecoder: Send + Sync {
    /// Symbologies this decoder can report
    fn supported_symbologies(&self) -> &[Symbology];

    /// Decode every code visible in `frame`
    fn decode(&self, frame: &CameraFrame) -> Vec<CapturedCode>;
}

/// QR code decoder
#[derive(Debug, Clone)]
pub struct QrDecoder {
    /// Frames larger than this are downscaled before decoding
    max_dimension: u32,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDecoder {
    pub fn new() -> Self {
        Self {
            max_dimension: capture::DECODE_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl CodeDecoder for QrDecoder {
    fn supported_symbologies(&self) -> &[Symbology] {
        &[Symbology::Qr]
    }

    fn decode(&self, frame: &CameraFrame) -> Vec<CapturedCode> {
        let start = std::time::Instant::now();

        if frame.width == 0 || frame.height == 0 {
            return Vec::new();
        }

        let (luma, width, height) = prepare_luma(frame, self.max_dimension);
        trace!(
            width,
            height,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared grayscale frame"
        );

        let mut image = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma[y * width as usize + x],
        );

        let mut codes = Vec::new();
        for grid in image.detect_grids() {
            match grid.decode() {
                Ok((_, content)) => codes.push(CapturedCode::new(content, Symbology::Qr)),
                Err(e) => debug!(error = %e, "Failed to decode QR grid"),
            }
        }

        if !codes.is_empty() {
            debug!(
                count = codes.len(),
                total_ms = start.elapsed().as_millis(),
                "QR decode found codes"
            );
        }

        codes
    }
}

/// Decode the codes in an image file
///
/// A file that cannot be opened or read as an image is a
/// [`ScannerError::ConfigurationInvalid`] input; an image without codes
/// yields an empty list.
pub fn decode_image(path: &Path, decoder: &dyn CodeDecoder) -> ScannerResult<Vec<CapturedCode>> {
    let image = image::open(path)
        .map_err(|e| ScannerError::ConfigurationInvalid(format!("{}: {}", path.display(), e)))?
        .to_rgba8();

    let (width, height) = image.dimensions();
    let frame = CameraFrame::from_rgba(width, height, image.into_raw());

    Ok(decoder.decode(&frame))
}

/// Grayscale copy of `frame`, downscaled to fit `max_dimension`
fn prepare_luma(frame: &CameraFrame, max_dimension: u32) -> (Vec<u8>, u32, u32) {
    let (width, height) = (frame.width, frame.height);

    if width > max_dimension || height > max_dimension {
        let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        (downscale_luma(frame, new_width, new_height), new_width, new_height)
    } else {
        (luma_without_stride(frame), width, height)
    }
}

/// BT.601 luma of an RGBA pixel
fn luma(pixel: &[u8]) -> u8 {
    ((pixel[0] as u32 * 77 + pixel[1] as u32 * 150 + pixel[2] as u32 * 29) >> 8) as u8
}

/// Grayscale frame data without stride padding
///
/// Rows missing from a truncated buffer are filled with black.
fn luma_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut result = Vec::with_capacity(width * height);

    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + width * 4;
        match frame.data.get(row_start..row_end) {
            Some(row) => result.extend(row.chunks_exact(4).map(luma)),
            None => result.resize(result.len() + width, 0),
        }
    }

    result
}

/// Downscale to grayscale using bilinear interpolation
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = frame.width as usize;
    let src_height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    let get_luma = |px: usize, py: usize| -> f32 {
        let offset = py * stride + px * 4;
        frame
            .data
            .get(offset..offset + 4)
            .map(luma)
            .unwrap_or(0) as f32
    };

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let value = get_luma(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + get_luma(x1, y0) * x_frac * (1.0 - y_frac)
                + get_luma(x0, y1) * (1.0 - x_frac) * y_frac
                + get_luma(x1, y1) * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame(width: u32, height: u32, stride: u32, data: Vec<u8>) -> CameraFrame {
        CameraFrame {
            width,
            height,
            stride,
            data: Arc::from(data),
            captured_at: std::time::Instant::now(),
        }
    }

    #[test]
    fn test_luma_without_stride() {
        let data: Vec<u8> = vec![
            255, 255, 255, 255, // White pixel
            0, 0, 0, 255, // Black pixel
            0, 0, // stride padding
            0, 0, 0, 255, // Black pixel
            255, 255, 255, 255, // White pixel
            0, 0, // stride padding
        ];

        let result = luma_without_stride(&frame(2, 2, 10, data));
        assert_eq!(result, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_truncated_frame_is_padded() {
        let data = vec![255; 8];
        let result = luma_without_stride(&frame(2, 2, 8, data));
        assert_eq!(result, vec![255, 255, 0, 0]);
    }

    #[test]
    fn test_downscale_luma() {
        // 4x2 frame, dark on the left and bright on the right
        let row: Vec<u8> = [0u8, 0, 200, 255]
            .iter()
            .flat_map(|&v| [v, v, v, 255])
            .collect();
        let data = [row.clone(), row].concat();

        let result = downscale_luma(&frame(4, 2, 16, data), 2, 1);
        assert_eq!(result.len(), 2);
        assert!(result[0] < 50);
        assert!(result[1] > 150);
    }

    #[test]
    fn test_prepare_luma_fits_max_dimension() {
        let data = vec![128; 1280 * 720 * 4];
        let (luma, width, height) = prepare_luma(&frame(1280, 720, 1280 * 4, data), 640);
        assert_eq!((width, height), (640, 360));
        assert_eq!(luma.len(), 640 * 360);
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let decoder = QrDecoder::new();
        let blank = CameraFrame::from_rgba(64, 64, vec![255; 64 * 64 * 4]);
        assert!(decoder.decode(&blank).is_empty());
        assert_eq!(decoder.supported_symbologies(), &[Symbology::Qr]);
    }

    #[test]
    fn test_decode_image_missing_file() {
        let result = decode_image(Path::new("/nonexistent/code.png"), &QrDecoder::new());
        assert!(matches!(result, Err(ScannerError::ConfigurationInvalid(_))));
    }

    #[test]
    fn test_decode_image_unreadable_file_is_not_a_decode_failure() {
        let path = std::env::temp_dir().join(format!(
            "barcode-scanner-not-an-image-{}.png",
            std::process::id()
        ));
        std::fs::write(&path, b"plain text, not a png").unwrap();

        let result = decode_image(&path, &QrDecoder::new());
        let _ = std::fs::remove_file(&path);

        match result {
            Err(ScannerError::ConfigurationInvalid(msg)) => assert!(msg.contains("not-an-image")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
