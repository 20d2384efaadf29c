// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview images

use crate::capture::CameraFrame;
use cosmic::widget::image::Handle;

/// Image handle for a camera frame
pub fn frame_handle(frame: &CameraFrame, mirrored: bool) -> Handle {
    Handle::from_rgba(frame.width, frame.height, packed_rgba(frame, mirrored))
}

/// Copy frame pixels into a tightly packed RGBA buffer
///
/// Row padding is dropped. Rows shorter than the frame width (truncated
/// buffers) are padded with transparent black.
fn packed_rgba(frame: &CameraFrame, mirrored: bool) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let row_len = width * 4;

    let mut out = vec![0u8; row_len * height];

    for (y, out_row) in out.chunks_exact_mut(row_len).enumerate() {
        let start = y * stride;
        let Some(row) = frame.data.get(start..(start + row_len).min(frame.data.len())) else {
            break;
        };

        if mirrored {
            for (x, pixel) in row.chunks_exact(4).enumerate() {
                let dst = (width - 1 - x) * 4;
                out_row[dst..dst + 4].copy_from_slice(pixel);
            }
        } else {
            out_row[..row.len()].copy_from_slice(row);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn pixel(v: u8) -> [u8; 4] {
        [v, v, v, 255]
    }

    #[test]
    fn test_packed_rgba_keeps_packed_frame() {
        let data = [pixel(1), pixel(2)].concat();
        let frame = CameraFrame::from_rgba(2, 1, data.clone());
        assert_eq!(packed_rgba(&frame, false), data);
    }

    #[test]
    fn test_packed_rgba_mirrors_rows() {
        let data = [pixel(1), pixel(2), pixel(3), pixel(4)].concat();
        let frame = CameraFrame::from_rgba(2, 2, data);
        assert_eq!(
            packed_rgba(&frame, true),
            [pixel(2), pixel(1), pixel(4), pixel(3)].concat()
        );
    }

    #[test]
    fn test_packed_rgba_drops_stride_padding() {
        // 1x2 frame with 4 bytes of padding per row
        let data = [pixel(7), [0xAA; 4], pixel(9), [0xAA; 4]].concat();
        let frame = CameraFrame {
            width: 1,
            height: 2,
            stride: 8,
            data: Arc::from(data),
            captured_at: Instant::now(),
        };
        assert_eq!(packed_rgba(&frame, false), [pixel(7), pixel(9)].concat());
    }

    #[test]
    fn test_packed_rgba_pads_truncated_buffer() {
        let frame = CameraFrame::from_rgba(2, 2, [pixel(5), pixel(6), pixel(7)].concat());
        let packed = packed_rgba(&frame, false);
        assert_eq!(packed.len(), 16);
        assert_eq!(&packed[8..12], &pixel(7));
        assert_eq!(&packed[12..], &[0, 0, 0, 0]);
    }
}
