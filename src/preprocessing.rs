// src/preprocessing.rs

use anyhow::Result;

/// Prepare an RGB frame for the pose landmark model: bilinear resize to a
/// square `size × size`, scale to [0, 1], keep NHWC layout.
pub fn preprocess(src: &[u8], src_width: usize, src_height: usize, size: usize) -> Result<Vec<f32>> {
    let expected = src_width * src_height * 3;
    if src_width == 0 || src_height == 0 || src.len() < expected {
        anyhow::bail!(
            "Frame buffer too small: {} bytes for {}x{} RGB",
            src.len(),
            src_width,
            src_height
        );
    }

    let resized = resize_bilinear(src, src_width, src_height, size, size);

    Ok(resized.iter().map(|&p| p as f32 / 255.0).collect())
}

/// Bilinear image resize over packed RGB bytes
fn resize_bilinear(src: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let mut dst = vec![0u8; dst_h * dst_w * 3];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx as f32 * x_ratio;
            let sy = dy as f32 * y_ratio;

            let sx0 = (sx.floor() as usize).min(src_w - 1);
            let sy0 = (sy.floor() as usize).min(src_h - 1);
            let sx1 = (sx0 + 1).min(src_w - 1);
            let sy1 = (sy0 + 1).min(src_h - 1);

            let fx = sx - sx0 as f32;
            let fy = sy - sy0 as f32;

            for c in 0..3 {
                let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * 3 + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    dst
}
