//! 2D scalar fields with bilinear sampling.

use std::path::Path;

/// Errors that can occur when loading a scalar field from disk.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Failed to open or decode the image file.
    #[error("failed to load field texture: {0}")]
    LoadError(#[source] image::ImageError),
    /// The decoded image has a zero dimension.
    #[error("field texture has zero dimension ({width}x{height})")]
    EmptyTexture { width: u32, height: u32 },
}

/// An immutable 2D raster of values in [0, 1] with bilinear lookup.
///
/// Used for blue-noise spawn masks: the spawners sample it at a world-derived
/// UV and compare against a threshold.
#[derive(Clone, Debug)]
pub struct ScalarField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl ScalarField {
    /// Build a field by evaluating `f(x, y)` at every texel.
    ///
    /// Results are clamped into [0, 1].
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        assert!(width > 0 && height > 0, "field dimensions must be non-zero");
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y).clamp(0.0, 1.0));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    /// Load a grayscale field from a PNG (or any image the `image` crate
    /// decodes). Color images are converted to luma.
    pub fn from_png(path: &Path) -> Result<Self, FieldError> {
        let img = image::open(path).map_err(FieldError::LoadError)?.to_luma8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(FieldError::EmptyTexture { width, height });
        }
        let values = img.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            values,
        })
    }

    /// Texel value at `(x, y)`, clamped to the raster borders.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.values[y * self.width + x]
    }

    /// Bilinearly interpolated value at normalized `(u, v)`, both clamped to
    /// [0, 1]. Returns a value in [0, 1].
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x0 + 1, y0);
        let v01 = self.get(x0, y0 + 1);
        let v11 = self.get(x0 + 1, y0 + 1);

        let a = v00 + (v10 - v00) * tx;
        let b = v01 + (v11 - v01) * tx;
        a + (b - a) * ty
    }

    /// Raster width in texels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height in texels.
    pub fn height(&self) -> usize {
        self.height
    }
}

/// An immutable 2D RGBA raster with bilinear lookup, channels in [0, 1].
#[derive(Clone, Debug)]
pub struct RgbaField {
    width: usize,
    height: usize,
    texels: Vec<[f32; 4]>,
}

impl RgbaField {
    /// Load an RGBA field from an image file.
    pub fn from_png(path: &Path) -> Result<Self, FieldError> {
        let img = image::open(path).map_err(FieldError::LoadError)?.to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(FieldError::EmptyTexture { width, height });
        }
        let texels = img
            .pixels()
            .map(|p| p.0.map(|c| f32::from(c) / 255.0))
            .collect();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            texels,
        })
    }

    /// Texel at `(x, y)`, clamped to the raster borders.
    pub fn get(&self, x: usize, y: usize) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[y * self.width + x]
    }

    /// Bilinearly interpolated RGBA at normalized `(u, v)`, both clamped
    /// to [0, 1].
    pub fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let c00 = self.get(x0, y0);
        let c10 = self.get(x0 + 1, y0);
        let c01 = self.get(x0, y0 + 1);
        let c11 = self.get(x0 + 1, y0 + 1);

        let mut out = [0.0f32; 4];
        for (i, o) in out.iter_mut().enumerate() {
            let a = c00[i] + (c10[i] - c00[i]) * tx;
            let b = c01[i] + (c11[i] - c01[i]) * tx;
            *o = a + (b - a) * ty;
        }
        out
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_clamps_values() {
        let field = ScalarField::from_fn(2, 2, |x, _| x as f32 * 2.0 - 0.5);
        assert_eq!(field.get(0, 0), 0.0);
        assert_eq!(field.get(1, 0), 1.0);
    }

    #[test]
    fn test_sample_at_texel_corners() {
        let field = ScalarField::from_fn(2, 2, |x, y| if x == 1 && y == 1 { 1.0 } else { 0.0 });
        assert_eq!(field.sample_bilinear(0.0, 0.0), 0.0);
        assert_eq!(field.sample_bilinear(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_sample_interpolates() {
        // Left column 0, right column 1: u=0.5 should give 0.5.
        let field = ScalarField::from_fn(2, 2, |x, _| x as f32);
        let mid = field.sample_bilinear(0.5, 0.5);
        assert!((mid - 0.5).abs() < 1e-6, "midpoint sample: {mid}");
    }

    #[test]
    fn test_sample_clamps_uv() {
        let field = ScalarField::from_fn(2, 2, |x, _| x as f32);
        assert_eq!(field.sample_bilinear(-5.0, 0.0), 0.0);
        assert_eq!(field.sample_bilinear(5.0, 0.0), 1.0);
    }

    #[test]
    fn test_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.png");

        let mut img = image::GrayImage::new(4, 4);
        for (x, _y, p) in img.enumerate_pixels_mut() {
            p.0[0] = (x * 85) as u8; // 0, 85, 170, 255
        }
        img.save(&path).unwrap();

        let field = ScalarField::from_png(&path).unwrap();
        assert_eq!(field.width(), 4);
        assert_eq!(field.height(), 4);
        assert!((field.get(0, 0) - 0.0).abs() < 1e-6);
        assert!((field.get(3, 0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rgba_roundtrip_and_interpolation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");

        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        img.save(&path).unwrap();

        let field = RgbaField::from_png(&path).unwrap();
        assert_eq!(field.get(0, 0), [1.0, 0.0, 0.0, 1.0]);
        // Midpoint mixes all four corners equally.
        let mid = field.sample_bilinear(0.5, 0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6, "red midpoint: {}", mid[0]);
        assert!((mid[3] - 1.0).abs() < 1e-6, "alpha stays opaque");
    }

    #[test]
    fn test_missing_png_is_an_error() {
        let result = ScalarField::from_png(Path::new("/nonexistent/noise.png"));
        assert!(result.is_err());
    }
}
