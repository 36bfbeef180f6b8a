//! Image helpers: orienting raw sensor frames, edge-clamped crops, resizing
//! and conversion into `ndarray` network tensors.

use crate::constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE, MAX_CROP_SCALE};
use crate::geometry::Rect;
use crate::orientation::{ExifOrientation, Orientation};
use crate::utils::safe_cast::{f64_to_i64_clamp, f64_to_u32_clamp};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

/// Apply an EXIF orientation tag to an image
#[must_use]
pub fn apply_exif(image: &RgbImage, exif: ExifOrientation) -> RgbImage {
    match exif {
        ExifOrientation::TopLeft => image.clone(),
        ExifOrientation::TopRight => imageops::flip_horizontal(image),
        ExifOrientation::BottomRight => imageops::rotate180(image),
        ExifOrientation::BottomLeft => imageops::flip_vertical(image),
        ExifOrientation::LeftTop => imageops::flip_horizontal(&imageops::rotate90(image)),
        ExifOrientation::RightTop => imageops::rotate90(image),
        ExifOrientation::RightBottom => imageops::flip_horizontal(&imageops::rotate270(image)),
        ExifOrientation::LeftBottom => imageops::rotate270(image),
    }
}

/// Turn a raw front-camera sensor frame upright for the given device orientation
#[must_use]
pub fn orient_frame(raw: &RgbImage, orientation: Orientation) -> RgbImage {
    apply_exif(raw, orientation.exif())
}

/// Crop `rect` out of `image`, repeating edge pixels where it overhangs.
///
/// The rect is snapped to whole pixels. Returns `None` when the rect is
/// degenerate, the image is empty, or either side exceeds `MAX_CROP_SCALE`
/// times the image's longer side.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Indices are clamped into the image first
#[allow(clippy::cast_sign_loss)]
pub fn crop_clamped(image: &RgbImage, rect: &Rect) -> Option<RgbImage> {
    if rect.is_degenerate() || image.width() == 0 || image.height() == 0 {
        return None;
    }

    let limit = f64::from(image.width().max(image.height())) * MAX_CROP_SCALE;
    if rect.width > limit || rect.height > limit {
        return None;
    }

    let width = f64_to_u32_clamp(rect.width.round(), 0, u32::MAX);
    let height = f64_to_u32_clamp(rect.height.round(), 0, u32::MAX);
    if width == 0 || height == 0 {
        return None;
    }

    let origin_x = f64_to_i64_clamp(rect.x.round(), i64::from(i32::MIN), i64::from(i32::MAX));
    let origin_y = f64_to_i64_clamp(rect.y.round(), i64::from(i32::MIN), i64::from(i32::MAX));
    let max_x = i64::from(image.width()) - 1;
    let max_y = i64::from(image.height()) - 1;

    Some(RgbImage::from_fn(width, height, |col, row| {
        let src_x = (origin_x + i64::from(col)).clamp(0, max_x) as u32;
        let src_y = (origin_y + i64::from(row)).clamp(0, max_y) as u32;
        *image.get_pixel(src_x, src_y)
    }))
}

/// Resize to `width` pixels wide, keeping the aspect ratio
#[must_use]
pub fn resize_to_width(image: &RgbImage, width: f64) -> RgbImage {
    let target_width = f64_to_u32_clamp(width.round(), 1, u32::MAX);
    let ratio = f64::from(image.height()) / f64::from(image.width().max(1));
    let target_height = f64_to_u32_clamp((f64::from(target_width) * ratio).round(), 1, u32::MAX);
    imageops::resize(image, target_width, target_height, FilterType::Triangle)
}

/// Resize to a `side` × `side` square (network input)
#[must_use]
pub fn resize_square(image: &RgbImage, side: u32) -> RgbImage {
    if image.width() == side && image.height() == side {
        return image.clone();
    }
    imageops::resize(image, side, side, FilterType::Triangle)
}

/// Convert an RGB image to a normalized NCHW tensor of shape (1, 3, H, W)
#[must_use]
pub fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[0, channel, y as usize, x as usize]] =
                (f32::from(pixel[channel]) - IMAGE_NORMALIZATION_OFFSET) / IMAGE_NORMALIZATION_SCALE;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_orient_frame_sizes() {
        let raw = gradient(8, 6);
        assert_eq!(orient_frame(&raw, Orientation::Portrait).dimensions(), (6, 8));
        assert_eq!(orient_frame(&raw, Orientation::PortraitUpsideDown).dimensions(), (6, 8));
        assert_eq!(orient_frame(&raw, Orientation::LandscapeLeft).dimensions(), (8, 6));
        assert_eq!(orient_frame(&raw, Orientation::LandscapeRight), raw);
    }

    #[test]
    fn test_orient_frame_portrait_rotates_clockwise() {
        let raw = gradient(8, 6);
        let upright = orient_frame(&raw, Orientation::Portrait);
        // The sensor's bottom-left pixel becomes the top-left one
        assert_eq!(upright.get_pixel(0, 0), raw.get_pixel(0, 5));
    }

    #[test]
    fn test_exif_transpose() {
        let raw = gradient(8, 6);
        let transposed = apply_exif(&raw, ExifOrientation::LeftTop);
        assert_eq!(transposed.dimensions(), (6, 8));
        assert_eq!(transposed.get_pixel(2, 5), raw.get_pixel(5, 2));
    }

    #[test]
    fn test_crop_inside() {
        let image = gradient(20, 20);
        let crop = crop_clamped(&image, &Rect::new(5.0, 6.0, 4.0, 3.0)).unwrap();
        assert_eq!(crop.dimensions(), (4, 3));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([5, 6, 0]));
        assert_eq!(crop.get_pixel(3, 2), &Rgb([8, 8, 0]));
    }

    #[test]
    fn test_crop_overhang_repeats_edges() {
        let image = gradient(10, 10);
        let crop = crop_clamped(&image, &Rect::new(-2.0, 8.0, 4.0, 4.0)).unwrap();
        assert_eq!(crop.dimensions(), (4, 4));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([0, 8, 0]));
        assert_eq!(crop.get_pixel(3, 3), &Rgb([1, 9, 0]));
    }

    #[test]
    fn test_crop_degenerate() {
        let image = gradient(10, 10);
        assert!(crop_clamped(&image, &Rect::new(1.0, 1.0, 0.0, 4.0)).is_none());
        assert!(crop_clamped(&image, &Rect::new(1.0, 1.0, 0.2, 4.0)).is_none());
        assert!(crop_clamped(&RgbImage::new(0, 0), &Rect::new(0.0, 0.0, 4.0, 4.0)).is_none());
    }

    #[test]
    fn test_crop_larger_than_limit() {
        let image = gradient(10, 6);
        assert!(crop_clamped(&image, &Rect::new(0.0, 0.0, 4.8e6, 6.4e6)).is_none());
        assert!(crop_clamped(&image, &Rect::new(0.0, 0.0, 81.0, 4.0)).is_none());
        assert_eq!(crop_clamped(&image, &Rect::new(-35.0, 0.0, 80.0, 4.0)).unwrap().dimensions(), (80, 4));
    }

    #[test]
    fn test_resize_to_width_keeps_aspect() {
        let image = gradient(200, 240);
        assert_eq!(resize_to_width(&image, 100.0).dimensions(), (100, 120));
    }

    #[test]
    fn test_image_to_tensor() {
        let image = RgbImage::from_pixel(3, 2, Rgb([255, 0, 128]));
        let tensor = image_to_tensor(&image);
        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert!((tensor[[0, 0, 1, 2]] - 0.996_093_75).abs() < 1e-6);
        assert!((tensor[[0, 1, 0, 0]] + 0.996_093_75).abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] - 0.003_906_25).abs() < 1e-6);
    }
}
