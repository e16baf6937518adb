use image::GrayImage;
use phorest_config::CameraTransform;

/// Applied uniformly after acquisition, regardless of which camera backend
/// produced the frame.
pub fn apply_transform(image: GrayImage, transform: CameraTransform) -> GrayImage {
    match transform {
        CameraTransform::None => image,
        CameraTransform::HorizontalFlip => image::imageops::flip_horizontal(&image),
        CameraTransform::VerticalFlip => image::imageops::flip_vertical(&image),
        CameraTransform::Rotate90Clockwise => image::imageops::rotate90(&image),
        CameraTransform::Rotate90Counterclockwise => image::imageops::rotate270(&image),
        CameraTransform::Rotate180 => image::imageops::rotate180(&image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn rotate_90_clockwise_swaps_dimensions() {
        let img = GrayImage::from_fn(10, 20, |_, _| Luma([0u8]));
        let rotated = apply_transform(img, CameraTransform::Rotate90Clockwise);
        assert_eq!(rotated.dimensions(), (20, 10));
    }

    #[test]
    fn none_is_a_no_op() {
        let img = GrayImage::from_fn(5, 5, |x, y| Luma([(x + y) as u8]));
        let out = apply_transform(img.clone(), CameraTransform::None);
        assert_eq!(img, out);
    }
}
