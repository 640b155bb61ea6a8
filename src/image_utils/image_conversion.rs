use image::RgbImage;
use ndarray::{Array, ArrayBase, Dim, OwnedRepr};

/// Converts an rgb8 image into a normalized (1, 3, height, width) f32 tensor,
/// the layout the segmentation model expects.
pub fn convert_rgb_image_to_owned_array(
    rgb_image: &RgbImage,
) -> ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>> {
    let mut image_array = Array::zeros((
        1,
        3,
        rgb_image.height() as usize,
        rgb_image.width() as usize,
    ));
    for pixel in rgb_image.enumerate_pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b] = pixel.2.0;
        image_array[[0, 0, y, x]] = (r as f32) / 255.;
        image_array[[0, 1, y, x]] = (g as f32) / 255.;
        image_array[[0, 2, y, x]] = (b as f32) / 255.;
    }
    image_array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn convert_rgb_image_to_owned_array_test() {
        let mut img = RgbImage::new(2, 3);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        img.put_pixel(1, 2, Rgb([255, 255, 255]));

        let arr = convert_rgb_image_to_owned_array(&img);
        // Dimensions encode (image, channel, row, column).
        assert_eq!(arr.shape(), &[1, 3, 3, 2]);
        assert_eq!(
            (arr[[0, 0, 0, 0]], arr[[0, 1, 0, 0]], arr[[0, 2, 0, 0]]),
            (1.0, 0.0, 0.0)
        );
        assert_eq!(
            (arr[[0, 0, 0, 1]], arr[[0, 1, 0, 1]], arr[[0, 2, 0, 1]]),
            (0.0, 1.0, 0.0)
        );
        assert_eq!(
            (arr[[0, 0, 1, 0]], arr[[0, 1, 1, 0]], arr[[0, 2, 1, 0]]),
            (0.0, 0.0, 1.0)
        );
        assert_eq!(
            (arr[[0, 0, 2, 1]], arr[[0, 1, 2, 1]], arr[[0, 2, 2, 1]]),
            (1.0, 1.0, 1.0)
        );
        assert_eq!(
            (arr[[0, 0, 2, 0]], arr[[0, 1, 2, 0]], arr[[0, 2, 2, 0]]),
            (0.0, 0.0, 0.0)
        );
    }
}
