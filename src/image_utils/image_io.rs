use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use image::{self, ImageError, RgbImage};
use ndarray::{ArrayBase, Dim, OwnedRepr};
use std::path::Path;

pub fn read_image_as_rgb8(filepath: &Path) -> Result<RgbImage, ImageError> {
    Ok(image::open(filepath)?.into_rgb8())
}

/// Reads an image and converts it into the (1, 3, height, width) f32 tensor
/// layout the segmentation model takes as input.
pub fn read_image_as_array4(
    filepath: &Path,
) -> Result<ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>>, ImageError> {
    let img = read_image_as_rgb8(filepath)?;
    Ok(convert_rgb_image_to_owned_array(&img))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_image_as_rgb8(Path::new("./does_not_exist.png")).is_err());
        assert!(read_image_as_array4(Path::new("./does_not_exist.png")).is_err());
    }
}
