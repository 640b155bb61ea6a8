use serde::{Deserialize, Serialize};

/// An axis-aligned box locating one detected chromosome in the input image.
///
/// This project uses the standard convention of the left side of the image
/// being x=0 and the top of the image being y=0. The box is carried alongside
/// the segmentation mask for completeness; deduplication works on masks, not
/// boxes.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl BoundingBox {
    /// Checks that a box has valid parameters before constructing.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, String> {
        if left > right {
            Err(format!(
                "Failed to create BoundingBox, value for left > value for right ({} > {}).",
                left, right
            ))
        } else if top > bottom {
            Err(format!(
                "Failed to create BoundingBox, value for top > value for bottom ({} > {}).",
                top, bottom
            ))
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
            })
        }
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}
