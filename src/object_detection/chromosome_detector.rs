use crate::annotations::detection::Detection;
use ndarray::{ArrayBase, Dim, ViewRepr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("inference failed")]
    Inference(#[from] ort::Error),
    #[error("unexpected model output shape for {output}: {shape:?}")]
    UnexpectedOutputShape { output: &'static str, shape: Vec<usize> },
}

/// Defines a trait that all chromosome segmentation models must follow.
///
/// run_inference does not take an array directly, but rather a view into an
/// array with dimensions (1, 3, image_height, image_width). Callers that own
/// the image tensor can pass views without making copies:
///
/// image.slice(s![.., .., .., ..])
///
/// Detections below the given confidence threshold are dropped here, at the
/// model boundary; downstream deduplication applies no confidence filtering
/// of its own.
pub trait ChromosomeDetector {
    fn run_inference(
        &mut self,
        input_array: ArrayBase<ViewRepr<&f32>, Dim<[usize; 4]>>,
        confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError>;
}
