use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::chromosome_class::ChromosomeClass;
use ndarray::Array2;

/// One candidate chromosome instance produced by the segmentation model.
///
/// A detection combines a class, a confidence score encoding the model's
/// belief that the detection is true, a bounding box, and a binary
/// segmentation mask over the model input grid. Detections are never mutated
/// after construction; deduplication only removes whole entries.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class: ChromosomeClass,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub mask: Array2<bool>,
}
