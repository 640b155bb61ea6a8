use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::chromosome_class::ChromosomeClass;
use crate::annotations::detection::Detection;
use crate::object_detection::chromosome_detector::{ChromosomeDetector, DetectionError};
use crate::object_detection::ort_inference_session::OrtInferenceSession;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView3, Axis, Dim, Ix3, Ix4, ViewRepr, s};
use ort::value::TensorRef;
use std::path::Path;
use tracing::warn;

/// A YOLOv11 instance-segmentation model for metaphase chromosomes.
///
/// The network emits two tensors: a detection head of shape
/// (1, 4 + num_classes + mask_dims, anchors) holding box coordinates, class
/// scores, and mask coefficients per anchor, and a prototype tensor of shape
/// (1, mask_dims, proto_h, proto_w). A detection's pixel mask is the sigmoid
/// of its coefficients dotted against the prototypes, thresholded at 0.5 and
/// restricted to its bounding box.
pub struct Yolov11Segmentation {
    ort_session: OrtInferenceSession,
    input_width: usize,
    input_height: usize,
    model_name: String,
}

impl Yolov11Segmentation {
    pub fn new(
        model_path: &Path,
        input_width: usize,
        input_height: usize,
        model_name: String,
    ) -> ort::Result<Self> {
        let ort_session = OrtInferenceSession::new(model_path)?;
        Ok(Yolov11Segmentation {
            ort_session,
            input_width,
            input_height,
            model_name,
        })
    }
}

impl ChromosomeDetector for Yolov11Segmentation {
    fn run_inference(
        &mut self,
        input_array: ArrayBase<ViewRepr<&f32>, Dim<[usize; 4]>>,
        confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        let input = input_array.to_owned();
        let outputs = self.ort_session.session.run(
            ort::inputs!["images" => TensorRef::from_array_view(&input)?],
        )?;

        let head = outputs["output0"].try_extract_array::<f32>()?;
        let head_shape = head.shape().to_vec();
        let head = head
            .into_dimensionality::<Ix3>()
            .map_err(|_| DetectionError::UnexpectedOutputShape {
                output: "output0",
                shape: head_shape,
            })?;
        let head = head.index_axis(Axis(0), 0);

        let protos = outputs["output1"].try_extract_array::<f32>()?;
        let protos_shape = protos.shape().to_vec();
        let protos = protos
            .into_dimensionality::<Ix4>()
            .map_err(|_| DetectionError::UnexpectedOutputShape {
                output: "output1",
                shape: protos_shape,
            })?;
        let protos = protos.index_axis(Axis(0), 0);

        let channels = head.shape()[0];
        let mask_dims = protos.shape()[0];
        if channels <= 4 + mask_dims {
            return Err(DetectionError::UnexpectedOutputShape {
                output: "output0",
                shape: head.shape().to_vec(),
            });
        }
        let num_classes = channels - 4 - mask_dims;

        let mut detections: Vec<Detection> = Vec::new();
        for anchor in 0..head.shape()[1] {
            let scores = head.slice(s![4..4 + num_classes, anchor]);
            let (class_id, prob) = scores
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::MIN), |accum, row| {
                    if row.1 > accum.1 { row } else { accum }
                });
            if prob < confidence {
                continue;
            }
            let Some(class) = ChromosomeClass::from_index(class_id) else {
                warn!(model = %self.model_name, class_id, "class id outside the karyotype label set");
                continue;
            };

            let x = head[[0, anchor]];
            let y = head[[1, anchor]];
            let w = head[[2, anchor]];
            let h = head[[3, anchor]];
            let left = (x - w / 2.0).clamp(0.0, self.input_width as f32);
            let top = (y - h / 2.0).clamp(0.0, self.input_height as f32);
            let right = (x + w / 2.0).clamp(0.0, self.input_width as f32);
            let bottom = (y + h / 2.0).clamp(0.0, self.input_height as f32);
            let bounding_box = match BoundingBox::new(left, top, right, bottom) {
                Ok(bbox) => bbox,
                Err(message) => {
                    warn!(model = %self.model_name, anchor, "{message}");
                    continue;
                }
            };

            let coefficients = head.slice(s![4 + num_classes.., anchor]);
            let Some(logits) = decode_mask_logits(coefficients, protos) else {
                return Err(DetectionError::UnexpectedOutputShape {
                    output: "output1",
                    shape: protos.shape().to_vec(),
                });
            };
            let mask = rasterize_mask(
                &logits,
                self.input_width,
                self.input_height,
                &bounding_box,
            );

            detections.push(Detection {
                class,
                confidence: prob,
                bounding_box,
                mask,
            });
        }
        Ok(detections)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Combines one detection's mask coefficients with the prototype tensor into
/// a logit map at prototype resolution.
fn decode_mask_logits(
    coefficients: ArrayView1<f32>,
    protos: ArrayView3<f32>,
) -> Option<Array2<f32>> {
    let (mask_dims, proto_h, proto_w) = protos.dim();
    if coefficients.len() != mask_dims {
        return None;
    }
    let flat = protos.to_shape((mask_dims, proto_h * proto_w)).ok()?;
    let logits: Array1<f32> = coefficients.dot(&flat.view());
    logits.into_shape_with_order((proto_h, proto_w)).ok()
}

/// Upsamples a prototype-resolution logit map to the model input grid by
/// nearest-neighbor sampling, keeping only pixels inside the bounding box
/// whose sigmoid activation clears 0.5.
fn rasterize_mask(
    logits: &Array2<f32>,
    grid_width: usize,
    grid_height: usize,
    bounding_box: &BoundingBox,
) -> Array2<bool> {
    let (proto_h, proto_w) = logits.dim();
    Array2::from_shape_fn((grid_height, grid_width), |(y, x)| {
        let fx = x as f32;
        let fy = y as f32;
        if fx < bounding_box.left()
            || fx >= bounding_box.right()
            || fy < bounding_box.top()
            || fy >= bounding_box.bottom()
        {
            return false;
        }
        let py = (y * proto_h / grid_height).min(proto_h - 1);
        let px = (x * proto_w / grid_width).min(proto_w - 1);
        sigmoid(logits[[py, px]]) > 0.5
    })
}
