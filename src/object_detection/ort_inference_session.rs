use ort::session::Session;
use std::path::Path;

/// An onnxruntime inference session.
///
/// The chromosome segmentation model in this project is a wrapper around an
/// ONNX inference session that handles running the network on hardware.
pub struct OrtInferenceSession {
    pub session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        Ok(Self { session })
    }
}
