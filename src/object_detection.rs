pub mod chromosome_detector;
pub mod mask_dedup;
pub mod ort_inference_session;
pub mod yolov11_segmentation;
