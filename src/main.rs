mod annotations;
mod image_utils;
mod karyogram;
mod object_detection;

use annotations::chromosome_class::ChromosomeClass;
use image::imageops::{self, FilterType};
use image_utils::image_conversion::convert_rgb_image_to_owned_array;
use image_utils::image_io::read_image_as_rgb8;
use karyogram::layout::{LayoutConfig, draw_karyogram};
use karyogram::pool::DirectoryPool;
use karyogram::summary::{build_legend_str, class_counts, summarize};
use object_detection::chromosome_detector::ChromosomeDetector;
use object_detection::mask_dedup::{DEFAULT_IOU_THRESHOLD, deduplicate_by_mask_iou};
use object_detection::yolov11_segmentation::Yolov11Segmentation;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MODEL_INPUT_SIZE: u32 = 640;
const DETECTION_CONFIDENCE: f32 = 0.2;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        return Err(format!(
            "Usage: {} <image> <chromosome_pool_dir> <output.png> [model.onnx] [font.ttf]",
            args.first().map(String::as_str).unwrap_or("karyogram-builder")
        )
        .into());
    }
    let image_path = Path::new(&args[1]);
    let pool_dir = Path::new(&args[2]);
    let output_path = Path::new(&args[3]);
    let model_path = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data/models/chromosome-yolo11-seg.onnx"));

    if !image_path.exists() {
        return Err(format!("Image path does not exist, or cannot be read: {:?}", image_path).into());
    }
    if !model_path.exists() {
        return Err(format!("Model path does not exist, or cannot be read: {:?}", model_path).into());
    }

    let mut model = Yolov11Segmentation::new(
        &model_path,
        MODEL_INPUT_SIZE as usize,
        MODEL_INPUT_SIZE as usize,
        "chromosome yolo11 seg onnx".to_string(),
    )?;
    let pool = DirectoryPool::new(pool_dir)?;

    let img = read_image_as_rgb8(image_path)?;
    let resized = imageops::resize(&img, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle);
    let tensor = convert_rgb_image_to_owned_array(&resized);

    let detections = model.run_inference(tensor.view(), DETECTION_CONFIDENCE)?;
    info!(count = detections.len(), "raw detections");
    let detections = deduplicate_by_mask_iou(detections, DEFAULT_IOU_THRESHOLD)?;
    info!(count = detections.len(), "detections after mask dedup");

    let classes: Vec<ChromosomeClass> = detections.iter().map(|d| d.class).collect();
    let config = match args.get(5) {
        Some(font_path) => LayoutConfig::with_font_path(Path::new(font_path))?,
        None => LayoutConfig::with_system_font(),
    };
    let canvas = draw_karyogram(&classes, &pool, &config);
    if canvas.width() > 0 {
        canvas.save(output_path)?;
        info!("karyogram saved to {}", output_path.display());
    } else {
        warn!("no chromosomes placed, skipping karyogram image output");
    }

    let summary = summarize(&classes);
    let summary_path = output_path.with_extension("json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    info!("summary saved to {}", summary_path.display());
    info!("{}", build_legend_str(&class_counts(&classes)));
    Ok(())
}
