use crate::annotations::chromosome_class::{CLASS_NAMES, ChromosomeClass, NUM_CLASSES};
use crate::karyogram::pool::ChromosomePool;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{error, info, warn};

pub const CANVAS_HEIGHT: u32 = 300;
pub const CANVAS_MAX_WIDTH: u32 = 2000;

/// Horizontal gap between neighboring pairs.
const PAIR_GAP: i64 = 50;
/// Horizontal gap between the two copies of one pair.
const COPY_GAP: i64 = 10;
const ROW_ONE_BASELINE: i64 = 150;
const ROW_TWO_BASELINE: i64 = 260;
/// Baseline a placement wraps to when it would run past the canvas width.
const OVERFLOW_ROW_BASELINE: i64 = 250;
/// Class index whose first sighting moves layout to the second row ("13").
const ROW_SPLIT_INDEX: usize = 12;
/// First-channel values below this count as chromosome content rather than
/// background matting.
const BACKGROUND_THRESHOLD: u8 = 230;
const LABEL_OFFSET_Y: i64 = 30;
const LINE_OFFSET_Y: i64 = 5;
const LINE_THICKNESS: u32 = 2;

pub const DEFAULT_FONT_SCALE: f32 = 19.2;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Font settings for pair labels.
pub struct LayoutConfig {
    /// The font used for pair labels. If None, label text is skipped and only
    /// the separator lines are drawn.
    pub font: Option<FontVec>,
    pub font_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            font: None,
            font_scale: DEFAULT_FONT_SCALE,
        }
    }
}

impl LayoutConfig {
    pub fn with_font_path(font_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data)
            .map_err(|_| format!("Failed to parse font file: {}", font_path.display()))?;
        Ok(LayoutConfig {
            font: Some(font),
            font_scale: DEFAULT_FONT_SCALE,
        })
    }

    /// Attempts to load a font from common system locations, falling back to
    /// label-free rendering when none is available.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];
        for path in font_paths {
            if let Ok(font_data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(font_data) {
                    info!(path, "using system font for karyogram labels");
                    return LayoutConfig {
                        font: Some(font),
                        font_scale: DEFAULT_FONT_SCALE,
                    };
                }
            }
        }
        warn!("no system font found, karyogram labels will be skipped");
        LayoutConfig::default()
    }
}

/// Per-label bookkeeping while laying out one pair.
struct PairState {
    x_start: i64,
    y_start: i64,
    width_total: i64,
}

/// Assembles the karyogram canvas from a deduplicated set of chromosome
/// classes.
///
/// Classes are sorted by index and placed left to right as homologous pairs:
/// inter-pair gap 50px, intra-pair gap 10px, classes below "13" on the first
/// row, the rest on the second, wrapping to the overflow row when a pair
/// would start past the canvas width. Each completed pair gets a centered
/// label and a separator line; labels that end the pass with a single
/// placement (expected for "y") are annotated afterwards at their own row.
/// The canvas is cropped to the rightmost used extent, capped at 2000px.
///
/// A reference image that cannot be fetched is logged and skipped, but the
/// count for its label has already advanced by then. That slot consumption
/// shifts the parity of the label's next placement and is kept as observed
/// behavior.
pub fn draw_karyogram(
    classes: &[ChromosomeClass],
    pool: &impl ChromosomePool,
    config: &LayoutConfig,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CANVAS_MAX_WIDTH, CANVAS_HEIGHT, WHITE);
    let mut sorted: Vec<ChromosomeClass> = classes.to_vec();
    sorted.sort();
    info!(count = sorted.len(), "laying out chromosomes");

    let mut counts = [0u32; NUM_CLASSES];
    let mut pair_info: [Option<PairState>; NUM_CLASSES] = std::array::from_fn(|_| None);
    let mut startx: i64 = 0;
    let mut starty: i64 = ROW_ONE_BASELINE;
    let mut max_x: i64 = 0;

    for class in sorted {
        let ix = class.index();
        if ix == ROW_SPLIT_INDEX && starty == ROW_ONE_BASELINE {
            starty = ROW_TWO_BASELINE;
            startx = 0;
        }
        counts[ix] += 1;

        let chrom = match pool.fetch(class, counts[ix] % 2) {
            Ok(img) => img,
            Err(err) => {
                error!(class = %class, "skipping chromosome placement: {err}");
                continue;
            }
        };
        let Some(chrom) = crop_to_content(&chrom) else {
            error!(class = %class, "skipping chromosome placement: reference image is all background");
            continue;
        };
        let w = chrom.width() as i64;
        let h = chrom.height() as i64;

        if counts[ix] == 1 {
            startx += PAIR_GAP;
            if startx >= CANVAS_MAX_WIDTH as i64 {
                startx = PAIR_GAP;
                starty = OVERFLOW_ROW_BASELINE;
            }
            pair_info[ix] = Some(PairState {
                x_start: startx,
                y_start: starty,
                width_total: 0,
            });
        } else {
            startx += COPY_GAP;
        }

        imageops::replace(&mut canvas, &chrom, startx, starty - h);

        // A second copy whose first copy lost its reference image arrives
        // with no recorded pair state; anchor the pair where it lands.
        let state = pair_info[ix].get_or_insert_with(|| PairState {
            x_start: startx,
            y_start: starty,
            width_total: 0,
        });
        state.width_total += w + if counts[ix] == 2 { COPY_GAP } else { 0 };

        if counts[ix] == 2 {
            // The separator follows the current row even if a wrap moved the
            // second copy; the label keeps the pair's stored anchor.
            draw_pair_annotation(
                &mut canvas,
                config,
                class.label(),
                state.x_start,
                state.width_total,
                state.y_start + LABEL_OFFSET_Y,
                starty + LINE_OFFSET_Y,
            );
        }

        startx += w;
        max_x = max_x.max(startx + w + PAIR_GAP);
    }

    for (ix, state) in pair_info.iter().enumerate() {
        if counts[ix] == 1 {
            if let Some(state) = state {
                draw_pair_annotation(
                    &mut canvas,
                    config,
                    CLASS_NAMES[ix],
                    state.x_start,
                    state.width_total,
                    state.y_start + LABEL_OFFSET_Y,
                    state.y_start + LINE_OFFSET_Y,
                );
            }
        }
    }

    let final_width = max_x.clamp(0, CANVAS_MAX_WIDTH as i64) as u32;
    imageops::crop_imm(&canvas, 0, 0, final_width, CANVAS_HEIGHT).to_image()
}

/// Crops a reference image to the bounding box of its non-background pixels,
/// judged by the first color channel. The box is exclusive of the last
/// content row and column. Returns None when no pixel clears the threshold.
fn crop_to_content(image: &RgbImage) -> Option<RgbImage> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] < BACKGROUND_THRESHOLD {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x == u32::MAX || max_x == min_x || max_y == min_y {
        return None;
    }
    Some(imageops::crop_imm(image, min_x, min_y, max_x - min_x, max_y - min_y).to_image())
}

/// Centers the pair label over its span and underlines the span.
fn draw_pair_annotation(
    canvas: &mut RgbImage,
    config: &LayoutConfig,
    label: &str,
    x_start: i64,
    width_total: i64,
    text_y: i64,
    line_y: i64,
) {
    if let Some(font) = &config.font {
        let scale = PxScale::from(config.font_scale);
        let text_w = measure_text_width(label, font, scale).round() as i64;
        let text_x = x_start + (width_total - text_w) / 2;
        draw_text_mut(
            canvas,
            BLACK,
            text_x as i32,
            text_y as i32,
            scale,
            font,
            label,
        );
    }
    if width_total > 0 {
        let line = Rect::at(x_start as i32, line_y as i32)
            .of_size(width_total as u32, LINE_THICKNESS);
        draw_filled_rect_mut(canvas, line, BLACK);
    }
}

/// Sums per-glyph advance widths for the label at the given scale.
fn measure_text_width(text: &str, font: &FontVec, scale: PxScale) -> f32 {
    let scaled_font = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.scaled_glyph(ch).id))
        .sum()
}
