//! Text and visual-region detection over captured images.
//!
//! Recognition engines are collaborators injected at construction time; the
//! detector owns dispatch between them, coordinate remapping for cropped
//! regions, and the shape-heuristic classifier used when no accessibility
//! tree is available.
//!
//! Failure policy: a recognition engine that errors is treated as "zero
//! detections". Text extraction degrades to empty output rather than
//! failing the caller.

use crate::config::{EngineSelection, OcrConfig};
use crate::types::{Detection, RecognizerKind, Region, RegionKind, VisualRegion};
use image::DynamicImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use tracing::{debug, trace, warn};

/// Contours with a bounding box smaller than this are discarded as noise.
const MIN_REGION_AREA: u32 = 100;

/// Canny hysteresis thresholds for the visual-region pass.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// One hit as reported by a recognition engine, before the detector stamps
/// the engine kind. The box is in the coordinate space of the image the
/// engine was given.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub text: String,
    pub bounds: Region,
    pub confidence: f32,
}

/// Error from a recognition engine. Never propagated past the detector.
#[derive(Debug, thiserror::Error)]
#[error("recognizer error: {0}")]
pub struct RecognizerError(pub String);

/// A text-recognition engine collaborator.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in an image. Engine internals (model, language) are
    /// the host's concern.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, RecognizerError>;
}

/// Runs text recognition and classifies visual UI regions.
pub struct ContentDetector {
    primary: Option<Box<dyn TextRecognizer>>,
    fallback: Option<Box<dyn TextRecognizer>>,
    selection: EngineSelection,
    confidence_threshold: f32,
}

impl ContentDetector {
    /// Create a detector with the engines the configuration selects.
    ///
    /// A `None` engine slot means that engine was never initialized; any
    /// dispatch to it degrades to zero detections.
    pub fn new(
        config: &OcrConfig,
        primary: Option<Box<dyn TextRecognizer>>,
        fallback: Option<Box<dyn TextRecognizer>>,
    ) -> Self {
        Self {
            primary,
            fallback,
            selection: config.engine,
            confidence_threshold: config.confidence_threshold,
        }
    }

    fn run_engine(
        engine: Option<&dyn TextRecognizer>,
        kind: RecognizerKind,
        image: &DynamicImage,
    ) -> Vec<Detection> {
        let Some(engine) = engine else {
            debug!("{} engine not initialized, skipping", kind.as_str());
            return vec![];
        };

        match engine.recognize(image) {
            Ok(raw) => raw
                .into_iter()
                .map(|d| Detection {
                    text: d.text,
                    bounds: d.bounds,
                    confidence: d.confidence,
                    engine: kind,
                })
                .collect(),
            Err(e) => {
                warn!("{} recognition failed: {}", kind.as_str(), e);
                vec![]
            }
        }
    }

    /// Detect all text in an image using the configured engine(s).
    ///
    /// With `Both` selected, the primary engine's non-empty result is
    /// authoritative and the fallback is consulted only when the primary
    /// yields nothing.
    pub fn detect_text(&self, image: &DynamicImage) -> Vec<Detection> {
        let detections = match self.selection {
            EngineSelection::Primary => {
                Self::run_engine(self.primary.as_deref(), RecognizerKind::Primary, image)
            }
            EngineSelection::Fallback => {
                Self::run_engine(self.fallback.as_deref(), RecognizerKind::Fallback, image)
            }
            EngineSelection::Both => {
                let primary =
                    Self::run_engine(self.primary.as_deref(), RecognizerKind::Primary, image);
                if !primary.is_empty() {
                    primary
                } else {
                    Self::run_engine(self.fallback.as_deref(), RecognizerKind::Fallback, image)
                }
            }
        };

        trace!(
            "Detected {} text regions in {}x{} image",
            detections.len(),
            image.width(),
            image.height()
        );
        detections
    }

    /// Detect text in a sub-region of an image.
    ///
    /// Crops the image to `region` (clamped to the image), runs detection,
    /// then translates every returned box by the crop origin so results are
    /// in the coordinate space of the *full* image. The translation is
    /// applied here and nowhere else.
    pub fn detect_text_in_region(&self, image: &DynamicImage, region: Region) -> Vec<Detection> {
        let x1 = region.x1.clamp(0, image.width() as i32);
        let y1 = region.y1.clamp(0, image.height() as i32);
        let x2 = region.x2.clamp(0, image.width() as i32);
        let y2 = region.y2.clamp(0, image.height() as i32);

        if x2 <= x1 || y2 <= y1 {
            debug!("Region {:?} is empty after clamping, skipping", region);
            return vec![];
        }

        let crop = image.crop_imm(x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32);

        self.detect_text(&crop)
            .into_iter()
            .map(|mut d| {
                d.bounds = d.bounds.translated(x1, y1);
                d
            })
            .collect()
    }

    /// Classify visual UI regions with edge detection and contour analysis.
    ///
    /// Works purely on pixels, independent of the accessibility engine. The
    /// classification is a coarse aspect-ratio heuristic and must not be
    /// treated as semantically reliable.
    pub fn detect_ui_elements(&self, image: &DynamicImage) -> Vec<VisualRegion> {
        let gray = image.to_luma8();
        let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
        let contours = find_contours::<i32>(&edges);

        let mut regions = Vec::new();
        for contour in &contours {
            // Outermost contours only; holes and nested borders describe the
            // same shape again.
            if contour.parent.is_some() {
                continue;
            }

            let Some(bounds) = contour_bounds(&contour.points) else {
                continue;
            };

            let width = bounds.width();
            let height = bounds.height();
            let area = (width * height) as u32;

            if area < MIN_REGION_AREA {
                continue;
            }

            let aspect_ratio = if height > 0 {
                width as f32 / height as f32
            } else {
                0.0
            };
            let kind = classify_region(aspect_ratio, height);

            regions.push(VisualRegion {
                kind,
                bounds,
                area,
                aspect_ratio,
            });
        }

        debug!(
            "Classified {} visual regions from {} contours",
            regions.len(),
            contours.len()
        );
        regions
    }

    /// Extract all confidently-detected text as a single string.
    ///
    /// Detections below the configured confidence threshold are dropped,
    /// the rest are sorted top-to-bottom (a reading-order approximation)
    /// and joined with single spaces.
    pub fn extract_visible_text(&self, image: &DynamicImage) -> String {
        let mut detections: Vec<_> = self
            .detect_text(image)
            .into_iter()
            .filter(|d| d.confidence >= self.confidence_threshold)
            .collect();

        detections.sort_by_key(|d| d.bounds.y1);

        detections
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Aspect-ratio shape classes: wide-and-short reads as a button, square as
/// an icon, very wide as a menu bar, anything else as a container.
fn classify_region(aspect_ratio: f32, height: i32) -> RegionKind {
    if aspect_ratio > 2.0 && aspect_ratio < 10.0 && height < 50 {
        RegionKind::Button
    } else if aspect_ratio > 0.8 && aspect_ratio < 1.2 {
        RegionKind::Icon
    } else if aspect_ratio > 10.0 {
        RegionKind::MenuBar
    } else {
        RegionKind::Container
    }
}

/// Axis-aligned bounding box of a contour's points.
fn contour_bounds(points: &[imageproc::point::Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let mut bounds = Region::new(first.x, first.y, first.x, first.y);

    for p in points {
        bounds.x1 = bounds.x1.min(p.x);
        bounds.y1 = bounds.y1.min(p.y);
        bounds.x2 = bounds.x2.max(p.x);
        bounds.y2 = bounds.y2.max(p.y);
    }

    // Contour points are pixel coordinates; the box spans one past the far
    // edge so width/height count pixels.
    bounds.x2 += 1;
    bounds.y2 += 1;
    Some(bounds)
}
