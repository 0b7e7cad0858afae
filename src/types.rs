//! Core types used throughout the screen analyzer.
//!
//! This module defines the fundamental data structures for window
//! descriptions, text detections, UI elements, and assembled analysis
//! results, plus the error taxonomy for window resolution failures.

use serde::{Deserialize, Serialize};

/// Opaque OS-assigned window identifier.
///
/// Validity is owned by the OS, not by this crate: a handle may go stale
/// between any two calls, and every operation that takes one must tolerate a
/// "window no longer exists" failure.
pub type WindowHandle = u64;

/// Identifier for a monitor, as understood by the pixel source.
pub type MonitorId = u32;

/// Screen-space rectangle (left/top/right/bottom).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Get the center point of the rectangle.
    pub fn center(&self) -> (i32, i32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    /// Check if a point is inside this rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Image-space rectangle (x1/y1/x2/y2).
///
/// A `Region` is always expressed in the coordinate space of the image it
/// was produced from. Translating a region from a cropped sub-image into its
/// parent image is done with [`Region::translated`], exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Return this region shifted by an offset.
    ///
    /// This is the single coordinate-remapping rule in the system: a box
    /// detected inside a crop becomes a box in the parent image by adding
    /// the crop origin to both corners.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

/// Which recognition engine produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerKind {
    /// The primary OCR engine.
    Primary,
    /// The fallback OCR engine.
    Fallback,
}

impl RecognizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognizerKind::Primary => "ocr_primary",
            RecognizerKind::Fallback => "ocr_fallback",
        }
    }
}

/// One OCR hit: text, bounding box, confidence, and source engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Recognized text.
    pub text: String,
    /// Bounding box in the coordinate space of the analyzed image.
    pub bounds: Region,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
    /// Engine that produced this detection.
    pub engine: RecognizerKind,
}

/// Classification assigned to a visual region by the CV fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Button,
    Icon,
    MenuBar,
    Container,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Button => "button",
            RegionKind::Icon => "icon",
            RegionKind::MenuBar => "menu_bar",
            RegionKind::Container => "container",
        }
    }
}

/// A UI region found by edge detection and contour analysis.
///
/// This is a coarse shape heuristic, not an object detector: the `kind` says
/// "this rectangle is shaped like a button", nothing more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualRegion {
    pub kind: RegionKind,
    pub bounds: Region,
    pub area: u32,
    pub aspect_ratio: f32,
}

/// One node from a window's accessibility tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    /// Accessible name (may be empty when only the control type is known).
    pub name: String,
    /// Control type reported by the accessibility engine.
    pub control_type: String,
    /// Screen-space rectangle; zeroed when the node's rectangle was unreadable.
    pub bounds: Bounds,
    /// Traversal depth, 0 = window root.
    pub depth: u32,
    pub enabled: bool,
    pub visible: bool,
}

/// Full description of one window, assembled fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub handle: WindowHandle,
    pub title: String,
    pub bounds: Bounds,
    pub window_class: String,
    pub process_id: u32,
    /// Process executable name, or "Unknown" when metadata was unreadable.
    pub process_name: String,
    /// Full executable path, or "Unknown" when metadata was unreadable.
    pub executable_path: String,
    pub visible: bool,
    pub enabled: bool,
}

/// Outcome of the accessibility-tree tab search.
///
/// The orchestrator's fallback chain branches on this tag: only a non-empty
/// `Tabs` list is final, everything else escalates to OCR when a screenshot
/// is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabSearch {
    /// Tab titles found in the accessibility tree, in traversal order.
    Tabs(Vec<String>),
    /// The tree could not be searched but a screenshot exists to fall back on.
    NoTreeAvailable,
    /// The tree was searched and contained no tab items.
    Empty,
}

/// Dimensions of a captured image, kept in results instead of raw pixels so
/// that results stay serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotInfo {
    pub width: u32,
    pub height: u32,
}

/// Assembled result of one analysis query.
///
/// A value object: built once per call and never mutated afterwards. Each
/// feature field is independently optional: a failing feature leaves its
/// field absent without affecting the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analyzed window (absent for full-screen analyses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowDescriptor>,

    /// The analyzed monitor (absent for window analyses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<MonitorId>,

    /// Unix timestamp of the query.
    pub timestamp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<ScreenshotInfo>,

    /// Present when a capture was requested but the pixel source returned
    /// no data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_detections: Option<Vec<Detection>>,

    /// All detected text joined into one string, detection order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_elements: Option<Vec<UiElement>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_regions: Option<Vec<VisualRegion>>,

    /// Browser tab titles recovered by the fallback chain; absent when the
    /// chain found nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_tabs: Option<Vec<String>>,
}

impl AnalysisResult {
    /// Empty result for a window analysis.
    pub fn for_window(window: WindowDescriptor) -> Self {
        Self {
            window: Some(window),
            monitor: None,
            ..Self::blank()
        }
    }

    /// Empty result for a full-screen analysis.
    pub fn for_monitor(monitor: MonitorId) -> Self {
        Self {
            window: None,
            monitor: Some(monitor),
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            window: None,
            monitor: None,
            timestamp: chrono::Utc::now().timestamp(),
            screenshot: None,
            screenshot_error: None,
            text_detections: None,
            extracted_text: None,
            ui_elements: None,
            visual_regions: None,
            browser_tabs: None,
        }
    }
}

/// Compact window view for language-model consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub window_name: String,
    pub application: String,
    pub visible_text: String,
    pub browser_tabs: Vec<String>,
    /// Mirrors the window's enabled flag (the closest OS-portable signal the
    /// descriptor carries).
    pub is_active: bool,
    pub position: Bounds,
}

/// Minimal per-window entry for desktop overviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBrief {
    pub name: String,
    pub application: String,
    pub handle: WindowHandle,
}

/// Snapshot of the whole desktop: every cataloged window plus the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopState {
    pub timestamp: i64,
    pub windows: Vec<WindowDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_window: Option<WindowDescriptor>,
    pub window_count: usize,
}

/// A window whose visible text matched a content search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMatch {
    pub window: WindowDescriptor,
    pub matching_text: String,
}

/// Errors that fail a whole analysis call.
///
/// Only window *resolution* failures live here. Per-feature failures (text
/// detection, UI tree, tab extraction, capture) degrade to absent fields on
/// the result instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// No cataloged window title contained the identifier.
    #[error("window matching '{identifier}' not found")]
    WindowNotFound {
        identifier: String,
        /// Titles of every currently cataloged window, to help the caller
        /// pick a better identifier.
        available_windows: Vec<String>,
    },

    /// The handle stopped resolving between calls.
    #[error("window {0} no longer exists")]
    WindowGone(WindowHandle),

    /// The OS reported no foreground window with a title.
    #[error("no active window found")]
    NoActiveWindow,
}
