//! Screen Analyzer - desktop state extraction core
//!
//! This crate answers "what is on screen" for an automation/assistant agent
//! without any cooperation from the inspected applications, using multiple
//! independent information sources:
//!
//! - **Window catalog**: Enumerate and look up on-screen windows
//! - **Content detector**: OCR the pixels, classify visual UI regions
//! - **Accessibility inspector**: Walk the OS control tree for a window
//!
//! # Architecture
//!
//! The [`ScreenAnalyzer`](analyzer::ScreenAnalyzer) orchestrator composes
//! the three components and a pixel source into per-query analyses. The
//! sources disagree and fail independently, so the orchestrator reconciles
//! them: cropped-region detections are remapped into full-image
//! coordinates, and browser tab titles are recovered through a fallback
//! chain (accessibility tree, then OCR over a primary tab-bar strip, then a
//! looser secondary strip).
//!
//! All OS integrations (pixel capture, text-recognition engines, the
//! accessibility engine, and the window registry) are collaborator traits
//! implemented and injected by the hosting service. Every call is
//! synchronous and stateless with respect to prior calls: nothing is
//! cached, so serializing access to the one shared capture session is the
//! only coordination a multi-worker host needs.

pub mod analyzer;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod inspector;
pub mod types;

// Re-export commonly used types
pub use analyzer::{AnalyzeOptions, ScreenAnalyzer, ScreenOptions};
pub use capture::PixelSource;
pub use catalog::{ProcessInfo, RawWindow, WindowCatalog, WindowRegistry};
pub use config::{AnalyzerConfig, EngineSelection, OcrConfig, TabScanConfig, TabStrip, TreeConfig};
pub use detector::{ContentDetector, RawDetection, RecognizerError, TextRecognizer};
pub use inspector::{AccessibilityEngine, UiInspector, UiNode};
pub use types::{
    AnalysisError, AnalysisResult, Bounds, ContentMatch, DesktopState, Detection, MonitorId,
    RecognizerKind, Region, RegionKind, ScreenshotInfo, Summary, TabSearch, UiElement,
    VisualRegion, WindowBrief, WindowDescriptor, WindowHandle,
};
