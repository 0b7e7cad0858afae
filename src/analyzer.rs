//! Screen analysis orchestration.
//!
//! [`ScreenAnalyzer`] composes the window catalog, content detector,
//! accessibility inspector, and pixel source into per-query analyses. It
//! owns the browser-tab fallback chain and is the only place cropped
//! sub-regions are requested, so coordinate remapping happens exactly once
//! (inside the detector's region call).
//!
//! Every call computes a fresh result; no handles, images, or detections
//! are retained between calls.

use crate::capture::{grab_window, PixelSource};
use crate::catalog::WindowCatalog;
use crate::config::{TabScanConfig, TabStrip};
use crate::detector::ContentDetector;
use crate::inspector::UiInspector;
use crate::types::{
    AnalysisError, AnalysisResult, ContentMatch, DesktopState, Detection, MonitorId, Region,
    ScreenshotInfo, Summary, TabSearch, WindowBrief, WindowDescriptor,
};
use image::DynamicImage;
use tracing::{debug, info, trace, warn};

/// Feature switches for a window analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    /// Capture the window image.
    pub capture_screenshot: bool,
    /// Run text detection over the full window image.
    pub detect_text: bool,
    /// Walk the UI tree (slower).
    pub ui_tree: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            capture_screenshot: true,
            detect_text: true,
            ui_tree: false,
        }
    }
}

/// Feature switches for a full-screen analysis.
#[derive(Debug, Clone, Copy)]
pub struct ScreenOptions {
    /// Run text detection over the monitor image.
    pub detect_text: bool,
    /// Run the visual-region classifier over the monitor image.
    pub detect_ui: bool,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            detect_text: true,
            detect_ui: false,
        }
    }
}

/// Orchestrates capture, detection, and inspection into analysis results.
pub struct ScreenAnalyzer {
    catalog: WindowCatalog,
    detector: ContentDetector,
    inspector: UiInspector,
    pixels: Box<dyn PixelSource>,
    tabs: TabScanConfig,
}

impl ScreenAnalyzer {
    /// Create an analyzer from already-constructed collaborators.
    ///
    /// Engine lifecycle (init/teardown) is owned by the hosting service;
    /// the analyzer only borrows capabilities for the duration of calls.
    pub fn new(
        catalog: WindowCatalog,
        detector: ContentDetector,
        inspector: UiInspector,
        pixels: Box<dyn PixelSource>,
        tabs: TabScanConfig,
    ) -> Self {
        Self {
            catalog,
            detector,
            inspector,
            pixels,
            tabs,
        }
    }

    pub fn catalog(&self) -> &WindowCatalog {
        &self.catalog
    }

    /// Analyze the window whose title contains `identifier`.
    ///
    /// A resolution miss is the only hard failure and carries the titles of
    /// every cataloged window so the caller can disambiguate. Capture, text
    /// detection, UI tree, and tab extraction each degrade independently.
    pub fn analyze_window(
        &mut self,
        identifier: &str,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let window = self.resolve(identifier)?;
        Ok(self.analyze_descriptor(&window, options))
    }

    /// Analyze the current foreground window.
    ///
    /// Fails with [`AnalysisError::NoActiveWindow`] when the foreground
    /// window has no title to resolve by.
    pub fn analyze_active_window(
        &mut self,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let active = self
            .inspector
            .focused_window()
            .ok_or(AnalysisError::NoActiveWindow)?;

        if active.title.is_empty() {
            return Err(AnalysisError::NoActiveWindow);
        }

        self.analyze_window(&active.title, options)
    }

    /// Analyze an entire monitor (no window concept).
    ///
    /// A capture failure marks the result rather than failing the call.
    pub fn analyze_full_screen(
        &mut self,
        monitor: MonitorId,
        options: &ScreenOptions,
    ) -> AnalysisResult {
        let mut result = AnalysisResult::for_monitor(monitor);

        match self.pixels.capture_monitor(monitor) {
            Some(image) => {
                result.screenshot = Some(ScreenshotInfo {
                    width: image.width(),
                    height: image.height(),
                });

                if options.detect_text {
                    let detections = self.detector.detect_text(&image);
                    result.extracted_text = Some(joined_text(&detections));
                    result.text_detections = Some(detections);
                }

                if options.detect_ui {
                    result.visual_regions = Some(self.detector.detect_ui_elements(&image));
                }
            }
            None => {
                warn!("Failed to capture monitor {}", monitor);
                result.screenshot_error = Some("Failed to capture monitor".to_string());
            }
        }

        result
    }

    /// Find windows whose visible text contains `search_text`
    /// (case-insensitive).
    ///
    /// A capture or detection failure on one window skips that window; the
    /// scan always covers the rest of the catalog.
    pub fn find_windows_by_content(&mut self, search_text: &str) -> Vec<ContentMatch> {
        let needle = search_text.to_lowercase();
        let mut matches = Vec::new();

        for window in self.catalog.list_windows() {
            let Some(image) = grab_window(self.pixels.as_mut(), &window.bounds) else {
                debug!("Skipping '{}': capture failed", window.title);
                continue;
            };

            let extracted = self.detector.extract_visible_text(&image);
            if extracted.to_lowercase().contains(&needle) {
                trace!("Content match in '{}'", window.title);
                matches.push(ContentMatch {
                    window,
                    matching_text: extracted,
                });
            }
        }

        matches
    }

    /// Compact text-only view of a window, with the UI tree disabled to
    /// keep it cheap.
    pub fn summarize(&mut self, identifier: &str) -> Result<Summary, AnalysisError> {
        let window = self.resolve(identifier)?;
        let result = self.analyze_descriptor(
            &window,
            &AnalyzeOptions {
                capture_screenshot: true,
                detect_text: true,
                ui_tree: false,
            },
        );

        Ok(Summary {
            window_name: window.title,
            application: window.process_name,
            visible_text: result.extracted_text.unwrap_or_default(),
            browser_tabs: result.browser_tabs.unwrap_or_default(),
            is_active: window.enabled,
            position: window.bounds,
        })
    }

    /// Snapshot of every cataloged window plus the active one.
    pub fn desktop_state(&self) -> DesktopState {
        let windows = self.catalog.list_windows();
        DesktopState {
            timestamp: chrono::Utc::now().timestamp(),
            active_window: self.inspector.focused_window(),
            window_count: windows.len(),
            windows,
        }
    }

    /// Minimal name/application listing of every cataloged window.
    pub fn window_briefs(&self) -> Vec<WindowBrief> {
        self.catalog
            .list_windows()
            .into_iter()
            .map(|w| WindowBrief {
                name: w.title,
                application: w.process_name,
                handle: w.handle,
            })
            .collect()
    }

    fn resolve(&self, identifier: &str) -> Result<WindowDescriptor, AnalysisError> {
        self.catalog.find_window(identifier).ok_or_else(|| {
            let available_windows = self.catalog.available_titles();
            debug!(
                "No window matching '{}' among {} cataloged",
                identifier,
                available_windows.len()
            );
            AnalysisError::WindowNotFound {
                identifier: identifier.to_string(),
                available_windows,
            }
        })
    }

    fn analyze_descriptor(
        &mut self,
        window: &WindowDescriptor,
        options: &AnalyzeOptions,
    ) -> AnalysisResult {
        info!("Analyzing window '{}' ({})", window.title, window.handle);
        let mut result = AnalysisResult::for_window(window.clone());

        let mut screenshot: Option<DynamicImage> = None;
        if options.capture_screenshot {
            match grab_window(self.pixels.as_mut(), &window.bounds) {
                Some(image) => {
                    result.screenshot = Some(ScreenshotInfo {
                        width: image.width(),
                        height: image.height(),
                    });

                    if options.detect_text {
                        let detections = self.detector.detect_text(&image);
                        result.extracted_text = Some(joined_text(&detections));
                        result.text_detections = Some(detections);
                    }

                    screenshot = Some(image);
                }
                None => {
                    warn!("Failed to capture window '{}'", window.title);
                    result.screenshot_error = Some("Failed to capture window".to_string());
                }
            }
        }

        if options.ui_tree {
            result.ui_elements = Some(self.inspector.ui_tree(window.handle));
        }

        let tabs = self.extract_tabs(window, screenshot.as_ref());
        if !tabs.is_empty() {
            result.browser_tabs = Some(tabs);
        }

        result
    }

    /// The tab-extraction fallback chain.
    ///
    /// Stage A asks the accessibility tree; a non-empty answer is final.
    /// Stage B reads the estimated tab-bar strip with OCR; Stage C retries
    /// a looser strip with looser filtering, and only runs when Stage B
    /// produced nothing. An empty outcome is an empty tab list, not an
    /// error.
    fn extract_tabs(
        &mut self,
        window: &WindowDescriptor,
        screenshot: Option<&DynamicImage>,
    ) -> Vec<String> {
        match self
            .inspector
            .browser_tabs(window.handle, screenshot.is_some())
        {
            TabSearch::Tabs(tabs) => return tabs,
            TabSearch::Empty | TabSearch::NoTreeAvailable => {}
        }

        let Some(image) = screenshot else {
            return vec![];
        };
        let width = image.width() as i32;

        // Stage B: primary tab-bar strip, strict filtering.
        let mut detections = self.detect_in_strip(image, width, self.tabs.primary_strip);
        detections.sort_by_key(|d| d.bounds.x1);
        let mut tabs = filter_tab_candidates(&detections, &self.tabs);

        // Stage C: looser strip, length filter only. Last resort.
        if tabs.is_empty() {
            trace!("Primary tab strip yielded nothing, trying secondary strip");
            let mut detections = self.detect_in_strip(image, width, self.tabs.secondary_strip);
            detections.sort_by_key(|d| d.bounds.x1);

            for det in &detections {
                let text = det.text.trim();
                let len = text.chars().count();
                if len > 2 && len < 60 {
                    tabs.push(text.to_string());
                }
            }
        }

        tabs.truncate(self.tabs.max_tabs);
        tabs
    }

    fn detect_in_strip(
        &self,
        image: &DynamicImage,
        window_width: i32,
        strip: TabStrip,
    ) -> Vec<Detection> {
        let region = Region::new(
            strip.left,
            strip.top,
            window_width - strip.right_inset,
            strip.bottom,
        );
        self.detector.detect_text_in_region(image, region)
    }
}

fn joined_text(detections: &[Detection]) -> String {
    detections
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stage-B acceptance filter over x-sorted detections.
///
/// A candidate must read like a tab title (bounded length), sit clearly to
/// the right of the last accepted candidate (duplicate OCR hits of one tab
/// land within a few pixels), and not be browser chrome or a URL fragment.
/// Rejected candidates do not advance the spacing anchor.
fn filter_tab_candidates(detections: &[Detection], config: &TabScanConfig) -> Vec<String> {
    let mut tabs = Vec::new();
    let mut last_x = -100;

    for det in detections {
        let text = det.text.trim();
        let len = text.chars().count();
        let x = det.bounds.x1;

        if text.is_empty() || len <= 2 || len >= 60 {
            continue;
        }
        if x - last_x <= config.min_spacing_px {
            continue;
        }
        if config.stop_titles.iter().any(|s| s == text) {
            continue;
        }
        if text.starts_with("http") || text.starts_with("www") {
            continue;
        }

        tabs.push(text.to_string());
        last_x = x;
    }

    tabs.truncate(config.max_tabs);
    tabs
}
