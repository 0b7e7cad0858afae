//! Accessibility-tree inspection.
//!
//! The accessibility engine is a collaborator supplied by the hosting
//! service; it exposes a navigable tree of UI nodes per window.
//! [`UiInspector`] owns the traversal rules: bounded depth, a hard
//! node-visit cap (trees come from third-party apps and are untrusted
//! input), and per-node failure swallowing: an unreadable node or child
//! list omits that subtree, never the whole walk.

use crate::catalog::{describe_raw, WindowRegistry};
use crate::config::TreeConfig;
use crate::types::{AnalysisError, TabSearch, UiElement, WindowDescriptor, WindowHandle};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Tab-item names starting with these are structural chrome, not tabs.
const STRUCTURAL_LABEL_PREFIXES: &[&str] = &["Active View", "Tab content"];

/// One node of a window's accessibility tree.
///
/// Accessor failures are part of the contract: `bounds` and `children`
/// return `None` when the underlying API refuses, and the inspector treats
/// that as "omit and continue".
pub trait UiNode {
    fn name(&self) -> String;
    fn control_type(&self) -> String;
    fn bounds(&self) -> Option<crate::types::Bounds>;
    fn enabled(&self) -> bool;
    fn visible(&self) -> bool;
    fn children(&self) -> Option<Vec<Box<dyn UiNode>>>;
}

/// Accessibility/automation engine collaborator.
pub trait AccessibilityEngine: Send + Sync {
    /// Root automation element of a window, or `None` when the window has
    /// no reachable tree.
    fn window_root(&self, handle: WindowHandle) -> Option<Box<dyn UiNode>>;
}

/// Walks accessibility trees and describes windows with process metadata.
pub struct UiInspector {
    /// `None` when the engine was never initialized; every tree feature
    /// then degrades to "no data".
    engine: Option<Box<dyn AccessibilityEngine>>,
    registry: Arc<dyn WindowRegistry>,
    limits: TreeConfig,
}

impl UiInspector {
    pub fn new(
        engine: Option<Box<dyn AccessibilityEngine>>,
        registry: Arc<dyn WindowRegistry>,
        limits: TreeConfig,
    ) -> Self {
        if engine.is_none() {
            debug!("No accessibility engine configured - tree inspection disabled");
        }
        Self {
            engine,
            registry,
            limits,
        }
    }

    /// Full descriptor for a window, sourced from the registry.
    ///
    /// Returns an explicit error on a stale handle so callers can tell
    /// "window gone" apart from "window has no text".
    pub fn window_info(&self, handle: WindowHandle) -> Result<WindowDescriptor, AnalysisError> {
        let raw = self
            .registry
            .resolve(handle)
            .ok_or(AnalysisError::WindowGone(handle))?;
        Ok(describe_raw(self.registry.as_ref(), raw))
    }

    /// Descriptor of the current foreground window, if there is one.
    pub fn focused_window(&self) -> Option<WindowDescriptor> {
        let handle = self.registry.foreground()?;
        self.window_info(handle).ok()
    }

    /// Depth-first flattening of a window's accessibility tree.
    ///
    /// A node is emitted only when it carries a non-empty name or a known
    /// control type, but traversal always continues into its children.
    pub fn ui_tree(&self, handle: WindowHandle) -> Vec<UiElement> {
        let Some(engine) = &self.engine else {
            return vec![];
        };
        let Some(root) = engine.window_root(handle) else {
            debug!("No accessibility root for window {}", handle);
            return vec![];
        };

        let mut elements = Vec::new();
        let mut visited = 0u32;
        self.collect_elements(root.as_ref(), 0, &mut elements, &mut visited);

        trace!(
            "Walked {} nodes, emitted {} elements for window {}",
            visited,
            elements.len(),
            handle
        );
        elements
    }

    fn collect_elements(
        &self,
        node: &dyn UiNode,
        depth: u32,
        out: &mut Vec<UiElement>,
        visited: &mut u32,
    ) {
        if depth > self.limits.max_depth {
            return;
        }
        if *visited >= self.limits.max_nodes {
            return;
        }
        *visited += 1;
        if *visited == self.limits.max_nodes {
            warn!(
                "Accessibility walk hit the {}-node cap, truncating",
                self.limits.max_nodes
            );
        }

        let name = node.name();
        let control_type = node.control_type();

        if !name.is_empty() || is_known_control(&control_type) {
            out.push(UiElement {
                name,
                control_type,
                bounds: node.bounds().unwrap_or_default(),
                depth,
                enabled: node.enabled(),
                visible: node.visible(),
            });
        }

        // An inaccessible child list omits the subtree, nothing more.
        if let Some(children) = node.children() {
            for child in children {
                self.collect_elements(child.as_ref(), depth + 1, out, visited);
            }
        }
    }

    /// Find a single element by name and/or control type.
    ///
    /// Returns the first depth-first match; `None` on any failure,
    /// including a query with no criteria at all.
    pub fn find_element(
        &self,
        handle: WindowHandle,
        name: Option<&str>,
        control_type: Option<&str>,
    ) -> Option<UiElement> {
        if name.is_none() && control_type.is_none() {
            return None;
        }

        let engine = self.engine.as_ref()?;
        let root = engine.window_root(handle)?;

        let mut visited = 0u32;
        self.search_element(root.as_ref(), 0, name, control_type, &mut visited)
    }

    fn search_element(
        &self,
        node: &dyn UiNode,
        depth: u32,
        name: Option<&str>,
        control_type: Option<&str>,
        visited: &mut u32,
    ) -> Option<UiElement> {
        if depth > self.limits.max_depth || *visited >= self.limits.max_nodes {
            return None;
        }
        *visited += 1;

        let node_name = node.name();
        let node_type = node.control_type();

        let name_ok = name.map_or(true, |n| node_name == n);
        let type_ok = control_type.map_or(true, |t| node_type == t);

        if name_ok && type_ok {
            return Some(UiElement {
                name: node_name,
                control_type: node_type,
                bounds: node.bounds().unwrap_or_default(),
                depth,
                enabled: node.enabled(),
                visible: node.visible(),
            });
        }

        let children = node.children()?;
        for child in children {
            if let Some(found) =
                self.search_element(child.as_ref(), depth + 1, name, control_type, visited)
            {
                return Some(found);
            }
        }
        None
    }

    /// Search the accessibility tree for browser tab titles.
    ///
    /// Emission follows traversal order, not horizontal position (unlike
    /// the OCR path, which sorts by x). When the tree cannot be searched and
    /// a screenshot exists, [`TabSearch::NoTreeAvailable`] tells the
    /// orchestrator to escalate instead of concluding "zero tabs".
    pub fn browser_tabs(&self, handle: WindowHandle, screenshot_available: bool) -> TabSearch {
        let root = self
            .engine
            .as_ref()
            .and_then(|engine| engine.window_root(handle));

        let Some(root) = root else {
            return if screenshot_available {
                debug!(
                    "No accessibility tree for window {}, deferring to screenshot",
                    handle
                );
                TabSearch::NoTreeAvailable
            } else {
                TabSearch::Empty
            };
        };

        let mut tabs = Vec::new();
        let mut visited = 0u32;
        self.search_tabs(root.as_ref(), 0, &mut tabs, &mut visited);

        if tabs.is_empty() {
            TabSearch::Empty
        } else {
            debug!("Found {} tabs in accessibility tree", tabs.len());
            TabSearch::Tabs(tabs)
        }
    }

    fn search_tabs(
        &self,
        node: &dyn UiNode,
        depth: u32,
        tabs: &mut Vec<String>,
        visited: &mut u32,
    ) {
        if depth > self.limits.tab_search_depth || *visited >= self.limits.max_nodes {
            return;
        }
        *visited += 1;

        let control_type = node.control_type().to_lowercase();
        let name = node.name();

        if control_type.contains("tabitem") && is_plausible_tab_name(&name, tabs) {
            tabs.push(name);
        }

        if let Some(children) = node.children() {
            for child in children {
                self.search_tabs(child.as_ref(), depth + 1, tabs, visited);
            }
        }
    }
}

fn is_known_control(control_type: &str) -> bool {
    !control_type.is_empty() && control_type != "Unknown"
}

/// Filter junk out of candidate tab names: very short names, repeats, and
/// known structural labels.
fn is_plausible_tab_name(name: &str, collected: &[String]) -> bool {
    !name.is_empty()
        && name.chars().count() > 3
        && !collected.iter().any(|t| t == name)
        && !STRUCTURAL_LABEL_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProcessInfo, RawWindow};
    use crate::types::Bounds;
    use pretty_assertions::assert_eq;

    #[derive(Clone)]
    struct FakeNode {
        name: String,
        control_type: String,
        bounds: Option<Bounds>,
        enabled: bool,
        visible: bool,
        children: Vec<FakeNode>,
        children_inaccessible: bool,
    }

    impl FakeNode {
        fn new(name: &str, control_type: &str) -> Self {
            Self {
                name: name.to_string(),
                control_type: control_type.to_string(),
                bounds: Some(Bounds::new(0, 0, 10, 10)),
                enabled: true,
                visible: true,
                children: vec![],
                children_inaccessible: false,
            }
        }

        fn with_children(mut self, children: Vec<FakeNode>) -> Self {
            self.children = children;
            self
        }
    }

    impl UiNode for FakeNode {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn control_type(&self) -> String {
            self.control_type.clone()
        }

        fn bounds(&self) -> Option<Bounds> {
            self.bounds
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn visible(&self) -> bool {
            self.visible
        }

        fn children(&self) -> Option<Vec<Box<dyn UiNode>>> {
            if self.children_inaccessible {
                return None;
            }
            Some(
                self.children
                    .iter()
                    .cloned()
                    .map(|c| Box::new(c) as Box<dyn UiNode>)
                    .collect(),
            )
        }
    }

    /// Node that spawns two children at every level, forever.
    struct EndlessNode;

    impl UiNode for EndlessNode {
        fn name(&self) -> String {
            "node".to_string()
        }

        fn control_type(&self) -> String {
            "Pane".to_string()
        }

        fn bounds(&self) -> Option<Bounds> {
            Some(Bounds::default())
        }

        fn enabled(&self) -> bool {
            true
        }

        fn visible(&self) -> bool {
            true
        }

        fn children(&self) -> Option<Vec<Box<dyn UiNode>>> {
            Some(vec![Box::new(EndlessNode), Box::new(EndlessNode)])
        }
    }

    struct FakeEngine {
        root: Option<FakeNode>,
        endless: bool,
    }

    impl AccessibilityEngine for FakeEngine {
        fn window_root(&self, _handle: WindowHandle) -> Option<Box<dyn UiNode>> {
            if self.endless {
                return Some(Box::new(EndlessNode));
            }
            self.root
                .clone()
                .map(|r| Box::new(r) as Box<dyn UiNode>)
        }
    }

    struct OneWindowRegistry;

    impl WindowRegistry for OneWindowRegistry {
        fn enumerate(&self) -> Vec<RawWindow> {
            vec![self.resolve(1).unwrap()]
        }

        fn resolve(&self, handle: WindowHandle) -> Option<RawWindow> {
            (handle == 1).then(|| RawWindow {
                handle: 1,
                title: "Browser".to_string(),
                bounds: Bounds::new(0, 0, 1280, 720),
                window_class: "BrowserFrame".to_string(),
                process_id: 77,
                visible: true,
                enabled: true,
            })
        }

        fn process_info(&self, _pid: u32) -> Option<ProcessInfo> {
            Some(ProcessInfo {
                name: "browser.exe".to_string(),
                executable_path: "/opt/browser".to_string(),
            })
        }

        fn foreground(&self) -> Option<WindowHandle> {
            Some(1)
        }
    }

    fn inspector_over(root: Option<FakeNode>) -> UiInspector {
        UiInspector::new(
            Some(Box::new(FakeEngine {
                root,
                endless: false,
            })),
            Arc::new(OneWindowRegistry),
            TreeConfig::default(),
        )
    }

    #[test]
    fn test_window_info_and_gone() {
        let inspector = inspector_over(None);

        let info = inspector.window_info(1).unwrap();
        assert_eq!(info.title, "Browser");
        assert_eq!(info.process_name, "browser.exe");

        assert!(matches!(
            inspector.window_info(9),
            Err(AnalysisError::WindowGone(9))
        ));
    }

    #[test]
    fn test_focused_window() {
        let inspector = inspector_over(None);
        assert_eq!(inspector.focused_window().unwrap().handle, 1);
    }

    #[test]
    fn test_ui_tree_emission_rule() {
        // The anonymous unknown-type pane must be skipped, but its named
        // child must still be reached.
        let root = FakeNode::new("Browser", "Window").with_children(vec![
            FakeNode::new("", "Unknown")
                .with_children(vec![FakeNode::new("Reload", "Button")]),
            FakeNode::new("", "ToolBar"),
        ]);

        let elements = inspector_over(Some(root)).ui_tree(1);
        let names: Vec<_> = elements
            .iter()
            .map(|e| (e.name.as_str(), e.depth))
            .collect();
        assert_eq!(names, vec![("Browser", 0), ("Reload", 2), ("", 1)]);
    }

    #[test]
    fn test_ui_tree_depth_bound() {
        // Chain of depth 7; default max depth is 5.
        let mut node = FakeNode::new("d7", "Button");
        for depth in (0..7).rev() {
            node = FakeNode::new(&format!("d{}", depth), "Button").with_children(vec![node]);
        }

        let elements = inspector_over(Some(node)).ui_tree(1);
        let max_depth = elements.iter().map(|e| e.depth).max().unwrap();
        assert_eq!(max_depth, 5);
        assert!(elements.iter().all(|e| e.name != "d6" && e.name != "d7"));
    }

    #[test]
    fn test_ui_tree_unreadable_bounds_zeroed() {
        let mut root = FakeNode::new("Ghost", "Button");
        root.bounds = None;

        let elements = inspector_over(Some(root)).ui_tree(1);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].bounds, Bounds::default());
    }

    #[test]
    fn test_ui_tree_inaccessible_children_skips_subtree() {
        let mut broken = FakeNode::new("Broken", "Pane");
        broken.children_inaccessible = true;
        broken.children = vec![FakeNode::new("Unreachable", "Button")];

        let root = FakeNode::new("Root", "Window")
            .with_children(vec![broken, FakeNode::new("Sibling", "Button")]);

        let elements = inspector_over(Some(root)).ui_tree(1);
        let names: Vec<_> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Broken", "Sibling"]);
    }

    #[test]
    fn test_ui_tree_node_cap_stops_runaway_trees() {
        let inspector = UiInspector::new(
            Some(Box::new(FakeEngine {
                root: None,
                endless: true,
            })),
            Arc::new(OneWindowRegistry),
            TreeConfig {
                max_depth: 64,
                tab_search_depth: 64,
                max_nodes: 25,
            },
        );

        let elements = inspector.ui_tree(1);
        assert_eq!(elements.len(), 25);
    }

    #[test]
    fn test_ui_tree_without_engine_is_empty() {
        let inspector = UiInspector::new(None, Arc::new(OneWindowRegistry), TreeConfig::default());
        assert!(inspector.ui_tree(1).is_empty());
    }

    #[test]
    fn test_find_element_by_name_and_type() {
        let root = FakeNode::new("Root", "Window").with_children(vec![
            FakeNode::new("OK", "Text"),
            FakeNode::new("OK", "Button"),
        ]);
        let inspector = inspector_over(Some(root));

        let by_name = inspector.find_element(1, Some("OK"), None).unwrap();
        assert_eq!(by_name.control_type, "Text");

        let by_both = inspector.find_element(1, Some("OK"), Some("Button")).unwrap();
        assert_eq!(by_both.depth, 1);

        assert!(inspector.find_element(1, Some("Cancel"), None).is_none());
        // No criteria at all is a failed query, not "return the root".
        assert!(inspector.find_element(1, None, None).is_none());
    }

    #[test]
    fn test_browser_tabs_traversal_order_and_filtering() {
        let root = FakeNode::new("Browser", "Window").with_children(vec![
            FakeNode::new("Tab strip", "TabControl").with_children(vec![
                FakeNode::new("Inbox (3) - Mail", "TabItem"),
                FakeNode::new("ab", "TabItem"),
                FakeNode::new("Active View selector", "TabItem"),
                FakeNode::new("Rust - The Book", "TabItem"),
                FakeNode::new("Inbox (3) - Mail", "TabItem"),
                FakeNode::new("Tab content area", "TabItem"),
            ]),
            FakeNode::new("Weather widget", "Button"),
        ]);

        let tabs = inspector_over(Some(root)).browser_tabs(1, true);
        assert_eq!(
            tabs,
            TabSearch::Tabs(vec![
                "Inbox (3) - Mail".to_string(),
                "Rust - The Book".to_string(),
            ])
        );
    }

    #[test]
    fn test_browser_tabs_empty_tree() {
        let root = FakeNode::new("Editor", "Window")
            .with_children(vec![FakeNode::new("File", "MenuItem")]);

        // Tree searched, nothing tab-shaped: that is Empty, not a signal.
        assert_eq!(inspector_over(Some(root)).browser_tabs(1, true), TabSearch::Empty);
    }

    #[test]
    fn test_browser_tabs_signals_fallback_when_tree_missing() {
        let no_tree = inspector_over(None);
        assert_eq!(no_tree.browser_tabs(1, true), TabSearch::NoTreeAvailable);
        assert_eq!(no_tree.browser_tabs(1, false), TabSearch::Empty);

        let no_engine =
            UiInspector::new(None, Arc::new(OneWindowRegistry), TreeConfig::default());
        assert_eq!(no_engine.browser_tabs(1, true), TabSearch::NoTreeAvailable);
        assert_eq!(no_engine.browser_tabs(1, false), TabSearch::Empty);
    }
}
