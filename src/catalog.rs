//! Window enumeration and lookup.
//!
//! The window registry (the OS enumeration API) is a collaborator supplied
//! by the hosting service; [`WindowCatalog`] layers the filtering and lookup
//! rules on top of it. Descriptors are assembled fresh on every call; a
//! handle's validity belongs to the OS, so nothing here is cached.

use crate::types::{AnalysisError, Bounds, WindowDescriptor, WindowHandle};
use std::sync::Arc;
use tracing::{debug, trace};

/// Placeholder used for process fields when metadata cannot be read.
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// One window as reported by the OS enumeration, before process metadata is
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub bounds: Bounds,
    pub window_class: String,
    pub process_id: u32,
    pub visible: bool,
    pub enabled: bool,
}

/// Process metadata for a window's owning process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub name: String,
    pub executable_path: String,
}

/// OS window enumeration, supplied by the hosting service.
pub trait WindowRegistry: Send + Sync {
    /// Enumerate all top-level windows in OS order. The order is whatever
    /// the OS hands back; callers must not assume it is sorted.
    fn enumerate(&self) -> Vec<RawWindow>;

    /// Resolve a handle to its current window record. `None` means the
    /// window no longer exists.
    fn resolve(&self, handle: WindowHandle) -> Option<RawWindow>;

    /// Read process metadata for a PID. `None` covers both "process gone"
    /// and permission denial; either way the caller falls back to
    /// placeholder fields.
    fn process_info(&self, pid: u32) -> Option<ProcessInfo>;

    /// Handle of the foreground window, if any.
    fn foreground(&self) -> Option<WindowHandle>;
}

/// Build a full descriptor from a raw record, attaching process metadata on
/// a best-effort basis.
pub(crate) fn describe_raw(registry: &dyn WindowRegistry, raw: RawWindow) -> WindowDescriptor {
    let process = registry.process_info(raw.process_id);
    if process.is_none() {
        debug!(
            "Process metadata unavailable for pid {} (window '{}')",
            raw.process_id, raw.title
        );
    }

    let (process_name, executable_path) = process
        .map(|p| (p.name, p.executable_path))
        .unwrap_or_else(|| (UNKNOWN_PROCESS.to_string(), UNKNOWN_PROCESS.to_string()));

    WindowDescriptor {
        handle: raw.handle,
        title: raw.title,
        bounds: raw.bounds,
        window_class: raw.window_class,
        process_id: raw.process_id,
        process_name,
        executable_path,
        visible: raw.visible,
        enabled: raw.enabled,
    }
}

/// Enumerates, finds, and describes windows via the registry collaborator.
pub struct WindowCatalog {
    registry: Arc<dyn WindowRegistry>,
}

impl WindowCatalog {
    pub fn new(registry: Arc<dyn WindowRegistry>) -> Self {
        Self { registry }
    }

    /// All windows that are currently visible and carry a non-empty title,
    /// in enumeration order.
    pub fn list_windows(&self) -> Vec<WindowDescriptor> {
        let windows: Vec<_> = self
            .registry
            .enumerate()
            .into_iter()
            .filter(|w| w.visible && !w.title.is_empty())
            .map(|raw| describe_raw(self.registry.as_ref(), raw))
            .collect();

        trace!("Cataloged {} titled visible windows", windows.len());
        windows
    }

    /// Titles of every cataloged window, for lookup-miss reporting.
    pub fn available_titles(&self) -> Vec<String> {
        self.list_windows().into_iter().map(|w| w.title).collect()
    }

    /// Find a window by case-insensitive title substring.
    ///
    /// When several windows match, the first in enumeration order wins.
    /// There is deliberately no relevance ranking, so ties between e.g. two
    /// browser windows are resolved arbitrarily by the OS.
    pub fn find_window(&self, title_substring: &str) -> Option<WindowDescriptor> {
        let needle = title_substring.to_lowercase();

        self.registry
            .enumerate()
            .into_iter()
            .find(|w| w.visible && w.title.to_lowercase().contains(&needle))
            .map(|raw| {
                trace!("Matched '{}' to window '{}'", title_substring, raw.title);
                describe_raw(self.registry.as_ref(), raw)
            })
    }

    /// Resolve a handle to a full descriptor including process metadata.
    ///
    /// Fails with [`AnalysisError::WindowGone`] when the handle no longer
    /// resolves; unreadable process metadata is non-fatal and yields
    /// "Unknown" placeholder fields instead.
    pub fn describe_window(&self, handle: WindowHandle) -> Result<WindowDescriptor, AnalysisError> {
        let raw = self
            .registry
            .resolve(handle)
            .ok_or(AnalysisError::WindowGone(handle))?;

        Ok(describe_raw(self.registry.as_ref(), raw))
    }
}
