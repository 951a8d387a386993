//! Engine view adapter
//!
//! [`EngineView`] decides what the host UI renders where the engine goes:
//! the native surface when an engine is available, otherwise a placeholder
//! with the same layout metrics. Mounting and unmounting are reported to a
//! [`ViewObserver`] (normally a [`WeakBridge`](crate::WeakBridge)), which
//! gates command dispatch on them.

use std::sync::Arc;

use gameshell_engine::{engine_availability, EngineAvailability};

/// Layout metrics shared by the native surface and the placeholder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    pub corner_radius: f32,
    pub border_width: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            corner_radius: 12.0,
            border_width: 1.0,
        }
    }
}

/// Colors used when no engine is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderStyle {
    pub background: &'static str,
    pub border_color: &'static str,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            background: "#14142E",
            border_color: "#24244F",
        }
    }
}

/// What the host UI should render
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Native {
        layout: SurfaceLayout,
    },
    Placeholder {
        layout: SurfaceLayout,
        style: PlaceholderStyle,
        reason: String,
    },
}

impl Surface {
    pub fn layout(&self) -> SurfaceLayout {
        match self {
            Surface::Native { layout } | Surface::Placeholder { layout, .. } => *layout,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Surface::Native { .. })
    }
}

/// Receives attach/detach notifications from an [`EngineView`]
pub trait ViewObserver: Send + Sync {
    fn view_attached(&self);
    fn view_detached(&self);
}

pub struct EngineView {
    availability: EngineAvailability,
    layout: SurfaceLayout,
    observer: Option<Arc<dyn ViewObserver>>,
    mounted: bool,
}

impl EngineView {
    /// View using the process-wide engine availability
    pub fn new(observer: Option<Arc<dyn ViewObserver>>) -> Self {
        Self::with_availability(engine_availability().clone(), observer)
    }

    pub fn with_availability(
        availability: EngineAvailability,
        observer: Option<Arc<dyn ViewObserver>>,
    ) -> Self {
        Self {
            availability,
            layout: SurfaceLayout::default(),
            observer,
            mounted: false,
        }
    }

    pub fn with_layout(mut self, layout: SurfaceLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Mount the view. Notifies the observer only for a native surface.
    pub fn mount(&mut self) -> Surface {
        if !self.mounted {
            self.mounted = true;
            if self.availability.is_available() {
                if let Some(observer) = &self.observer {
                    observer.view_attached();
                }
            }
        }
        self.surface()
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        if self.availability.is_available() {
            if let Some(observer) = &self.observer {
                observer.view_detached();
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn surface(&self) -> Surface {
        match &self.availability {
            EngineAvailability::Available => Surface::Native {
                layout: self.layout,
            },
            EngineAvailability::Unavailable { reason } => Surface::Placeholder {
                layout: self.layout,
                style: PlaceholderStyle::default(),
                reason: reason.clone(),
            },
        }
    }
}

impl Drop for EngineView {
    fn drop(&mut self) {
        self.unmount();
    }
}
