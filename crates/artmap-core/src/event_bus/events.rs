//! Event type definitions for the session event bus.
//!
//! Events are cloneable and serializable so hosts can log or replay them.

use serde::{Deserialize, Serialize};

use crate::types::{TierId, Transform};

/// Root event enum for viewer sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewerEvent {
    /// The view state machine moved to a new state.
    StateChanged {
        /// Previous state name.
        from: String,
        /// New state name.
        to: String,
    },
    /// A tier bitmap was captured.
    TierBuilt {
        /// The tier that was built.
        tier: TierId,
        /// Points rasterized into the tier.
        drawn: usize,
        /// Points skipped for lack of a thumbnail.
        skipped: usize,
    },
    /// The active tier changed.
    TierSwitched {
        /// The newly active tier.
        tier: TierId,
    },
    /// A frame was composited onto the visible surface.
    Rendered {
        /// The tier whose bitmap was drawn.
        tier: TierId,
        /// The transform it was drawn under.
        transform: Transform,
        /// Running frame counter.
        frame: u64,
    },
    /// A point was selected for the detail view.
    PointSelected {
        /// Index in the session's point list.
        index: usize,
        /// The point's file name.
        filename: String,
    },
    /// The detail view was closed.
    DetailClosed,
    /// A single image failed to load.
    ImageFailed {
        /// The file that failed.
        filename: String,
        /// Failure description.
        reason: String,
    },
    /// An error was surfaced to the user.
    Error {
        /// Failure description.
        message: String,
        /// Whether the session halted.
        fatal: bool,
    },
}

impl ViewerEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            ViewerEvent::StateChanged { .. } | ViewerEvent::TierBuilt { .. } => {
                EventCategory::Lifecycle
            }
            ViewerEvent::TierSwitched { .. } | ViewerEvent::Rendered { .. } => {
                EventCategory::Render
            }
            ViewerEvent::PointSelected { .. } | ViewerEvent::DetailClosed => {
                EventCategory::Selection
            }
            ViewerEvent::ImageFailed { .. } | ViewerEvent::Error { .. } => EventCategory::Error,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            ViewerEvent::StateChanged { from, to } => format!("{} -> {}", from, to),
            ViewerEvent::TierBuilt {
                tier,
                drawn,
                skipped,
            } => format!("Built {} tier ({} drawn, {} skipped)", tier, drawn, skipped),
            ViewerEvent::TierSwitched { tier } => format!("Active tier: {}", tier),
            ViewerEvent::Rendered {
                tier,
                transform,
                frame,
            } => format!("Frame {} ({} tier, {})", frame, tier, transform),
            ViewerEvent::PointSelected { index, filename } => {
                format!("Selected #{} ({})", index, filename)
            }
            ViewerEvent::DetailClosed => "Detail closed".to_string(),
            ViewerEvent::ImageFailed { filename, reason } => {
                format!("Image {} failed: {}", filename, reason)
            }
            ViewerEvent::Error { message, fatal } => {
                if *fatal {
                    format!("Fatal: {}", message)
                } else {
                    message.clone()
                }
            }
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Loading and build progress.
    Lifecycle,
    /// Frames and tier switches.
    Render,
    /// Detail selection.
    Selection,
    /// Errors and per-point failures.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Lifecycle => write!(f, "Lifecycle"),
            EventCategory::Render => write!(f, "Render"),
            EventCategory::Selection => write!(f, "Selection"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}
