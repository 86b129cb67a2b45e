//! View state machine.
//!
//! [`transition`] is a pure function from `(state, event)` to the next state
//! and a list of [`Effect`]s. Executing the effects (fetching, drawing,
//! showing panels) is the session's job.
//!
//! ```text
//! Loading -> LoadingImages -> BuildingBitmaps -> Viewing <-> Detail
//!    \             \                \
//!     `-------------`----------------`--> Failed
//! ```

use artmap_core::{Size, TierId};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Waiting for the points list.
    Loading,
    /// Waiting for thumbnails.
    LoadingImages,
    /// Rasterizing tiers. A resize that arrives meanwhile is kept and
    /// applied once the build completes.
    BuildingBitmaps { pending_resize: Option<Size> },
    /// Showing the full tier.
    Viewing,
    /// Showing the half tier with the detail panel open.
    Detail { selected: usize },
    /// Halted by a fatal error.
    Failed { reason: String },
    /// Torn down.
    Closed,
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Loading => "Loading",
            ViewState::LoadingImages => "LoadingImages",
            ViewState::BuildingBitmaps { .. } => "BuildingBitmaps",
            ViewState::Viewing => "Viewing",
            ViewState::Detail { .. } => "Detail",
            ViewState::Failed { .. } => "Failed",
            ViewState::Closed => "Closed",
        }
    }

    /// The tier on screen, once bitmaps exist.
    pub fn active_tier(&self) -> Option<TierId> {
        match self {
            ViewState::Viewing => Some(TierId::Full),
            ViewState::Detail { .. } => Some(TierId::Half),
            _ => None,
        }
    }

    /// Whether pointer clicks are hit tested in this state.
    pub fn accepts_clicks(&self) -> bool {
        matches!(self, ViewState::Viewing | ViewState::Detail { .. })
    }

    /// The selected point index while in `Detail`.
    pub fn selected(&self) -> Option<usize> {
        match self {
            ViewState::Detail { selected } => Some(*selected),
            _ => None,
        }
    }

    /// Whether no further events are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewState::Failed { .. } | ViewState::Closed)
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::Detail { selected } => write!(f, "Detail(#{})", selected),
            ViewState::Failed { reason } => write!(f, "Failed({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    PointsFetched { count: usize },
    PointsFetchFailed { reason: String },
    /// Thumbnail loading finished; per-point failures are counted, not fatal.
    ThumbnailsLoaded { loaded: usize, failed: usize },
    /// The thumbnail stage as a whole failed.
    ThumbnailsFailed { reason: String },
    BitmapsBuilt,
    BitmapBuildFailed { reason: String },
    /// A pointer click, already resolved by the hit tester.
    Click { hit: Option<usize> },
    /// The transform controller propagated a new transform.
    TransformChanged,
    /// The artist lookup for `index` failed.
    DetailFailed { index: usize, reason: String },
    /// Click outside the detail panel, or an explicit close.
    Dismiss,
    /// Reset view, e.g. the escape key.
    Reset,
    Resize { size: Size },
    Teardown,
}

/// Work for the session to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchPoints,
    LoadThumbnails,
    BuildBitmaps,
    /// Start routing pointer input to the hit tester.
    AttachPointer,
    /// Fit `tier`'s bitmap into the viewport.
    ResetTransform { tier: TierId },
    Render { tier: TierId },
    ShowDetail { index: usize },
    /// Look up the artist and resized image for `index`.
    PopulateDetail { index: usize },
    ShowDetailError { message: String },
    HideDetail,
    ResizeSurface { size: Size },
    ShowError { message: String },
}

/// Next state plus effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: ViewState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    fn stay(state: &ViewState) -> Self {
        Self::to(state.clone(), Vec::new())
    }

    fn fail(reason: String) -> Self {
        Self::to(
            ViewState::Failed {
                reason: reason.clone(),
            },
            vec![Effect::ShowError { message: reason }],
        )
    }
}

/// The initial state and its effects.
pub fn start() -> Transition {
    Transition::to(ViewState::Loading, vec![Effect::FetchPoints])
}

/// Computes the next state for `event`. Events that make no sense in the
/// current state leave it unchanged with no effects.
pub fn transition(state: &ViewState, event: ViewEvent) -> Transition {
    use ViewEvent as E;
    use ViewState as S;

    let next = match (state, event) {
        (S::Closed, _) => Transition::stay(state),
        (_, E::Teardown) => {
            let effects = if state.selected().is_some() {
                vec![Effect::HideDetail]
            } else {
                Vec::new()
            };
            Transition::to(S::Closed, effects)
        }
        (S::Failed { .. }, _) => Transition::stay(state),

        (S::Loading, E::PointsFetched { .. }) => {
            Transition::to(S::LoadingImages, vec![Effect::LoadThumbnails])
        }
        (S::Loading, E::PointsFetchFailed { reason }) => Transition::fail(reason),

        (S::LoadingImages, E::ThumbnailsLoaded { .. }) => Transition::to(
            S::BuildingBitmaps {
                pending_resize: None,
            },
            vec![Effect::BuildBitmaps],
        ),
        (S::LoadingImages, E::ThumbnailsFailed { reason }) => Transition::fail(reason),

        (S::BuildingBitmaps { pending_resize }, E::BitmapsBuilt) => {
            let mut effects = vec![Effect::AttachPointer];
            if let Some(size) = pending_resize {
                effects.push(Effect::ResizeSurface { size: *size });
            }
            effects.push(Effect::ResetTransform { tier: TierId::Full });
            effects.push(Effect::Render { tier: TierId::Full });
            Transition::to(S::Viewing, effects)
        }
        (S::BuildingBitmaps { .. }, E::BitmapBuildFailed { reason }) => Transition::fail(reason),
        (S::BuildingBitmaps { .. }, E::Resize { size }) => Transition::to(
            S::BuildingBitmaps {
                pending_resize: Some(size),
            },
            Vec::new(),
        ),

        (S::Viewing, E::Click { hit: Some(index) }) => Transition::to(
            S::Detail { selected: index },
            vec![
                Effect::ShowDetail { index },
                Effect::PopulateDetail { index },
                Effect::Render { tier: TierId::Half },
            ],
        ),
        (S::Detail { selected }, E::Click { hit: Some(index) }) if *selected != index => {
            Transition::to(
                S::Detail { selected: index },
                vec![
                    Effect::ShowDetail { index },
                    Effect::PopulateDetail { index },
                ],
            )
        }
        (S::Detail { .. }, E::Dismiss) => Transition::to(
            S::Viewing,
            vec![Effect::HideDetail, Effect::Render { tier: TierId::Full }],
        ),
        (S::Detail { selected }, E::DetailFailed { index, reason }) if *selected == index => {
            Transition::to(
                state.clone(),
                vec![Effect::ShowDetailError { message: reason }],
            )
        }

        (S::Viewing, E::Reset) => Transition::to(
            S::Viewing,
            vec![
                Effect::ResetTransform { tier: TierId::Full },
                Effect::Render { tier: TierId::Full },
            ],
        ),
        (S::Detail { .. }, E::Reset) => Transition::to(
            S::Viewing,
            vec![
                Effect::HideDetail,
                Effect::ResetTransform { tier: TierId::Full },
                Effect::Render { tier: TierId::Full },
            ],
        ),

        (S::Viewing | S::Detail { .. }, E::TransformChanged) => match state.active_tier() {
            Some(tier) => Transition::to(state.clone(), vec![Effect::Render { tier }]),
            None => Transition::stay(state),
        },
        (S::Viewing | S::Detail { .. }, E::Resize { size }) => match state.active_tier() {
            Some(tier) => Transition::to(
                state.clone(),
                vec![Effect::ResizeSurface { size }, Effect::Render { tier }],
            ),
            None => Transition::stay(state),
        },

        (_, event) => {
            debug!("Ignoring {:?} in {}", event, state);
            Transition::stay(state)
        }
    };

    if next.state.name() != state.name() {
        debug!("{} -> {}", state, next.state);
    }
    next
}
