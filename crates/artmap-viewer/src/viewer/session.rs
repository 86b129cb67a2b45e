//! Viewer session.
//!
//! Owns everything one viewer needs: the points, the bitmap cache, the
//! transform controller, the visible surface and the collaborators. Input
//! is turned into [`ViewEvent`]s, fed through the pure [`transition`]
//! function, and the returned [`Effect`]s are executed here.

use std::collections::VecDeque;
use std::sync::Arc;

use artmap_core::{
    Error, EventBus, Result, Size, TierId, Transform, ViewerEvent, ViewportRect,
};
use artmap_settings::Config;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::bitmap_cache::BitmapCache;
use super::detail::{DetailFields, DetailPanel};
use super::hit_test::{Hit, HitTester};
use super::point::Point;
use super::raster::{Bitmap, Thumbnail};
use super::renderer::{Renderer, Surface};
use super::state::{self, Effect, Transition, ViewEvent, ViewState};
use super::transform::TransformController;
use crate::sources::{ImageLoader, PointSource};

/// Upper bound on thumbnail loads in flight at once.
const MAX_IN_FLIGHT_LOADS: usize = 32;

pub struct ViewerSession {
    config: Config,
    state: ViewState,
    points: Vec<Point>,
    cache: BitmapCache,
    transform: TransformController,
    renderer: Renderer,
    surface: Surface,
    rect: ViewportRect,
    hit_tester: HitTester,
    displayed_tier: Option<TierId>,
    pointer_attached: bool,
    events: Arc<EventBus>,
    source: Arc<dyn PointSource>,
    images: Arc<dyn ImageLoader>,
    panel: Box<dyn DetailPanel>,
}

impl ViewerSession {
    /// Creates a session in its initial state. Nothing is fetched until
    /// [`start`](Self::start).
    pub fn new(
        config: Config,
        source: Arc<dyn PointSource>,
        images: Arc<dyn ImageLoader>,
        panel: Box<dyn DetailPanel>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::other(format!("Invalid configuration: {}", e)))?;

        let viewport = config.viewer.viewport();
        let cache = BitmapCache::new(viewport, &config.render, config.tiers.max_raster_dimension)?;
        let surface = Surface::new(viewport)?;

        Ok(Self {
            state: ViewState::Loading,
            points: Vec::new(),
            cache,
            transform: TransformController::new(&config.zoom),
            renderer: Renderer::new(),
            surface,
            rect: ViewportRect::from_size(viewport),
            hit_tester: HitTester::new(&config.hit_test),
            displayed_tier: None,
            pointer_attached: false,
            events: Arc::new(EventBus::new()),
            source,
            images,
            panel,
            config,
        })
    }

    /// Runs the loading pipeline until the session reaches `Viewing` or
    /// fails.
    pub async fn start(&mut self) -> Result<()> {
        self.run(state::start()).await;
        match &self.state {
            ViewState::Failed { reason } => Err(artmap_core::ViewError::Halted {
                reason: reason.clone(),
            }
            .into()),
            ViewState::Closed => Err(artmap_core::ViewError::Closed.into()),
            _ => Ok(()),
        }
    }

    /// Feeds one event through the state machine.
    pub async fn dispatch(&mut self, event: ViewEvent) {
        let next = state::transition(&self.state, event);
        self.run(next).await;
    }

    async fn run(&mut self, first: Transition) {
        let mut queue = VecDeque::new();
        let mut next = Some(first);
        while let Some(transition) = next.take() {
            self.enter(transition, &mut queue).await;
            if let Some(event) = queue.pop_front() {
                next = Some(state::transition(&self.state, event));
            }
        }
    }

    async fn enter(&mut self, transition: Transition, queue: &mut VecDeque<ViewEvent>) {
        if transition.state.name() != self.state.name() {
            info!("View state: {} -> {}", self.state, transition.state);
            self.publish(ViewerEvent::StateChanged {
                from: self.state.name().to_string(),
                to: transition.state.name().to_string(),
            });
        }
        self.state = transition.state;

        for effect in transition.effects {
            if let Some(event) = self.execute(effect).await {
                queue.push_back(event);
            }
        }
    }

    async fn execute(&mut self, effect: Effect) -> Option<ViewEvent> {
        debug!("Effect {:?}", effect);
        match effect {
            Effect::FetchPoints => Some(self.fetch_points().await),
            Effect::LoadThumbnails => Some(self.load_thumbnails().await),
            Effect::BuildBitmaps => Some(self.build_bitmaps().await),
            Effect::AttachPointer => {
                self.pointer_attached = true;
                None
            }
            Effect::ResetTransform { tier } => {
                if let Err(e) = self.reset_transform(tier) {
                    self.report(&e);
                }
                None
            }
            Effect::Render { tier } => {
                if let Err(e) = self.render(tier) {
                    self.report(&e);
                }
                None
            }
            Effect::ShowDetail { index } => {
                if let Some(point) = self.points.get(index) {
                    self.panel.show(point.record());
                    let filename = point.filename().to_string();
                    self.publish(ViewerEvent::PointSelected { index, filename });
                }
                None
            }
            Effect::PopulateDetail { index } => self.populate_detail(index).await,
            Effect::ShowDetailError { message } => {
                self.panel.show_error(&message);
                None
            }
            Effect::HideDetail => {
                self.panel.hide();
                self.publish(ViewerEvent::DetailClosed);
                None
            }
            Effect::ResizeSurface { size } => {
                if let Err(e) = self.resize_surface(size) {
                    self.report(&e);
                }
                None
            }
            Effect::ShowError { message } => {
                error!("Viewer halted: {}", message);
                self.publish(ViewerEvent::Error {
                    message,
                    fatal: true,
                });
                None
            }
        }
    }

    async fn fetch_points(&mut self) -> ViewEvent {
        match self.source.fetch_points().await {
            Ok(mut records) => {
                if let Some(max) = self.config.viewer.max_points {
                    if records.len() > max {
                        info!("Limiting {} points to {}", records.len(), max);
                        records.truncate(max);
                    }
                }
                self.points = records.into_iter().map(Point::new).collect();
                ViewEvent::PointsFetched {
                    count: self.points.len(),
                }
            }
            Err(e) => ViewEvent::PointsFetchFailed {
                reason: e.to_string(),
            },
        }
    }

    /// Loads every thumbnail concurrently. Results are applied in point
    /// order once all loads finish; a fatal error aborts the rest.
    async fn load_thumbnails(&mut self) -> ViewEvent {
        let filenames: Vec<String> = self
            .points
            .iter()
            .map(|p| p.filename().to_string())
            .collect();
        let mut results: Vec<Option<Result<Thumbnail>>> =
            std::iter::repeat_with(|| None).take(filenames.len()).collect();
        let mut tasks = JoinSet::new();
        let mut next = 0;

        loop {
            while next < filenames.len() && tasks.len() < MAX_IN_FLIGHT_LOADS {
                let images = Arc::clone(&self.images);
                let filename = filenames[next].clone();
                let index = next;
                tasks.spawn(async move { (index, images.load(&filename, false).await) });
                next += 1;
            }
            let Some(joined) = tasks.join_next().await else {
                break;
            };
            match joined {
                Ok((_, Err(e))) if e.is_fatal() => {
                    tasks.abort_all();
                    return ViewEvent::ThumbnailsFailed {
                        reason: e.to_string(),
                    };
                }
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    tasks.abort_all();
                    return ViewEvent::ThumbnailsFailed {
                        reason: format!("thumbnail load task failed: {}", e),
                    };
                }
            }
        }

        let mut loaded = 0;
        let mut failed = 0;
        for (index, (result, filename)) in results.into_iter().zip(filenames).enumerate() {
            match result {
                Some(Ok(thumbnail)) => {
                    self.points[index].set_thumbnail(thumbnail);
                    loaded += 1;
                }
                Some(Err(e)) => {
                    warn!("Skipping {}: {}", filename, e);
                    failed += 1;
                    self.publish(ViewerEvent::ImageFailed {
                        filename,
                        reason: e.to_string(),
                    });
                }
                None => {}
            }
        }

        info!("Loaded {} thumbnails ({} failed)", loaded, failed);
        ViewEvent::ThumbnailsLoaded { loaded, failed }
    }

    async fn build_bitmaps(&mut self) -> ViewEvent {
        let viewport = self.surface.size();
        match self
            .cache
            .build_all(&mut self.points, &self.config.tiers, viewport)
            .await
        {
            Ok(summaries) => {
                for summary in summaries {
                    self.publish(ViewerEvent::TierBuilt {
                        tier: summary.tier,
                        drawn: summary.drawn,
                        skipped: summary.skipped,
                    });
                }
                ViewEvent::BitmapsBuilt
            }
            Err(e) => ViewEvent::BitmapBuildFailed {
                reason: e.to_string(),
            },
        }
    }

    fn reset_transform(&mut self, tier: TierId) -> Result<Transform> {
        let bitmap = self.cache.require(tier)?.bitmap.size();
        Ok(self.transform.reset_to_fit(bitmap, self.surface.size())?)
    }

    fn render(&mut self, tier: TierId) -> Result<()> {
        let transform = self.transform.current();
        let bitmap = &self.cache.require(tier)?.bitmap;
        let frame = self.renderer.render(&mut self.surface, transform, bitmap);
        if self.displayed_tier != Some(tier) {
            self.displayed_tier = Some(tier);
            self.publish(ViewerEvent::TierSwitched { tier });
        }
        self.publish(ViewerEvent::Rendered {
            tier,
            transform,
            frame,
        });
        Ok(())
    }

    /// Runs the artist lookup and the resized image load side by side.
    /// Either may fail without affecting the other.
    async fn populate_detail(&mut self, index: usize) -> Option<ViewEvent> {
        let (artist, filename) = match self.points.get(index) {
            Some(point) => (point.artist().to_string(), point.filename().to_string()),
            None => return None,
        };

        let (lookup, image) = tokio::join!(
            self.source.artist(&artist),
            self.images.load(&filename, true)
        );

        let failed = match lookup {
            Ok(record) => {
                if record.is_none() {
                    debug!("No artist record for '{}'", artist);
                }
                self.panel
                    .populate(&DetailFields::from_artist(record.as_ref()));
                None
            }
            Err(e) => {
                warn!("Artist lookup failed: {}", e);
                Some(ViewEvent::DetailFailed {
                    index,
                    reason: e.to_string(),
                })
            }
        };

        match image {
            Ok(image) => self.panel.show_image(&image),
            Err(e) => {
                warn!("No resized image for {}: {}", filename, e);
                self.panel
                    .show_image_error(&format!("Error loading {}", filename));
                self.publish(ViewerEvent::ImageFailed {
                    filename,
                    reason: e.to_string(),
                });
            }
        }
        failed
    }

    fn resize_surface(&mut self, size: Size) -> Result<()> {
        self.surface.resize(size)?;
        self.cache.reset_raster(size)?;
        self.rect.width = size.width;
        self.rect.height = size.height;
        debug!("Surface resized to {}", size);
        Ok(())
    }

    fn report(&self, err: &Error) {
        error!("{}", err);
        self.publish(ViewerEvent::Error {
            message: err.to_string(),
            fatal: false,
        });
    }

    fn publish(&self, event: ViewerEvent) {
        // No subscribers is fine
        let _ = self.events.publish(event);
    }

    /// Hit tests a client-space click and feeds the result to the state
    /// machine. Returns the hit, if any.
    pub async fn click(&mut self, client_x: f64, client_y: f64) -> Option<Hit> {
        if !self.pointer_attached || !self.state.accepts_clicks() {
            return None;
        }
        let tier = self.state.active_tier()?;
        let hit = self.hit_tester.hit(
            &self.points,
            &self.transform.current(),
            &self.rect,
            client_x,
            client_y,
            tier,
        );
        self.dispatch(ViewEvent::Click {
            hit: hit.map(|h| h.index),
        })
        .await;
        hit
    }

    /// Closes the detail panel.
    pub async fn dismiss(&mut self) {
        self.dispatch(ViewEvent::Dismiss).await;
    }

    /// Fits the active tier back into the viewport, leaving `Detail`.
    pub async fn reset(&mut self) {
        self.dispatch(ViewEvent::Reset).await;
    }

    /// Moves the visible surface within the client area. A size change is
    /// a resize.
    pub async fn set_viewport_rect(&mut self, rect: ViewportRect) {
        self.rect.left = rect.left;
        self.rect.top = rect.top;
        if rect.size() != self.rect.size() {
            self.resize(rect.size()).await;
        }
    }

    pub async fn resize(&mut self, size: Size) {
        self.dispatch(ViewEvent::Resize { size }).await;
    }

    pub async fn wheel(&mut self, client_x: f64, client_y: f64, delta_y: f64) {
        if !self.pointer_attached {
            return;
        }
        let (x, y) = (client_x - self.rect.left, client_y - self.rect.top);
        if self.transform.wheel(x, y, delta_y).is_some() {
            self.dispatch(ViewEvent::TransformChanged).await;
        }
    }

    pub fn drag_start(&mut self, client_x: f64, client_y: f64) {
        if self.pointer_attached {
            self.transform
                .drag_start(client_x - self.rect.left, client_y - self.rect.top);
        }
    }

    pub async fn drag_to(&mut self, client_x: f64, client_y: f64) {
        if !self.pointer_attached {
            return;
        }
        let (x, y) = (client_x - self.rect.left, client_y - self.rect.top);
        if self.transform.drag_to(x, y).is_some() {
            self.dispatch(ViewEvent::TransformChanged).await;
        }
    }

    pub fn drag_end(&mut self) {
        self.transform.drag_end();
    }

    /// Tears the session down. Later input is ignored.
    pub async fn teardown(&mut self) {
        self.pointer_attached = false;
        self.dispatch(ViewEvent::Teardown).await;
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The selected point while in `Detail`.
    pub fn selected_point(&self) -> Option<&Point> {
        self.state.selected().and_then(|i| self.points.get(i))
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn transform(&self) -> Transform {
        self.transform.current()
    }

    pub fn transform_controller(&self) -> &TransformController {
        &self.transform
    }

    /// The tier bitmap, once built.
    pub fn bitmap(&self, tier: TierId) -> Option<&Bitmap> {
        self.cache.bitmap(tier)
    }

    pub fn bitmap_cache(&self) -> &BitmapCache {
        &self.cache
    }

    pub fn frames(&self) -> u64 {
        self.renderer.frames()
    }

    pub fn viewport_rect(&self) -> ViewportRect {
        self.rect
    }

    /// The session's event bus, for hosts to subscribe to.
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("state", &self.state)
            .field("points", &self.points.len())
            .field("transform", &self.transform.current())
            .field("frames", &self.renderer.frames())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::Thumbnail;
    use artmap_core::{ArtistRecord, DataError, ImageError, PointRecord};
    use artmap_settings::TierSettings;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticSource {
        points: Option<Vec<PointRecord>>,
    }

    #[async_trait]
    impl PointSource for StaticSource {
        async fn fetch_points(&self) -> Result<Vec<PointRecord>> {
            self.points.clone().ok_or_else(|| {
                DataError::FetchFailed {
                    reason: "store offline".to_string(),
                }
                .into()
            })
        }

        async fn artist(&self, name: &str) -> Result<Option<ArtistRecord>> {
            Ok(Some(ArtistRecord {
                name: name.to_string(),
                ..Default::default()
            }))
        }
    }

    struct SolidImages;

    #[async_trait]
    impl ImageLoader for SolidImages {
        async fn load(&self, filename: &str, _resized: bool) -> Result<Thumbnail> {
            if filename.starts_with("missing") {
                return Err(ImageError::LoadFailed {
                    filename: filename.to_string(),
                    reason: "404".to_string(),
                }
                .into());
            }
            Thumbnail::solid(8, 8, [0, 0, 255, 255]).ok_or_else(|| Error::other("alloc"))
        }
    }

    /// Finishes later points first; each thumbnail's width is its point's
    /// number.
    struct ReversedImages {
        count: u64,
    }

    #[async_trait]
    impl ImageLoader for ReversedImages {
        async fn load(&self, filename: &str, _resized: bool) -> Result<Thumbnail> {
            let n: u64 = filename
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .trim_end_matches(".jpg")
                .parse()
                .map_err(|_| Error::other("bad name"))?;
            tokio::time::sleep(std::time::Duration::from_millis(2 * (self.count - n))).await;
            if filename.starts_with("missing") {
                return Err(ImageError::LoadFailed {
                    filename: filename.to_string(),
                    reason: "404".to_string(),
                }
                .into());
            }
            Thumbnail::solid(n as u32, 1, [0, 0, 255, 255]).ok_or_else(|| Error::other("alloc"))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPanel {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl DetailPanel for RecordingPanel {
        fn show(&mut self, record: &PointRecord) {
            self.calls.lock().unwrap().push(format!("show:{}", record.filename));
        }
        fn populate(&mut self, fields: &DetailFields) {
            self.calls.lock().unwrap().push(format!("populate:{}", fields.name));
        }
        fn show_error(&mut self, message: &str) {
            self.calls.lock().unwrap().push(format!("error:{}", message));
        }
        fn hide(&mut self) {
            self.calls.lock().unwrap().push("hide".to_string());
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.viewer.viewport_width = 800;
        config.viewer.viewport_height = 600;
        config.tiers.full = TierSettings {
            width: 800,
            height: 600,
            margin: 40.0,
        };
        config.tiers.half = TierSettings {
            width: 400,
            height: 600,
            margin: 40.0,
        };
        config
    }

    fn records() -> Vec<PointRecord> {
        vec![
            PointRecord::new("a.jpg", "Claude Monet", 0.0, 0.0),
            PointRecord::new("b.jpg", "Edgar Degas", 60.0, 50.0),
            PointRecord::new("missing.jpg", "Nobody", 30.0, 25.0),
        ]
    }

    fn session(points: Option<Vec<PointRecord>>, panel: RecordingPanel) -> ViewerSession {
        ViewerSession::new(
            small_config(),
            Arc::new(StaticSource { points }),
            Arc::new(SolidImages),
            Box::new(panel),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_reaches_viewing() {
        let mut s = session(Some(records()), RecordingPanel::default());
        s.start().await.unwrap();

        assert_eq!(s.state(), &ViewState::Viewing);
        assert!(s.bitmap_cache().is_complete());
        assert_eq!(s.frames(), 1);
        // Missing thumbnail: kept, but never drawn
        assert_eq!(s.points().len(), 3);
        assert!(s.points()[2].bounds(TierId::Full).is_none());
        assert!(s.points()[0].bounds(TierId::Full).is_some());
        // Full tier fits the viewport exactly
        assert_eq!(s.transform(), Transform::IDENTITY);
    }

    #[tokio::test]
    async fn test_concurrent_thumbnails_land_on_their_points() {
        let records: Vec<PointRecord> = (1..=6)
            .map(|n| {
                let name = if n % 3 == 0 {
                    format!("missing{}.jpg", n)
                } else {
                    format!("p{}.jpg", n)
                };
                PointRecord::new(name, "artist", n as f64, n as f64)
            })
            .collect();
        let mut s = ViewerSession::new(
            small_config(),
            Arc::new(StaticSource {
                points: Some(records),
            }),
            Arc::new(ReversedImages { count: 6 }),
            Box::new(RecordingPanel::default()),
        )
        .unwrap();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        s.events().subscribe(artmap_core::EventFilter::All, move |event| {
            if let ViewerEvent::ImageFailed { filename, .. } = event {
                sink.lock().unwrap().push(filename.clone());
            }
        });

        s.start().await.unwrap();
        assert_eq!(s.state(), &ViewState::Viewing);
        for (i, point) in s.points().iter().enumerate() {
            let n = i as u32 + 1;
            match point.thumbnail() {
                Some(thumb) => assert_eq!(thumb.width(), n, "{}", point.filename()),
                None => assert_eq!(n % 3, 0, "{}", point.filename()),
            }
        }
        // Reported in point order, not completion order
        assert_eq!(
            *failures.lock().unwrap(),
            vec!["missing3.jpg".to_string(), "missing6.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_halts() {
        let mut s = session(None, RecordingPanel::default());
        let err = s.start().await.unwrap_err();
        assert!(matches!(s.state(), ViewState::Failed { .. }));
        assert!(err.to_string().contains("store offline"));
        assert_eq!(s.frames(), 0);
    }

    #[tokio::test]
    async fn test_click_opens_detail_with_half_tier() {
        let panel = RecordingPanel::default();
        let calls = panel.calls.clone();
        let mut s = session(Some(records()), panel);
        s.start().await.unwrap();

        let rendered = Arc::new(Mutex::new(Vec::new()));
        let sink = rendered.clone();
        s.events().subscribe(artmap_core::EventFilter::All, move |event| {
            if let ViewerEvent::Rendered { tier, .. } = event {
                sink.lock().unwrap().push(*tier);
            }
        });

        let center = s.points()[1].bounds(TierId::Full).unwrap().center();
        let hit = s.click(center.0, center.1).await.unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(s.state(), &ViewState::Detail { selected: 1 });
        assert_eq!(*rendered.lock().unwrap(), vec![TierId::Half]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["show:b.jpg".to_string(), "populate:Edgar Degas".to_string()]
        );

        s.dismiss().await;
        assert_eq!(s.state(), &ViewState::Viewing);
        assert_eq!(
            *rendered.lock().unwrap(),
            vec![TierId::Half, TierId::Full]
        );
    }

    #[tokio::test]
    async fn test_input_ignored_after_teardown() {
        let mut s = session(Some(records()), RecordingPanel::default());
        s.start().await.unwrap();
        s.teardown().await;
        assert_eq!(s.state(), &ViewState::Closed);

        let frames = s.frames();
        assert!(s.click(400.0, 300.0).await.is_none());
        s.wheel(400.0, 300.0, -100.0).await;
        assert_eq!(s.frames(), frames);
    }
}
