use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use crate::catalog::CatalogProvider;
use crate::error::PlaybackError;
use crate::media::{DisplayMode, MediaKind, MediaRecord, ScreenTarget};
use crate::render::{Surface, VideoRenderer, VideoStatus};
use crate::schedule::resolve;

/// Fixed for the lifetime of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackOptions {
    pub display_mode: DisplayMode,
    pub screen: ScreenTarget,
}

/// Identifies one play session. Events from an earlier session carry an
/// old token and are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

/// Asynchronous notifications that drive the sequencer forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    DwellElapsed(SessionToken),
    EndOfStream(SessionToken),
    VideoFailed(SessionToken, String),
}

/// Lifecycle notifications for the UI.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Started,
    Stopped,
    NothingToPlay,
    Error(PlaybackError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    ShowingImage,
    ShowingVideo,
}

#[derive(Clone, Copy, Debug)]
enum Current {
    Image { deadline: Instant },
    Video,
}

struct Session {
    token: SessionToken,
    items: Vec<MediaRecord>,
    /// Next item to consider. Images bump it when shown, videos on completion.
    index: usize,
    showing: Option<usize>,
    current: Option<Current>,
    options: PlaybackOptions,
}

/// Walks a resolved playlist in a loop, one item at a time.
///
/// Nothing here blocks. The host calls [`Sequencer::tick`] from its event
/// loop; dwell deadlines and video completion are turned into [`Event`]s and
/// fed through [`Sequencer::handle`], the only place the current item
/// changes.
pub struct Sequencer<S: Surface, V: VideoRenderer> {
    surface: S,
    video: V,
    muted: bool,
    session: Option<Session>,
    next_token: u64,
    notices: Vec<Notice>,
}

impl<S: Surface, V: VideoRenderer> Sequencer<S, V> {
    pub fn new(surface: S, video: V, muted: bool) -> Self {
        Self {
            surface,
            video,
            muted,
            session: None,
            next_token: 1,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        match self.session.as_ref().and_then(|s| s.current) {
            Some(Current::Image { .. }) => PlaybackState::ShowingImage,
            Some(Current::Video) => PlaybackState::ShowingVideo,
            None => PlaybackState::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn options(&self) -> Option<&PlaybackOptions> {
        self.session.as_ref().map(|s| &s.options)
    }

    pub fn current_item(&self) -> Option<&MediaRecord> {
        let session = self.session.as_ref()?;
        session.showing.and_then(|i| session.items.get(i))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Stop whatever is running, resolve the catalog at `local_now` and
    /// start on the result.
    pub fn play<C: CatalogProvider + ?Sized>(
        &mut self,
        catalog: &C,
        local_now: NaiveDateTime,
        options: PlaybackOptions,
        now: Instant,
    ) {
        self.stop();
        let resolution = resolve(&catalog.list_all(), local_now);
        self.notices
            .extend(resolution.malformed.into_iter().map(Notice::Error));
        self.start(resolution.active, options, now);
    }

    pub fn start(&mut self, items: Vec<MediaRecord>, options: PlaybackOptions, now: Instant) {
        self.stop();

        if items.is_empty() {
            warn!("{}", PlaybackError::EmptyPlaylist);
            self.notices.push(Notice::NothingToPlay);
            return;
        }

        let token = SessionToken(self.next_token);
        self.next_token += 1;

        info!(
            "Starting playback of {} items on {} ({})",
            items.len(),
            options.screen.name,
            options.display_mode
        );
        self.surface.open(&options.screen);
        self.session = Some(Session {
            token,
            items,
            index: 0,
            showing: None,
            current: None,
            options,
        });
        self.notices.push(Notice::Started);
        self.advance(now);
    }

    /// Cancel the pending dwell, halt video and close the surface. Calling
    /// it while idle does nothing.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Some(Current::Video) = session.current {
            self.video.stop_video();
        }
        self.surface.clear();
        self.surface.close();
        info!("Playback stopped");
        self.notices.push(Notice::Stopped);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(Current::Video) = self.session.as_ref().and_then(|s| s.current) {
            self.video.set_muted(muted);
        }
        debug!("Muted: {}", muted);
    }

    /// Poll timers and the video backend, delivering at most one event.
    pub fn tick(&mut self, now: Instant) {
        let Some(session) = &self.session else {
            return;
        };
        let token = session.token;
        let event = match session.current {
            Some(Current::Image { deadline }) if now >= deadline => Some(Event::DwellElapsed(token)),
            Some(Current::Video) => match self.video.poll() {
                VideoStatus::EndOfStream => Some(Event::EndOfStream(token)),
                VideoStatus::Failed(reason) => Some(Event::VideoFailed(token, reason)),
                VideoStatus::Idle | VideoStatus::Playing => None,
            },
            _ => None,
        };
        if let Some(event) = event {
            self.handle(event, now);
        }
    }

    pub fn handle(&mut self, event: Event, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            debug!("Ignoring {:?} while idle", event);
            return;
        };

        match event {
            Event::DwellElapsed(token) => {
                if token != session.token || !matches!(session.current, Some(Current::Image { .. })) {
                    debug!("Ignoring stale dwell timer {:?}", token);
                    return;
                }
            }
            Event::EndOfStream(token) => {
                if token != session.token || !matches!(session.current, Some(Current::Video)) {
                    debug!("Ignoring stale end of stream {:?}", token);
                    return;
                }
                session.index += 1;
            }
            Event::VideoFailed(token, reason) => {
                if token != session.token || !matches!(session.current, Some(Current::Video)) {
                    debug!("Ignoring stale video failure {:?}", token);
                    return;
                }
                if let Some(item) = session.items.get(session.index) {
                    let err = PlaybackError::RendererFailure {
                        path: item.source_path.clone(),
                        reason,
                    };
                    error!("{}", err);
                    self.notices.push(Notice::Error(err));
                }
                session.index += 1;
            }
        }

        self.advance(now);
    }

    fn advance(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(Current::Video) = session.current.take() {
            self.video.stop_video();
        }
        session.showing = None;
        self.surface.clear();

        let mode = session.options.display_mode;
        let screen = session.options.screen.geometry;
        let len = session.items.len();

        // One full pass at most, so a list with nothing playable ends.
        for _ in 0..len {
            if session.index >= len {
                session.index = 0;
            }
            let item = &session.items[session.index];

            match item.kind {
                MediaKind::Image => match self.surface.render_image(&item.source_path, mode, &screen) {
                    Ok(native) => {
                        let size = match mode {
                            DisplayMode::Fullscreen => screen.size(),
                            DisplayMode::Original => native,
                        };
                        self.surface.resize(size);
                        let dwell = Duration::from_secs(u64::from(item.dwell_seconds.max(1)));
                        debug!("Showing image {} for {:?}", item.name, dwell);
                        session.showing = Some(session.index);
                        session.current = Some(Current::Image {
                            deadline: now + dwell,
                        });
                        session.index += 1;
                        return;
                    }
                    Err(e) => {
                        let err = PlaybackError::AssetLoadFailure {
                            path: item.source_path.clone(),
                            reason: format!("{:#}", e),
                        };
                        warn!("{}", err);
                        self.notices.push(Notice::Error(err));
                    }
                },
                MediaKind::Video => match self.video.render_video(&item.source_path, mode, self.muted) {
                    Ok(()) => {
                        self.surface.resize(screen.size());
                        debug!("Playing video {}", item.name);
                        session.showing = Some(session.index);
                        session.current = Some(Current::Video);
                        return;
                    }
                    Err(e) => {
                        self.video.stop_video();
                        let err = PlaybackError::RendererFailure {
                            path: item.source_path.clone(),
                            reason: format!("{:#}", e),
                        };
                        error!("{}", err);
                        self.notices.push(Notice::Error(err));
                    }
                },
                MediaKind::Other => {
                    debug!("Skipping unsupported media {}", item.name);
                }
            }
            session.index += 1;
        }

        warn!("Nothing in the playlist could be played");
        self.notices.push(Notice::NothingToPlay);
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::media::{ScheduleEntry, ScreenGeometry, Size};
    use anyhow::{anyhow, Result};
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct MockSurface {
        opened: Vec<ScreenTarget>,
        rendered: Vec<PathBuf>,
        modes: Vec<DisplayMode>,
        sizes: Vec<Size>,
        clears: usize,
        closes: usize,
        broken: HashSet<PathBuf>,
    }

    impl Surface for MockSurface {
        fn open(&mut self, screen: &ScreenTarget) {
            self.opened.push(screen.clone());
        }

        fn render_image(&mut self, path: &Path, mode: DisplayMode, _screen: &ScreenGeometry) -> Result<Size> {
            if self.broken.contains(path) {
                return Err(anyhow!("corrupt image"));
            }
            self.rendered.push(path.to_path_buf());
            self.modes.push(mode);
            Ok(Size::new(640, 480))
        }

        fn resize(&mut self, size: Size) {
            self.sizes.push(size);
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    #[derive(Default)]
    struct MockVideo {
        played: Vec<PathBuf>,
        modes: Vec<DisplayMode>,
        status: Option<VideoStatus>,
        mute_calls: Vec<bool>,
        started_muted: Vec<bool>,
        stops: usize,
        broken: HashSet<PathBuf>,
    }

    impl VideoRenderer for MockVideo {
        fn render_video(&mut self, path: &Path, mode: DisplayMode, muted: bool) -> Result<()> {
            if self.broken.contains(path) {
                return Err(anyhow!("no decoder"));
            }
            self.played.push(path.to_path_buf());
            self.modes.push(mode);
            self.started_muted.push(muted);
            self.status = Some(VideoStatus::Playing);
            Ok(())
        }

        fn set_muted(&mut self, muted: bool) {
            self.mute_calls.push(muted);
        }

        fn poll(&mut self) -> VideoStatus {
            self.status.clone().unwrap_or(VideoStatus::Idle)
        }

        fn stop_video(&mut self) {
            self.stops += 1;
            self.status = None;
        }
    }

    type TestSequencer = Sequencer<MockSurface, MockVideo>;

    fn sequencer() -> TestSequencer {
        Sequencer::new(MockSurface::default(), MockVideo::default(), true)
    }

    fn options(mode: DisplayMode) -> PlaybackOptions {
        PlaybackOptions {
            display_mode: mode,
            screen: ScreenTarget {
                index: 0,
                name: "Screen 1".to_string(),
                geometry: ScreenGeometry {
                    x: 0,
                    y: 0,
                    width: 1920,
                    height: 1080,
                },
            },
        }
    }

    fn item(id: u64, kind: MediaKind, dwell: u32) -> MediaRecord {
        let ext = match kind {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
            MediaKind::Other => "txt",
        };
        MediaRecord {
            id,
            name: format!("{}.{}", id, ext),
            kind,
            source_path: PathBuf::from(format!("/media/{}.{}", id, ext)),
            dwell_seconds: dwell,
            duration_seconds: None,
            schedule: None,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_start_empty_list_reports_nothing_to_play() {
        let mut seq = sequencer();
        seq.start(Vec::new(), options(DisplayMode::Fullscreen), Instant::now());

        assert_eq!(seq.state(), PlaybackState::Idle);
        assert!(!seq.is_playing());
        assert_eq!(seq.drain_notices(), vec![Notice::NothingToPlay]);
        assert!(seq.surface().opened.is_empty());
    }

    #[test]
    fn test_single_image_loops_on_dwell() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(vec![item(1, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), t0);

        assert_eq!(seq.state(), PlaybackState::ShowingImage);
        assert_eq!(seq.surface().rendered.len(), 1);

        seq.tick(t0 + secs(4.999));
        assert_eq!(seq.surface().rendered.len(), 1);

        seq.tick(t0 + secs(5.0));
        assert_eq!(seq.surface().rendered.len(), 2);

        // A second tick at the same instant must not fire again.
        seq.tick(t0 + secs(5.0));
        assert_eq!(seq.surface().rendered.len(), 2);

        seq.tick(t0 + secs(9.9));
        assert_eq!(seq.surface().rendered.len(), 2);
        seq.tick(t0 + secs(10.0));
        assert_eq!(seq.surface().rendered.len(), 3);
        assert!(seq.surface().rendered.iter().all(|p| p == Path::new("/media/1.png")));

        seq.stop();
        seq.tick(t0 + secs(100.0));
        assert_eq!(seq.surface().rendered.len(), 3);
        assert_eq!(seq.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_video_advances_only_on_end_of_stream() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(vec![item(1, MediaKind::Video, 5)], options(DisplayMode::Fullscreen), t0);
        assert_eq!(seq.state(), PlaybackState::ShowingVideo);

        for minutes in 1..=60 {
            seq.tick(t0 + Duration::from_secs(60 * minutes));
        }
        assert_eq!(seq.video().played.len(), 1);

        seq.video.status = Some(VideoStatus::EndOfStream);
        seq.tick(t0 + Duration::from_secs(3601));
        assert_eq!(seq.video().played.len(), 2);
        assert_eq!(seq.video().stops, 1);
        assert_eq!(seq.state(), PlaybackState::ShowingVideo);
    }

    #[test]
    fn test_stop_twice_is_noop() {
        let mut seq = sequencer();
        seq.start(vec![item(1, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), Instant::now());
        seq.stop();
        seq.stop();

        assert_eq!(seq.drain_notices(), vec![Notice::Started, Notice::Stopped]);
        assert_eq!(seq.surface().closes, 1);
    }

    #[test]
    fn test_stop_halts_video() {
        let mut seq = sequencer();
        seq.start(vec![item(1, MediaKind::Video, 5)], options(DisplayMode::Fullscreen), Instant::now());
        seq.stop();
        assert_eq!(seq.video().stops, 1);
        assert_eq!(seq.surface().closes, 1);
    }

    #[test]
    fn test_mute_toggle_keeps_video_playing() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(vec![item(1, MediaKind::Video, 5)], options(DisplayMode::Fullscreen), t0);
        assert_eq!(seq.video().started_muted, vec![true]);

        seq.set_muted(true);
        seq.set_muted(false);
        seq.tick(t0 + secs(1.0));

        assert_eq!(seq.video().mute_calls, vec![true, false]);
        assert_eq!(seq.video().played.len(), 1);
        assert_eq!(seq.video().stops, 0);
        assert!(!seq.muted());
    }

    #[test]
    fn test_mute_while_image_only_records_flag() {
        let mut seq = sequencer();
        seq.start(
            vec![item(1, MediaKind::Image, 1), item(2, MediaKind::Video, 1)],
            options(DisplayMode::Fullscreen),
            Instant::now(),
        );
        seq.set_muted(false);
        assert!(seq.video().mute_calls.is_empty());

        seq.handle(Event::DwellElapsed(seq.token().unwrap()), Instant::now());
        assert_eq!(seq.video().started_muted, vec![false]);
    }

    #[test]
    fn test_stale_timer_after_restart_is_ignored() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(vec![item(1, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), t0);
        let old = seq.token().unwrap();
        seq.stop();

        seq.handle(Event::DwellElapsed(old), t0 + secs(6.0));
        assert!(!seq.is_playing());
        assert_eq!(seq.surface().rendered.len(), 1);

        seq.start(vec![item(2, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), t0);
        assert_ne!(seq.token().unwrap(), old);
        seq.handle(Event::DwellElapsed(old), t0 + secs(6.0));
        assert_eq!(seq.surface().rendered.len(), 2);
        assert_eq!(seq.current_item().unwrap().id, 2);
    }

    #[test]
    fn test_end_of_stream_ignored_while_showing_image() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(
            vec![item(1, MediaKind::Image, 5), item(2, MediaKind::Image, 5)],
            options(DisplayMode::Fullscreen),
            t0,
        );
        seq.handle(Event::EndOfStream(seq.token().unwrap()), t0);
        assert_eq!(seq.surface().rendered.len(), 1);
        assert_eq!(seq.current_item().unwrap().id, 1);
    }

    #[test]
    fn test_all_unsupported_ends_playback() {
        let mut seq = sequencer();
        seq.start(
            vec![item(1, MediaKind::Other, 5), item(2, MediaKind::Other, 5)],
            options(DisplayMode::Fullscreen),
            Instant::now(),
        );
        assert!(!seq.is_playing());
        assert_eq!(
            seq.drain_notices(),
            vec![Notice::Started, Notice::NothingToPlay, Notice::Stopped]
        );
    }

    #[test]
    fn test_unsupported_items_are_skipped() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(
            vec![item(1, MediaKind::Other, 5), item(2, MediaKind::Image, 2), item(3, MediaKind::Other, 5)],
            options(DisplayMode::Fullscreen),
            t0,
        );
        assert_eq!(seq.current_item().unwrap().id, 2);
        seq.tick(t0 + secs(2.0));
        assert_eq!(seq.current_item().unwrap().id, 2);
        assert_eq!(seq.surface().rendered.len(), 2);
    }

    #[test]
    fn test_broken_image_is_skipped() {
        let mut seq = sequencer();
        seq.surface.broken.insert(PathBuf::from("/media/1.png"));
        seq.start(
            vec![item(1, MediaKind::Image, 5), item(2, MediaKind::Image, 5)],
            options(DisplayMode::Fullscreen),
            Instant::now(),
        );
        assert_eq!(seq.current_item().unwrap().id, 2);
        let notices = seq.drain_notices();
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notice::Error(PlaybackError::AssetLoadFailure { .. }))));
    }

    #[test]
    fn test_video_load_and_stream_failures_are_skipped() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.video.broken.insert(PathBuf::from("/media/1.mp4"));
        seq.start(
            vec![item(1, MediaKind::Video, 5), item(2, MediaKind::Video, 5), item(3, MediaKind::Image, 5)],
            options(DisplayMode::Fullscreen),
            t0,
        );
        assert_eq!(seq.current_item().unwrap().id, 2);

        seq.video.status = Some(VideoStatus::Failed("decoder error".to_string()));
        seq.tick(t0 + secs(1.0));
        assert_eq!(seq.current_item().unwrap().id, 3);
        assert_eq!(seq.state(), PlaybackState::ShowingImage);

        let failures = seq
            .drain_notices()
            .into_iter()
            .filter(|n| matches!(n, Notice::Error(PlaybackError::RendererFailure { .. })))
            .count();
        assert_eq!(failures, 2);
    }

    #[test]
    fn test_mixed_playlist_order_and_wrap() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(
            vec![item(1, MediaKind::Image, 3), item(2, MediaKind::Video, 5), item(3, MediaKind::Image, 4)],
            options(DisplayMode::Fullscreen),
            t0,
        );
        let mut order = vec![seq.current_item().unwrap().id];

        seq.tick(t0 + secs(3.0));
        order.push(seq.current_item().unwrap().id);

        seq.video.status = Some(VideoStatus::EndOfStream);
        seq.tick(t0 + secs(20.0));
        order.push(seq.current_item().unwrap().id);

        seq.tick(t0 + secs(24.0));
        order.push(seq.current_item().unwrap().id);

        assert_eq!(order, vec![1, 2, 3, 1]);
    }

    #[test]
    fn test_display_mode_sizes_surface() {
        let mut seq = sequencer();
        seq.start(vec![item(1, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), Instant::now());
        assert_eq!(seq.surface().sizes.last(), Some(&Size::new(1920, 1080)));

        seq.start(vec![item(1, MediaKind::Image, 5)], options(DisplayMode::Original), Instant::now());
        assert_eq!(seq.surface().sizes.last(), Some(&Size::new(640, 480)));
        assert_eq!(seq.options().unwrap().display_mode, DisplayMode::Original);
    }

    #[test]
    fn test_session_display_mode_reaches_both_renderers() {
        let mut seq = sequencer();
        let t0 = Instant::now();
        seq.start(
            vec![item(1, MediaKind::Image, 1), item(2, MediaKind::Video, 5)],
            options(DisplayMode::Original),
            t0,
        );
        seq.tick(t0 + secs(1.0));
        assert_eq!(seq.state(), PlaybackState::ShowingVideo);

        assert_eq!(seq.surface().modes, vec![DisplayMode::Original]);
        assert_eq!(seq.video().modes, vec![DisplayMode::Original]);
        // Video surfaces always take the screen; the frame is fitted at paint time.
        assert_eq!(seq.surface().sizes.last(), Some(&Size::new(1920, 1080)));
    }

    #[test]
    fn test_restart_stops_previous_session_first() {
        let mut seq = sequencer();
        seq.start(vec![item(1, MediaKind::Video, 5)], options(DisplayMode::Fullscreen), Instant::now());
        seq.start(vec![item(2, MediaKind::Image, 5)], options(DisplayMode::Fullscreen), Instant::now());

        assert_eq!(
            seq.drain_notices(),
            vec![Notice::Started, Notice::Stopped, Notice::Started]
        );
        assert_eq!(seq.video().stops, 1);
        assert_eq!(seq.surface().opened.len(), 2);
    }

    #[test]
    fn test_play_resolves_catalog_and_reports_bad_schedules() {
        let mut catalog = Catalog::in_memory();
        let a = catalog.create("a.png", MediaKind::Image, Path::new("/m/a.png"), 5, None).unwrap();
        let b = catalog.create("b.png", MediaKind::Image, Path::new("/m/b.png"), 5, None).unwrap();
        let c = catalog.create("c.png", MediaKind::Image, Path::new("/m/c.png"), 5, None).unwrap();
        catalog
            .update_schedule(a, Some(ScheduleEntry::starting("01/01/2099", "00:00")))
            .unwrap();
        catalog
            .update_schedule(c, Some(ScheduleEntry::starting("99/99/9999", "xx")))
            .unwrap();

        let local_now = NaiveDateTime::parse_from_str("2025-05-05 10:00", "%Y-%m-%d %H:%M").unwrap();
        let t0 = Instant::now();
        let mut seq = sequencer();
        seq.play(&catalog, local_now, options(DisplayMode::Fullscreen), t0);

        assert_eq!(seq.current_item().unwrap().id, b);
        seq.tick(t0 + secs(5.0));
        assert_eq!(seq.current_item().unwrap().id, c);

        let notices = seq.drain_notices();
        assert!(matches!(
            notices[0],
            Notice::Error(PlaybackError::MalformedSchedule { id, .. }) if id == c
        ));
        assert_eq!(notices[1], Notice::Started);
    }

    #[test]
    fn test_play_with_nothing_active() {
        let mut catalog = Catalog::in_memory();
        let a = catalog.create("a.png", MediaKind::Image, Path::new("/m/a.png"), 5, None).unwrap();
        catalog
            .update_schedule(a, Some(ScheduleEntry::starting("01/01/2020", "00:00").until("02/01/2020", "00:00")))
            .unwrap();

        let local_now = NaiveDateTime::parse_from_str("2025-05-05 10:00", "%Y-%m-%d %H:%M").unwrap();
        let mut seq = sequencer();
        seq.play(&catalog, local_now, options(DisplayMode::Fullscreen), Instant::now());

        assert!(!seq.is_playing());
        assert_eq!(seq.drain_notices(), vec![Notice::NothingToPlay]);
    }
}
