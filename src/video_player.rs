use anyhow::{anyhow, Result};
use eframe::epaint::ColorImage;
use gstreamer::prelude::*;
use gstreamer::{glib, Bin, Element, ElementFactory, MessageView, State};
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFrame as GstFrame, VideoInfo};
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::display::VideoFrame;
use crate::media::DisplayMode;
use crate::render::{VideoRenderer, VideoStatus};

/// One playbin pipeline decoding a single file into RGBA frames.
pub struct VideoPlayer {
    pipeline: Element,
    eos: Arc<AtomicBool>,
    error: Arc<Mutex<Option<String>>>,
    shutdown: Arc<AtomicBool>,
}

impl VideoPlayer {
    pub fn new(uri: &str, frame_sender: watch::Sender<Option<VideoFrame>>, mode: DisplayMode) -> Result<Self> {
        debug!("Creating pipeline for {}", uri);

        let pipeline = ElementFactory::make("playbin")
            .name("playbin")
            .build()
            .map_err(|e| anyhow!("Failed to create playbin: {:?}", e))?;
        pipeline.set_property("uri", uri);

        let video_bin = Bin::new();

        let videoconvert = ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| anyhow!("Failed to create videoconvert: {:?}", e))?;
        let videoscale = ElementFactory::make("videoscale")
            .build()
            .map_err(|e| anyhow!("Failed to create videoscale: {:?}", e))?;
        let capsfilter = ElementFactory::make("capsfilter")
            .build()
            .map_err(|e| anyhow!("Failed to create capsfilter: {:?}", e))?;
        capsfilter.set_property(
            "caps",
            &gstreamer::Caps::builder("video/x-raw").field("format", "RGBA").build(),
        );

        let appsink = AppSink::builder().build();
        appsink.set_max_buffers(1);
        appsink.set_drop(true);
        let sink_element = appsink.clone().upcast::<Element>();

        video_bin
            .add_many([&videoconvert, &videoscale, &capsfilter, &sink_element])
            .map_err(|e| anyhow!("Failed to populate video bin: {:?}", e))?;
        Element::link_many([&videoconvert, &videoscale, &capsfilter, &sink_element])
            .map_err(|e| anyhow!("Failed to link video bin: {:?}", e))?;

        let pad = videoconvert
            .static_pad("sink")
            .ok_or_else(|| anyhow!("Failed to get sink pad"))?;
        let ghost = gstreamer::GhostPad::with_target(&pad)
            .map_err(|e| anyhow!("Failed to create ghost pad: {:?}", e))?;
        video_bin
            .add_pad(&ghost)
            .map_err(|e| anyhow!("Failed to add ghost pad: {:?}", e))?;
        pipeline.set_property("video-sink", &video_bin);

        let audiosink = ElementFactory::make("autoaudiosink")
            .build()
            .map_err(|e| anyhow!("Failed to create audio sink: {:?}", e))?;
        pipeline.set_property("audio-sink", &audiosink);

        let player = VideoPlayer {
            pipeline,
            eos: Arc::new(AtomicBool::new(false)),
            error: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        player.start_bus_watching()?;
        Self::start_frame_extraction(appsink, frame_sender, mode);

        Ok(player)
    }

    fn start_bus_watching(&self) -> Result<()> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| anyhow!("Pipeline has no bus"))?;
        let eos = self.eos.clone();
        let error = self.error.clone();
        let shutdown = self.shutdown.clone();

        std::thread::spawn(move || {
            while !shutdown.load(Ordering::Acquire) {
                let Some(msg) = bus.timed_pop(gstreamer::ClockTime::from_mseconds(200)) else {
                    continue;
                };
                match msg.view() {
                    MessageView::Eos(_) => {
                        info!("End of stream reached");
                        eos.store(true, Ordering::Release);
                    }
                    MessageView::Error(err) => {
                        let error_msg = format!(
                            "Error from {:?}: {} ({:?})",
                            err.src().map(|s| s.path_string()),
                            err.error(),
                            err.debug()
                        );
                        error!("GStreamer error: {}", error_msg);
                        if let Ok(mut slot) = error.lock() {
                            *slot = Some(error_msg);
                        }
                    }
                    MessageView::Warning(warn) => {
                        warn!(
                            "Warning from {:?}: {} ({:?})",
                            warn.src().map(|s| s.path_string()),
                            warn.error(),
                            warn.debug()
                        );
                    }
                    MessageView::StateChanged(state_changed) => {
                        if msg.src().map(|s| s.type_().name() == "GstPlayBin").unwrap_or(false) {
                            debug!(
                                "Pipeline state changed from {:?} to {:?}",
                                state_changed.old(),
                                state_changed.current()
                            );
                        }
                    }
                    _ => {}
                }
            }
        });
        Ok(())
    }

    fn start_frame_extraction(appsink: AppSink, sender: watch::Sender<Option<VideoFrame>>, mode: DisplayMode) {
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    match Self::pull_frame(appsink) {
                        Some(image) => {
                            let _ = sender.send(Some(VideoFrame { image, mode }));
                        }
                        None => debug!("Failed to pull frame"),
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );
    }

    fn pull_frame(appsink: &AppSink) -> Option<ColorImage> {
        let sample = appsink.pull_sample().ok()?;
        let buffer = sample.buffer()?;
        let caps = sample.caps()?;
        let video_info = VideoInfo::from_caps(caps).ok()?;

        let frame = GstFrame::from_buffer_readable(buffer.copy(), &video_info).ok()?;
        let width = video_info.width() as usize;
        let height = video_info.height() as usize;
        let stride = video_info.stride()[0] as usize;
        let plane_data = frame.plane_data(0).ok()?;

        // Rows may be padded past width * 4.
        if stride == width * 4 {
            return Some(ColorImage::from_rgba_unmultiplied([width, height], plane_data));
        }
        let mut pixels = Vec::with_capacity(width * height * 4);
        for row in plane_data.chunks(stride).take(height) {
            pixels.extend_from_slice(&row[..width * 4]);
        }
        Some(ColorImage::from_rgba_unmultiplied([width, height], &pixels))
    }

    pub fn play(&self) -> Result<()> {
        self.pipeline
            .set_state(State::Playing)
            .map_err(|e| anyhow!("Failed to set pipeline to PLAYING: {:?}", e))?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        let _ = self.pipeline.set_state(State::Paused);
        self.pipeline
            .set_state(State::Null)
            .map_err(|e| anyhow!("Failed to set pipeline to NULL: {:?}", e))?;
        self.shutdown.store(true, Ordering::Release);
        Ok(())
    }

    pub fn set_muted(&self, muted: bool) {
        self.pipeline.set_property("mute", muted);
    }

    pub fn is_muted(&self) -> bool {
        self.pipeline.property::<bool>("mute")
    }

    pub fn is_eos(&self) -> bool {
        self.eos.load(Ordering::Acquire)
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|e| e.clone())
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn file_uri(path: &Path) -> Result<String> {
    let abs_path = dunce::canonicalize(path)
        .map_err(|e| anyhow!("Failed to canonicalize path {}: {}", path.display(), e))?;
    let uri = glib::filename_to_uri(&abs_path, None)
        .map_err(|e| anyhow!("Failed to convert path to URI {}: {}", abs_path.display(), e))?;
    Ok(uri.to_string())
}

/// Length of a video in whole seconds, found by pre-rolling a silent
/// playbin. `Ok(None)` when the file does not decode or reports no length.
pub fn read_duration(path: &Path) -> Result<Option<u64>> {
    gstreamer::init().map_err(|e| anyhow!("Failed to initialize GStreamer: {}", e))?;
    let uri = file_uri(path)?;

    let playbin = ElementFactory::make("playbin")
        .build()
        .map_err(|e| anyhow!("Failed to create playbin: {:?}", e))?;
    let video_sink = ElementFactory::make("fakesink")
        .build()
        .map_err(|e| anyhow!("Failed to create fakesink: {:?}", e))?;
    let audio_sink = ElementFactory::make("fakesink")
        .build()
        .map_err(|e| anyhow!("Failed to create fakesink: {:?}", e))?;
    playbin.set_property("uri", &uri);
    playbin.set_property("video-sink", &video_sink);
    playbin.set_property("audio-sink", &audio_sink);

    let duration = match playbin.set_state(State::Paused) {
        Ok(_) => match playbin.state(gstreamer::ClockTime::from_seconds(5)).0 {
            Ok(_) => playbin
                .query_duration::<gstreamer::ClockTime>()
                .map(|d| d.seconds()),
            Err(e) => {
                debug!("{} did not pre-roll: {:?}", uri, e);
                None
            }
        },
        Err(e) => {
            debug!("{} could not be paused: {:?}", uri, e);
            None
        }
    };
    let _ = playbin.set_state(State::Null);
    Ok(duration)
}

/// [`VideoRenderer`] backed by one [`VideoPlayer`] at a time.
pub struct GstVideoRenderer {
    player: Option<VideoPlayer>,
    frames: watch::Sender<Option<VideoFrame>>,
}

impl GstVideoRenderer {
    pub fn new(frames: watch::Sender<Option<VideoFrame>>) -> Self {
        Self { player: None, frames }
    }
}

impl VideoRenderer for GstVideoRenderer {
    fn render_video(&mut self, path: &Path, mode: DisplayMode, muted: bool) -> Result<()> {
        self.stop_video();

        let uri = file_uri(path)?;
        let player = VideoPlayer::new(&uri, self.frames.clone(), mode)?;
        player.set_muted(muted);
        player.play()?;
        info!("Video player started for {}", uri);
        self.player = Some(player);
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some(player) = &self.player {
            player.set_muted(muted);
        }
    }

    fn poll(&mut self) -> VideoStatus {
        match &self.player {
            None => VideoStatus::Idle,
            Some(player) => {
                if let Some(error) = player.get_error() {
                    VideoStatus::Failed(error)
                } else if player.is_eos() {
                    VideoStatus::EndOfStream
                } else {
                    VideoStatus::Playing
                }
            }
        }
    }

    fn stop_video(&mut self) {
        if let Some(player) = self.player.take() {
            if let Err(e) = player.stop() {
                error!("Error stopping player: {}", e);
            }
        }
    }
}
