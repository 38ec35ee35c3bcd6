//! Render orchestrator
//!
//! [`RenderEngine::render_project`] builds the full mixing graph up front with
//! an empty placeholder per phrase, hands it back for playback, then fills the
//! placeholders on a background thread in playback order.
//! [`RenderEngine::render_tracks`] is the blocking variant used for offline
//! mixdown.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rayon::prelude::*;

use super::{
    snapshot_project, CancellationSlot, CancellationToken, Progress, RenderError, RenderResult,
    UiDispatcher,
};
use crate::config::RenderConfig;
use crate::events::{NotificationSink, RenderEvent};
use crate::project::{Phrase, SharedProject};
use crate::signal::{Fader, MasterAdapter, SignalSource, WaveMix, WaveSource};
use crate::types::{decibel_to_volume, frames_to_ms, ms_to_frames, Sample};

/// A phrase waiting to be rendered into its placeholder
struct PhraseTask {
    phrase: Phrase,
    source: Arc<WaveSource>,
}

/// What a finished background pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    pub phrases_total: usize,
    pub phrases_rendered: usize,
    /// The pass stopped because its token was cancelled
    pub cancelled: bool,
}

/// Handle to a background render pass
///
/// A fault is reported to the UI before the thread exits and is then also
/// returned from [`join`](Self::join). Cancellation is not a fault: the pass
/// ends with `Ok` and [`RenderSummary::cancelled`] set.
pub struct RenderTask {
    handle: JoinHandle<Result<RenderSummary, RenderError>>,
}

impl RenderTask {
    /// Wait for the pass to end
    pub fn join(self) -> Result<RenderSummary, RenderError> {
        self.handle
            .join()
            .map_err(|_| RenderError::ThreadPanicked)?
    }

    /// Whether the pass has ended
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// The playable graph returned by [`RenderEngine::render_project`]
pub struct ProjectRender {
    /// Root of the graph, cursor at the requested start tick
    pub master: Arc<MasterAdapter>,
    /// One fader per project track, in track order
    pub faders: Vec<Arc<Fader>>,
    /// Phrase placeholders in the order they will be filled
    pub placeholders: Vec<Arc<WaveSource>>,
    pub task: RenderTask,
}

/// A fully rendered track and the fader scale it plays at
pub struct TrackMix {
    pub mix: WaveMix,
    pub gain: Sample,
}

/// Renders a shared project into mixing graphs
pub struct RenderEngine {
    project: SharedProject,
    sink: Arc<dyn NotificationSink>,
    config: RenderConfig,
}

impl RenderEngine {
    /// Create an engine with the default configuration
    pub fn new(project: SharedProject, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_config(project, sink, RenderConfig::default())
    }

    pub fn with_config(
        project: SharedProject,
        sink: Arc<dyn NotificationSink>,
        config: RenderConfig,
    ) -> Self {
        Self {
            project,
            sink,
            config,
        }
    }

    pub fn project(&self) -> &SharedProject {
        &self.project
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.sink
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Build the mixing graph for playback from `start_tick` and start filling it
    ///
    /// Supersedes whatever pass held `slot`. Returns as soon as the graph is
    /// built; unfilled placeholders read as silence. Phrases that end before
    /// `start_tick` are left out of the graph.
    ///
    /// Preparation errors are returned here. Renderer faults are logged,
    /// published as [`RenderEvent::UserMessage`] through `ui`, and returned
    /// from [`RenderTask::join`].
    pub fn render_project(
        &self,
        start_tick: i64,
        ui: Arc<dyn UiDispatcher>,
        slot: &CancellationSlot,
    ) -> Result<ProjectRender, RenderError> {
        let token = slot.replace();
        let snapshot = snapshot_project(&self.project)?;
        let start_ms = snapshot.tick_to_ms(start_tick);

        let mut tasks = Vec::new();
        let mut total_phones = 0;
        let mut faders = Vec::with_capacity(snapshot.tracks.len());

        for track in snapshot.tracks {
            let mut sources: Vec<Arc<dyn SignalSource>> = Vec::new();

            for phrase in track.phrases {
                let layout = phrase.renderer().layout(&phrase);
                if layout.end_ms() < start_ms {
                    continue;
                }
                let source = Arc::new(WaveSource::new(
                    layout.start_ms(),
                    layout.estimated_length_ms,
                    0.0,
                    1,
                ));
                total_phones += phrase.phones().len();
                sources.push(source.clone());
                tasks.push(PhraseTask { phrase, source });
            }

            for clip in &track.wave_clips {
                sources.push(Arc::new(clip.to_source()));
            }

            let fader = Fader::with_ramp_ms(
                Arc::new(WaveMix::new(sources)),
                self.config.fader_ramp_ms,
            );
            fader.set_scale(self.track_scale(track.mute, track.volume_db));
            fader.set_scale_to_target();
            faders.push(Arc::new(fader));
        }

        let master = MasterAdapter::new(WaveMix::new(
            faders
                .iter()
                .map(|f| f.clone() as Arc<dyn SignalSource>)
                .collect(),
        ));
        master.set_position(ms_to_frames(start_ms));

        tasks.sort_by_key(|task| task.phrase.start_tick());
        let placeholders = tasks.iter().map(|task| task.source.clone()).collect();

        log::info!(
            "[RENDER] Rendering {} phrases ({} phones) from tick {}",
            tasks.len(),
            total_phones,
            start_tick
        );

        let progress = Progress::new(total_phones, self.sink.clone());
        let sink = self.sink.clone();
        let handle = thread::Builder::new()
            .name("render-project".to_string())
            .spawn(move || {
                let (summary, result) = fill_in_order(&tasks, &progress, &token);
                progress.clear();
                match result {
                    Ok(()) => Ok(summary),
                    Err(e) if e.is_cancelled() => {
                        log::debug!(
                            "[RENDER] Pass cancelled after {}/{} phrases",
                            summary.phrases_rendered,
                            summary.phrases_total
                        );
                        Ok(RenderSummary {
                            cancelled: true,
                            ..summary
                        })
                    }
                    Err(e) => {
                        log::error!("[RENDER] Failed to render: {}", e);
                        let message = e.to_string();
                        ui.dispatch(Box::new(move || {
                            sink.publish(RenderEvent::UserMessage { message });
                        }));
                        Err(e)
                    }
                }
            })?;

        Ok(ProjectRender {
            master: Arc::new(master),
            faders,
            placeholders,
            task: RenderTask { handle },
        })
    }

    /// Render every track to completion, one mix per track
    ///
    /// Blocks the caller. Phrases of one track are rendered in parallel; each
    /// result is placed at its own position and length. Wave parts are added
    /// alongside, so the mixes cover the whole project.
    pub fn render_tracks(&self, slot: &CancellationSlot) -> Result<Vec<WaveMix>, RenderError> {
        Ok(self
            .render_track_mixes(slot)?
            .into_iter()
            .map(|track| track.mix)
            .collect())
    }

    /// [`render_tracks`](Self::render_tracks), with each track's fader scale
    /// taken from the same project snapshot as its audio
    pub fn render_track_mixes(&self, slot: &CancellationSlot) -> Result<Vec<TrackMix>, RenderError> {
        let token = slot.replace();
        let snapshot = snapshot_project(&self.project)?;
        let total_phones = snapshot.tracks.iter().map(|t| t.phone_count()).sum();
        let progress = Progress::new(total_phones, self.sink.clone());

        let mut mixes = Vec::with_capacity(snapshot.tracks.len());
        for track in &snapshot.tracks {
            let results = track
                .phrases
                .par_iter()
                .map(|phrase| {
                    token.check()?;
                    render_phrase(phrase, &progress, &token, false)
                })
                .collect::<Result<Vec<_>, _>>();

            let results = match results {
                Ok(results) => results,
                Err(e) => {
                    progress.clear();
                    if !e.is_cancelled() {
                        log::error!("[RENDER] Track {} failed: {}", track.track_no, e);
                    }
                    return Err(e);
                }
            };

            let mut sources: Vec<Arc<dyn SignalSource>> = results
                .into_iter()
                .map(|result| Arc::new(source_from_result(result)) as Arc<dyn SignalSource>)
                .collect();
            sources.extend(
                track
                    .wave_clips
                    .iter()
                    .map(|clip| Arc::new(clip.to_source()) as Arc<dyn SignalSource>),
            );
            log::debug!(
                "[RENDER] Track {} rendered: {} sources",
                track.track_no,
                sources.len()
            );
            mixes.push(TrackMix {
                mix: WaveMix::new(sources),
                gain: self.track_scale(track.mute, track.volume_db),
            });
        }

        progress.clear();
        Ok(mixes)
    }

    /// Fader scale for a track; muted tracks drop to the mute level
    fn track_scale(&self, mute: bool, volume_db: f32) -> Sample {
        decibel_to_volume(if mute {
            self.config.muted_volume_db
        } else {
            volume_db
        })
    }
}

/// Render tasks one at a time, filling each placeholder as its phrase finishes
fn fill_in_order(
    tasks: &[PhraseTask],
    progress: &Progress,
    token: &CancellationToken,
) -> (RenderSummary, Result<(), RenderError>) {
    let mut summary = RenderSummary {
        phrases_total: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        if let Err(e) = token.check() {
            return (summary, Err(e));
        }
        let result = match render_phrase(&task.phrase, progress, token, false) {
            Ok(result) => result,
            Err(e) => return (summary, Err(e)),
        };
        // A superseded pass must not publish into a graph nobody listens to
        if let Err(e) = token.check() {
            return (summary, Err(e));
        }
        task.source.set_samples(result.samples);
        summary.phrases_rendered += 1;
    }
    (summary, Ok(()))
}

/// Call the phrase's renderer, tagging faults with the phrase location
pub(crate) fn render_phrase(
    phrase: &Phrase,
    progress: &Progress,
    token: &CancellationToken,
    speculative: bool,
) -> Result<RenderResult, RenderError> {
    phrase
        .renderer()
        .render(phrase, progress, token, speculative)
        .map_err(|e| match e {
            RenderError::Cancelled | RenderError::PhraseFailed { .. } => e,
            other => RenderError::PhraseFailed {
                track_no: phrase.track_no(),
                position: phrase.start_tick(),
                message: format!("{}: {}", phrase.renderer().name(), other),
            },
        })
}

/// Place a finished render on the timeline at its own position
fn source_from_result(result: RenderResult) -> WaveSource {
    let source = WaveSource::new(
        result.start_ms(),
        frames_to_ms(result.samples.len()),
        0.0,
        1,
    );
    source.set_samples(result.samples);
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::project::{Note, Part, PrepError, Project, VoicePart};
    use crate::render::{ChannelDispatcher, RenderLayout, Renderer};
    use crate::testing::ScriptedRenderer;
    use crate::types::{StereoSample, SAMPLE_RATE};
    use std::sync::Mutex;
    use std::time::Duration;

    fn note(position: i64, duration: i64) -> Note {
        Note {
            position,
            duration,
            tone: 60,
            lyric: "a".to_string(),
            phonemes: Vec::new(),
        }
    }

    /// One track, one phrase per entry of `starts` (480 ticks each)
    fn project(renderer: Arc<ScriptedRenderer>, starts: &[i64]) -> SharedProject {
        let mut project = Project::new("engine", 120.0);
        let renderer: Arc<dyn Renderer> = renderer;
        project.add_track("lead", renderer);
        for &start in starts {
            project.parts.push(Part::Voice(VoicePart {
                track_no: 0,
                position: start,
                duration: 480,
                notes: vec![note(0, 480)],
            }));
        }
        project.into_shared()
    }

    #[test]
    fn test_render_project_fills_in_playback_order() {
        let renderer = Arc::new(ScriptedRenderer::new());
        let engine = RenderEngine::new(
            project(renderer.clone(), &[1920, 0, 960]),
            Arc::new(EventBus::default()),
        );
        let slot = CancellationSlot::new();
        let ui = Arc::new(ChannelDispatcher::new());

        let render = engine.render_project(0, ui.clone(), &slot).unwrap();
        let summary = render.task.join().unwrap();

        assert_eq!(summary.phrases_rendered, 3);
        assert!(!summary.cancelled);
        let order: Vec<i64> = renderer.calls().iter().map(|c| c.start_tick).collect();
        assert_eq!(order, vec![0, 960, 1920]);
        assert!(render.placeholders.iter().all(|s| s.has_samples()));
        assert_eq!(ui.pending(), 0);
    }

    #[test]
    fn test_phrases_before_start_are_skipped() {
        let renderer = Arc::new(ScriptedRenderer::new());
        let engine = RenderEngine::new(
            project(renderer.clone(), &[0, 1920]),
            Arc::new(EventBus::default()),
        );
        let slot = CancellationSlot::new();

        let render = engine
            .render_project(1440, Arc::new(ChannelDispatcher::new()), &slot)
            .unwrap();
        render.task.join().unwrap();

        assert_eq!(render.placeholders.len(), 1);
        assert_eq!(renderer.calls().len(), 1);
        // 1440 ticks at 120 BPM = 1500ms
        assert_eq!(render.master.position(), ms_to_frames(1500.0));
    }

    #[test]
    fn test_placeholder_starts_at_lead_in() {
        let renderer = Arc::new(ScriptedRenderer::new().with_leading_ms(20.0));
        let engine = RenderEngine::new(project(renderer, &[960]), Arc::new(EventBus::default()));
        let render = engine
            .render_project(0, Arc::new(ChannelDispatcher::new()), &CancellationSlot::new())
            .unwrap();
        assert_eq!(render.placeholders[0].offset_frame(), ms_to_frames(980.0));
        render.task.join().unwrap();
    }

    #[test]
    fn test_renderer_fault_reaches_ui_and_joiner() {
        let renderer = Arc::new(ScriptedRenderer::new().failing_at(960));
        let bus = Arc::new(EventBus::default());
        let engine = RenderEngine::new(project(renderer, &[0, 960, 1920]), bus.clone());
        let slot = CancellationSlot::new();
        let ui = Arc::new(ChannelDispatcher::new());

        let render = engine.render_project(0, ui.clone(), &slot).unwrap();
        let result = render.task.join();

        assert!(matches!(
            result,
            Err(RenderError::PhraseFailed { position: 960, .. })
        ));
        assert!(render.placeholders[0].has_samples());
        assert!(!render.placeholders[2].has_samples());

        // Nothing is published until the UI thread runs the job
        assert!(!bus
            .drain()
            .iter()
            .any(|e| matches!(e, RenderEvent::UserMessage { .. })));
        assert_eq!(ui.run_pending(), 1);
        assert!(bus
            .drain()
            .iter()
            .any(|e| matches!(e, RenderEvent::UserMessage { .. })));
    }

    #[test]
    fn test_superseded_pass_ends_cancelled() {
        let renderer = Arc::new(ScriptedRenderer::new().with_delay(Duration::from_millis(40)));
        let engine = RenderEngine::new(
            project(renderer, &[0, 960, 1920, 2880]),
            Arc::new(EventBus::default()),
        );
        let slot = CancellationSlot::new();
        let ui = Arc::new(ChannelDispatcher::new());

        let first = engine.render_project(0, ui.clone(), &slot).unwrap();
        let second = engine.render_project(0, ui.clone(), &slot).unwrap();

        let first_summary = first.task.join().unwrap();
        assert!(first_summary.cancelled);
        assert!(first_summary.phrases_rendered < 4);
        assert_eq!(second.task.join().unwrap().phrases_rendered, 4);
        assert_eq!(ui.run_pending(), 0);
    }

    #[test]
    fn test_muted_track_uses_mute_level() {
        let renderer = Arc::new(ScriptedRenderer::new());
        let shared = project(renderer, &[0]);
        {
            let mut project = shared.lock().unwrap();
            project.tracks[0].mute = true;
            project.tracks[0].volume_db = 6.0;
        }
        let engine = RenderEngine::new(shared, Arc::new(EventBus::default()));
        let render = engine
            .render_project(0, Arc::new(ChannelDispatcher::new()), &CancellationSlot::new())
            .unwrap();
        render.task.join().unwrap();

        assert_eq!(render.faders[0].scale(), decibel_to_volume(-24.0));
        assert_eq!(render.faders[0].current_scale(), render.faders[0].scale());
        let mixes = engine.render_track_mixes(&CancellationSlot::new()).unwrap();
        assert_eq!(mixes[0].gain, 0.0);
    }

    #[test]
    fn test_render_tracks_places_results() {
        let renderer = Arc::new(ScriptedRenderer::new().with_value(0.25));
        let engine = RenderEngine::new(
            project(renderer.clone(), &[0, 960]),
            Arc::new(EventBus::default()),
        );

        let mixes = engine.render_tracks(&CancellationSlot::new()).unwrap();
        assert_eq!(mixes.len(), 1);
        assert_eq!(mixes[0].len(), 2);
        assert!(renderer.calls().iter().all(|c| c.track_no == 0 && !c.speculative));

        // Second phrase starts at 960 ticks = 1000ms
        let frame = SAMPLE_RATE as usize + 10;
        let mut buffer = vec![StereoSample::silence(); 4];
        mixes[0].mix(frame, &mut buffer);
        assert!(buffer.iter().all(|s| (s.left - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_fault_message_names_renderer() {
        let renderer = Arc::new(ScriptedRenderer::new().failing_at(0));
        let engine = RenderEngine::new(project(renderer, &[0]), Arc::new(EventBus::default()));
        match engine.render_tracks(&CancellationSlot::new()) {
            Err(RenderError::PhraseFailed { message, .. }) => {
                assert!(message.starts_with("scripted: "))
            }
            other => panic!("Expected phrase failure, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_render_tracks_superseded_through_slot() {
        let renderer = Arc::new(ScriptedRenderer::new().with_delay(Duration::from_millis(300)));
        let engine = RenderEngine::new(
            project(renderer, &[0, 960]),
            Arc::new(EventBus::default()),
        );
        let slot = CancellationSlot::new();

        let result = std::thread::scope(|scope| {
            let render = scope.spawn(|| engine.render_tracks(&slot));
            std::thread::sleep(Duration::from_millis(30));
            slot.replace();
            render.join().unwrap()
        });
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn test_render_project_returns_prep_error_before_spawning() {
        let renderer = Arc::new(ScriptedRenderer::new());
        let shared = project(renderer.clone(), &[]);
        shared.lock().unwrap().parts.push(Part::Voice(VoicePart {
            track_no: 0,
            position: 0,
            duration: 960,
            notes: vec![note(0, 480), note(240, 480)],
        }));
        let engine = RenderEngine::new(shared, Arc::new(EventBus::default()));
        let ui = Arc::new(ChannelDispatcher::new());

        let result = engine.render_project(0, ui.clone(), &CancellationSlot::new());
        assert!(matches!(
            result,
            Err(RenderError::Preparation(PrepError::OverlappingNotes { position: 240, .. }))
        ));
        assert!(renderer.calls().is_empty());
        assert_eq!(ui.pending(), 0);
    }

    /// Mutes track 0 of its project from inside a render
    struct MutingRenderer {
        project: Mutex<Option<SharedProject>>,
    }

    impl Renderer for MutingRenderer {
        fn name(&self) -> &str {
            "muting"
        }

        fn layout(&self, phrase: &Phrase) -> RenderLayout {
            RenderLayout {
                position_ms: phrase.start_ms(),
                leading_ms: 0.0,
                estimated_length_ms: phrase.end_ms() - phrase.start_ms(),
            }
        }

        fn render(
            &self,
            phrase: &Phrase,
            _progress: &Progress,
            _cancellation: &CancellationToken,
            _speculative: bool,
        ) -> Result<RenderResult, RenderError> {
            if let Some(project) = self.project.lock().unwrap().as_ref() {
                project.lock().unwrap().tracks[0].mute = true;
            }
            Ok(RenderResult {
                samples: vec![0.5; 16],
                position_ms: phrase.start_ms(),
                leading_ms: 0.0,
            })
        }
    }

    #[test]
    fn test_track_gain_matches_rendered_snapshot() {
        let renderer = Arc::new(MutingRenderer {
            project: Mutex::new(None),
        });
        let mut project = Project::new("edit-during-mixdown", 120.0);
        let dyn_renderer: Arc<dyn Renderer> = renderer.clone();
        project.add_track("lead", dyn_renderer);
        project.parts.push(Part::Voice(VoicePart {
            track_no: 0,
            position: 0,
            duration: 480,
            notes: vec![note(0, 480)],
        }));
        let shared = project.into_shared();
        *renderer.project.lock().unwrap() = Some(shared.clone());

        let engine = RenderEngine::new(shared.clone(), Arc::new(EventBus::default()));
        let mixes = engine.render_track_mixes(&CancellationSlot::new()).unwrap();

        assert!(shared.lock().unwrap().tracks[0].mute);
        assert_eq!(mixes[0].gain, 1.0);
    }

    #[test]
    fn test_render_tracks_reports_fault() {
        let renderer = Arc::new(ScriptedRenderer::new().failing_at(0));
        let bus = Arc::new(EventBus::default());
        let engine = RenderEngine::new(project(renderer, &[0]), bus.clone());
        let result = engine.render_tracks(&CancellationSlot::new());
        assert!(matches!(result, Err(RenderError::PhraseFailed { track_no: 0, .. })));
        assert!(bus.drain().last().is_some_and(|e| e.is_progress_reset()));
    }
}
