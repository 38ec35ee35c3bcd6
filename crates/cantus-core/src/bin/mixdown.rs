//! Cantus mixdown - render a demo project to a WAV file
//!
//! Usage: `cantus-mixdown <output.wav> [--config <render.yaml>]`
//!
//! Without `--config` the render settings are read from the user config
//! directory (see `cantus_core::config::default_config_path`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use cantus_core::config::{default_config_path, load_config, RenderConfig};
use cantus_core::events::{EventBus, RenderEvent};
use cantus_core::export::write_mixdown;
use cantus_core::project::{Note, Part, Phoneme, Project, VoicePart, WavePart};
use cantus_core::render::{CancellationSlot, RenderEngine, Renderer, ToneRenderer};
use cantus_core::SAMPLE_RATE;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(output) = args.first().map(PathBuf::from) else {
        bail!("usage: cantus-mixdown <output.wav> [--config <render.yaml>]");
    };
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => args
            .get(i + 1)
            .map(PathBuf::from)
            .context("--config needs a path")?,
        None => default_config_path("render.yaml"),
    };
    let config: RenderConfig = load_config(&config_path);

    rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-render-{}", i))
        .build_global()
        .context("Failed to initialize Rayon thread pool")?;

    let bus = Arc::new(EventBus::default());
    let engine = RenderEngine::with_config(demo_project().into_shared(), bus.clone(), config);

    log::info!("cantus-mixdown rendering to {:?}", output);
    let stats = write_mixdown(&engine, &CancellationSlot::new(), &output)
        .with_context(|| format!("Failed to write mixdown to {:?}", output))?;

    for event in bus.drain() {
        if let RenderEvent::UserMessage { message } = event {
            log::warn!("{}", message);
        }
    }
    println!(
        "Wrote {:?} ({:.2}s, peak {:.3})",
        output,
        stats.frames as f64 / SAMPLE_RATE as f64,
        stats.peak
    );
    Ok(())
}

/// Two tracks: a sung melody and a pre-decoded drone
fn demo_project() -> Project {
    let mut project = Project::new("demo", 110.0);
    let voice: Arc<dyn Renderer> = Arc::new(ToneRenderer::new("tone"));
    let lead = project.add_track("lead", voice.clone());
    let drone = project.add_track("drone", voice);
    project.tracks[drone].volume_db = -9.0;

    let melody = [(60, "do"), (62, "re"), (64, "mi"), (65, "fa"), (67, "so")];
    let notes = melody
        .iter()
        .enumerate()
        .map(|(i, &(tone, lyric))| Note {
            position: i as i64 * 480,
            duration: 480,
            tone,
            lyric: lyric.to_string(),
            phonemes: split_lyric(lyric),
        })
        .collect();
    project.parts.push(Part::Voice(VoicePart {
        track_no: lead,
        position: 480,
        duration: 480 * 6,
        notes,
    }));

    let drone_ms = project.tick_to_ms(480 * 7);
    let frames = (drone_ms * SAMPLE_RATE as f64 / 1000.0) as usize;
    let step = 110.0 * std::f32::consts::TAU / SAMPLE_RATE as f32;
    let samples: Vec<f32> = (0..frames).map(|i| (i as f32 * step).sin() * 0.2).collect();
    project.parts.push(Part::Wave(WavePart {
        track_no: drone,
        position: 0,
        duration: 480 * 7,
        samples: Some(Arc::new(samples)),
        channels: 1,
        skip_ms: 0.0,
    }));

    project
}

/// Consonant sung slightly ahead of the beat, vowel on it
fn split_lyric(lyric: &str) -> Vec<Phoneme> {
    let (consonant, vowel) = lyric.split_at(1);
    vec![
        Phoneme {
            symbol: consonant.to_string(),
            offset: -40,
        },
        Phoneme {
            symbol: vowel.to_string(),
            offset: 0,
        },
    ]
}
