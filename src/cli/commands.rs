//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use crate::analysis::analyze_buffer;
use crate::cli::MixArgs;
use crate::config::EngineConfig;
use crate::engine::buffer::{calculate_peak, calculate_rms};
use crate::engine::{export_wav, AudioEngine, ExportFormat};
use crate::error::Result;
use crate::generator::oscillator::preset_for_frequency;
use crate::generator::{NoiseGenerator, BINAURAL_PRESETS, CARRIER_FREQUENCY};
use crate::nature::discover_nature_sounds;
use crate::settings::{AudioSettings, NoiseType};

/// FFT size used by `analyze`
const ANALYSIS_FFT_SIZE: usize = 4096;

/// Lowest octave band reported by `analyze`
const ANALYSIS_LOWEST_HZ: f32 = 62.5;

/// Build the engine config from files and flags
///
/// Precedence, lowest first: defaults, `--config`, `--settings`, flags.
pub fn build_config(mix: &MixArgs) -> Result<EngineConfig> {
    let mut config = match &mix.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if let Some(path) = &mix.settings {
        let text = std::fs::read_to_string(path)?;
        let settings: AudioSettings = serde_json::from_str(&text)?;
        config.settings = settings.normalized();
    }

    if let Some(seed) = mix.seed {
        config.seed = Some(seed);
    }
    if let (Some(kind), Some(source)) = (mix.nature, &mix.nature_source) {
        config.nature_sources.insert(kind, source.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Apply command line settings and load the selected nature sound
fn prepare_engine(engine: &mut AudioEngine, mix: &MixArgs) -> Result<()> {
    engine.update_settings(mix.settings_update())?;

    if let Some(kind) = engine.settings().nature_sound {
        match engine.config().nature_sources.get(&kind).cloned() {
            Some(source) => {
                if let Err(e) = engine.load_nature_sound(kind, &source) {
                    println!("Nature sound '{}' unavailable: {}", kind, e);
                }
            }
            None => {
                println!("No source configured for nature sound '{}', layer stays silent", kind);
            }
        }
    }
    Ok(())
}

/// Render the mix offline and write it to a WAV file.
pub fn render(out: &Path, seconds: f64, bit_depth: u16, mix: &MixArgs) -> Result<()> {
    tracing::info!("Rendering {:.1}s mix to: {}", seconds, out.display());

    let config = build_config(mix)?;
    let mut engine = AudioEngine::offline(config)?;
    prepare_engine(&mut engine, mix)?;
    engine.play()?;

    let sample_rate = engine.sample_rate().unwrap_or(engine.config().sample_rate);
    let frames = (seconds.max(0.0) * sample_rate as f64).round() as usize;
    let buffer = engine.render_offline(frames)?;
    engine.dispose();

    export_wav(&buffer, out, ExportFormat::new(bit_depth))?;

    let settings = engine.settings();
    println!("Rendered: {}", out.display());
    println!("  Duration:  {:.2}s @ {} Hz", buffer.duration_secs(), buffer.sample_rate);
    println!("  Noise:     {} ({:.2})", settings.noise_type, settings.noise_volume);
    match settings.nature_sound {
        Some(kind) => println!("  Nature:    {} ({:.2})", kind, settings.nature_volume),
        None => println!("  Nature:    off"),
    }
    println!(
        "  Binaural:  {:.1} Hz beat on {:.0} Hz carrier ({:.2})",
        settings.binaural_frequency, CARRIER_FREQUENCY, settings.binaural_volume
    );
    println!(
        "  Level:     {:.1} dB RMS, peak {:.3}",
        calculate_rms(&buffer),
        calculate_peak(&buffer)
    );

    Ok(())
}

/// Play the mix on the default output device.
#[cfg(feature = "device")]
pub fn play(seconds: f64, mix: &MixArgs) -> Result<()> {
    use crate::engine::EngineHandle;
    use crate::output::CpalBackend;

    let config = build_config(mix)?;
    let mut engine = AudioEngine::new(config, Box::new(CpalBackend::new()))?;
    prepare_engine(&mut engine, mix)?;

    let handle = EngineHandle::new(engine);
    handle.play()?;
    println!("Playing for {:.0}s (Ctrl+C to quit)", seconds);

    std::thread::sleep(std::time::Duration::from_secs_f64(seconds.max(0.0)));
    handle.dispose();
    println!("Stopped");
    Ok(())
}

/// Print the binaural beat presets.
pub fn list_presets() -> Result<()> {
    println!("Binaural presets (carrier {:.0} Hz):", CARRIER_FREQUENCY);
    for preset in BINAURAL_PRESETS.iter() {
        println!(
            "  {:<6} {:>5.1} - {:>5.1} Hz  default {:>4.1} Hz  {}",
            preset.name, preset.min_hz, preset.max_hz, preset.default_hz, preset.description
        );
    }

    let default_hz = AudioSettings::default().binaural_frequency;
    if let Some(preset) = preset_for_frequency(default_hz) {
        println!("Default beat {:.1} Hz is in the {} band", default_hz, preset.name);
    }
    Ok(())
}

/// Print octave band energies and slope for generated noise.
pub fn analyze(noise: Option<NoiseType>, seconds: f64, sample_rate: u32, seed: Option<u64>) -> Result<()> {
    let mut generator = match seed {
        Some(seed) => NoiseGenerator::with_seed(seed),
        None => NoiseGenerator::new(),
    };
    let types: Vec<NoiseType> = match noise {
        Some(noise_type) => vec![noise_type],
        None => NoiseType::ALL.to_vec(),
    };

    for noise_type in types {
        let buffer = generator.generate(noise_type, sample_rate, seconds)?;
        let report = analyze_buffer(&buffer, ANALYSIS_FFT_SIZE, ANALYSIS_LOWEST_HZ);

        println!(
            "{} noise: {:+.2} dB/octave, {:.1} dB RMS",
            noise_type,
            report.slope_db_per_octave,
            calculate_rms(&buffer)
        );
        for band in &report.bands {
            println!(
                "  {:>7.1} - {:>7.1} Hz  {:>7.2} dB",
                band.low_hz, band.high_hz, band.power_db
            );
        }
    }
    Ok(())
}

/// List nature sound files found under a directory.
pub fn discover(dir: &Path) -> Result<()> {
    tracing::info!("Searching for nature sounds in: {}", dir.display());

    let found = discover_nature_sounds(dir)?;
    if found.is_empty() {
        println!("No nature sound files found in {}", dir.display());
        return Ok(());
    }

    println!("Found {} nature sound(s):", found.len());
    for (kind, path) in &found {
        println!("  {:<12} {}", kind.as_str(), path.display());
    }
    Ok(())
}
