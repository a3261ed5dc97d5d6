use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nova_voice::audio::{CapturePipeline, CaptureSource, CpalCapture, CpalSink};
use nova_voice::live::WsLive;
use nova_voice::preview::{self, PreviewSynth, VoicePreview};
use nova_voice::voices::PREBUILT_VOICES;
use nova_voice::{
    AudioChunk, Config, PLAYBACK_SAMPLE_RATE, PlaybackScheduler, SessionSetup, VoiceSession,
};

/// Nova - live voice sessions with the Nova Care companion
#[derive(Parser)]
#[command(name = "nova", version, about)]
struct Cli {
    /// Voice profile to use (e.g. "Zephyr", or "custom")
    #[arg(short = 'V', long, env = "NOVA_VOICE")]
    voice: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a live voice session (default)
    Run,
    /// List available voice profiles
    Voices,
    /// Play a short sample of a voice profile
    Preview {
        /// Voice to preview; defaults to the configured profile
        name: Option<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,nova_voice=info",
        1 => "info,nova_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let voice = cli.voice.as_deref();

    match cli.command {
        None | Some(Command::Run) => run_session(voice).await,
        Some(Command::Voices) => list_voices(voice),
        Some(Command::Preview { name }) => preview_voice(name.as_deref().or(voice)).await,
        Some(Command::TestMic { duration }) => test_mic(duration).await,
        Some(Command::TestSpeaker) => test_speaker().await,
    }
}

/// Run a live voice session until interrupted
#[allow(clippy::future_not_send)]
async fn run_session(voice: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(voice)?;
    let api_key = config.live.api_key()?.clone();

    if config.voice.is_custom() {
        println!(
            "Note: custom profile '{}' uses the {} voice for the live session.",
            config.voice.display_name(),
            config.voice.live_voice_name()
        );
    }

    let setup = SessionSetup {
        model: config.live.model.clone(),
        voice: config.voice.live_voice_name().to_string(),
        system_instruction: config.system_instruction.clone(),
    };

    let capture = CapturePipeline::new(CpalCapture::new()?);
    let scheduler = PlaybackScheduler::new(CpalSink::new()?);
    let transport = WsLive::new(config.live.url.clone(), api_key);
    let mut session = VoiceSession::new(capture, scheduler, transport, setup);

    // Stream transcript fragments to the terminal as they arrive
    let mut snapshots = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let text = snapshot.transcription;
            if text.len() > printed {
                print!("{}", &text[printed..]);
                let _ = std::io::stdout().flush();
                printed = text.len();
            } else if text.is_empty() && printed > 0 {
                println!();
                printed = 0;
            }
        }
    });

    session.start().await?;
    println!("Session active - speak when ready (Ctrl-C to end).");

    tokio::select! {
        result = session.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nEnding session...");
        }
    }

    session.stop().await;
    printer.abort();

    if let Some(error) = session.snapshot().error {
        println!("Session ended with an error: {error}");
    } else {
        println!("Session ended.");
    }

    Ok(())
}

/// List voice profiles
fn list_voices(selected: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(selected)?;

    println!("Available voices:");
    for voice in PREBUILT_VOICES {
        let marker = if config.voice.display_name() == *voice {
            " (selected)"
        } else {
            ""
        };
        println!("  {voice}{marker}");
    }

    if config.voice.is_custom() {
        println!(
            "  {} [custom] (selected) - live sessions fall back to {}",
            config.voice.display_name(),
            config.voice.live_voice_name()
        );
    }

    Ok(())
}

/// Play a short preview of a voice profile
#[allow(clippy::future_not_send)]
async fn preview_voice(name: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(name)?;

    let chunk = if config.voice.is_custom() {
        println!("Playing imported sample '{}'...", config.voice.display_name());
        preview::load_custom_sample(&config.voice)?
    } else {
        println!("Synthesizing sample for {}...", config.voice.display_name());
        PreviewSynth::new(&config.live)?
            .synthesize(config.voice.live_voice_name())
            .await?
    };

    play_to_completion(chunk).await
}

/// Play one chunk on the default output and wait for it to finish
#[allow(clippy::future_not_send)]
async fn play_to_completion(chunk: AudioChunk) -> anyhow::Result<()> {
    let duration = chunk.duration_secs();
    let mut player = VoicePreview::new(CpalSink::new()?);
    player.play(chunk)?;

    println!("Playing ({duration:.1}s)...");
    tokio::time::sleep(Duration::from_secs_f64(duration + 0.3)).await;
    player.stop();

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = CpalCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_samples();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check your input device and levels.");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (PLAYBACK_SAMPLE_RATE as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    play_to_completion(AudioChunk {
        samples,
        sample_rate: PLAYBACK_SAMPLE_RATE,
        channels: 1,
    })
    .await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}
