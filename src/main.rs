mod args;

use args::{Args, Mode};
use log::{debug, error, info, warn};
use minimap_autoplay::automation::{
    AnchorSet, AutomationCommand, AutomationEvent, CalibrationError, CaptureLoop, MinimapCalibrator,
    create_automation_channels,
};
use minimap_autoplay::capture::{CaptureError, FixedWindow, FrameSource, StillImageSource, WindowLocator};
use minimap_autoplay::config::{AppConfig, DEFAULT_CONFIG_FILE};
use minimap_autoplay::vision::{LibraryError, TemplateLibrary, TemplateMatcher, draw_matches};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let default_filter = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = AppConfig::load_or_default(&config_path);
    if let Some(dir) = &args.templates_dir {
        config.templates_dir = dir.clone();
    }
    if let Some(dir) = &args.anchors_dir {
        config.anchors_dir = dir.clone();
    }
    if !args.categories.is_empty() {
        config.matching.categories = Some(args.categories.clone());
    }
    debug!("Configuration: {:?}", config);

    let result = match args.mode.clone() {
        Mode::MatchOnce(image) => match_once(&config, &image, args.output.as_deref()),
        Mode::Replay(image) => StillImageSource::open(&image)
            .map_err(RunError::from)
            .and_then(|source| {
                let window = FixedWindow(source.screen_bounds());
                block_on_loop(source, window, config, args.timeout_secs)
            }),
        Mode::Live => run_live(config, args.timeout_secs),
        Mode::Screenshot => screenshot(&config, args.output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Match the library once against an image file and print what was found
fn match_once(config: &AppConfig, image_path: &Path, output: Option<&Path>) -> Result<(), RunError> {
    let mut source = StillImageSource::open(image_path)?;
    let region = source.screen_bounds().ok_or(CaptureError::Empty)?;
    let frame = source.capture(region)?;
    let library = TemplateLibrary::open(&config.templates_dir)?;
    let matcher = TemplateMatcher::new(config.matching.clone());

    let minimap = match AnchorSet::load(&config.anchors_dir) {
        Ok(anchors) => {
            let mut calibrator = MinimapCalibrator::new(config.calibration.clone(), anchors);
            calibrator.process(&frame, 1);
            match (calibrator.calibration(), calibrator.player()) {
                (Some(calibration), player) => {
                    println!(
                        "🧭 Minimap at ({}, {}) {}x{}, aspect {:.3}",
                        calibration.rect.x,
                        calibration.rect.y,
                        calibration.rect.width,
                        calibration.rect.height,
                        calibration.aspect_ratio
                    );
                    if let Some(player) = player {
                        println!(
                            "🧍 Player at ({:.3}, {:.3}) confidence {:.3}",
                            player.position.x, player.position.y, player.confidence
                        );
                    }
                    Some(calibration.rect)
                }
                (None, _) => {
                    println!("🧭 Minimap not found");
                    None
                }
            }
        }
        Err(e) => {
            warn!("⚠️ Skipping calibration: {}", e);
            None
        }
    };

    let matches = matcher.match_all(&library, Some(&frame));
    println!("🎯 {} matches", matches.len());
    for candidate in &matches {
        println!(
            "    {:<20} {:<10} {:.3} at ({}, {}) {}x{}",
            candidate.name,
            candidate.category,
            candidate.confidence,
            candidate.bounds.x,
            candidate.bounds.y,
            candidate.bounds.width,
            candidate.bounds.height
        );
    }

    if let Some(output) = output {
        let annotated = draw_matches(frame.image(), &matches, minimap);
        annotated.save(output).map_err(|source| CaptureError::ImageSave {
            path: output.to_path_buf(),
            source,
        })?;
        println!("✅ Annotated image saved to {}", output.display());
    }
    Ok(())
}

fn block_on_loop<S, W>(source: S, window: W, config: AppConfig, timeout_secs: Option<u64>) -> Result<(), RunError>
where
    S: FrameSource + 'static,
    W: WindowLocator + 'static,
{
    let runtime = tokio::runtime::Runtime::new().map_err(RunError::Runtime)?;
    runtime.block_on(run_loop(source, window, config, timeout_secs))
}

async fn run_loop<S, W>(source: S, window: W, config: AppConfig, timeout_secs: Option<u64>) -> Result<(), RunError>
where
    S: FrameSource + 'static,
    W: WindowLocator + 'static,
{
    let library = Arc::new(RwLock::new(TemplateLibrary::open(&config.templates_dir)?));
    let anchors = AnchorSet::load(&config.anchors_dir)?;
    let calibrator = MinimapCalibrator::new(config.calibration.clone(), anchors);
    let matcher = TemplateMatcher::new(config.matching.clone());

    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_automation_channels();
    let (capture_loop, mut reader) = CaptureLoop::new(
        source,
        window,
        config.capture.clone(),
        calibrator,
        matcher,
        library,
        cmd_rx,
        event_tx,
    );
    let loop_handle = tokio::spawn(capture_loop.run());

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                AutomationEvent::Error(message) => warn!("⚠️ {}", message),
                other => info!("📣 {:?}", other),
            }
        }
    });

    tokio::spawn(async move {
        while let Some(snapshot) = reader.changed().await {
            let player = snapshot
                .player
                .map(|fix| {
                    format!(
                        "({:.3}, {:.3}) age {}",
                        fix.position.x,
                        fix.position.y,
                        fix.age(snapshot.sequence)
                    )
                })
                .unwrap_or_else(|| "unknown".to_string());
            debug!(
                "Frame {} {:?}: player {}, {} matches ({} monsters)",
                snapshot.sequence,
                snapshot.state,
                player,
                snapshot.matches.len(),
                snapshot.matches_in("monster").count()
            );
        }
    });

    let deadline = async {
        match timeout_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = deadline => info!("⏰ Timeout reached"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("⚠️ Ctrl-C handler failed: {}", e);
            }
            info!("🛑 Interrupted");
        }
    }

    // the loop may already be gone if its channel closed
    let _ = cmd_tx.send(AutomationCommand::Stop).await;
    if let Err(e) = loop_handle.await {
        error!("❌ Capture loop task failed: {}", e);
    }
    Ok(())
}

#[cfg(feature = "screen-capture")]
fn run_live(config: AppConfig, timeout_secs: Option<u64>) -> Result<(), RunError> {
    use minimap_autoplay::capture::{ScreenSource, TitleWindowLocator};

    let window = TitleWindowLocator::new(config.capture.window_titles.clone());
    block_on_loop(ScreenSource::new(), window, config, timeout_secs)
}

#[cfg(not(feature = "screen-capture"))]
fn run_live(_config: AppConfig, _timeout_secs: Option<u64>) -> Result<(), RunError> {
    Err(CaptureError::Unsupported.into())
}

#[cfg(feature = "screen-capture")]
fn screenshot(config: &AppConfig, output: Option<&Path>) -> Result<(), RunError> {
    use minimap_autoplay::capture::{ScreenSource, TitleWindowLocator};

    let output = output.unwrap_or(Path::new("screenshot.png"));
    let region = TitleWindowLocator::new(config.capture.window_titles.clone())
        .find_game_window()
        .unwrap_or_else(|| {
            warn!("⚠️ Game window not found, capturing the fallback region");
            config.capture.fallback_region
        });

    // independent of any running capture loop
    let frame = ScreenSource::new().capture(region)?;
    frame.image().save(output).map_err(|source| CaptureError::ImageSave {
        path: output.to_path_buf(),
        source,
    })?;
    println!(
        "✅ Screenshot {}x{} saved to {}",
        frame.width(),
        frame.height(),
        output.display()
    );
    Ok(())
}

#[cfg(not(feature = "screen-capture"))]
fn screenshot(_config: &AppConfig, _output: Option<&Path>) -> Result<(), RunError> {
    Err(CaptureError::Unsupported.into())
}
