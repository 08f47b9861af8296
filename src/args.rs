use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Capture loop against the live screen
    Live,
    /// Capture loop against a still image
    Replay(PathBuf),
    /// Match the template library once against an image
    MatchOnce(PathBuf),
    /// Capture the game window once and save it
    Screenshot,
}

#[derive(Debug)]
pub struct Args {
    pub mode: Mode,
    pub debug_mode: bool,
    pub timeout_secs: Option<u64>,
    pub config_path: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub anchors_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub categories: Vec<String>,
}

fn path_value(arg: &str, prefix: &str) -> Option<Result<PathBuf, String>> {
    let value = arg.strip_prefix(prefix)?;
    if value.is_empty() {
        Some(Err(format!("{prefix} needs a value")))
    } else {
        Some(Ok(PathBuf::from(value)))
    }
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags (without the program name). `None` means exit: help, version or a bad flag.
    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut mode: Option<Mode> = None;
        let mut parsed = Args {
            mode: Mode::Live,
            debug_mode: false,
            timeout_secs: None,
            config_path: None,
            templates_dir: None,
            anchors_dir: None,
            output: None,
            categories: Vec::new(),
        };

        for arg in args {
            let arg = arg.as_str();
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "Minimap Autoplay v{} (built {})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return None;
            } else if arg == "--debug" {
                parsed.debug_mode = true;
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot);
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => parsed.timeout_secs = Some(secs),
                    Err(_) => {
                        eprintln!("❌ Invalid timeout value: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--category=") {
                if val.is_empty() {
                    eprintln!("❌ --category= needs a value");
                    return None;
                }
                parsed.categories.push(val.to_string());
            } else {
                let path_flags = [
                    "--config=",
                    "--templates=",
                    "--anchors=",
                    "--replay=",
                    "--match=",
                    "--out=",
                ];
                let Some((flag, value)) = path_flags
                    .iter()
                    .find_map(|flag| path_value(arg, flag).map(|value| (*flag, value)))
                else {
                    eprintln!("❌ Unknown argument: {}", arg);
                    print_help();
                    return None;
                };
                let path = match value {
                    Ok(path) => path,
                    Err(message) => {
                        eprintln!("❌ {}", message);
                        return None;
                    }
                };
                match flag {
                    "--config=" => parsed.config_path = Some(path),
                    "--templates=" => parsed.templates_dir = Some(path),
                    "--anchors=" => parsed.anchors_dir = Some(path),
                    "--replay=" => mode = Some(Mode::Replay(path)),
                    "--match=" => mode = Some(Mode::MatchOnce(path)),
                    _ => parsed.output = Some(path),
                }
            }
        }

        parsed.mode = mode.unwrap_or(Mode::Live);
        Some(parsed)
    }
}

fn print_help() {
    println!("🗺️ Minimap Autoplay");
    println!();
    println!("USAGE:");
    println!("    minimap-autoplay [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)          Run the capture loop on the live screen (needs `screen-capture`)");
    println!("    --replay=PNG        Run the capture loop against a still screenshot");
    println!("    --match=PNG         Match templates once against an image and print detections");
    println!("    --out=PNG           With --match, save an annotated copy; with --screenshot, the target file");
    println!("    --category=NAME     Only match templates of this category (repeatable)");
    println!("    --screenshot, -s    Capture the game window once (default: screenshot.png)");
    println!("    --templates=DIR     Template directory (default from config: templates)");
    println!("    --anchors=DIR       Anchor image directory (default from config: assets)");
    println!("    --config=FILE       Config file (default: minimap-autoplay.json)");
    println!("    --debug             Enable debug logging");
    println!("    --timeout=N         Stop the capture loop after N seconds");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    minimap-autoplay --replay=shot.png --timeout=5 --debug");
    println!("    minimap-autoplay --match=shot.png --category=monster --out=annotated.png");
    println!("    minimap-autoplay --screenshot --out=game.png");
}
