use clap::{Parser, Subcommand};
use std::path::PathBuf;

use picam_panel::capability;
use picam_panel::config::PanelConfig;
use picam_panel::controller::Controller;
use picam_panel::pointer::GlobalPointer;
use picam_panel::process;
use picam_panel::settings::Settings;
use picam_panel::store;

/// picam-panel: pointer-driven control panel for a Raspberry Pi camera
#[derive(Parser)]
#[command(name = "picam-panel")]
#[command(version, about = "Pointer-driven control panel for a Raspberry Pi camera")]
#[command(long_about = "Drive libcamera capture tools from a touchscreen or mouse: \
    live preview, stills, video and timelapse sequences, with every exposure, \
    color and format parameter adjustable from a fixed control grid.")]
struct Cli {
    /// Custom config file path (default: ~/.config/picam-panel/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the attached camera, start the preview and run the panel
    Start,

    /// Probe the attached camera and print what was detected
    Probe,

    /// Print the resolved configuration
    ShowConfig,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let panel = match load_panel(cli.config) {
        Ok(panel) => panel,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => {
            if let Err(message) = run_start(panel) {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
        }
        Commands::Probe => {
            if let Err(message) = run_probe(panel) {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
        }
        Commands::ShowConfig => match toml::to_string_pretty(&panel) {
            Ok(rendered) => print!("{}", rendered),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Load the panel config; an explicitly requested file must exist, the
/// default location may be absent.
fn load_panel(path: Option<PathBuf>) -> Result<PanelConfig, String> {
    match path {
        Some(path) => PanelConfig::load_from_explicit(path).map_err(|e| e.to_string()),
        None => PanelConfig::load(None).map_err(|e| e.to_string()),
    }
}

fn run_start(panel: PanelConfig) -> Result<(), String> {
    let cap = capability::detect(&panel).map_err(|e| e.to_string())?;

    // A missing record means first run: seed it with the defaults. A present
    // but unreadable record is a configuration error, never a silent reset.
    let state_file = panel.paths.state_file.clone();
    let mut settings = if state_file.exists() {
        let record = store::load(&state_file).map_err(|e| e.to_string())?;
        Settings::from_record(&record, panel.preview.width, panel.preview.height)
    } else {
        let settings = Settings::defaults(panel.preview.width, panel.preview.height);
        store::save(&state_file, &settings.to_record()).map_err(|e| e.to_string())?;
        settings
    };
    settings.reconcile(&cap);

    if let Err(e) = process::setup_interrupt_handler() {
        log::warn!("could not set up Ctrl+C handler: {}", e);
    }

    print_startup_status(&panel, &cap, &settings);

    let mut pointer = GlobalPointer::new();
    if pointer.start().is_err() {
        log::warn!("could not start the pointer listener; only Ctrl+C will work");
    }

    let mut controller = Controller::new(settings, cap, panel);
    controller.run(&mut pointer);

    println!("Panel stopped.");
    Ok(())
}

fn run_probe(panel: PanelConfig) -> Result<(), String> {
    let cap = capability::detect(&panel).map_err(|e| e.to_string())?;
    println!("Camera:       {}", cap.model.label());
    println!("Sensor:       {}x{}", cap.native_width, cap.native_height);
    println!("Max exposure: {}s", cap.max_shutter_secs);
    println!("Autofocus:    {}", if cap.has_autofocus { "yes" } else { "no" });
    Ok(())
}

/// Display formatted startup status showing current settings
fn print_startup_status(panel: &PanelConfig, cap: &picam_panel::capability::CameraCapability, settings: &Settings) {
    println!();
    println!("picam-panel v{}", env!("CARGO_PKG_VERSION"));
    println!("  Camera:    {}", cap.model.label());
    println!(
        "  Preview:   {}x{}",
        panel.preview.width, panel.preview.height
    );
    println!(
        "  Exposure:  {} ({})",
        picam_panel::settings::MODES[settings.mode as usize],
        settings.shutter_label()
    );
    println!("  Pictures:  {}", panel.paths.pictures_dir.display());
    println!("  Videos:    {}", panel.paths.videos_dir.display());
    println!();
}
