use clap::Parser;

use sift_cam::cli::{handle_config_action, list_cameras, Args, Command, StartupOptions};
use sift_cam::config::Config;
use sift_cam::{gui, shutdown};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let options = StartupOptions::resolve(&args, &config);

    match args.command {
        Some(Command::ListCameras) => {
            list_cameras();
            return Ok(());
        }
        Some(Command::Config { action }) => {
            handle_config_action(action, &options, args.config.as_deref());
            return Ok(());
        }
        None => {}
    }

    if let Err(e) = shutdown::setup_ctrlc_handler() {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }

    log::info!(
        "Starting with camera {} at {} ({} fps display)",
        options.device_index,
        options.resolution,
        options.tick_hz
    );
    gui::run(options)
}
