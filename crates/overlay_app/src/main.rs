mod logging;
mod persistence;
mod session;

use std::path::PathBuf;

use overlay_logging::overlay_warn;

const SETTINGS_FILENAME: &str = ".overlay_settings.ron";

fn main() {
    logging::initialize(logging::LogDestination::Terminal);

    let settings_path = PathBuf::from(SETTINGS_FILENAME);
    let settings = persistence::load_settings(&settings_path);
    if !settings_path.exists() {
        // Write the defaults so there is a file to edit.
        if let Err(err) = persistence::save_settings(&settings_path, &settings) {
            overlay_warn!("Failed to write default settings: {}", err);
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    if std::env::args().any(|arg| arg == "--check") {
        runtime.block_on(session::check_credentials(&settings));
        return;
    }
    runtime.block_on(session::run_demo(settings));
}
