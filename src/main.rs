#![windows_subsystem = "windows"]

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--print-config") {
        let config = blitcore::config::Config::default();
        match toml::to_string_pretty(&config) {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if args.iter().any(|a| a == "--check-config") {
        match blitcore::config::Config::try_load() {
            Ok(_) => println!("{}: ok", blitcore::config::config_path().display()),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if args.iter().any(|a| a == "--write-config") {
        match blitcore::config::Config::load().save() {
            Ok(path) => println!("wrote {}", path.display()),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("blitcore {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("blitcore {}", env!("CARGO_PKG_VERSION"));
        println!("Batched 2D renderer demo\n");
        println!("USAGE:");
        println!("    blitcore [OPTIONS]\n");
        println!("OPTIONS:");
        println!("    --print-config    Print the default configuration to stdout");
        println!("    --check-config    Parse the config file and report errors");
        println!("    --write-config    Write the current configuration to the config file");
        println!("    --version, -V     Print version information");
        println!("    --help, -h        Print this help message");
        return;
    }

    if let Err(e) = blitcore::init_logging(log::LevelFilter::Info) {
        eprintln!("logging unavailable: {e}");
    }
    let config = blitcore::config::Config::load();
    log::set_max_level(config.debug.level_filter());

    if let Err(e) = blitcore::app::App::run(config) {
        log::logger().flush();
        let _ = std::fs::write("blitcore_error.log", format!("{e}\n{e:?}"));
        eprintln!("error: {e}");
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("blitcore")
            .set_description(startup_failure_text(&e))
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
        std::process::exit(1);
    }
}

/// Body of the fatal start-up dialog.
fn startup_failure_text(error: &impl std::fmt::Display) -> String {
    format!(
        "Failed to start the renderer:\n\n{error}\n\nDetails were written to blitcore_error.log."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failure_text_names_the_error() {
        let err = blitcore::InitError::NoSurfaceFormat;
        let text = startup_failure_text(&err);
        assert!(text.starts_with("Failed to start the renderer:"));
        assert!(text.contains(&err.to_string()));
        assert!(text.ends_with("blitcore_error.log."));
    }
}
