/// Replays a recorded annotation session and prints the final state as JSON.
///
/// Usage: `vat-replay <script.json> [config.json]`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;
    use vat::replay::{self, ReplayError, Script};

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(script_path) = args.first() else {
        eprintln!("Usage: vat-replay <script.json> [config.json]");
        std::process::exit(2);
    };

    let config = match replay::load_config(args.get(1).map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let result = std::fs::read_to_string(script_path)
        .map_err(ReplayError::from)
        .and_then(|json| Script::from_json(&json))
        .and_then(|script| replay::run(&config, &script))
        .and_then(|state| state.to_json().map_err(ReplayError::from));

    match result {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Replay error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
