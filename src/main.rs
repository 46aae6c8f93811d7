use a64_multicolor::cli::{self, Args, Command};
use a64_multicolor::config::Config;
use clap::Parser;

fn load_config(args: &Args) -> Config {
    // If --config is specified, require the file to exist
    let result = match args.config {
        Some(ref path) => Config::load_from_explicit(path),
        None => Config::load(None),
    };
    match result {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config file: {}", e);
            eprintln!("Using default settings.\n");
            Config::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let result = match args.command {
        Command::Encode(ref encode_args) => {
            let config = load_config(&args);
            if let Err(e) = cli::setup_ctrlc_handler() {
                log::warn!("Failed to install Ctrl+C handler: {}", e);
            }
            cli::run_encode(encode_args, &config).map(|_| ())
        }
        Command::Info { lifetime, mode } => {
            let config = load_config(&args);
            cli::show_info(&config, lifetime, mode);
            Ok(())
        }
        Command::Config { ref action } => {
            cli::handle_config_action(action.clone(), args.config.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
