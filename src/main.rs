use clap::Parser;
use imagepress::config::Config;
use imagepress::server::{build_server, RunOptions};
use std::path::PathBuf;

/// imagepress - image upload and transform service built on Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "imagepress")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    let config = Config::load_or_default(&args.config)
        .unwrap_or_else(|e| fail("Failed to load configuration", e));

    imagepress::logging::init_subscriber(&config.logging)
        .unwrap_or_else(|e| fail("Failed to initialize logging subsystem", e));

    if !args.config.exists() {
        tracing::warn!(
            config_file = %args.config.display(),
            "Configuration file not found, using defaults"
        );
    }

    config
        .validate()
        .unwrap_or_else(|e| fail("Invalid configuration", e));
    config
        .storage
        .ensure_image_dir()
        .unwrap_or_else(|e| fail("Image directory unusable", e));

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        image_dir = %config.storage.image_dir.display(),
        fixed_contrast = ?config.image.fixed_contrast,
        "Configuration loaded successfully"
    );

    if args.test {
        tracing::info!("Configuration test passed");
        return;
    }

    let options = RunOptions {
        daemon: args.daemon,
        test: args.test,
        upgrade: args.upgrade,
    };
    let server = build_server(&config, options)
        .unwrap_or_else(|e| fail("Failed to create server", e));

    tracing::info!(address = %config.listen_address(), "Starting imagepress");

    // Blocks until shutdown
    server.run_forever();
}
