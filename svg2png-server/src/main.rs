//! Entry point of the SVG to PNG conversion server.

use std::process::ExitCode;

use clap::Parser;
use log::error;
use svg2png::FontCatalog;
use svg2png_server::{Config, Server};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // Fonts are registered once, before the first request can come in.
    let fonts = FontCatalog::init(&config.fonts());

    let server = match Server::bind(&config, fonts) {
        Ok(server) => server,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    server.run();

    ExitCode::SUCCESS
}
