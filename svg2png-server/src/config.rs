//! Command line and environment configuration.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

use clap::Parser;
use svg2png::{DEFAULT_FONT_FILE, DecodeSettings, FontSettings, RenderSettings};

/// Configuration of the conversion service.
///
/// Every option can also be set through the environment variable listed in its help.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "svg2png-server",
    version,
    about = "Converts SVG documents into PNG images over HTTP.",
    args_override_self = true
)]
pub struct Config {
    /// The socket address to listen on.
    #[arg(long, env = "SVG2PNG_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// The path the conversion endpoint is mounted at.
    #[arg(long, env = "SVG2PNG_PATH", default_value = "/SVG2PNGServlet")]
    pub path: String,

    /// The directory containing the font to register at startup.
    #[arg(long, env = "SVG2PNG_FONTS_DIR")]
    pub fonts_dir: Option<PathBuf>,

    /// The name of the font file inside the fonts directory.
    #[arg(long, env = "SVG2PNG_FONT_FILE", default_value = DEFAULT_FONT_FILE)]
    pub font_file: String,

    /// Do not load the fonts installed on the host.
    #[arg(long, env = "SVG2PNG_NO_SYSTEM_FONTS")]
    pub no_system_fonts: bool,

    /// The font family for text that does not name one.
    #[arg(long, env = "SVG2PNG_DEFAULT_FONT_FAMILY", default_value = "Arimo")]
    pub default_font_family: String,

    /// The number of worker threads. Defaults to the available parallelism.
    #[arg(long, env = "SVG2PNG_WORKERS")]
    pub workers: Option<NonZeroUsize>,

    /// The largest accepted request body, in bytes.
    #[arg(long, env = "SVG2PNG_MAX_BODY_SIZE", default_value_t = DecodeSettings::default().max_body_size)]
    pub max_body_size: usize,

    /// The largest width or height of a produced image, in pixels.
    #[arg(long, env = "SVG2PNG_MAX_DIMENSION", default_value_t = RenderSettings::default().max_dimension)]
    pub max_dimension: u32,
}

impl Config {
    /// The fonts to load at startup.
    pub fn fonts(&self) -> FontSettings {
        FontSettings {
            directory: self.fonts_dir.clone(),
            file_name: self.font_file.clone(),
            system_fonts: !self.no_system_fonts,
        }
    }

    /// The settings for the renderer.
    pub fn render(&self) -> RenderSettings {
        RenderSettings {
            max_dimension: self.max_dimension,
            default_font_family: self.default_font_family.clone(),
        }
    }

    /// The settings for decoding requests.
    pub fn decode(&self) -> DecodeSettings {
        DecodeSettings {
            max_body_size: self.max_body_size,
        }
    }

    /// The number of worker threads to run.
    pub fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| thread::available_parallelism().ok())
            .map_or(4, NonZeroUsize::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["svg2png-server"]).unwrap();

        assert_eq!(config.path, "/SVG2PNGServlet");
        assert_eq!(config.font_file, "Arimo-Regular.ttf");
        assert!(config.fonts().system_fonts);
        assert_eq!(config.fonts().directory, None);
        assert_eq!(config.decode().max_body_size, 32 * 1024 * 1024);
        assert_eq!(config.render().max_dimension, 16384);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "svg2png-server",
            "--listen",
            "127.0.0.1:9000",
            "--fonts-dir",
            "/usr/share/fonts/arimo",
            "--no-system-fonts",
            "--workers",
            "3",
            "--max-dimension",
            "512",
        ])
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.fonts().directory,
            Some(PathBuf::from("/usr/share/fonts/arimo"))
        );
        assert!(!config.fonts().system_fonts);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.render().max_dimension, 512);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(Config::try_parse_from(["svg2png-server", "--workers", "0"]).is_err());
    }
}
