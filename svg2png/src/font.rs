//! The font catalog available to the renderer.

use core::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use resvg::usvg::fontdb::Database;

/// The font file loaded at startup when nothing else is configured.
pub const DEFAULT_FONT_FILE: &str = "Arimo-Regular.ttf";

/// Which fonts to load into the catalog.
#[derive(Debug, Clone)]
pub struct FontSettings {
    /// The directory holding the font file. If this is `None`, no font file is loaded.
    pub directory: Option<PathBuf>,
    /// The name of the font file inside `directory`.
    pub file_name: String,
    /// Whether to load the fonts installed on the host as well.
    pub system_fonts: bool,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: DEFAULT_FONT_FILE.to_string(),
            system_fonts: true,
        }
    }
}

/// The set of fonts available for text in SVG documents.
///
/// The catalog is built exactly once, before any request is served, and cannot be
/// changed afterwards. Clones share the same underlying font database.
#[derive(Clone)]
pub struct FontCatalog {
    database: Arc<Database>,
}

impl FontCatalog {
    /// Build the catalog.
    ///
    /// Failing to load the configured font file is not fatal: a warning is logged
    /// and documents fall back to whatever other fonts are available.
    pub fn init(settings: &FontSettings) -> Self {
        let (catalog, warning) = Self::load(settings);

        if let Some(warning) = warning {
            warn!("{warning}");
        }

        info!("font catalog initialized with {} faces", catalog.len());

        catalog
    }

    /// A catalog without any fonts.
    pub fn empty() -> Self {
        Self {
            database: Arc::new(Database::new()),
        }
    }

    pub(crate) fn load(settings: &FontSettings) -> (Self, Option<FontLoadWarning>) {
        let mut database = Database::new();

        if settings.system_fonts {
            database.load_system_fonts();
            debug!("loaded {} system font faces", database.len());
        }

        let warning = match &settings.directory {
            Some(directory) => register(&mut database, &directory.join(&settings.file_name)).err(),
            None => {
                debug!("no font directory configured");
                None
            }
        };

        let catalog = Self {
            database: Arc::new(database),
        };

        (catalog, warning)
    }

    /// The number of font faces in the catalog.
    pub fn len(&self) -> usize {
        self.database.len()
    }

    /// Whether the catalog contains no fonts at all.
    pub fn is_empty(&self) -> bool {
        self.database.is_empty()
    }

    pub(crate) fn database(&self) -> Arc<Database> {
        Arc::clone(&self.database)
    }
}

impl fmt::Debug for FontCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCatalog")
            .field("faces", &self.len())
            .finish()
    }
}

fn register(database: &mut Database, path: &Path) -> Result<(), FontLoadWarning> {
    let before = database.len();

    database
        .load_font_file(path)
        .map_err(|err| FontLoadWarning {
            path: path.to_path_buf(),
            reason: FontLoadFailure::Io(err),
        })?;

    // Unparsable files are silently skipped by the database.
    if database.len() == before {
        return Err(FontLoadWarning {
            path: path.to_path_buf(),
            reason: FontLoadFailure::NoFaces,
        });
    }

    debug!(
        "registered {} faces from {}",
        database.len() - before,
        path.display()
    );

    Ok(())
}

/// A font file that could not be registered at startup.
#[derive(Debug)]
pub struct FontLoadWarning {
    path: PathBuf,
    reason: FontLoadFailure,
}

#[derive(Debug)]
enum FontLoadFailure {
    Io(io::Error),
    NoFaces,
}

impl FontLoadWarning {
    /// The path of the font file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for FontLoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FontLoadFailure::Io(err) => {
                write!(f, "failed to load font {}: {err}", self.path.display())
            }
            FontLoadFailure::NoFaces => {
                write!(f, "no usable font faces in {}", self.path.display())
            }
        }
    }
}

impl core::error::Error for FontLoadWarning {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.reason {
            FontLoadFailure::Io(err) => Some(err),
            FontLoadFailure::NoFaces => None,
        }
    }
}
