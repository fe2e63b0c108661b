use anyhow::Result;
use phenomatch_core::{
    rank, score, Catalog, Category, CategoryGate, Confirm, DecodeReport, Error as CoreError,
    Leaderboard, ScoreReport,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::FaceAnalyzer;
use crate::config::Config;
use crate::storage;

/// Ways an analysis can end without a leaderboard. `Display` is the status line.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("No image to analyze.")]
    NoImage,

    #[error("Could not read image {}: {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("No face detected. Try another image.")]
    NoFace,

    #[error("No phenotype data loaded.")]
    NoData,

    #[error("An error occurred while analyzing: {0:#}")]
    Other(#[from] anyhow::Error),
}

impl From<CoreError> for AnalyzeError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NoFaceDetected => AnalyzeError::NoFace,
            CoreError::EmptyCatalogResult => AnalyzeError::NoData,
            other => AnalyzeError::Other(other.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub category: Category,
    /// Model confidence for the predicted category.
    pub confidence: f32,
    pub leaderboard: Leaderboard,
    pub scores: ScoreReport,
}

/// A loaded catalog and the settings used to rank against it.
///
/// The catalog is only ever borrowed, so one session serves any number of
/// analyses.
pub struct Session {
    catalog: Catalog,
    decode_report: DecodeReport,
    config: Config,
}

impl Session {
    pub fn new(catalog: Catalog, config: Config) -> Self {
        Self {
            catalog,
            decode_report: DecodeReport::default(),
            config,
        }
    }

    /// Load the catalog named by `config`.
    pub fn open(config: Config) -> Result<Self> {
        let (catalog, decode_report) = storage::load_catalog(&config.catalog)?;
        Ok(Self {
            catalog,
            decode_report,
            config,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn decode_report(&self) -> &DecodeReport {
        &self.decode_report
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Image file → face → category → scores → leaderboard.
    ///
    /// `forced` skips the category gate.
    pub fn analyze(
        &self,
        image_path: &Path,
        analyzer: &mut dyn FaceAnalyzer,
        confirm: &mut dyn Confirm,
        forced: Option<Category>,
    ) -> std::result::Result<Analysis, AnalyzeError> {
        if !image_path.is_file() {
            return Err(AnalyzeError::NoImage);
        }
        let img = image::open(image_path).map_err(|source| AnalyzeError::UnreadableImage {
            path: image_path.to_path_buf(),
            source,
        })?;
        log::info!("Analyzing {} ({}x{})", image_path.display(), img.width(), img.height());

        let face = analyzer
            .analyze(&img)?
            .ok_or(CoreError::NoFaceDetected)?;
        if let Some(bbox) = face.bbox {
            log::debug!("face at {:?}", bbox);
        }

        let category = match forced {
            Some(c) => c,
            None => {
                let gate = CategoryGate {
                    auto_accept: self.config.auto_accept_confidence,
                };
                gate.resolve(face.category, face.confidence, confirm)?
            }
        };
        log::info!("Gender: {}", category);

        let (scored, scores) = score(&self.catalog, &face.embedding, category);
        let ranked = rank(&scored, &self.config.rank_options())?;
        let leaderboard = Leaderboard::new(&ranked, category, &self.config.links);

        Ok(Analysis {
            category,
            confidence: face.confidence,
            leaderboard,
            scores,
        })
    }
}
