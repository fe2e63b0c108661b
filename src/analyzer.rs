use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use phenomatch_core::{Category, Embedding};
use serde::Deserialize;
use std::io::{self, Cursor, Write};
use std::process::{Command, Stdio};
use std::thread;

use crate::config::AnalyzerConfig;

/// What the face model reports for the most prominent face.
#[derive(Debug, Clone)]
pub struct FaceAnalysis {
    pub category: Category,
    /// Confidence of `category`, in `[0, 1]`.
    pub confidence: f32,
    pub embedding: Embedding,
    pub bbox: Option<[f32; 4]>, // x, y, w, h
}

/// Face detection + embedding. `Ok(None)` means no face was found.
pub trait FaceAnalyzer {
    fn analyze(&mut self, image: &DynamicImage) -> Result<Option<FaceAnalysis>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Detection {
    gender: String,
    gender_probability: f32,
    descriptor: Vec<f32>,
    #[serde(rename = "box")]
    bbox: Option<[f32; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Response {
    Face(Detection),
    #[allow(dead_code)]
    NoFace { face: Option<()> },
}

/// Parse the analyzer's JSON answer.
pub fn parse_response(raw: &str) -> Result<Option<FaceAnalysis>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    let detection = match serde_json::from_str::<Response>(raw).context("parsing analyzer output")? {
        Response::Face(d) => d,
        Response::NoFace { .. } => return Ok(None),
    };
    let category = detection
        .gender
        .parse::<Category>()
        .map_err(anyhow::Error::msg)?;
    if detection.descriptor.is_empty() {
        anyhow::bail!("analyzer returned an empty descriptor");
    }
    Ok(Some(FaceAnalysis {
        category,
        confidence: detection.gender_probability,
        embedding: Embedding::new(detection.descriptor),
        bbox: detection.bbox,
    }))
}

/// Runs an external face model as a child process.
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(cfg: &AnalyzerConfig) -> Result<Self> {
        if cfg.program.is_empty() {
            anyhow::bail!("no analyzer configured; set [analyzer] program in the config file");
        }
        Ok(Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
        })
    }
}

impl FaceAnalyzer for CommandAnalyzer {
    fn analyze(&mut self, image: &DynamicImage) -> Result<Option<FaceAnalysis>> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("encoding image for analyzer")?;

        log::debug!("running analyzer {} ({} bytes)", self.program, png.len());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("starting analyzer {}", self.program))?;

        // Stdin is fed from its own thread while stdout/stderr are drained.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || stdin.write_all(&png))
        });
        let output = child.wait_with_output().context("waiting for analyzer")?;
        let written = match writer {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow::anyhow!("analyzer input thread panicked"))?,
            None => Ok(()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "analyzer failed (code {:?}): {}",
                output.status.code(),
                stderr.trim()
            );
        }
        match written {
            // The child answered without reading the whole image.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("analyzer closed stdin early")
            }
            other => other.context("sending image to analyzer")?,
        }
        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}
