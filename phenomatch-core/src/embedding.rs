use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use ndarray::{Array1, Zip};

use crate::error::{EntryDecodeError, ScoreError};

/// Standard alphabet, trailing `=` optional. Encoding always pads.
const DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Face embedding, either a stored reference or a live query.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Array1<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            vector: Array1::from_vec(values),
        }
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Parse the stored textual form: base64 of consecutive little-endian f32s.
    pub fn from_base64(encoded: &str) -> Result<Self, EntryDecodeError> {
        let values = decode_embedding(encoded)?;
        if values.is_empty() {
            return Err(EntryDecodeError::Empty);
        }
        Ok(Self::new(values))
    }

    pub fn to_base64(&self) -> String {
        encode_embedding(&self.vector.to_vec())
    }
}

/// Decode base64 text into floats. An empty string yields an empty vector.
pub fn decode_embedding(encoded: &str) -> Result<Vec<f32>, EntryDecodeError> {
    let bytes = DECODER.decode(encoded.trim())?;
    if bytes.len() % 4 != 0 {
        return Err(EntryDecodeError::Misaligned(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn encode_embedding(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

fn dot(a: &Array1<f32>, b: &Array1<f32>) -> f64 {
    // Accumulate in f64; stored vectors are f32 but the sum over 128 terms drifts otherwise.
    Zip::from(a)
        .and(b)
        .fold(0.0_f64, |acc, &x, &y| acc + f64::from(x) * f64::from(y))
}

/// Cosine similarity `dot(a, b) / sqrt(dot(a, a) * dot(b, b))`.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> Result<f64, ScoreError> {
    if a.len() != b.len() {
        return Err(ScoreError::VectorDimension {
            expected: b.len(),
            actual: a.len(),
        });
    }
    let magnitude = (dot(&a.vector, &a.vector) * dot(&b.vector, &b.vector)).sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(ScoreError::ZeroMagnitude);
    }
    Ok(dot(&a.vector, &b.vector) / magnitude)
}

/// Cosine similarity scaled to a percentage. Not clamped.
pub fn similarity_percent(reference: &Embedding, query: &Embedding) -> Result<f64, ScoreError> {
    cosine_similarity(reference, query).map(|c| c * 100.0)
}
