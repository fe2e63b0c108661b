use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Predictions at or above this confidence are accepted without asking.
pub const AUTO_ACCEPT_CONFIDENCE: f32 = 0.5;

/// Which of an entry's two stored embeddings (and image variant) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Male,
    Female,
}

impl Category {
    /// Index into an entry's stored embeddings.
    pub fn slot(self) -> usize {
        match self {
            Category::Male => 0,
            Category::Female => 1,
        }
    }

    /// Suffix used in image filenames.
    pub fn suffix(self) -> char {
        match self {
            Category::Male => 'm',
            Category::Female => 'f',
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Category::Male => Category::Female,
            Category::Female => Category::Male,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Male => "male",
            Category::Female => "female",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Male => "Male",
            Category::Female => "Female",
        })
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Category::Male),
            "female" | "f" => Ok(Category::Female),
            other => Err(format!("unknown category label: {other}")),
        }
    }
}

/// Asks the user whether a low-confidence prediction is right.
pub trait Confirm {
    fn confirm(&mut self, predicted: Category, confidence: f32) -> std::io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(Category, f32) -> std::io::Result<bool>,
{
    fn confirm(&mut self, predicted: Category, confidence: f32) -> std::io::Result<bool> {
        self(predicted, confidence)
    }
}

pub fn prompt_text(predicted: Category, confidence: f32) -> String {
    format!(
        "The program thinks you are {} with {}% confidence. Is this correct?",
        predicted.label(),
        (confidence * 100.0).round()
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryGate {
    pub auto_accept: f32,
}

impl Default for CategoryGate {
    fn default() -> Self {
        Self {
            auto_accept: AUTO_ACCEPT_CONFIDENCE,
        }
    }
}

impl CategoryGate {
    /// Accept a confident prediction, otherwise ask and invert on rejection.
    pub fn resolve(
        &self,
        predicted: Category,
        confidence: f32,
        confirm: &mut dyn Confirm,
    ) -> Result<Category> {
        if confidence >= self.auto_accept {
            log::debug!("auto-accepted {} at {:.3}", predicted, confidence);
            return Ok(predicted);
        }
        let accepted = confirm
            .confirm(predicted, confidence)
            .map_err(Error::Prompt)?;
        if accepted {
            Ok(predicted)
        } else {
            log::info!("prediction {} rejected, using {}", predicted, predicted.opposite());
            Ok(predicted.opposite())
        }
    }
}

/// [`CategoryGate::resolve`] with the default threshold.
pub fn confirm_or_invert(
    predicted: Category,
    confidence: f32,
    confirm: &mut dyn Confirm,
) -> Result<Category> {
    CategoryGate::default().resolve(predicted, confidence, confirm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_asked(_: Category, _: f32) -> std::io::Result<bool> {
        panic!("prompt should not be shown");
    }

    #[test]
    fn test_auto_accept_at_threshold() {
        let got = confirm_or_invert(Category::Female, 0.5, &mut never_asked).unwrap();
        assert_eq!(got, Category::Female);
    }

    #[test]
    fn test_low_confidence_accepted() {
        let mut asked = 0;
        let mut yes = |_: Category, _: f32| -> std::io::Result<bool> {
            asked += 1;
            Ok(true)
        };
        let got = confirm_or_invert(Category::Male, 0.49, &mut yes).unwrap();
        assert_eq!(got, Category::Male);
        assert_eq!(asked, 1);
    }

    #[test]
    fn test_low_confidence_rejected_inverts() {
        let mut no = |_: Category, _: f32| -> std::io::Result<bool> { Ok(false) };
        let got = confirm_or_invert(Category::Male, 0.2, &mut no).unwrap();
        assert_eq!(got, Category::Female);
    }

    #[test]
    fn test_nan_confidence_asks() {
        let mut no = |_: Category, _: f32| -> std::io::Result<bool> { Ok(false) };
        let got = confirm_or_invert(Category::Female, f32::NAN, &mut no).unwrap();
        assert_eq!(got, Category::Male);
    }

    #[test]
    fn test_prompt_failure() {
        let mut broken = |_: Category, _: f32| -> std::io::Result<bool> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "closed"))
        };
        let err = confirm_or_invert(Category::Male, 0.1, &mut broken).unwrap_err();
        assert!(matches!(err, Error::Prompt(_)));
    }

    #[test]
    fn test_parse_and_suffix() {
        assert_eq!("Female".parse::<Category>().unwrap(), Category::Female);
        assert_eq!("m".parse::<Category>().unwrap().suffix(), 'm');
        assert!("other".parse::<Category>().is_err());
        assert_eq!(
            prompt_text(Category::Male, 0.424),
            "The program thinks you are male with 42% confidence. Is this correct?"
        );
    }
}
