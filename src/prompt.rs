use dialoguer::Confirm as Dialog;
use phenomatch_core::category::prompt_text;
use phenomatch_core::{Category, Confirm};

/// Terminal yes/no prompt for low-confidence predictions.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, predicted: Category, confidence: f32) -> std::io::Result<bool> {
        Dialog::new()
            .with_prompt(prompt_text(predicted, confidence))
            .default(true)
            .interact()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

/// Answers every prompt the same way. Used with `--yes`/`--no` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, predicted: Category, confidence: f32) -> std::io::Result<bool> {
        log::info!(
            "{} -> {}",
            prompt_text(predicted, confidence),
            if self.0 { "yes" } else { "no" }
        );
        Ok(self.0)
    }
}
