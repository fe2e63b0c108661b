use phenomatch_core::{DecodeReport, Leaderboard, ScoreReport};
use std::fmt::Write;

/// Plain-text leaderboard: the top match, then every ranked row.
pub fn leaderboard_text(board: &Leaderboard) -> String {
    let mut out = String::new();
    let top = &board.top;
    let _ = writeln!(out, "Top Match Results");
    let _ = writeln!(
        out,
        "  {} {}% similarity\n    {}\n    {}",
        top.display_name, top.similarity_percent, top.image_path_hint, top.detail_url_hint
    );
    let _ = writeln!(out);
    for (i, m) in board.matches.iter().enumerate() {
        let marker = if m.is_primary { "*" } else { " " };
        let _ = writeln!(
            out,
            "{:>3}. {}{:<24} {:>4}%  {}",
            i + 1,
            marker,
            m.display_name,
            m.similarity_percent,
            m.detail_url_hint
        );
    }
    let _ = write!(out, "Gender: {} | Results ready", board.category);
    out
}

pub fn decode_report_text(report: &DecodeReport) -> String {
    let mut out = String::new();
    for issue in &report.issues {
        let _ = match issue.category {
            Some(category) => writeln!(
                out,
                "  {}: {} embedding: {}",
                issue.location,
                category.label(),
                issue.error
            ),
            None => writeln!(out, "  {}: entry skipped: {}", issue.location, issue.error),
        };
    }
    out
}

pub fn score_report_text(report: &ScoreReport) -> String {
    let mut out = format!("{} entries scored", report.scored);
    if !report.issues.is_empty() {
        let _ = write!(out, ", {} skipped", report.issues.len());
        for issue in &report.issues {
            let _ = write!(out, "\n  {} ({}): {}", issue.location, issue.name, issue.error);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenomatch_core::ranking::{RankedEntry, RankedResult};
    use phenomatch_core::{Category, LinkLayout};

    #[test]
    fn test_leaderboard_text() {
        let ranked = RankedResult::new(vec![
            RankedEntry {
                name: "Nordid".into(),
                score: 81.5,
                is_primary: true,
                group: 2,
            },
            RankedEntry {
                name: "Baltid".into(),
                score: 77.2,
                is_primary: false,
                group: 2,
            },
        ])
        .unwrap();
        let board = Leaderboard::new(&ranked, Category::Female, &LinkLayout::default());
        let text = leaderboard_text(&board);
        assert!(text.contains("Nordid 82% similarity"));
        assert!(text.contains("faces_lowres/basic/nordidf.jpg"));
        assert!(text.contains("  2.  Baltid"));
        assert!(text.ends_with("Gender: Female | Results ready"));
    }

    #[test]
    fn test_decode_report_text() {
        let raw = serde_json::json!([[["Broken", "!!!", "AACAPw=="], [["Short", "AACAPw=="]]]]);
        let (_, report) = phenomatch_core::catalog::decode(&raw).unwrap();
        let text = decode_report_text(&report);
        assert!(text.contains("group 0 primary: male embedding:"));
        assert!(text.contains("group 0 nested 0: entry skipped: expected [name, embedding, embedding], got list of 2"));
    }
}
