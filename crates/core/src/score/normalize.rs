use crate::score::{
    EmotionScores, ScoreError, ScoringResult, DOMINANCE_FLOOR, NEUTRAL_CEILING, NEUTRAL_LABEL,
};

/// Rewrites the model's free-text score report into a self-consistent
/// distribution: neutral capped at [`NEUTRAL_CEILING`], values rescaled to
/// total 100, and the dominant emotion forced up to [`DOMINANCE_FLOOR`].
///
/// The model also declares a winner line, but models routinely name a label
/// that is not the actual maximum, so the declared winner is only logged and
/// the returned `winner` is always the recomputed maximum.
pub fn normalize(raw_text: &str) -> Result<ScoringResult, ScoreError> {
    let extraction = extract_scores(raw_text);
    let mut scores = extraction.scores;
    if scores.is_empty() {
        return Err(ScoreError::NoScores);
    }

    clamp_neutral(&mut scores);
    rescale_to_hundred(&mut scores);
    let winner = enforce_dominance_floor(&mut scores);

    if let Some(declared) = extraction.declared_winner {
        if !declared.eq_ignore_ascii_case(&winner) {
            tracing::debug!(%declared, recomputed = %winner, "overriding declared winner");
        }
    }

    Ok(ScoringResult {
        emotions: scores,
        winner,
    })
}

struct Extraction {
    scores: EmotionScores,
    declared_winner: Option<String>,
}

/// Pulls `Label: <integer>` lines and the `WINNER:` line out of the raw
/// response, ignoring any surrounding prose. Duplicate labels keep their
/// first position but take the last value.
fn extract_scores(raw_text: &str) -> Extraction {
    let mut scores = EmotionScores::new();
    let mut declared_winner = None;

    for line in raw_text.trim().lines() {
        if let Some((label, value)) = parse_score_line(line) {
            scores.set(&label, value as f64);
        } else if let Some(rest) = line.strip_prefix("WINNER:") {
            let name = rest.split(':').next().unwrap_or("").trim();
            declared_winner = Some(name.to_owned());
        }
    }

    Extraction {
        scores,
        declared_winner,
    }
}

/// Matches `<letters>:<whitespace><digits>` at line start; anything after the
/// digits is ignored. Returns the lower-cased label and the integer value.
fn parse_score_line(line: &str) -> Option<(String, u64)> {
    let label_len = line
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    if label_len == 0 {
        return None;
    }
    let rest = line[label_len..].strip_prefix(':')?.trim_start();
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    let value = rest[..digits_len].parse().ok()?;
    Some((line[..label_len].to_lowercase(), value))
}

fn clamp_neutral(scores: &mut EmotionScores) {
    let Some(neutral) = scores.get(NEUTRAL_LABEL) else {
        return;
    };
    if neutral <= NEUTRAL_CEILING {
        return;
    }

    let excess = neutral - NEUTRAL_CEILING;
    scores.set(NEUTRAL_LABEL, NEUTRAL_CEILING);

    let others = scores.len() - 1;
    if others == 0 {
        return;
    }
    let share = excess / others as f64;
    for (label, value) in scores.iter_mut() {
        if label != NEUTRAL_LABEL {
            *value += share;
        }
    }
}

/// Scales every value by `100 / total`, rounding half-up per value. Rounding
/// can leave the total a few units off 100; that drift is tolerated. An
/// all-zero extraction is left untouched and resolved by the dominance floor.
fn rescale_to_hundred(scores: &mut EmotionScores) {
    let total = scores.total();
    if total <= 0.0 {
        return;
    }
    let scale = 100.0 / total;
    for (_, value) in scores.iter_mut() {
        *value = (*value * scale).round();
    }
}

/// Finds the maximum label (first-extracted wins ties) and, if it is below
/// [`DOMINANCE_FLOOR`], boosts it to the floor while deducting an equal share
/// from every other label, never below zero. Runs after rounding, so the
/// floor check sees already-rounded values.
fn enforce_dominance_floor(scores: &mut EmotionScores) -> String {
    let mut winner = String::new();
    let mut top = f64::NEG_INFINITY;
    for (label, value) in scores.iter() {
        if value > top {
            winner = label.to_owned();
            top = value;
        }
    }

    if top < DOMINANCE_FLOOR {
        let boost = DOMINANCE_FLOOR - top;
        scores.set(&winner, DOMINANCE_FLOOR);
        let others = scores.len() - 1;
        if others > 0 {
            let reduction = boost / others as f64;
            for (label, value) in scores.iter_mut() {
                if label != winner {
                    *value = (*value - reduction).max(0.0);
                }
            }
        }
    }

    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::EMOTION_LABELS;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert_eq!(normalize(""), Err(ScoreError::NoScores));
        assert_eq!(
            normalize("the model declined to answer"),
            Err(ScoreError::NoScores)
        );
    }

    #[test]
    fn winner_line_alone_is_not_a_score() {
        assert_eq!(normalize("WINNER: Happiness"), Err(ScoreError::NoScores));
    }

    #[test]
    fn parses_scores_and_ignores_prose() {
        let result = normalize(
            "Here are the scores you asked for:\n\
             Happiness: 60\n\
             Sadness: 40\n\
             Hope this helps!",
        )
        .unwrap();
        assert_close(result.emotions.get("happiness").unwrap(), 60.0);
        assert_close(result.emotions.get("sadness").unwrap(), 40.0);
        assert_eq!(result.winner, "happiness");
    }

    #[test]
    fn duplicate_label_takes_last_value_keeps_first_position() {
        let result = normalize("Anger: 10\nFear: 50\nAnger: 50").unwrap();
        // anger ties fear at 50 but was extracted first, so it wins
        assert_eq!(result.winner, "anger");
        assert_close(result.emotions.get("anger").unwrap(), 50.0);
    }

    #[test]
    fn trailing_text_after_digits_is_ignored() {
        let result = normalize("Happiness: 70%\nSadness: 30 (roughly)").unwrap();
        assert_close(result.emotions.get("happiness").unwrap(), 70.0);
        assert_close(result.emotions.get("sadness").unwrap(), 30.0);
    }

    #[test]
    fn unknown_labels_are_carried_through() {
        let result = normalize("Boredom: 80\nHappiness: 20").unwrap();
        assert_close(result.emotions.get("boredom").unwrap(), 80.0);
        assert_eq!(result.winner, "boredom");
    }

    #[test]
    fn numeric_winner_line_parses_as_a_score_label() {
        // `WINNER: 5` satisfies the score-line pattern, which is tried first.
        let result = normalize("Happiness: 95\nWINNER: 5").unwrap();
        assert!(result.emotions.get("winner").is_some());
    }

    #[test]
    fn neutral_clamp_redistributes_excess() {
        let result = normalize("Happiness: 45\nSadness: 45\nNeutral: 30").unwrap();
        // excess 20 split across 2 others pre-scale: {55, 55, 10}, sum 120
        // scaled: 45.83 -> 46, 45.83 -> 46, 8.33 -> 8
        assert_close(result.emotions.get("neutral").unwrap(), 8.0);
        assert_close(result.emotions.get("happiness").unwrap(), 46.0);
        assert_eq!(result.winner, "happiness");
    }

    #[test]
    fn neutral_alone_is_clamped_then_rescaled_to_dominance() {
        let result = normalize("Neutral: 70").unwrap();
        // clamp to 10 with nobody to redistribute to, then scaled to 100
        assert_close(result.emotions.get("neutral").unwrap(), 100.0);
        assert_eq!(result.winner, "neutral");
    }

    #[test]
    fn worked_example_from_flat_distribution() {
        let result = normalize(
            "Happiness: 5\nSadness: 5\nAnger: 5\nFear: 5\nSurprise: 5\nDisgust: 5\nNeutral: 70\nWINNER: Neutral",
        )
        .unwrap();

        // neutral 70 -> 10, excess 60 adds 10 to each of the 6 others, so the
        // pre-round distribution is already {15 x6, neutral: 10}. All below
        // the floor, so the first-extracted 15 (happiness) is boosted to 40
        // and the rest shed 25/6 each.
        assert_eq!(result.winner, "happiness");
        assert_close(result.emotions.get("happiness").unwrap(), 40.0);
        assert_close(result.emotions.get("sadness").unwrap(), 15.0 - 25.0 / 6.0);
        assert_close(result.emotions.get("neutral").unwrap(), 10.0 - 25.0 / 6.0);

        let total = result.emotions.total();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn invariants_hold_for_arbitrary_score_lines() {
        let inputs = [
            "Happiness: 1\nSadness: 1\nNeutral: 98",
            "Anger: 3\nFear: 2\nDisgust: 2\nSurprise: 1",
            "Happiness: 100\nSadness: 100\nAnger: 100",
            "Neutral: 10\nHappiness: 90",
        ];
        for input in inputs {
            let result = normalize(input).unwrap();
            let labels = result.emotions.len() as f64;
            let total = result.emotions.total();
            assert!(
                (total - 100.0).abs() <= labels,
                "total {total} out of tolerance for {input:?}"
            );
            if let Some(neutral) = result.emotions.get(NEUTRAL_LABEL) {
                assert!(neutral <= NEUTRAL_CEILING, "neutral {neutral} for {input:?}");
            }
            let max = result
                .emotions
                .iter()
                .map(|(_, v)| v)
                .fold(f64::NEG_INFINITY, f64::max);
            assert!(max >= DOMINANCE_FLOOR, "max {max} for {input:?}");
            assert!(result.emotions.iter().all(|(_, v)| v >= 0.0));
            assert_close(result.emotions.get(&result.winner).unwrap(), max);
        }
    }

    #[test]
    fn all_zero_scores_boost_the_first_label() {
        let result = normalize("Fear: 0\nAnger: 0").unwrap();
        assert_eq!(result.winner, "fear");
        assert_close(result.emotions.get("fear").unwrap(), 40.0);
        assert_close(result.emotions.get("anger").unwrap(), 0.0);
    }

    #[test]
    fn normalizing_a_normalized_result_is_stable() {
        let first = normalize(
            "Happiness: 5\nSadness: 5\nAnger: 5\nFear: 5\nSurprise: 5\nDisgust: 5\nNeutral: 70",
        )
        .unwrap();

        let mut reserialized = String::new();
        for (label, value) in first.emotions.iter() {
            reserialized.push_str(&format!("{label}: {}\n", value.round() as i64));
        }
        reserialized.push_str(&format!("WINNER: {}\n", first.winner));

        let second = normalize(&reserialized).unwrap();
        assert_eq!(second.winner, first.winner);
        for (label, value) in first.emotions.iter() {
            let revalue = second.emotions.get(label).unwrap();
            assert!(
                (revalue - value).abs() <= 1.0,
                "{label} drifted from {value} to {revalue}"
            );
        }
    }

    #[test]
    fn display_reports_every_label_and_the_verdict() {
        let mut text = String::new();
        for (i, label) in EMOTION_LABELS.iter().enumerate() {
            let capitalized = format!(
                "{}{}",
                label[..1].to_uppercase(),
                &label[1..]
            );
            text.push_str(&format!("{capitalized}: {}\n", if i == 0 { 94 } else { 1 }));
        }
        let rendered = normalize(&text).unwrap().to_string();
        assert!(rendered.contains("happiness: 94%"));
        assert!(rendered.ends_with("Verdict: happiness"));
    }
}
