//! Answer judgement: a lenient local comparison with an optional remote
//! fallback for answers the simple matcher cannot settle.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AppConfig;

/// Judge a submitted answer against the canonical one. The local matcher
/// accepts normalized containment in either direction; anything it rejects is
/// escalated to the remote judge when one is configured. A remote failure
/// rules the answer incorrect rather than blocking the game.
pub async fn judge_answer(
    config: &AppConfig,
    question: &str,
    canonical: &str,
    submitted: &str,
) -> bool {
    if matches_locally(canonical, submitted) {
        return true;
    }

    let Some(url) = config.judge_url.as_deref() else {
        return false;
    };

    match remote_judgement(url, question, canonical, submitted).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(error = %err, "remote answer judge unavailable; ruling incorrect");
            false
        }
    }
}

/// Lenient comparison: after normalization, either answer containing the
/// other counts as a match ("amazon" for "the amazon river").
pub fn matches_locally(canonical: &str, submitted: &str) -> bool {
    let canonical = normalize(canonical);
    let submitted = normalize(submitted);
    if canonical.is_empty() || submitted.is_empty() {
        return false;
    }

    canonical.contains(&submitted) || submitted.contains(&canonical)
}

/// Lowercase, strip punctuation, and collapse whitespace.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Serialize)]
struct JudgeRequest<'a> {
    question: &'a str,
    correct_answer: &'a str,
    submitted_answer: &'a str,
}

#[derive(Deserialize)]
struct JudgeResponse {
    is_correct: bool,
}

async fn remote_judgement(
    url: &str,
    question: &str,
    canonical: &str,
    submitted: &str,
) -> Result<bool, reqwest::Error> {
    let response = reqwest::Client::new()
        .post(url)
        .json(&JudgeRequest {
            question,
            correct_answer: canonical,
            submitted_answer: submitted,
        })
        .send()
        .await?
        .error_for_status()?
        .json::<JudgeResponse>()
        .await?;

    Ok(response.is_correct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_punctuation_and_spacing() {
        assert!(matches_locally("The Amazon River", "the amazon river"));
        assert!(matches_locally("Mount Everest", "mount  everest!"));
        assert!(matches_locally("O'Brien", "obrien"));
    }

    #[test]
    fn containment_matches_either_direction() {
        assert!(matches_locally("The Amazon River", "amazon river"));
        assert!(matches_locally("Amazon", "the amazon river"));
    }

    #[test]
    fn unrelated_or_empty_answers_do_not_match() {
        assert!(!matches_locally("The Amazon River", "the nile"));
        assert!(!matches_locally("The Amazon River", ""));
        assert!(!matches_locally("", "anything"));
        assert!(!matches_locally("The Amazon River", "?!"));
    }

    #[test]
    fn remote_verdict_uses_the_is_correct_field() {
        let verdict: JudgeResponse = serde_json::from_str(r#"{"is_correct": true}"#).unwrap();
        assert!(verdict.is_correct);
        let verdict: JudgeResponse = serde_json::from_str(r#"{"is_correct": false}"#).unwrap();
        assert!(!verdict.is_correct);
    }
}
