//! Candidate scoring helpers shared by the matchers.

use crate::catalog::TargetCandidate;
use crate::similarity::normalize;

/// A candidate with its fuzzy score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: TargetCandidate,
    pub score: f64,
}

/// Whether `artist` names the candidate's primary artist, or failing that,
/// any of its credited artists (after normalization).
pub fn artist_matches(artist: &str, candidate: &TargetCandidate) -> bool {
    let wanted = normalize(artist);
    if wanted.is_empty() {
        return false;
    }

    if candidate
        .primary_artist()
        .is_some_and(|primary| normalize(primary) == wanted)
    {
        return true;
    }

    candidate.artists.iter().any(|a| normalize(a) == wanted)
}

/// Score every candidate and sort best first.
///
/// The sort is stable, so equal scores keep catalog search order.
pub fn rank<F>(candidates: Vec<TargetCandidate>, score: F) -> Vec<ScoredCandidate>
where
    F: Fn(&TargetCandidate) -> f64,
{
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| ScoredCandidate {
            score: score(&candidate),
            candidate,
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_matches_primary_then_full_list() {
        let candidate = TargetCandidate::new(
            "t1",
            "Under Pressure",
            vec!["Queen".to_string(), "David Bowie".to_string()],
        );

        assert!(artist_matches("QUEEN", &candidate));
        assert!(artist_matches("david bowie", &candidate));
        assert!(!artist_matches("Freddie Mercury", &candidate));
        assert!(!artist_matches("", &candidate));
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let candidates = vec![
            TargetCandidate::new("a", "x", vec![]),
            TargetCandidate::new("b", "xx", vec![]),
            TargetCandidate::new("c", "x", vec![]),
        ];

        let ranked = rank(candidates, |c| if c.name == "x" { 0.8 } else { 0.9 });
        let ids: Vec<_> = ranked.iter().map(|s| s.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
