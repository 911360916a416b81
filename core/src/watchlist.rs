//! Watchlist screening: exact, alias, and fuzzy name matching against
//! read-only reference list snapshots.
//!
//! The screener holds only the shared snapshot and its configuration, so
//! screening many entities concurrently is safe by construction: every
//! call is side-effect-free.

use crate::config::ScreenerConfig;
use crate::error::AmlResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistType {
    Sanctions,
    Pep,
    AdverseMedia,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Passport,
    NationalId,
    TaxId,
    CompanyRegistration,
    Lei,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

/// One record from the reference list snapshot supplied by the watchlist
/// data collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub list: WatchlistType,
    pub record_id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub identifiers: Vec<WatchlistIdentifier>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
}

/// How a candidate record was matched, strongest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Identifier,
    Exact,
    Alias,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistMatch {
    pub list: WatchlistType,
    pub record_id: String,
    pub kind: MatchKind,
    pub score: f64,
    pub matched_name: String,
    /// Which fields matched, and any penalty applied.
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreeningQuery {
    pub name: String,
    pub identifier: Option<String>,
    pub identifier_kind: Option<IdentifierKind>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
}

pub struct WatchlistScreener {
    entries: Vec<WatchlistEntry>,
    config: ScreenerConfig,
}

impl WatchlistScreener {
    pub fn new(entries: Vec<WatchlistEntry>, config: ScreenerConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { entries, config })
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Screen one entity against every list in the snapshot. Results are
    /// sorted best first; ties break on record id.
    pub fn check_entity(&self, query: &ScreeningQuery) -> Vec<WatchlistMatch> {
        self.check_filtered(query, None)
    }

    /// Screen a batch of entities against the named lists. Each entity is
    /// screened independently.
    pub fn check_batch(
        &self,
        queries: &[ScreeningQuery],
        lists: &[WatchlistType],
    ) -> Vec<Vec<WatchlistMatch>> {
        queries
            .iter()
            .map(|q| self.check_filtered(q, Some(lists)))
            .collect()
    }

    fn check_filtered(
        &self,
        query: &ScreeningQuery,
        lists: Option<&[WatchlistType]>,
    ) -> Vec<WatchlistMatch> {
        if query.name.is_empty() {
            return Vec::new();
        }
        let query_name = normalize_name(&query.name);

        let mut matches: Vec<WatchlistMatch> = self
            .entries
            .iter()
            .filter(|e| lists.map_or(true, |l| l.contains(&e.list)))
            .filter_map(|e| self.score_entry(query, &query_name, e))
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        matches.truncate(self.config.max_matches);

        if let Some(best) = matches.first() {
            log::info!(
                "watchlist hit: query={} record={} kind={:?} score={:.2}",
                query.name,
                best.record_id,
                best.kind,
                best.score
            );
        }
        matches
    }

    /// Highest-scoring strategy wins per record: identifier, then exact
    /// name, then alias, then fuzzy.
    fn score_entry(
        &self,
        query: &ScreeningQuery,
        query_name: &str,
        entry: &WatchlistEntry,
    ) -> Option<WatchlistMatch> {
        if let Some(identifier) = query.identifier.as_deref() {
            let wanted = normalize_identifier(identifier);
            let hit = entry.identifiers.iter().find(|i| {
                query.identifier_kind.map_or(true, |k| k == i.kind)
                    && normalize_identifier(&i.value) == wanted
            });
            if let Some(id) = hit {
                return Some(self.matched(
                    entry,
                    MatchKind::Identifier,
                    1.0,
                    entry.name.clone(),
                    format!("identifier ({:?}) matched exactly", id.kind),
                ));
            }
        }

        if normalize_name(&entry.name) == query_name {
            return Some(self.matched(
                entry,
                MatchKind::Exact,
                1.0,
                entry.name.clone(),
                "primary name matched exactly".into(),
            ));
        }

        if let Some(alias) = entry
            .aliases
            .iter()
            .find(|a| normalize_name(a) == query_name)
        {
            return Some(self.matched(
                entry,
                MatchKind::Alias,
                0.95,
                alias.clone(),
                format!("known alias '{alias}' matched"),
            ));
        }

        self.fuzzy_entry(query, query_name, entry)
    }

    fn fuzzy_entry(
        &self,
        query: &ScreeningQuery,
        query_name: &str,
        entry: &WatchlistEntry,
    ) -> Option<WatchlistMatch> {
        let (best_name, best_score) = std::iter::once(&entry.name)
            .chain(entry.aliases.iter())
            .map(|candidate| (candidate, composite_similarity(query_name, &normalize_name(candidate))))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let mut score = best_score;
        let mut explanation = format!(
            "fuzzy name match against '{best_name}' scored {best_score:.2}"
        );

        // A date-of-birth disagreement only ever lowers the score.
        if let (Some(q), Some(e)) = (query.date_of_birth, entry.date_of_birth) {
            if q != e {
                score *= self.config.dob_mismatch_penalty;
                explanation.push_str(&format!(
                    "; date of birth mismatch, score reduced to {score:.2}"
                ));
            } else {
                explanation.push_str("; date of birth matched");
            }
        }

        if score < self.config.fuzzy_floor {
            return None;
        }
        Some(self.matched(entry, MatchKind::Fuzzy, score, best_name.clone(), explanation))
    }

    fn matched(
        &self,
        entry: &WatchlistEntry,
        kind: MatchKind,
        score: f64,
        matched_name: String,
        explanation: String,
    ) -> WatchlistMatch {
        WatchlistMatch {
            list: entry.list,
            record_id: entry.record_id.clone(),
            kind,
            score,
            matched_name,
            explanation,
        }
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
pub(crate) fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_space = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

fn normalize_identifier(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Composite fuzzy score: 0.4 x token-set similarity + 0.6 x edit-distance
/// ratio, both over normalized names.
pub(crate) fn composite_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    0.4 * token_set_similarity(a, b) + 0.6 * edit_ratio(a, b)
}

/// Symmetric token overlap (Dice). Two tokens pair when equal or when
/// their edit ratio is at least 0.8, which tolerates in-token typos.
fn token_set_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let mut used = vec![false; tokens_b.len()];
    let mut pairs = 0usize;
    for ta in &tokens_a {
        let found = tokens_b
            .iter()
            .enumerate()
            .find(|(i, tb)| !used[*i] && (*tb == ta || edit_ratio(ta, tb) >= 0.8));
        if let Some((i, _)) = found {
            used[i] = true;
            pairs += 1;
        }
    }
    2.0 * pairs as f64 / (tokens_a.len() + tokens_b.len()) as f64
}

/// Edit-distance-derived ratio in [0, 1] using optimal string alignment,
/// which counts an adjacent transposition as one edit.
fn edit_ratio(a: &str, b: &str) -> f64 {
    let ca: Vec<char> = a.chars().collect();
    let cb: Vec<char> = b.chars().collect();
    let max_len = ca.len().max(cb.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = osa_distance(&ca, &cb);
    1.0 - distance as f64 / max_len as f64
}

fn osa_distance(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut prev2 = vec![0usize; m + 1];
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                curr[j] = curr[j].min(prev2[j - 2] + 1);
            }
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_name("  Al-Mansoori,  KHALID "), "al mansoori khalid");
        assert_eq!(normalize_name("John  Q.  Smith"), "john q smith");
    }

    #[test]
    fn transposition_costs_one_edit() {
        let a: Vec<char> = "joahn".chars().collect();
        let b: Vec<char> = "johan".chars().collect();
        assert_eq!(osa_distance(&a, &b), 1);
    }

    #[test]
    fn transposed_name_stays_above_fuzzy_floor() {
        let score = composite_similarity(
            &normalize_name("Johan Andersson"),
            &normalize_name("Joahn Andersson"),
        );
        assert!(score >= 0.85, "expected >= 0.85, got {score}");
    }

    #[test]
    fn unrelated_name_falls_below_fuzzy_floor() {
        let score = composite_similarity(
            &normalize_name("Johan Andersson"),
            &normalize_name("Maria Gonzalez"),
        );
        assert!(score < 0.85, "expected < 0.85, got {score}");
    }

    #[test]
    fn identical_names_score_one() {
        let score = composite_similarity("johan andersson", "johan andersson");
        assert!((score - 1.0).abs() < 1e-9);
    }
}
