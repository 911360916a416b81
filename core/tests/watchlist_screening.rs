//! Watchlist screening tests: match-kind precedence, fuzzy tolerance for
//! transposition typos, date-of-birth penalties, and batch behaviour.

use chrono::NaiveDate;
use fintel_core::config::ScreenerConfig;
use fintel_core::watchlist::{
    IdentifierKind, MatchKind, ScreeningQuery, WatchlistEntry, WatchlistIdentifier,
    WatchlistScreener, WatchlistType,
};

fn entry(list: WatchlistType, record_id: &str, name: &str) -> WatchlistEntry {
    WatchlistEntry {
        list,
        record_id: record_id.into(),
        name: name.into(),
        aliases: Vec::new(),
        identifiers: Vec::new(),
        date_of_birth: None,
        nationality: None,
    }
}

fn query(name: &str) -> ScreeningQuery {
    ScreeningQuery {
        name: name.into(),
        ..ScreeningQuery::default()
    }
}

fn screener(entries: Vec<WatchlistEntry>) -> WatchlistScreener {
    WatchlistScreener::new(entries, ScreenerConfig::default()).unwrap()
}

/// A matching identifier is conclusive even when the names disagree.
#[test]
fn identifier_match_outranks_the_name() {
    let mut e = entry(WatchlistType::Sanctions, "S-1", "Nikolai Petrov");
    e.identifiers.push(WatchlistIdentifier {
        kind: IdentifierKind::Passport,
        value: "P1234567".into(),
    });
    let s = screener(vec![e]);

    let mut q = query("Completely Different Name");
    q.identifier = Some("p 1234-567".into());
    q.identifier_kind = Some(IdentifierKind::Passport);

    let matches = s.check_entity(&q);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].kind, MatchKind::Identifier);
    assert_eq!(matches[0].score, 1.0);
}

/// Exact name equality after normalization scores 1.0.
#[test]
fn exact_name_match_ignores_case_and_punctuation() {
    let s = screener(vec![entry(WatchlistType::Sanctions, "S-1", "Nikolai Petrov")]);
    let matches = s.check_entity(&query("  nikolai PETROV. "));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].kind, MatchKind::Exact);
    assert_eq!(matches[0].score, 1.0);
}

/// An alias hit scores slightly below an exact primary-name hit.
#[test]
fn alias_match_scores_below_exact() {
    let mut e = entry(WatchlistType::Pep, "P-1", "Jonathan Alvarez");
    e.aliases.push("Johnny A".into());
    let s = screener(vec![e]);

    let matches = s.check_entity(&query("johnny a"));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].kind, MatchKind::Alias);
    assert_eq!(matches[0].score, 0.95);
    assert_eq!(matches[0].matched_name, "Johnny A");
}

/// A transposition typo still clears the fuzzy floor.
#[test]
fn transposed_name_matches_fuzzily() {
    let s = screener(vec![entry(WatchlistType::Sanctions, "S-1", "Johan Andersson")]);
    let matches = s.check_entity(&query("Joahn Andersson"));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].kind, MatchKind::Fuzzy);
    assert!(
        matches[0].score >= 0.85,
        "expected >= 0.85, got {}",
        matches[0].score
    );
}

/// An unrelated name produces no candidate at all.
#[test]
fn unrelated_name_produces_no_match() {
    let s = screener(vec![entry(WatchlistType::Sanctions, "S-1", "Johan Andersson")]);
    assert!(s.check_entity(&query("Maria Gonzalez")).is_empty());
}

/// With both dates of birth present and disagreeing, the penalized fuzzy
/// score falls under the default floor and the candidate is dropped.
#[test]
fn dob_mismatch_suppresses_a_borderline_fuzzy_hit() {
    let mut e = entry(WatchlistType::Sanctions, "S-1", "Johan Andersson");
    e.date_of_birth = NaiveDate::from_ymd_opt(1975, 5, 5);
    let s = screener(vec![e]);

    let mut confirming = query("Joahn Andersson");
    confirming.date_of_birth = NaiveDate::from_ymd_opt(1975, 5, 5);
    assert_eq!(s.check_entity(&confirming).len(), 1, "matching DOB keeps the hit");

    let mut conflicting = query("Joahn Andersson");
    conflicting.date_of_birth = NaiveDate::from_ymd_opt(1980, 1, 1);
    assert!(
        s.check_entity(&conflicting).is_empty(),
        "conflicting DOB must drop the hit below the floor"
    );
}

/// With a lowered floor the penalty is visible: the score shrinks but the
/// hit survives, and the explanation says why.
#[test]
fn dob_penalty_only_ever_lowers_the_score() {
    let mut e = entry(WatchlistType::Sanctions, "S-1", "Johan Andersson");
    e.date_of_birth = NaiveDate::from_ymd_opt(1975, 5, 5);
    let config = ScreenerConfig {
        fuzzy_floor: 0.5,
        ..ScreenerConfig::default()
    };
    let s = WatchlistScreener::new(vec![e], config).unwrap();

    let clean = s.check_entity(&query("Joahn Andersson"));
    let mut conflicting = query("Joahn Andersson");
    conflicting.date_of_birth = NaiveDate::from_ymd_opt(1980, 1, 1);
    let penalized = s.check_entity(&conflicting);

    assert_eq!(clean.len(), 1);
    assert_eq!(penalized.len(), 1);
    assert!(penalized[0].score < clean[0].score);
    assert!(penalized[0].explanation.contains("mismatch"));
}

/// Batch screening scopes each query to the requested lists only.
#[test]
fn batch_screening_filters_by_list() {
    let s = screener(vec![
        entry(WatchlistType::Sanctions, "S-1", "Johan Andersson"),
        entry(WatchlistType::Pep, "P-1", "Johan Andersson"),
    ]);

    let results = s.check_batch(
        &[query("Johan Andersson"), query("Nobody Relevant")],
        &[WatchlistType::Sanctions],
    );

    assert_eq!(results.len(), 2, "one result set per query");
    assert_eq!(results[0].len(), 1);
    assert_eq!(results[0][0].list, WatchlistType::Sanctions);
    assert!(results[1].is_empty());
}

/// Results are best-first, tie-broken on record id, and capped.
#[test]
fn results_are_capped_and_ordered() {
    let config = ScreenerConfig {
        max_matches: 1,
        ..ScreenerConfig::default()
    };
    let s = WatchlistScreener::new(
        vec![
            entry(WatchlistType::Sanctions, "S-2", "Johan Andersson"),
            entry(WatchlistType::Sanctions, "S-1", "Johan Andersson"),
        ],
        config,
    )
    .unwrap();

    let matches = s.check_entity(&query("Johan Andersson"));
    assert_eq!(matches.len(), 1, "max_matches caps the result set");
    assert_eq!(matches[0].record_id, "S-1", "ties break on record id");
}

#[test]
fn empty_query_name_returns_nothing() {
    let s = screener(vec![entry(WatchlistType::Sanctions, "S-1", "Johan Andersson")]);
    assert!(s.check_entity(&query("")).is_empty());
}
