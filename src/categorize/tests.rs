#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{Source, Transaction};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn make_rule(id: &str, category: &str, patterns: &[&str]) -> CategoryRule {
    CategoryRule::new(
        id.into(),
        category.into(),
        patterns.iter().map(|p| p.to_string()).collect(),
    )
}

fn make_txn(id: &str, desc: &str) -> Transaction {
    Transaction::new(
        id.into(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        desc.into(),
        dec!(-10.00),
        Source::Upload,
    )
}

// ── normalize ─────────────────────────────────────────────────

#[test]
fn test_normalize_strips_digits_and_punctuation() {
    assert_eq!(normalize("SAMSCLUB #6453 PHOENIX"), "samsclub phoenix");
    assert_eq!(normalize("AMZN Mktp US*2A1B3C"), "amzn mktp usabc");
}

#[test]
fn test_normalize_collapses_whitespace() {
    assert_eq!(normalize("  Coffee \t  Shop  "), "coffee shop");
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("1234 #!"), "");
}

// ── is_keyword_match ──────────────────────────────────────────

#[test]
fn test_prefix_match_merchant_variant() {
    assert!(is_keyword_match("SAMSCLUB #6453", "SAMS"));
    assert!(is_keyword_match("SAMS CLUB", "SAMSCLUB"));
}

#[test]
fn test_whole_token_match() {
    assert!(is_keyword_match("Starbucks Coffee #123", "coffee"));
    assert!(is_keyword_match("COFFEE SHOP", "Coffee"));
}

#[test]
fn test_multi_word_keyword_matches_token_run() {
    assert!(is_keyword_match("Blue Bottle Coffee Oakland", "bottle coffee"));
}

#[test]
fn test_multi_word_keyword_matches_by_leading_token() {
    assert!(is_keyword_match("SAMS #4521 PURCHASE", "sams club"));
    assert!(is_keyword_match("Coffee from Blue Bottle", "bottle coffee"));
    // "coffee" is not how "bottle coffee" starts.
    assert!(!is_keyword_match("COFFEE CART", "bottle coffee"));
}

#[test]
fn test_multi_word_keyword_picks_rule_for_merchant_variant() {
    let rules = vec![
        make_rule("r1", "6500", &["sams club"]),
        make_rule("r2", "6100", &["sams"]),
    ];
    assert_eq!(find_matching_rule("SAMS #4521", &rules).unwrap().id, "r1");
}

#[test]
fn test_short_keyword_needs_whole_token() {
    // "gas" is under four letters, so "gasoline" does not match it.
    assert!(!is_keyword_match("GASOLINE STATION", "gas"));
    assert!(is_keyword_match("SHELL GAS 123", "gas"));
}

#[test]
fn test_short_token_never_prefix_matches() {
    // "sam" is a short token; it must not match the keyword "samsclub".
    assert!(!is_keyword_match("SAM SMITH", "samsclub"));
}

#[test]
fn test_no_match() {
    assert!(!is_keyword_match("GROCERY STORE", "coffee"));
}

#[test]
fn test_empty_inputs_never_match() {
    assert!(!is_keyword_match("Coffee", ""));
    assert!(!is_keyword_match("Coffee", "  ##  "));
    assert!(!is_keyword_match("", "coffee"));
}

// ── find_matching_rule ────────────────────────────────────────

#[test]
fn test_first_matching_rule_wins() {
    let rules = vec![
        make_rule("r1", "6500", &["shop"]),
        make_rule("r2", "6100", &["coffee shop"]),
    ];
    let rule = find_matching_rule("Coffee Shop", &rules).unwrap();
    assert_eq!(rule.id, "r1");
}

#[test]
fn test_any_pattern_in_rule_matches() {
    let rules = vec![make_rule("r1", "6400", &["github", "adobe"])];
    assert_eq!(find_matching_rule("ADOBE *CREATIVE", &rules).unwrap().category, "6400");
    assert!(find_matching_rule("NETFLIX", &rules).is_none());
}

#[test]
fn test_rule_without_patterns_never_matches() {
    let rules = vec![make_rule("r1", "6400", &["  ", ""])];
    assert!(rules[0].patterns.is_empty());
    assert!(find_matching_rule("anything", &rules).is_none());
}

// ── propose_categories ────────────────────────────────────────

#[test]
fn test_proposals_only_for_uncategorized_visible() {
    let rules = vec![make_rule("r1", "6100", &["staples"])];
    let open = make_txn("t1", "STAPLES #22");
    let mut done = make_txn("t2", "STAPLES #22");
    done.category = "6900".into();
    let mut hidden = make_txn("t3", "STAPLES #22");
    hidden.excluded = true;
    let other = make_txn("t4", "UNRELATED");

    let proposals = propose_categories(&[open, done, hidden, other], &rules);
    assert_eq!(
        proposals,
        vec![Proposal {
            transaction_id: "t1".into(),
            rule_id: "r1".into(),
            category: "6100".into(),
        }]
    );
}

#[test]
fn test_proposals_empty_without_rules() {
    let txns = vec![make_txn("t1", "STAPLES")];
    assert!(propose_categories(&txns, &[]).is_empty());
}

// ── suggest_pattern ───────────────────────────────────────────

#[test]
fn test_suggest_pattern_first_word() {
    assert_eq!(suggest_pattern("STARBUCKS #1234 SEATTLE"), "starbucks");
    assert_eq!(suggest_pattern("SQ *BLUE BOTTLE"), "sq blue");
}

#[test]
fn test_suggest_pattern_falls_back_to_raw() {
    assert_eq!(suggest_pattern("  12345 "), "12345");
}
