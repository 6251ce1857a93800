use crate::models::{CategoryRule, Transaction};

/// Keyword tokens shorter than this never take part in prefix matching.
const MIN_PREFIX_LEN: usize = 4;

/// Lowercase, drop everything but letters and whitespace, collapse runs of
/// whitespace, trim.
pub(crate) fn normalize(text: &str) -> String {
    let letters: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect();
    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Does `keyword` identify `description`?
///
/// A keyword matches as a whole token (or whole run of tokens), or by prefix:
/// a description token and the whole normalized keyword, both at least four
/// letters, where one starts with the other. The prefix case catches merchant
/// variants such as "SAMSCLUB" for the keyword "SAMS", or "SAMS" for "sams club".
pub(crate) fn is_keyword_match(description: &str, keyword: &str) -> bool {
    let keyword = normalize(keyword);
    if keyword.is_empty() {
        return false;
    }
    let description = normalize(description);
    if description.is_empty() {
        return false;
    }

    let padded = format!(" {description} ");
    if padded.contains(&format!(" {keyword} ")) {
        return true;
    }

    if keyword.len() < MIN_PREFIX_LEN {
        return false;
    }
    description.split(' ').any(|token| {
        token.len() >= MIN_PREFIX_LEN && (keyword.starts_with(token) || token.starts_with(&keyword))
    })
}

/// First rule, in order, with any pattern matching the description.
pub(crate) fn find_matching_rule<'a>(description: &str, rules: &'a [CategoryRule]) -> Option<&'a CategoryRule> {
    rules
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| is_keyword_match(description, p)))
}

/// A category the rules suggest for an uncategorized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Proposal {
    pub(crate) transaction_id: String,
    pub(crate) rule_id: String,
    pub(crate) category: String,
}

/// Proposals for every uncategorized, visible transaction some rule matches.
pub(crate) fn propose_categories(transactions: &[Transaction], rules: &[CategoryRule]) -> Vec<Proposal> {
    transactions
        .iter()
        .filter(|t| !t.is_categorized() && !t.excluded)
        .filter_map(|t| {
            find_matching_rule(&t.description, rules).map(|rule| Proposal {
                transaction_id: t.id.clone(),
                rule_id: rule.id.clone(),
                category: rule.category.clone(),
            })
        })
        .collect()
}

/// Suggest a keyword for a new rule from a transaction description.
pub(crate) fn suggest_pattern(description: &str) -> String {
    // Store numbers, card masks and city codes rarely help; the first
    // meaningful word is usually the merchant.
    let cleaned = normalize(&description.replace('*', " "));
    let words: Vec<&str> = cleaned.split(' ').filter(|w| !w.is_empty()).collect();
    match words.as_slice() {
        [first, second, ..] if first.len() < MIN_PREFIX_LEN => format!("{first} {second}"),
        [first, ..] => first.to_string(),
        [] => description.trim().to_lowercase(),
    }
}

#[cfg(test)]
mod tests;
