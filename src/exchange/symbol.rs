//! Symbol canonicalization shared by the exchange adapters.
//!
//! Each adapter picks the rules that match its own naming scheme; the result
//! is always the bare base-asset ticker ("BTC", "1000PEPE", "kPEPE").

/// Strip `suffix` from the end of `symbol` if present.
///
/// A symbol that consists solely of the suffix is returned unchanged.
pub fn strip_quote_suffix<'a>(symbol: &'a str, suffix: &str) -> &'a str {
    match symbol.strip_suffix(suffix) {
        Some(base) if !base.is_empty() => base,
        _ => symbol,
    }
}

/// Base asset of a `BASE-QUOTE` or `BASE/QUOTE` market name.
pub fn base_of_pair(market: &str) -> &str {
    market
        .split(['-', '/'])
        .next()
        .unwrap_or(market)
}

/// Whether the symbol contains letters outside the Latin script, such as
/// CJK or Cyrillic tickers. Accented Latin letters and digits are allowed.
pub fn has_non_latin_letters(symbol: &str) -> bool {
    symbol.chars().any(|c| c.is_alphabetic() && !is_latin_letter(c))
}

fn is_latin_letter(c: char) -> bool {
    matches!(c,
        'A'..='Z' | 'a'..='z'
        | '\u{00C0}'..='\u{024F}' // Latin-1 Supplement, Extended-A/B
        | '\u{1E00}'..='\u{1EFF}' // Latin Extended Additional
    )
}
