//! Splits raw chat text into command tokens.
//!
//! Words are separated by whitespace; a double-quoted run becomes a single
//! token without its quotes. There is no escaping. A quote with no partner
//! is skipped and the text after it falls back to plain word splitting.

const QUOTE: char = '"';

pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = raw;

    while let Some(ch) = rest.chars().next() {
        if ch.is_whitespace() {
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        if ch != QUOTE {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == QUOTE)
                .unwrap_or(rest.len());
            tokens.push(rest[..end].to_string());
            rest = &rest[end..];
            continue;
        }

        let after_quote = &rest[QUOTE.len_utf8()..];
        match after_quote.find(QUOTE) {
            Some(0) => {
                // An empty pair has nothing to unwrap and is kept verbatim.
                tokens.push(format!("{QUOTE}{QUOTE}"));
                rest = &after_quote[QUOTE.len_utf8()..];
            }
            Some(close) => {
                tokens.push(after_quote[..close].to_string());
                rest = &after_quote[close + QUOTE.len_utf8()..];
            }
            None => {
                rest = after_quote;
            }
        }
    }

    tokens
}
