//! OCR text cleanup: the line-level repairs that run before any field
//! extraction. Everything here is best-effort; a line we cannot repair is
//! passed through or dropped, never an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "S10.99": OCR reads a dollar sign as an S.
    static ref LEADING_S_MONEY: Regex = Regex::new(r"(^|\s)S(\d+[.,]\d{2}\b)").unwrap();
    // "$1O.99", "$O.99": letter O inside the digits of a dollar amount.
    static ref DOLLAR_WITH_O: Regex = Regex::new(r"\$[0-9O]*[.,\s][0-9O]{2}\b").unwrap();
    // "10 99": lost decimal point between integer and cents.
    static ref SPACED_CENTS: Regex = Regex::new(r"\b(\d{1,4}) (\d{2})\b(?:\s|$)").unwrap();
    // "Sales Iiax", "Sales 1ax", "Sales lax" and friends.
    static ref GARBLED_TAX: Regex = Regex::new(r"(?i)\b[Il1|]+ax\b").unwrap();
    // "1,234.56": comma thousands separators.
    static ref COMMA_THOUSANDS: Regex = Regex::new(r"(\d),(\d{3})").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref PHONE: Regex = Regex::new(r"\(?\d{3}\)?[-. ]\d{3}[-. ]\d{4}").unwrap();
    static ref ZIP: Regex = Regex::new(r"\b[A-Z]{2}\s+\d{5}(-\d{4})?\b").unwrap();
    static ref STREET: Regex = Regex::new(
        r"(?i)\b\d+\s+\w+.*\b(st|street|ave|avenue|blvd|boulevard|rd|road|dr|drive|ln|lane|way|suite|ste|hwy)\b\.?"
    )
    .unwrap();
    static ref LONG_ID: Regex = Regex::new(r"\b\d{7,}\b").unwrap();
    // One or two digits only: longer runs may be decimal-less money.
    static ref PURE_QUANTITY: Regex = Regex::new(r"(?i)^\d{1,2}\s*x?$").unwrap();
    static ref CARD_META: Regex = Regex::new(
        r"(?i)\b(visa|mastercard|amex|discover|debit|credit|card|chip|auth|approval|terminal|batch|entry\s+method|aid|arqc|merchant\s+id|cashier|register|order\s*#|check\s*#|trans(action)?\s*#?)\b"
    )
    .unwrap();
    static ref PROMO: Regex = Regex::new(
        r"(?i)(survey|feedback|rewards|coupon|www\.|http|\.com|thank\s+you|come\s+again|welcome\s+to|tell\s+us|save\s+your\s+receipt)"
    )
    .unwrap();

    static ref TOTALS_LABEL: Regex = Regex::new(
        r"(?i)\b(sub\s*total|total|tax|tip|gratuity|amount\s+due|balance\s+due)\b"
    )
    .unwrap();
    static ref MONEY_TOKEN: Regex = Regex::new(r"\$?\d+\.\d{2}\b").unwrap();
}

/// Single-line repair: whitespace, glyph confusions, garbled labels,
/// thousands separators.
pub fn normalize_line(raw: &str) -> String {
    let mut line = WHITESPACE.replace_all(raw.trim(), " ").to_string();

    line = LEADING_S_MONEY.replace_all(&line, "${1}$$${2}").to_string();

    // O for 0 only inside a dollar amount, where it is unambiguous.
    line = DOLLAR_WITH_O
        .replace_all(&line, |caps: &regex::Captures| {
            caps[0].replace('O', "0")
        })
        .to_string();

    line = COMMA_THOUSANDS.replace_all(&line, "${1}${2}").to_string();
    line = SPACED_CENTS.replace_all(&line, "${1}.${2} ").trim_end().to_string();
    line = GARBLED_TAX.replace_all(&line, "Tax").to_string();

    line
}

/// Lines that carry no receipt content: addresses, phones, card terminal
/// metadata, promo text, bare quantities, long numeric identifiers.
pub fn is_junk_line(line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    if PHONE.is_match(line) || ZIP.is_match(line) || STREET.is_match(line) {
        return true;
    }
    if PURE_QUANTITY.is_match(line) {
        return true;
    }
    if CARD_META.is_match(line) || PROMO.is_match(line) {
        return true;
    }
    // Long numeric IDs, unless the line also carries a money value.
    if LONG_ID.is_match(line) && !MONEY_TOKEN.is_match(line) {
        return true;
    }
    false
}

pub fn is_address_line(line: &str) -> bool {
    STREET.is_match(line) || ZIP.is_match(line)
}

pub fn has_totals_label(line: &str) -> bool {
    TOTALS_LABEL.is_match(line)
}

pub fn has_money_token(line: &str) -> bool {
    MONEY_TOKEN.is_match(line)
}

/// Normalized lines with quantity-1 prefixes merged, junk still included.
/// Merchant extraction wants to see address and promo lines for position.
pub fn normalized_lines(raw_text: &str) -> Vec<String> {
    let normalized: Vec<String> = raw_text
        .lines()
        .map(normalize_line)
        .filter(|l| !l.is_empty())
        .collect();

    // "1" on its own line followed by an item name is one logical line.
    let mut merged: Vec<String> = Vec::with_capacity(normalized.len());
    let mut i = 0;
    while i < normalized.len() {
        if normalized[i] == "1" && i + 1 < normalized.len() && !has_money_token(&normalized[i + 1])
        {
            merged.push(normalized[i + 1].clone());
            i += 2;
            continue;
        }
        merged.push(normalized[i].clone());
        i += 1;
    }

    merged
}

/// Full cleanup pipeline: normalize, merge quantities, drop junk, and
/// un-scramble receipts whose totals block was read before the items.
pub fn clean_lines(raw_text: &str) -> Vec<String> {
    let mut kept: Vec<String> = normalized_lines(raw_text)
        .into_iter()
        .filter(|l| !is_junk_line(l))
        .collect();

    // Scramble repair: when the whole totals block was read before the first
    // item line, the OCR shuffled the blocks. Rebuild as (items, totals).
    let last_totals = kept.iter().rposition(|l| has_totals_label(l));
    let first_plain_money = kept
        .iter()
        .position(|l| has_money_token(l) && !has_totals_label(l));
    if let (Some(t), Some(m)) = (last_totals, first_plain_money) {
        if t < m {
            let (totals, rest): (Vec<String>, Vec<String>) =
                kept.drain(..).partition(|l| has_totals_label(l));
            kept = rest;
            kept.extend(totals);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_line("  Pizza    $10.99  "), "Pizza $10.99");
    }

    #[test]
    fn repairs_s_for_dollar() {
        assert_eq!(normalize_line("Burger S12.50"), "Burger $12.50");
        // S followed by letters stays alone
        assert_eq!(normalize_line("Salad bowl"), "Salad bowl");
    }

    #[test]
    fn repairs_o_for_zero_in_amounts() {
        assert_eq!(normalize_line("Coffee $1O.99"), "Coffee $10.99");
        assert_eq!(normalize_line("Donut $O.99"), "Donut $0.99");
        // O outside a dollar amount is left alone
        assert_eq!(normalize_line("Onion rings $3.99"), "Onion rings $3.99");
    }

    #[test]
    fn repairs_spaced_cents() {
        assert_eq!(normalize_line("Wrap 8 49"), "Wrap 8.49");
    }

    #[test]
    fn repairs_garbled_tax_label() {
        assert_eq!(normalize_line("Sales Iiax $1.20"), "Sales Tax $1.20");
        assert_eq!(normalize_line("Sales 1ax $1.20"), "Sales Tax $1.20");
        assert_eq!(normalize_line("Sales lax $1.20"), "Sales Tax $1.20");
    }

    #[test]
    fn strips_comma_thousands() {
        assert_eq!(normalize_line("Total $1,234.56"), "Total $1234.56");
    }

    #[test]
    fn junk_classification() {
        assert!(is_junk_line("123 Main St"));
        assert!(is_junk_line("Springfield, IL 62704"));
        assert!(is_junk_line("(555) 867-5309"));
        assert!(is_junk_line("VISA **** 4242"));
        assert!(is_junk_line("Auth Code 123456"));
        assert!(is_junk_line("Take our survey at example.com"));
        assert!(is_junk_line("2 x"));
        assert!(is_junk_line("00012345678"));

        assert!(!is_junk_line("Pizza $10.99"));
        assert!(!is_junk_line("Subtotal $13.49"));
        assert!(!is_junk_line("Joe's Diner"));
    }

    #[test]
    fn merges_quantity_one_with_item_line() {
        let cleaned = clean_lines("1\nCaesar Salad\nSubtotal $9.00");
        assert_eq!(cleaned[0], "Caesar Salad");
    }

    #[test]
    fn reorders_scrambled_totals_before_items() {
        let cleaned = clean_lines("Total $14.69\nPizza $10.99\nSoda $2.50");
        assert_eq!(
            cleaned,
            vec!["Pizza $10.99", "Soda $2.50", "Total $14.69"]
        );
    }

    #[test]
    fn well_formed_receipt_keeps_order() {
        let cleaned = clean_lines("Joe's Diner\nPizza $10.99\nSubtotal $10.99\nTotal $10.99");
        assert_eq!(
            cleaned,
            vec![
                "Joe's Diner",
                "Pizza $10.99",
                "Subtotal $10.99",
                "Total $10.99"
            ]
        );
    }
}
