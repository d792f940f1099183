//! Rule-based receipt parsing over cleaned OCR lines.
//!
//! The parser never fails: whatever fields survive extraction come back with
//! a confidence score and warnings for anything that did not line up.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::money::{from_cents, Cents};
use crate::receipt::normalize::{
    clean_lines, has_money_token, has_totals_label, is_address_line, is_junk_line,
    normalized_lines,
};

/// Ceiling on price candidates fed to the subset-sum matcher.
const MAX_PRICE_CANDIDATES: usize = 18;
/// A totals label's amount may trail it by this many lines.
const LABEL_LOOKAHEAD: usize = 8;
/// How far above a price to look for its item name.
const NAME_BACKSCAN: usize = 6;
const NAME_FORWARDSCAN: usize = 2;
/// Totals that disagree by more than this many cents earn a warning.
const DISAGREEMENT_CENTS: Cents = 5;

lazy_static! {
    static ref MONEY: Regex = Regex::new(r"\$?(\d+)\.(\d{2})\b").unwrap();
    static ref BARE_DIGITS: Regex = Regex::new(r"^\$?(\d{3,6})$").unwrap();
    static ref SUBTOTAL_LABEL: Regex = Regex::new(r"(?i)\bsub\s*total\b").unwrap();
    static ref TOTAL_LABEL: Regex =
        Regex::new(r"(?i)\b(grand\s+)?total\b|\bamount\s+due\b|\bbalance\s+due\b").unwrap();
    static ref TAX_LABEL: Regex = Regex::new(r"(?i)\btax\b").unwrap();
    static ref TIP_LABEL: Regex = Regex::new(r"(?i)\b(tip|gratuity)\b").unwrap();
    static ref DATE_MDY: Regex = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap();
    static ref DATE_ISO: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
    static ref LETTERS: Regex = Regex::new(r"[A-Za-z].*[A-Za-z]").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub merchant_name: String,
    pub transaction_date: Option<String>,
    pub items: Vec<ReceiptItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub tip: f64,
    pub total: f64,
    pub warnings: Vec<String>,
    pub confidence: f64,
    pub source: String,
}

/// Last money value on a line. Lines quoting percentages are skipped so a
/// "Tip suggestion 20% = $4.80" footer cannot masquerade as an amount.
fn trailing_money(line: &str) -> Option<Cents> {
    if line.contains('%') {
        return None;
    }
    let caps = MONEY.captures_iter(line).last()?;
    let dollars: Cents = caps[1].parse().ok()?;
    let cents: Cents = caps[2].parse().ok()?;
    Some(dollars * 100 + cents)
}

/// Bare 3-6 digit run with no decimal point: treat the last two digits as
/// cents when that lands in a plausible price range.
fn loose_money(line: &str) -> Option<Cents> {
    let caps = BARE_DIGITS.captures(line.trim())?;
    let value: Cents = caps[1].parse().ok()?;
    if (50..100_000).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn money_only(line: &str) -> Option<Cents> {
    let stripped = line.trim();
    if MONEY.is_match(stripped) {
        let rest = MONEY.replace(stripped, "");
        let rest = rest.trim_start_matches('$').trim();
        if rest.is_empty() {
            return trailing_money(stripped);
        }
        return None;
    }
    loose_money(stripped)
}

/// Text before the first money token, if it reads like an item name.
fn leading_name(line: &str) -> Option<String> {
    let m = MONEY.find(line)?;
    let name = line[..m.start()].trim_end_matches(['$', ' ', '.', ':', '-']).trim();
    if looks_like_name(name) {
        Some(name.to_string())
    } else {
        None
    }
}

fn looks_like_name(text: &str) -> bool {
    LETTERS.is_match(text) && !has_totals_label(text)
}

fn readable_merchant_line(line: &str) -> bool {
    looks_like_name(line)
        && !has_money_token(line)
        && !is_junk_line(line)
        && !DATE_MDY.is_match(line)
        && !DATE_ISO.is_match(line)
}

fn extract_merchant(raw_lines: &[String]) -> Option<String> {
    // The line right above the address block is almost always the merchant.
    if let Some(addr_idx) = raw_lines.iter().position(|l| is_address_line(l)) {
        if let Some(found) = raw_lines[..addr_idx]
            .iter()
            .rev()
            .find(|l| readable_merchant_line(l))
        {
            return Some(found.clone());
        }
    }

    raw_lines
        .iter()
        .take(5)
        .find(|l| readable_merchant_line(l))
        .cloned()
}

fn extract_date(lines: &[String]) -> Option<String> {
    for line in lines {
        if let Some(caps) = DATE_ISO.captures(line) {
            return Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]));
        }
        if let Some(caps) = DATE_MDY.captures(line) {
            let month: u32 = caps[1].parse().ok()?;
            let day: u32 = caps[2].parse().ok()?;
            let year_raw: i32 = caps[3].parse().ok()?;
            let year = if year_raw < 100 { 2000 + year_raw } else { year_raw };
            if (1..=12).contains(&month) && (1..=31).contains(&day) {
                return Some(format!("{:04}-{:02}-{:02}", year, month, day));
            }
        }
    }
    None
}

/// Amount for a labeled line: on the line itself, or on the nearest
/// following money-only line.
fn labeled_amount(lines: &[String], label_idx: usize) -> Option<Cents> {
    if let Some(cents) = trailing_money(&lines[label_idx]) {
        return Some(cents);
    }
    for line in lines.iter().skip(label_idx + 1).take(LABEL_LOOKAHEAD) {
        if has_totals_label(line) {
            break;
        }
        if let Some(cents) = money_only(line) {
            return Some(cents);
        }
    }
    None
}

struct Totals {
    subtotal: Option<Cents>,
    tax: Option<Cents>,
    tip: Option<Cents>,
    total: Option<Cents>,
    first_label_idx: Option<usize>,
}

fn extract_totals(lines: &[String]) -> Totals {
    let mut totals = Totals {
        subtotal: None,
        tax: None,
        tip: None,
        total: None,
        first_label_idx: None,
    };

    for (idx, line) in lines.iter().enumerate() {
        let is_subtotal = SUBTOTAL_LABEL.is_match(line);
        let is_total = !is_subtotal && TOTAL_LABEL.is_match(line);
        let is_tax = TAX_LABEL.is_match(line);
        let is_tip = TIP_LABEL.is_match(line);

        if is_subtotal || is_total || is_tax || is_tip {
            totals.first_label_idx.get_or_insert(idx);
        }

        if is_subtotal && totals.subtotal.is_none() {
            totals.subtotal = labeled_amount(lines, idx);
        }
        if is_total && totals.total.is_none() {
            totals.total = labeled_amount(lines, idx);
        }
        if is_tax && totals.tax.is_none() {
            totals.tax = labeled_amount(lines, idx);
        }
        if is_tip && totals.tip.is_none() {
            totals.tip = labeled_amount(lines, idx);
        }
    }

    // Derive the subtotal from the other totals when only they survived.
    if totals.subtotal.is_none() {
        if let Some(total) = totals.total {
            let derived = total - totals.tax.unwrap_or(0) - totals.tip.unwrap_or(0);
            if derived > 0 {
                totals.subtotal = Some(derived);
            }
        }
    }

    // Last resort for the total: the largest money value near the bottom.
    if totals.total.is_none() {
        let tail_start = lines.len().saturating_sub(10);
        totals.total = lines[tail_start..]
            .iter()
            .filter_map(|l| trailing_money(l))
            .max();
    }

    totals
}

struct PriceCandidate {
    line_idx: usize,
    cents: Cents,
    inline_name: Option<String>,
}

/// Gather price candidates between the content start and the totals block,
/// then pick the subset that matches the subtotal.
fn extract_items(
    lines: &[String],
    first_label_idx: Option<usize>,
    subtotal: Option<Cents>,
    warnings: &mut Vec<String>,
) -> Vec<(usize, Cents, Option<String>)> {
    let region_end = first_label_idx.unwrap_or(lines.len());
    let mut candidates: Vec<PriceCandidate> = Vec::new();

    for (idx, line) in lines.iter().enumerate().take(region_end) {
        if has_totals_label(line) {
            continue;
        }
        let cents = match trailing_money(line).or_else(|| money_only(line)) {
            Some(c) if c > 0 => c,
            _ => continue,
        };
        candidates.push(PriceCandidate {
            line_idx: idx,
            cents,
            inline_name: leading_name(line),
        });
    }

    if candidates.len() > MAX_PRICE_CANDIDATES {
        warnings.push(format!(
            "too many price candidates; considering the first {}",
            MAX_PRICE_CANDIDATES
        ));
        candidates.truncate(MAX_PRICE_CANDIDATES);
    }

    let chosen: Vec<usize> = match subtotal {
        Some(target) if !candidates.is_empty() => {
            subset_matching(&candidates, target)
                .unwrap_or_else(|| (0..candidates.len()).collect())
        }
        _ => (0..candidates.len()).collect(),
    };

    chosen
        .into_iter()
        .map(|i| {
            let c = &candidates[i];
            (c.line_idx, c.cents, c.inline_name.clone())
        })
        .collect()
}

/// Subset-sum DP over cents: find candidate prices adding up to the subtotal
/// within a cent. Returns candidate indices in input order.
fn subset_matching(candidates: &[PriceCandidate], target: Cents) -> Option<Vec<usize>> {
    let target = target as usize;
    let slack = 1usize;
    // parent[sum] = (candidate idx used to reach sum, previous sum)
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; target + slack + 1];
    let mut reachable = vec![false; target + slack + 1];
    reachable[0] = true;

    for (idx, candidate) in candidates.iter().enumerate() {
        let price = candidate.cents as usize;
        if price > target + slack {
            continue;
        }
        for sum in (price..=target + slack).rev() {
            if reachable[sum - price] && !reachable[sum] {
                reachable[sum] = true;
                parent[sum] = Some((idx, sum - price));
            }
        }
    }

    let hit = (target.saturating_sub(slack)..=target + slack)
        .rev()
        .find(|s| *s > 0 && reachable[*s])?;

    let mut indices = Vec::new();
    let mut sum = hit;
    while sum > 0 {
        let (idx, prev) = parent[sum]?;
        indices.push(idx);
        sum = prev;
    }
    indices.sort_unstable();
    Some(indices)
}

/// Attach names to chosen prices: inline text first, then a back-scan for a
/// free-standing name line, then a short forward scan.
fn name_items(
    lines: &[String],
    chosen: Vec<(usize, Cents, Option<String>)>,
) -> Vec<ReceiptItem> {
    let mut used_lines: Vec<usize> = chosen.iter().map(|(idx, _, _)| *idx).collect();
    let mut items = Vec::with_capacity(chosen.len());

    for (line_idx, cents, inline_name) in chosen {
        let name = inline_name.or_else(|| {
            let back = (line_idx.saturating_sub(NAME_BACKSCAN)..line_idx).rev().find(|i| {
                !used_lines.contains(i) && !has_money_token(&lines[*i]) && looks_like_name(&lines[*i])
            });
            let found = back.or_else(|| {
                (line_idx + 1..=line_idx + NAME_FORWARDSCAN)
                    .filter(|i| *i < lines.len())
                    .find(|i| {
                        !used_lines.contains(i)
                            && !has_money_token(&lines[*i])
                            && looks_like_name(&lines[*i])
                    })
            });
            found.map(|i| {
                used_lines.push(i);
                lines[i].clone()
            })
        });

        items.push(ReceiptItem {
            name: name.unwrap_or_else(|| "Item".to_string()),
            price: from_cents(cents),
        });
    }

    items
}

pub fn parse_receipt(raw_text: &str) -> ParsedReceipt {
    let raw_lines = normalized_lines(raw_text);
    let lines = clean_lines(raw_text);
    let mut warnings: Vec<String> = Vec::new();

    let merchant = extract_merchant(&raw_lines);
    let date = extract_date(&lines);
    let totals = extract_totals(&lines);

    let chosen = extract_items(&lines, totals.first_label_idx, totals.subtotal, &mut warnings);
    let items = name_items(&lines, chosen);
    let items_sum: Cents = items.iter().map(|i| (i.price * 100.0).round() as Cents).sum();

    // With no labeled subtotal anywhere, the items themselves are the best
    // estimate we have.
    let subtotal = totals.subtotal.unwrap_or(items_sum);
    let tax = totals.tax.unwrap_or(0);
    let tip = totals.tip.unwrap_or(0);
    let total = totals.total.unwrap_or(subtotal + tax + tip);

    if items.is_empty() {
        warnings.push("no line items detected".to_string());
    }
    let agreement = totals.subtotal.is_some() && (items_sum - subtotal).abs() <= DISAGREEMENT_CENTS;
    if totals.subtotal.is_some()
        && !items.is_empty()
        && (items_sum - subtotal).abs() > DISAGREEMENT_CENTS
    {
        warnings.push("line items do not add up to the subtotal".to_string());
    }
    if (subtotal + tax + tip - total).abs() > DISAGREEMENT_CENTS {
        warnings.push("subtotal, tax and tip do not add up to the total".to_string());
    }

    let mut confidence: f64 = 0.0;
    if totals.total.is_some() {
        confidence += 0.25;
    }
    if totals.subtotal.is_some() {
        confidence += 0.20;
    }
    if !items.is_empty() {
        confidence += 0.20;
    }
    if totals.tax.is_some() {
        confidence += 0.10;
    }
    if agreement {
        confidence += 0.15;
    }
    if merchant.is_some() {
        confidence += 0.05;
    }
    if date.is_some() {
        confidence += 0.05;
    }

    ParsedReceipt {
        merchant_name: merchant.unwrap_or_default(),
        transaction_date: date,
        items,
        subtotal: from_cents(subtotal),
        tax: from_cents(tax),
        tip: from_cents(tip),
        total: from_cents(total),
        warnings,
        confidence,
        source: "rules".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_receipt_round_trip() {
        let text = "Pizza  $10.99\nSoda  $2.50\nSubtotal  $13.49\nTax  $1.20\nTotal  $14.69";
        let parsed = parse_receipt(text);

        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].name, "Pizza");
        assert_eq!(parsed.items[0].price, 10.99);
        assert_eq!(parsed.items[1].name, "Soda");
        assert_eq!(parsed.items[1].price, 2.50);
        assert_eq!(parsed.subtotal, 13.49);
        assert_eq!(parsed.tax, 1.20);
        assert_eq!(parsed.tip, 0.0);
        assert_eq!(parsed.total, 14.69);
        assert!(parsed.confidence >= 0.8, "confidence {}", parsed.confidence);
        assert!(parsed.warnings.is_empty(), "warnings {:?}", parsed.warnings);
    }

    #[test]
    fn merchant_above_address_is_preferred() {
        let text = "Joe's Diner\n123 Main St\nSpringfield, IL 62704\nBurger $8.00\nTotal $8.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.merchant_name, "Joe's Diner");
    }

    #[test]
    fn merchant_from_top_window_without_address() {
        let text = "Corner Cafe\nLatte $4.50\nTotal $4.50";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.merchant_name, "Corner Cafe");
    }

    #[test]
    fn date_is_normalized() {
        let text = "Cafe\n03/15/2024\nCoffee $3.00\nTotal $3.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.transaction_date.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn two_digit_year_is_expanded() {
        let text = "Cafe\n3-5-24\nCoffee $3.00\nTotal $3.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.transaction_date.as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn label_amount_on_following_line() {
        let text = "Deli\nSandwich $7.25\nSubtotal\n$7.25\nTotal\n$7.25";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.subtotal, 7.25);
        assert_eq!(parsed.total, 7.25);
    }

    #[test]
    fn subtotal_derived_from_total_and_tax() {
        let text = "Diner\nOmelette $10.00\nTax $0.80\nTotal $10.80";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.subtotal, 10.00);
        assert_eq!(parsed.total, 10.80);
    }

    #[test]
    fn subset_sum_drops_stray_money_values() {
        // 2.00 is a posted discount the items must not absorb
        let text = "Shop\nApples $3.00\nBananas $2.50\nMember savings $2.00\nSubtotal $5.50\nTotal $5.50";
        let parsed = parse_receipt(text);
        let total: f64 = parsed.items.iter().map(|i| i.price).sum();
        assert!((total - 5.50).abs() < 0.001, "items {:?}", parsed.items);
    }

    #[test]
    fn ocr_confusions_are_repaired_end_to_end() {
        let text = "Cafe\nBagel S3.50\nLox $8 25\nSubtotal $11.75\nSales 1ax $1.00\nTotal $12.75";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.subtotal, 11.75);
        assert_eq!(parsed.tax, 1.00);
        assert_eq!(parsed.total, 12.75);
        let sum: f64 = parsed.items.iter().map(|i| i.price).sum();
        assert!((sum - 11.75).abs() < 0.001);
    }

    #[test]
    fn name_backscan_for_price_only_lines() {
        let text = "Bistro\nHouse Salad\n$9.00\nSubtotal $9.00\nTotal $9.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "House Salad");
        assert_eq!(parsed.items[0].price, 9.00);
    }

    #[test]
    fn unnamed_price_falls_back_to_item() {
        let text = "$6.00\nSubtotal $6.00\nTotal $6.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "Item");
    }

    #[test]
    fn garbage_never_panics_and_reports_low_confidence() {
        let parsed = parse_receipt("@@@@\n????\n!!!!");
        assert!(parsed.items.is_empty());
        assert!(parsed.confidence < 0.5);
        assert!(!parsed.warnings.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        let parsed = parse_receipt("");
        assert_eq!(parsed.total, 0.0);
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn percent_lines_are_ignored_for_amounts() {
        let text = "Grill\nRibs $20.00\nSubtotal $20.00\nSuggested tip 20% = $4.00\nTotal $20.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.tip, 0.0);
        assert_eq!(parsed.total, 20.00);
    }

    #[test]
    fn missing_total_falls_back_to_largest_tail_value() {
        let text = "Stand\nHot Dog $5.00\nLemonade $3.00\nSubtotal $8.00";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.total, 8.00);
    }

    #[test]
    fn scrambled_totals_block_is_reordered_end_to_end() {
        let text = "Total $14.69\nSubtotal $13.49\nTax $1.20\nPizza $10.99\nSoda $2.50";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.subtotal, 13.49);
        assert_eq!(parsed.tax, 1.20);
        assert_eq!(parsed.total, 14.69);
    }

    #[test]
    fn decimal_less_digit_runs_read_as_money() {
        let text = "Snack Bar\nTrail Mix\n449\nSubtotal\n449\nTotal\n449";
        let parsed = parse_receipt(text);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "Trail Mix");
        assert_eq!(parsed.items[0].price, 4.49);
        assert_eq!(parsed.subtotal, 4.49);
        assert_eq!(parsed.total, 4.49);
    }

    #[test]
    fn candidate_overflow_is_truncated_with_a_warning() {
        let mut text = String::from("Busy Shop\n");
        for n in 0..19 {
            text.push_str(&format!("Thing {} $1.00\n", n));
        }
        let parsed = parse_receipt(&text);
        assert_eq!(parsed.items.len(), 18);
        assert!(parsed
            .warnings
            .iter()
            .any(|w| w.contains("too many price candidates")));
    }
}
