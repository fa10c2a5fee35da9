//! Property-based tests for local reply resolution

use super::*;
use proptest::prelude::*;

/// Filler that can never spell a keyword: digits, spaces, punctuation
fn arb_filler() -> impl Strategy<Value = String> {
    "[0-9 ?!.,]{0,24}"
}

fn arb_keyword_index() -> impl Strategy<Value = usize> {
    0..KeywordTable::brokerage().unwrap().len()
}

fn keyword_at(i: usize) -> String {
    KeywordTable::brokerage().unwrap().keywords().nth(i).unwrap().to_string()
}

proptest! {
    #[test]
    fn prop_payment_without_earlier_keyword(prefix in arb_filler(), suffix in arb_filler(), shout in any::<bool>()) {
        let table = KeywordTable::brokerage().unwrap();
        let resolver = ResponseResolver::local(table.clone());
        let word = if shout { "PAYMENT" } else { "payment" };
        let message = format!("{prefix}{word}{suffix}");

        prop_assert_eq!(resolver.resolve_local(&message), table.reply_for("payment").unwrap());
    }

    #[test]
    fn prop_no_keyword_gives_default(message in "[0-9 ?!.,]{0,64}") {
        let resolver = ResponseResolver::local(KeywordTable::brokerage().unwrap());
        prop_assert_eq!(resolver.resolve_local(&message), DEFAULT_REPLY);
    }

    #[test]
    fn prop_earliest_declared_wins(
        a in arb_keyword_index(),
        b in arb_keyword_index(),
        gap in arb_filler(),
        swap in any::<bool>(),
    ) {
        let table = KeywordTable::brokerage().unwrap();
        let resolver = ResponseResolver::local(table.clone());
        let (first, second) = if swap { (b, a) } else { (a, b) };
        let message = format!("{} {gap} {}", keyword_at(first), keyword_at(second));

        // No shipped keyword contains another, so the lower index wins
        let winner = keyword_at(a.min(b));
        prop_assert_eq!(resolver.resolve_local(&message), table.reply_for(&winner).unwrap());
    }
}
