//! Property-based tests for URL template substitution

use macrohttp::template::{has_placeholders, resolve_segment, substitute};
use proptest::prelude::*;
use serde_json::json;

/// Text that cannot contain a `${` opener
fn plain_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/_.?=&{} -]{0,40}".prop_map(|s| s.to_string())
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,12}".prop_map(|s| s.to_string())
}

proptest! {
    /// Text without placeholders comes back unchanged and the resolver is
    /// never invoked.
    #[test]
    fn prop_plain_text_unchanged(text in plain_text_strategy()) {
        let mut calls = 0;
        let result = substitute(&text, |_, _| {
            calls += 1;
            String::new()
        });

        prop_assert!(!has_placeholders(&text));
        prop_assert_eq!(result, text);
        prop_assert_eq!(calls, 0);
    }

    /// A single placeholder invokes the resolver once with its key and the
    /// output is spliced in place of the token.
    #[test]
    fn prop_single_placeholder_spliced(
        prefix in plain_text_strategy(),
        key in key_strategy(),
        suffix in plain_text_strategy(),
        replacement in "[a-z0-9/]{0,10}",
    ) {
        let text = format!("{prefix}${{{key}}}{suffix}");
        let mut seen = Vec::new();

        let result = substitute(&text, |full, k| {
            seen.push((full.to_string(), k.to_string()));
            replacement.clone()
        });

        prop_assert_eq!(seen, vec![(format!("${{{key}}}"), key.clone())]);
        prop_assert_eq!(result, format!("{prefix}{replacement}{suffix}"));
    }

    /// Values without a separator always gain exactly one leading `/`.
    #[test]
    fn prop_segment_prefix(value in "[a-z0-9]{1,10}") {
        let lookup = json!({"k": value.clone()});
        prop_assert_eq!(resolve_segment(&lookup, "k").unwrap(), format!("/{value}"));
    }

    /// Values that already contain a separator are used verbatim.
    #[test]
    fn prop_path_values_verbatim(head in "[a-z]{0,5}", tail in "[a-z]{0,5}") {
        let value = format!("{head}/{tail}");
        let lookup = json!({"k": value.clone()});
        prop_assert_eq!(resolve_segment(&lookup, "k").unwrap(), value);
    }
}
