//! Property-based tests for CSV field quoting.
//!
//! Uses proptest to verify that:
//! - Quoting then standard CSV unquoting yields the input back exactly
//! - Values without special characters pass through byte-identical
//! - Values with special characters always come back wrapped in quotes

use proptest::prelude::*;
use sentry_event_exporter::render::RenderFormat;

/// Standard CSV unquoting: strip the outer quotes and collapse doubled
/// quote characters.
fn unquote(field: &str) -> String {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}

fn has_special(value: &str) -> bool {
    value.contains([',', '"', '\r', '\n'])
}

proptest! {
    #[test]
    fn quote_then_unquote_roundtrips(value in ".*") {
        let fmt = RenderFormat::excel_csv();
        let quoted = fmt.quote_field(&value);
        prop_assert_eq!(unquote(&quoted), value);
    }

    #[test]
    fn plain_values_pass_through_unchanged(value in "[^,\"\r\n]*") {
        let fmt = RenderFormat::excel_csv();
        let quoted = fmt.quote_field(&value);
        prop_assert_eq!(quoted.as_ref(), value.as_str());
    }

    #[test]
    fn special_values_are_always_wrapped(value in ".*[,\"\r\n].*") {
        prop_assume!(has_special(&value));
        let fmt = RenderFormat::excel_csv();
        let quoted = fmt.quote_field(&value);
        prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));
        // Everything between the outer quotes is either a doubled quote
        // or a non-quote character.
        let inner = &quoted[1..quoted.len() - 1];
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '"' {
                prop_assert_eq!(chars.next(), Some('"'));
            }
        }
    }

    #[test]
    fn quoting_never_loses_quote_characters(value in "[\"a]{0,16}") {
        let fmt = RenderFormat::excel_csv();
        let quoted = fmt.quote_field(&value);
        let original_quotes = value.matches('"').count();
        if original_quotes > 0 {
            let quoted_quotes = quoted.matches('"').count();
            // Outer pair plus each embedded quote doubled.
            prop_assert_eq!(quoted_quotes, 2 + original_quotes * 2);
        }
    }
}
