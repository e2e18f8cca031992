//! Deterministic tone adjustment for winning candidates.
//!
//! Runs after provider selection and never influences it. The adjustment is
//! idempotent: feeding its output back through produces the same text, so a
//! message that already carries the endearment or heart is left alone.

use paivand_types::Locale;

/// Persian endearment prepended to translations addressed to Khadija.
const FA_ENDEARMENT: &str = "عزیزم";

const HEART: &str = "❤️";

/// Applies the warmth adjustment for the given target locale.
///
/// - `fa`: prepend the endearment if absent; append a heart unless the
///   text already carries one or any context line does.
/// - `en`: append a heart if absent.
pub fn add_warmth(translated: &str, locale: Locale, context: &[String]) -> String {
    match locale {
        Locale::Fa => {
            let softened = if translated.contains(FA_ENDEARMENT) {
                translated.to_string()
            } else {
                format!("{FA_ENDEARMENT} {translated}")
            };
            let heart_present = softened.contains(HEART)
                || context.iter().any(|line| line.contains(HEART));
            if heart_present {
                softened.trim().to_string()
            } else {
                format!("{softened} {HEART}").trim().to_string()
            }
        }
        Locale::En => {
            if translated.contains(HEART) {
                translated.to_string()
            } else {
                format!("{translated} {HEART}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fa_prepends_endearment_and_appends_heart() {
        let out = add_warmth("سلام", Locale::Fa, &[]);
        assert_eq!(out, "عزیزم سلام ❤️");
    }

    #[test]
    fn fa_skips_heart_when_context_has_one() {
        let context = vec!["دوستت دارم ❤️".to_string()];
        let out = add_warmth("سلام", Locale::Fa, &context);
        assert_eq!(out, "عزیزم سلام");
    }

    #[test]
    fn en_appends_heart_once() {
        assert_eq!(add_warmth("Hello", Locale::En, &[]), "Hello ❤️");
        assert_eq!(add_warmth("Hello ❤️", Locale::En, &[]), "Hello ❤️");
    }

    #[test]
    fn idempotent_on_own_output() {
        for (text, locale) in [
            ("سلام", Locale::Fa),
            ("عزیزم سلام", Locale::Fa),
            ("Hello", Locale::En),
        ] {
            let once = add_warmth(text, locale, &[]);
            let twice = add_warmth(&once, locale, &[]);
            assert_eq!(once, twice, "tone adjustment must be idempotent");
        }
    }
}
