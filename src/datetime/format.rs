//! Format token translation
//!
//! Converts the user-facing token language ("YYYY-MM-DD hh:mmap")
//! into a chrono strftime pattern ("%Y-%m-%d %I:%M%p").

/// One entry of the token table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatToken {
    /// Token as typed by the user
    pub custom: &'static str,
    /// strftime replacement
    pub canonical: &'static str,
    /// Human readable description (for help listings)
    pub description: &'static str,
}

const fn token(
    custom: &'static str,
    canonical: &'static str,
    description: &'static str,
) -> FormatToken {
    FormatToken {
        custom,
        canonical,
        description,
    }
}

/// Token table in match priority order.
///
/// Longer tokens must come before any token that is a prefix of them
/// (DATETIME before DATE, MONTH before MON, TZOF before TZ), otherwise
/// they can never match.
pub const FORMAT_TOKENS: [FormatToken; 25] = [
    token("DATETIME", "%c", "Full date and time"),
    token("DATE", "%x", "Full date"),
    token("DAYW", "%A", "Name of the day in the week"),
    token("DW", "%a", "Shorthand name for the day in the week"),
    token("DNW", "%u", "Number of the day in the week (monday = 1)"),
    token("DIW", "%w", "Index of the day in the week (sunday = 0)"),
    token("DN", "%j", "Number of the day in the year (January 1 = 001, 3 digits)"),
    token("DD", "%d", "Day in the month (2 digits)"),
    token("D", "%e", "Day in the month (1 or 2 digits)"),
    token(
        "WN",
        "%W",
        "Number of the week in the year (first monday of year: WN = 01, before that: WN = 00)",
    ),
    token("MONTH", "%B", "Name of the month"),
    token("MON", "%b", "Shorthand name of the month"),
    token("MM", "%m", "Month in year (2 digits)"),
    token("CCCC", "%C", "Century"),
    token("YYYY", "%Y", "Year (4 digits)"),
    token("YY", "%y", "Year (2 digits)"),
    token("TZOF", "%z", "Timezone offset (e.g. +0230)"),
    token("TZ:OF", "%:z", "Timezone offset with minute separator (e.g. +02:30)"),
    token("TZ", "%Z", "Timezone abbreviation"),
    token("TIME", "%X", "Full time of day"),
    token("HH", "%H", "Hour in day (24-hour clock, 2 digits)"),
    token("hh", "%I", "Hour in day (12-hour clock, 2 digits)"),
    token("mm", "%M", "Minute in hour (2 digits)"),
    token("ss", "%S", "Second in minute (2 digits)"),
    token("ap", "%p", "AM or PM of day"),
];

/// Translate custom tokens using the built-in table.
pub fn translate(format: &str) -> String {
    translate_with(format, &FORMAT_TOKENS)
}

/// Translate custom tokens using `table`, scanning left to right.
///
/// At each position the first matching entry wins. Its replacement is
/// spliced in and scanning resumes right after the inserted text, so
/// canonical text is never rescanned as custom tokens. Positions with
/// no match are copied through unchanged.
pub fn translate_with(format: &str, table: &[FormatToken]) -> String {
    let mut out = format.to_string();
    let mut i = 0;

    while i < out.len() {
        let rest = &out[i..];
        let hit = table
            .iter()
            .find(|t| !t.custom.is_empty() && rest.starts_with(t.custom));

        match hit {
            Some(t) => {
                out.replace_range(i..i + t.custom.len(), t.canonical);
                i += t.canonical.len();
            }
            None => i += rest.chars().next().map_or(1, char::len_utf8),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_common_pattern() {
        assert_eq!(translate("YYYY-MM-DD hh:mmap"), "%Y-%m-%d %I:%M%p");
        assert_eq!(translate("hh:mmap TMZCITY"), "%I:%M%p TMZCITY");
        assert_eq!(translate("HH:mm:ss TZ:OF"), "%H:%M:%S %:z");
    }

    #[test]
    fn test_longer_token_wins() {
        assert_eq!(translate("DAYW"), "%A");
        assert_eq!(translate("DW"), "%a");
        assert_eq!(translate("DATETIME"), "%c");
        assert_eq!(translate("DATE"), "%x");
        assert_eq!(translate("MONTH MON"), "%B %b");
        assert_eq!(translate("TZOF TZ"), "%z %Z");
    }

    #[test]
    fn test_adjacent_tokens() {
        assert_eq!(translate("YYYYMM"), "%Y%m");
        assert_eq!(translate("DDMMYY"), "%d%m%y");
    }

    #[test]
    fn test_no_tokens_is_idempotent() {
        for s in ["", "at noon: 12.5%", "über 3 o'clock", "x\ny"] {
            let once = translate(s);
            assert_eq!(once, s);
            assert_eq!(translate(&once), once);
        }
    }

    #[test]
    fn test_deterministic() {
        let input = "DAYW, D MONTH YYYY (WN) TIME TZ";
        assert_eq!(translate(input), translate(input));
        assert_eq!(translate(input), "%A, %e %B %Y (%W) %X %Z");
    }

    #[test]
    fn test_shadowed_entry_order() {
        // With the short token first, the long one is unreachable
        let table = [token("D", "<d>", ""), token("DAYW", "<dayw>", "")];
        assert_eq!(translate_with("DAYW", &table), "<d>AYW");

        let table = [token("DAYW", "<dayw>", ""), token("D", "<d>", "")];
        assert_eq!(translate_with("DAYW", &table), "<dayw>");
    }

    #[test]
    fn test_replacement_not_rescanned() {
        // "X" -> "XX" must not loop forever
        let table = [token("X", "XX", "")];
        assert_eq!(translate_with("aXb", &table), "aXXb");
    }

    #[test]
    fn test_empty_token_ignored() {
        let table = [token("", "!", ""), token("a", "b", "")];
        assert_eq!(translate_with("aa", &table), "bb");
    }
}
