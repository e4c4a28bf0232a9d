//! Ordinals as they appear in act and chapter headings: `3`, `III`, `Three`,
//! `Twenty-One`.

const UNITS: &[&str] = &[
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: &[&str] = &[
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Parse an ordinal token. Returns `None` for zero or anything unrecognized.
pub fn parse_ordinal(token: &str) -> Option<u32> {
    let token = token.trim().trim_end_matches(['.', ':']);
    if token.is_empty() {
        return None;
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse::<u32>().ok().filter(|n| *n > 0);
    }
    parse_roman(token).or_else(|| parse_words(token))
}

fn parse_roman(token: &str) -> Option<u32> {
    let upper = token.to_ascii_uppercase();
    let mut total = 0u32;
    let mut prev = 0u32;
    for c in upper.chars().rev() {
        let value = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }
    // Reject non-canonical forms like "IIII" or "VX".
    (total > 0 && to_roman(total) == upper).then_some(total)
}

/// Canonical upper-case roman numeral for `n` (`n` in 1..4000).
pub fn to_roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

fn parse_words(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    let parts: Vec<&str> = lower
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [single] => unit_value(single).or_else(|| tens_value(single)),
        [tens, unit] => {
            let t = tens_value(tens)?;
            let u = unit_value(unit).filter(|u| *u < 10)?;
            Some(t + u)
        }
        _ => None,
    }
}

fn unit_value(word: &str) -> Option<u32> {
    UNITS.iter().position(|w| *w == word).map(|i| i as u32 + 1)
}

fn tens_value(word: &str) -> Option<u32> {
    TENS.iter().position(|w| *w == word).map(|i| (i as u32 + 2) * 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic() {
        assert_eq!(parse_ordinal("12"), Some(12));
        assert_eq!(parse_ordinal("3:"), Some(3));
        assert_eq!(parse_ordinal("0"), None);
    }

    #[test]
    fn roman() {
        assert_eq!(parse_ordinal("IV"), Some(4));
        assert_eq!(parse_ordinal("xii"), Some(12));
        assert_eq!(parse_ordinal("IIII"), None);
        assert_eq!(parse_ordinal("VX"), None);
    }

    #[test]
    fn overlong_roman_is_rejected() {
        assert_eq!(parse_ordinal(&"M".repeat(4_300_000)), None);
    }

    #[test]
    fn words() {
        assert_eq!(parse_ordinal("One"), Some(1));
        assert_eq!(parse_ordinal("nineteen"), Some(19));
        assert_eq!(parse_ordinal("Twenty-One"), Some(21));
        assert_eq!(parse_ordinal("forty"), Some(40));
        assert_eq!(parse_ordinal("twenty-eleven"), None);
        assert_eq!(parse_ordinal("prologue"), None);
    }

    #[test]
    fn roman_rendering() {
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(3), "III");
    }
}
