//! Number formatting for the metrics panel and map tooltips.

/// Integer with `,` thousands separators: `5000` -> `5,000`.
pub fn thousands(value: u64) -> String {
    group(&value.to_string(), ',')
}

/// One decimal and a percent sign: `20.0` -> `20.0 %`.
pub fn percent(value: f64) -> String {
    format!("{:.1} %", value)
}

/// Spanish (Argentina) rendering used in tooltips: `.` groups, `,` decimals,
/// at most two fraction digits, trailing zeros dropped.
pub fn localized(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group(int_part, '.'));
    if !frac.is_empty() {
        out.push(',');
        out.push_str(frac);
    }
    out
}

fn group(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
