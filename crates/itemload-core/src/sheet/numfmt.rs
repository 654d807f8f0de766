//! Renders numeric cell values through spreadsheet number format codes.
//!
//! Covers the built-in formats and the custom codes people actually write:
//! digit placeholders (`0`, `#`, `?`), thousands grouping and `,` scaling,
//! percent, scientific notation, quoted and escaped literals, currency
//! brackets (`[$€-407]`), up to four `;`-separated sections, and date/time
//! codes including elapsed `[h]`. Colour and condition brackets are dropped.
//! Padding (`_x`) and fill (`*x`) produce no text. Fraction codes fall back
//! to General.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

/// The en-US display codes for the built-in number format ids.
pub fn builtin(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "$#,##0_);($#,##0)",
        6 => "$#,##0_);[Red]($#,##0)",
        7 => "$#,##0.00_);($#,##0.00)",
        8 => "$#,##0.00_);[Red]($#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yyyy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yyyy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// The General format: up to ten significant digits, scientific notation
/// for very large or very small magnitudes.
pub fn general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let mut exp = value.abs().log10().floor() as i32;
    if (-9..11).contains(&exp) {
        let decimals = (if exp >= 0 { 9 - exp } else { 9 }).max(0) as usize;
        let text = trim_fraction(format!("{:.*}", decimals, value));
        return if text == "-0" { "0".to_string() } else { text };
    }
    let mut mantissa = round_to(value / 10f64.powi(exp), 5);
    if mantissa.abs() >= 10.0 {
        mantissa /= 10.0;
        exp += 1;
    }
    let mantissa = trim_fraction(format!("{:.5}", mantissa));
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", mantissa, sign, exp.abs())
}

/// Formats `value` with `code`. `date1904` selects the workbook's date
/// system for date codes. Returns `None` for values the code cannot show,
/// such as negative dates.
pub fn format_number(value: f64, code: &str, date1904: bool) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let sections = split_sections(code);
    let (section, value, signed) = match sections.as_slice() {
        [only] => (*only, value, true),
        [pos, neg] => {
            if value < 0.0 {
                (*neg, -value, false)
            } else {
                (*pos, value, true)
            }
        }
        [pos, neg, zero, ..] => {
            if value < 0.0 {
                (*neg, -value, false)
            } else if value == 0.0 {
                (*zero, value, true)
            } else {
                (*pos, value, true)
            }
        }
        [] => return Some(general(value)),
    };

    let tokens = tokenize(section);
    if tokens.iter().any(Token::is_date) {
        return format_date(value, &tokens, date1904);
    }
    if is_fraction(&tokens) {
        return Some(general(value));
    }
    Some(format_numeric(value, &tokens, signed))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    /// `0`, `#` or `?`.
    Digit(char),
    Point,
    Comma,
    Percent,
    /// `E+` or `E-`; holds the sign character.
    Exponent(char),
    General,
    /// `@`, the text placeholder.
    Text,
    /// A run of one date letter (`y`, `m`, `d`, `h`, `s`) and its length.
    Date(char, usize),
    /// `[h]`, `[mm]`, `[ss]`: elapsed time unit and width.
    Elapsed(char, usize),
    /// `AM/PM`, or `A/P` when short.
    AmPm(bool),
}

impl Token {
    fn is_date(&self) -> bool {
        matches!(self, Token::Date(..) | Token::Elapsed(..) | Token::AmPm(_))
    }

    fn is_number(&self) -> bool {
        matches!(
            self,
            Token::Digit(_) | Token::Point | Token::Exponent(_) | Token::General | Token::Text
        )
    }

    /// The date letter of a date or elapsed token.
    fn unit(&self) -> Option<char> {
        match self {
            Token::Date(c, _) | Token::Elapsed(c, _) => Some(*c),
            _ => None,
        }
    }
}

/// Splits on `;` outside quotes, escapes and brackets.
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut bracketed = false;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !quoted => escaped = true,
            '"' => quoted = !quoted,
            '[' if !quoted => bracketed = true,
            ']' if !quoted => bracketed = false,
            ';' if !quoted && !bracketed => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Literal(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn starts_with_ignore_case(chars: &[char], word: &str) -> bool {
    word.chars().count() <= chars.len()
        && word
            .chars()
            .zip(chars)
            .all(|(w, c)| c.eq_ignore_ascii_case(&w))
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '"')
                    .map_or(chars.len(), |p| i + 1 + p);
                let text: String = chars[i + 1..end].iter().collect();
                push_literal(&mut tokens, &text);
                i = end + 1;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    push_literal(&mut tokens, &next.to_string());
                }
                i += 2;
            }
            '_' | '*' => i += 2,
            '[' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .map_or(chars.len(), |p| i + 1 + p);
                let inner: String = chars[i + 1..end].iter().collect();
                if let Some(currency) = inner.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or_default();
                    if !symbol.is_empty() {
                        push_literal(&mut tokens, symbol);
                    }
                } else if let Some(unit) = elapsed_unit(&inner) {
                    tokens.push(Token::Elapsed(unit, inner.len()));
                }
                i = end + 1;
            }
            '0' | '#' | '?' => {
                tokens.push(Token::Digit(c));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Point);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '@' => {
                tokens.push(Token::Text);
                i += 1;
            }
            'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                tokens.push(Token::Exponent(chars[i + 1]));
                i += 2;
            }
            _ if starts_with_ignore_case(&chars[i..], "general") => {
                tokens.push(Token::General);
                i += "general".len();
            }
            _ if starts_with_ignore_case(&chars[i..], "am/pm") => {
                tokens.push(Token::AmPm(false));
                i += "am/pm".len();
            }
            _ if starts_with_ignore_case(&chars[i..], "a/p") => {
                tokens.push(Token::AmPm(true));
                i += "a/p".len();
            }
            _ if matches!(c.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') => {
                let unit = c.to_ascii_lowercase();
                let run = chars[i..]
                    .iter()
                    .take_while(|c| c.to_ascii_lowercase() == unit)
                    .count();
                tokens.push(Token::Date(unit, run));
                i += run;
            }
            _ => {
                push_literal(&mut tokens, &c.to_string());
                i += 1;
            }
        }
    }
    tokens
}

fn elapsed_unit(inner: &str) -> Option<char> {
    let mut letters = inner.chars().map(|c| c.to_ascii_lowercase());
    let unit = letters.next()?;
    (matches!(unit, 'h' | 'm' | 's') && letters.all(|c| c == unit)).then_some(unit)
}

fn is_fraction(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| matches!(t, Token::Digit(_)))
        && tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(s) if s.contains('/')))
}

fn literal_text(token: &Token) -> &str {
    match token {
        Token::Literal(s) => s,
        Token::Comma => ",",
        Token::Percent => "%",
        _ => "",
    }
}

fn format_numeric(value: f64, tokens: &[Token], signed: bool) -> String {
    let (Some(first), Some(last)) = (
        tokens.iter().position(Token::is_number),
        tokens.iter().rposition(Token::is_number),
    ) else {
        return tokens.iter().map(literal_text).collect();
    };
    // Commas right after the last placeholder divide by a thousand each.
    let scaling = tokens[last + 1..]
        .iter()
        .take_while(|t| matches!(t, Token::Comma))
        .count();
    let percents = tokens.iter().filter(|t| matches!(t, Token::Percent)).count();
    let scaled = value.abs() * 100f64.powi(percents as i32) / 1000f64.powi(scaling as i32);

    let body = &tokens[first..=last];
    let (number, is_zero) = if body.iter().any(|t| matches!(t, Token::General | Token::Text)) {
        (general(scaled), scaled == 0.0)
    } else {
        render_digits(scaled, body)
    };

    let mut out = String::new();
    if signed && value < 0.0 && !is_zero {
        out.push('-');
    }
    out.extend(tokens[..first].iter().map(literal_text));
    out.push_str(&number);
    out.extend(tokens[last + 1 + scaling..].iter().map(literal_text));
    out
}

/// Renders a non-negative value through the placeholder run of a section.
/// Also reports whether the rendered number is zero.
fn render_digits(value: f64, body: &[Token]) -> (String, bool) {
    let exponent = body.iter().position(|t| matches!(t, Token::Exponent(_)));
    let mantissa_end = exponent.unwrap_or(body.len());
    let point = body[..mantissa_end]
        .iter()
        .position(|t| matches!(t, Token::Point));
    let int_end = point.unwrap_or(mantissa_end);

    let int_part = &body[..int_end];
    let grouped = int_part.iter().any(|t| matches!(t, Token::Comma));
    let int_min = int_part
        .iter()
        .filter(|t| matches!(t, Token::Digit('0')))
        .count();
    let frac_part = point.map_or(&[][..], |p| &body[p + 1..mantissa_end]);
    let frac_total = frac_part
        .iter()
        .filter(|t| matches!(t, Token::Digit(_)))
        .count();
    let frac_min = frac_part
        .iter()
        .filter(|t| matches!(t, Token::Digit('0')))
        .count();

    let (mantissa, exp) = match exponent {
        Some(_) if value != 0.0 => {
            let mut exp = value.log10().floor() as i32;
            let mut mantissa = round_to(value / 10f64.powi(exp), frac_total);
            if mantissa >= 10.0 {
                mantissa /= 10.0;
                exp += 1;
            }
            (mantissa, Some(exp))
        }
        Some(_) => (0.0, Some(0)),
        None => (round_to(value, frac_total), None),
    };

    let text = format!("{:.*}", frac_total, mantissa);
    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut int_digits = if int_digits == "0" && int_min == 0 {
        String::new()
    } else {
        int_digits.to_string()
    };
    while int_digits.len() < int_min {
        int_digits.insert(0, '0');
    }
    if grouped {
        int_digits = group_thousands(&int_digits);
    }
    let mut frac_digits = frac_digits.to_string();
    while frac_digits.len() > frac_min && frac_digits.ends_with('0') {
        frac_digits.pop();
    }

    let mut out = int_digits;
    if point.is_some() {
        out.push('.');
        out.push_str(&frac_digits);
    }
    if let (Some(exp), Some(at)) = (exp, exponent) {
        let width = body[at + 1..]
            .iter()
            .filter(|t| matches!(t, Token::Digit(_)))
            .count();
        let sign = match body[at] {
            _ if exp < 0 => "-",
            Token::Exponent('+') => "+",
            _ => "",
        };
        out.push_str(&format!("E{}{:0width$}", sign, exp.abs(), width = width));
    }
    (out, mantissa == 0.0)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounds half away from zero after trimming binary noise to fifteen
/// significant digits, so `2.675` rounds to `2.68`.
fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = format!("{:.14e}", value * factor)
        .parse::<f64>()
        .unwrap_or(value * factor);
    scaled.round() / factor
}

fn trim_fraction(mut text: String) -> String {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

/// Date for a serial day number; the 1900 system skips its phantom
/// 29 February 1900.
fn serial_to_datetime(serial: f64, date1904: bool, keep_millis: bool) -> Option<NaiveDateTime> {
    let base = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let mut millis = (serial * 86_400_000.0).round() as i64;
    if !keep_millis {
        millis = (millis + 500).div_euclid(1000) * 1000;
    }
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn format_date(serial: f64, tokens: &[Token], date1904: bool) -> Option<String> {
    if serial < 0.0 {
        // Only elapsed times have a meaningful negative.
        if tokens.iter().any(|t| matches!(t, Token::Elapsed(..))) {
            return format_date(-serial, tokens, date1904).map(|s| format!("-{}", s));
        }
        return None;
    }
    if serial > 2_958_465.0 {
        return None;
    }
    let sub_second = tokens.iter().any(|t| matches!(t, Token::Digit(_)));
    let dt = serial_to_datetime(serial, date1904, sub_second)?;
    let total_secs = if sub_second {
        (serial * 86_400.0).floor() as i64
    } else {
        (serial * 86_400.0).round() as i64
    };
    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::AmPm(_)));

    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Date('y', n) if *n <= 2 => out.push_str(&format!("{:02}", dt.year() % 100)),
            Token::Date('y', _) => out.push_str(&format!("{:04}", dt.year())),
            Token::Date('m', n) if is_minute(tokens, i) => out.push_str(&pad(dt.minute(), *n)),
            Token::Date('m', 1 | 2) => out.push_str(&pad(dt.month(), token_len(token))),
            Token::Date('m', 3) => out.push_str(&dt.format("%b").to_string()),
            Token::Date('m', 4) => out.push_str(&dt.format("%B").to_string()),
            Token::Date('m', _) => out.push_str(&dt.format("%B").to_string()[..1]),
            Token::Date('d', 1 | 2) => out.push_str(&pad(dt.day(), token_len(token))),
            Token::Date('d', 3) => out.push_str(&dt.format("%a").to_string()),
            Token::Date('d', _) => out.push_str(&dt.format("%A").to_string()),
            Token::Date('h', n) => {
                let hour = if twelve_hour {
                    match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    dt.hour()
                };
                out.push_str(&pad(hour, *n));
            }
            Token::Date('s', n) => out.push_str(&pad(dt.second(), *n)),
            Token::Date(..) => {}
            Token::Elapsed(unit, n) => {
                let amount = match *unit {
                    'h' => total_secs / 3600,
                    'm' => total_secs / 60,
                    _ => total_secs,
                };
                out.push_str(&format!("{:0width$}", amount, width = *n));
            }
            Token::AmPm(short) => {
                let pm = dt.hour() >= 12;
                out.push_str(match (*short, pm) {
                    (false, false) => "AM",
                    (false, true) => "PM",
                    (true, false) => "A",
                    (true, true) => "P",
                });
            }
            Token::Point => {
                let places = tokens[i + 1..]
                    .iter()
                    .take_while(|t| matches!(t, Token::Digit(_)))
                    .count()
                    .min(3);
                out.push('.');
                let millis = format!("{:03}", dt.nanosecond() / 1_000_000);
                out.push_str(&millis[..places]);
            }
            Token::Digit(_) | Token::Exponent(_) | Token::General | Token::Text => {}
            Token::Literal(_) | Token::Comma | Token::Percent => out.push_str(literal_text(token)),
        }
    }
    Some(out)
}

fn token_len(token: &Token) -> usize {
    match token {
        Token::Date(_, n) | Token::Elapsed(_, n) => *n,
        _ => 0,
    }
}

fn pad(value: u32, width: usize) -> String {
    if width >= 2 {
        format!("{:02}", value)
    } else {
        value.to_string()
    }
}

/// `m` means minutes right after an hour or right before a second.
fn is_minute(tokens: &[Token], at: usize) -> bool {
    let before = tokens[..at].iter().rev().find_map(Token::unit);
    let after = tokens[at + 1..].iter().find_map(Token::unit);
    before == Some('h') || after == Some('s')
}
