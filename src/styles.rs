//! Number formats from the workbook's style table
//!
//! A cell's `s` attribute indexes `cellXfs` in `xl/styles.xml`, and each of
//! those formats names a number format, either built in or declared under
//! `numFmts`. Only date and time formats change how a numeric cell reads:
//! the serial number is rendered through the format code. Every other
//! number keeps its stored text.

use crate::error::Result;
use crate::xml::{self, XmlReader};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fmt::Write;
use std::io::BufRead;

/// Serial number of 9999-12-31, the last day a sheet can hold
const MAX_SERIAL: f64 = 2_958_465.0;

/// Format codes of the built-in date and time formats
fn builtin_date_format(id: u32) -> Option<&'static str> {
    match id {
        14 => Some("m/d/yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mm:ss.0"),
        _ => None,
    }
}

/// Date rendering for each cell format of a workbook
#[derive(Debug, Clone, Default)]
pub struct CellStyles {
    /// chrono pattern per `cellXfs` index, `None` for non-date formats
    patterns: Vec<Option<String>>,
    date1904: bool,
}

impl CellStyles {
    /// Build from the number format id of each cell format, in `cellXfs` order
    ///
    /// `custom` holds the workbook's own `numFmts`, keyed by id.
    pub fn from_formats(
        format_ids: impl IntoIterator<Item = u32>,
        custom: &HashMap<u32, String>,
        date1904: bool,
    ) -> Self {
        let patterns = format_ids
            .into_iter()
            .map(|id| {
                custom
                    .get(&id)
                    .map(String::as_str)
                    .or_else(|| builtin_date_format(id))
                    .filter(|code| is_date_format(code))
                    .map(to_chrono_pattern)
            })
            .collect();

        CellStyles { patterns, date1904 }
    }

    /// Load `numFmts` and `cellXfs` from styles.xml
    pub(crate) fn parse<R: BufRead>(reader: &mut XmlReader<R>, date1904: bool) -> Result<Self> {
        let mut custom = HashMap::new();
        let mut format_ids = Vec::new();
        let mut in_cell_xfs = false;

        while let Some(event) = reader.next()? {
            match event {
                Event::Start(node) => match node.local_name().as_ref() {
                    // Example: <numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/>
                    b"numFmt" => {
                        let id = xml::attribute(&node, "numFmtId")?;
                        let code = xml::attribute(&node, "formatCode")?;
                        if let (Some(id), Some(code)) = (id, code) {
                            if let Ok(id) = id.trim().parse::<u32>() {
                                custom.insert(id, code.into_owned());
                            }
                        }
                    }
                    b"cellXfs" => in_cell_xfs = true,
                    // `cellStyleXfs` holds `xf` elements too; only `cellXfs` is indexed by `s`
                    b"xf" if in_cell_xfs => {
                        let id = xml::attribute(&node, "numFmtId")?
                            .and_then(|id| id.trim().parse::<u32>().ok())
                            .unwrap_or(0);
                        format_ids.push(id);
                    }
                    _ => {}
                },
                Event::End(node) if node.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                _ => {}
            }
        }

        Ok(Self::from_formats(format_ids, &custom, date1904))
    }

    /// Number of cell formats
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether cells with this format index hold dates or times
    pub fn is_date(&self, style: usize) -> bool {
        matches!(self.patterns.get(style), Some(Some(_)))
    }

    /// Render a numeric cell's stored text through its date format
    ///
    /// Returns `None` when the format is not a date format or the text is not
    /// a serial number within the calendar, in which case the stored text
    /// stands.
    pub fn format(&self, style: usize, raw: &str) -> Option<String> {
        let pattern = self.patterns.get(style)?.as_ref()?;
        let serial = raw.trim().parse::<f64>().ok()?;
        let value = self.to_datetime(serial)?;

        let mut text = String::new();
        write!(text, "{}", value.format(pattern)).ok()?;
        Some(text)
    }

    fn to_datetime(&self, serial: f64) -> Option<NaiveDateTime> {
        if !(0.0..=MAX_SERIAL).contains(&serial) {
            return None;
        }
        // The 1900 system counts a phantom 1900-02-29 as day 60
        let epoch = if self.date1904 {
            NaiveDate::from_ymd_opt(1904, 1, 1)?
        } else if serial < 60.0 {
            NaiveDate::from_ymd_opt(1899, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30)?
        };
        let seconds = (serial * 86_400.0).round() as i64;
        epoch
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }
}

/// Whether a format code renders dates or times
///
/// Quoted text, escaped characters and bracketed sections (colors, locales)
/// are ignored. `m` alone is ambiguous between months and minutes and does
/// not count.
fn is_date_format(code: &str) -> bool {
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_bracket = false;

    for character in code.chars() {
        match character {
            _ if is_escaped => is_escaped = false,
            '_' | '\\' | '*' if !is_literal => is_escaped = true,
            '"' => is_literal = !is_literal,
            _ if is_literal => {}
            '[' => is_bracket = true,
            ']' => is_bracket = false,
            _ if is_bracket => {}
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Year(usize),
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    AmPm,
}

/// Translate the first section of a date format code to a chrono pattern
///
/// Fractional seconds are dropped and elapsed-time brackets (`[h]`) read as
/// the plain unit.
fn to_chrono_pattern(code: &str) -> String {
    let tokens = resolve_minutes(tokenize(code));
    let twelve_hour = tokens.contains(&Token::AmPm);

    let mut pattern = String::new();
    for token in tokens {
        let spec = match token {
            Token::Literal(text) => {
                pattern.push_str(&text.replace('%', "%%"));
                continue;
            }
            Token::Year(n) if n <= 2 => "%y",
            Token::Year(_) => "%Y",
            Token::Month(1) => "%-m",
            Token::Month(2) => "%m",
            Token::Month(3) => "%b",
            Token::Month(_) => "%B",
            Token::Minute(1) => "%-M",
            Token::Minute(_) => "%M",
            Token::Day(1) => "%-d",
            Token::Day(2) => "%d",
            Token::Day(3) => "%a",
            Token::Day(_) => "%A",
            Token::Hour(1) if twelve_hour => "%-I",
            Token::Hour(_) if twelve_hour => "%I",
            Token::Hour(1) => "%-H",
            Token::Hour(_) => "%H",
            Token::Second(1) => "%-S",
            Token::Second(_) => "%S",
            Token::AmPm => "%p",
        };
        pattern.push_str(spec);
    }
    pattern
}

fn tokenize(code: &str) -> Vec<Token> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    let flush = |literal: &mut String, tokens: &mut Vec<Token>| {
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(literal)));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            ';' => break,
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    literal.push(chars[i]);
                    i += 1;
                }
                i += 1;
                continue;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    literal.push(*next);
                }
                i += 2;
                continue;
            }
            '_' => {
                literal.push(' ');
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            '[' => {
                let end = chars[i..].iter().position(|&c| c == ']').map(|p| i + p);
                let inner: String = match end {
                    Some(end) => chars[i + 1..end].iter().collect(),
                    None => String::new(),
                };
                let unit = inner.to_ascii_lowercase();
                if !unit.is_empty() && unit.chars().all(|c| c == unit.as_bytes()[0] as char) {
                    let token = match unit.as_bytes()[0] {
                        b'h' => Some(Token::Hour(unit.len())),
                        b'm' => Some(Token::Minute(unit.len())),
                        b's' => Some(Token::Second(unit.len())),
                        _ => None,
                    };
                    if let Some(token) = token {
                        flush(&mut literal, &mut tokens);
                        tokens.push(token);
                    }
                }
                i = end.map(|end| end + 1).unwrap_or(chars.len());
                continue;
            }
            'a' | 'A' => {
                let rest: String = chars[i..].iter().take(5).collect::<String>().to_ascii_uppercase();
                let width = if rest.starts_with("AM/PM") {
                    5
                } else if rest.starts_with("A/P") {
                    3
                } else {
                    0
                };
                if width > 0 {
                    flush(&mut literal, &mut tokens);
                    tokens.push(Token::AmPm);
                    i += width;
                } else {
                    literal.push(c);
                    i += 1;
                }
                continue;
            }
            '.' if matches!(tokens.last(), Some(Token::Second(_))) && literal.is_empty() => {
                // Fractional seconds
                i += 1;
                while i < chars.len() && chars[i] == '0' {
                    i += 1;
                }
                continue;
            }
            _ => {}
        }

        let lower = c.to_ascii_lowercase();
        if matches!(lower, 'y' | 'm' | 'd' | 'h' | 's') {
            let run = chars[i..]
                .iter()
                .take_while(|ch| ch.to_ascii_lowercase() == lower)
                .count();
            flush(&mut literal, &mut tokens);
            tokens.push(match lower {
                'y' => Token::Year(run),
                'm' => Token::Month(run),
                'd' => Token::Day(run),
                'h' => Token::Hour(run),
                _ => Token::Second(run),
            });
            i += run;
        } else {
            literal.push(c);
            i += 1;
        }
    }
    flush(&mut literal, &mut tokens);
    tokens
}

/// `m`/`mm` after an hour or before a second is minutes, not months
fn resolve_minutes(mut tokens: Vec<Token>) -> Vec<Token> {
    let units: Vec<usize> = (0..tokens.len())
        .filter(|&i| !matches!(tokens[i], Token::Literal(_)))
        .collect();

    for (position, &index) in units.iter().enumerate() {
        let Token::Month(n) = tokens[index] else {
            continue;
        };
        if n > 2 {
            continue;
        }
        let after_hour = position
            .checked_sub(1)
            .map(|p| matches!(tokens[units[p]], Token::Hour(_)))
            .unwrap_or(false);
        let before_second = units
            .get(position + 1)
            .map(|&next| matches!(tokens[next], Token::Second(_)))
            .unwrap_or(false);
        if after_hour || before_second {
            tokens[index] = Token::Minute(n);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(ids: &[u32]) -> CellStyles {
        CellStyles::from_formats(ids.iter().copied(), &HashMap::new(), false)
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("h:mm AM/PM"));
        assert!(is_date_format("[$-409]d-mmm-yy;@"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("#,##0 \"days\""));
        assert!(!is_date_format("[Red]0.00"));
    }

    #[test]
    fn test_chrono_patterns() {
        assert_eq!(to_chrono_pattern("m/d/yy"), "%-m/%-d/%y");
        assert_eq!(to_chrono_pattern("yyyy\\-mm\\-dd"), "%Y-%m-%d");
        assert_eq!(to_chrono_pattern("h:mm:ss AM/PM"), "%-I:%M:%S %p");
        assert_eq!(to_chrono_pattern("d-mmm-yy"), "%-d-%b-%y");
        assert_eq!(to_chrono_pattern("mm:ss.0"), "%M:%S");
        assert_eq!(to_chrono_pattern("[h]:mm:ss"), "%-H:%M:%S");
        assert_eq!(to_chrono_pattern("yyyy\"年\"m\"月\";@"), "%Y年%-m月");
    }

    #[test]
    fn test_builtin_date_formats() {
        // cellXfs: General, m/d/yy, 0.00, h:mm, m/d/yy h:mm
        let styles = builtin(&[0, 14, 2, 20, 22]);
        assert_eq!(styles.len(), 5);
        assert!(!styles.is_date(0));
        assert!(styles.is_date(1));
        assert!(!styles.is_date(2));

        assert_eq!(styles.format(1, "44197").as_deref(), Some("1/1/21"));
        assert_eq!(styles.format(3, "0.5").as_deref(), Some("12:00"));
        assert_eq!(styles.format(4, "44197.75").as_deref(), Some("1/1/21 18:00"));
        assert_eq!(styles.format(0, "44197"), None);
        assert_eq!(styles.format(2, "1.5"), None);
        assert_eq!(styles.format(9, "1.5"), None);
    }

    #[test]
    fn test_custom_format_and_1904_system() {
        let custom = HashMap::from([(164, "yyyy-mm-dd".to_string())]);
        let styles = CellStyles::from_formats([164], &custom, false);
        assert_eq!(styles.format(0, "1").as_deref(), Some("1900-01-01"));
        assert_eq!(styles.format(0, "61").as_deref(), Some("1900-03-01"));

        let styles = CellStyles::from_formats([164], &custom, true);
        assert_eq!(styles.format(0, "0").as_deref(), Some("1904-01-01"));
    }

    #[test]
    fn test_out_of_range_serial_keeps_text() {
        let styles = builtin(&[14]);
        assert_eq!(styles.format(0, "-1"), None);
        assert_eq!(styles.format(0, "3000000"), None);
        assert_eq!(styles.format(0, "not a date"), None);
    }

    #[test]
    fn test_parse_styles_xml() {
        let xml = r#"<styleSheet>
            <numFmts count="1"><numFmt numFmtId="164" formatCode="dd/mm/yyyy"/></numFmts>
            <cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs>
            <cellXfs count="3">
                <xf numFmtId="0" fontId="0"/>
                <xf numFmtId="164" applyNumberFormat="1"><alignment horizontal="left"/></xf>
                <xf numFmtId="15"/>
            </cellXfs>
        </styleSheet>"#;
        let mut reader = XmlReader::new(xml.as_bytes());
        let styles = CellStyles::parse(&mut reader, false).unwrap();

        assert_eq!(styles.len(), 3);
        assert!(!styles.is_date(0));
        assert_eq!(styles.format(1, "44197").as_deref(), Some("01/01/2021"));
        assert_eq!(styles.format(2, "44197").as_deref(), Some("1-Jan-21"));
    }
}
