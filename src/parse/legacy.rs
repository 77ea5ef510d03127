use std::str::FromStr;

use chrono::NaiveDate;

use crate::model::todo::{Kind, Level, TodoItem};

/// Result of reading a legacy month file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyParse {
    /// Records read before the first error
    pub todos: Vec<TodoItem>,
    /// Item count from the header line
    pub declared: usize,
    /// Unparsed tail, starting at the record that failed
    pub dropped: Vec<String>,
    /// Why parsing stopped early, if it did
    pub error: Option<LegacyParseError>,
}

/// Why a legacy record could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyParseError {
    #[error("invalid item count: {0:?}")]
    BadCount(String),
    #[error("unexpected end of file reading {0}")]
    UnexpectedEof(&'static str),
    #[error("invalid {field} on line {line}: {text:?}")]
    Invalid {
        field: &'static str,
        line: usize,
        text: String,
    },
}

/// Parse the legacy line-oriented month format.
///
/// Layout: a count line, then per item a `name` block, a `label` block,
/// the level, `year month day hour minute`, a `place` block, a `content`
/// block and `done kind warnTime`. A block is a line count followed by
/// that many lines of text.
///
/// Parsing stops at the first malformed record; everything read up to
/// that point is kept.
pub fn parse_legacy(source: &str) -> LegacyParse {
    let lines: Vec<&str> = source.lines().collect();
    let Some(first) = lines.first() else {
        return LegacyParse::default();
    };

    let declared = match first.trim().parse::<i64>() {
        Ok(n) => usize::try_from(n).unwrap_or(0),
        Err(_) => {
            return LegacyParse {
                dropped: to_owned_lines(&lines),
                error: Some(LegacyParseError::BadCount(first.to_string())),
                ..Default::default()
            };
        }
    };

    let mut cursor = Cursor { lines: &lines, pos: 1 };
    let mut result = LegacyParse {
        declared,
        ..Default::default()
    };

    for _ in 0..declared {
        let start = cursor.pos;
        match read_item(&mut cursor) {
            Ok(item) => result.todos.push(item),
            Err(e) => {
                result.dropped = to_owned_lines(&lines[start.min(lines.len())..]);
                result.error = Some(e);
                break;
            }
        }
    }

    result
}

fn to_owned_lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

struct Cursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next_line(&mut self, field: &'static str) -> Result<&'a str, LegacyParseError> {
        let line = self
            .lines
            .get(self.pos)
            .ok_or(LegacyParseError::UnexpectedEof(field))?;
        self.pos += 1;
        Ok(line)
    }

    fn invalid(&self, field: &'static str, text: &str) -> LegacyParseError {
        LegacyParseError::Invalid {
            field,
            line: self.pos,
            text: text.to_string(),
        }
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, LegacyParseError> {
        let line = self.next_line(field)?;
        line.trim().parse().map_err(|_| self.invalid(field, line))
    }

    /// Read a length-prefixed block. A block cut short by end of file
    /// yields the lines that were there.
    fn block(&mut self, field: &'static str) -> Result<String, LegacyParseError> {
        let count: i64 = self.number(field)?;
        let mut text = Vec::new();
        for _ in 0..count.max(0) {
            match self.lines.get(self.pos) {
                Some(line) => {
                    text.push(*line);
                    self.pos += 1;
                }
                None => break,
            }
        }
        Ok(text.join("\n"))
    }
}

fn read_item(cursor: &mut Cursor<'_>) -> Result<TodoItem, LegacyParseError> {
    let name = cursor.block("name")?;
    let label = cursor.block("label")?;
    let level: i64 = cursor.number("level")?;

    let when = cursor.next_line("date")?;
    let parts: Vec<i64> = when
        .split_whitespace()
        .map(|p| p.parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|_| cursor.invalid("date", when))?;
    let [year, month, day, hour, minute] = parts[..] else {
        return Err(cursor.invalid("date", when));
    };
    let todo_time = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .zip(u32::try_from(hour).ok().zip(u32::try_from(minute).ok()))
        .and_then(|(date, (h, min))| date.and_hms_opt(h, min, 0))
        .ok_or_else(|| cursor.invalid("date", when))?;

    let place = cursor.block("place")?;
    let content = cursor.block("content")?;

    let status = cursor.next_line("status")?;
    let fields: Vec<&str> = status.split_whitespace().collect();
    let [done, kind, warn] = fields[..] else {
        return Err(cursor.invalid("status", status));
    };
    let done = parse_flag(done).ok_or_else(|| cursor.invalid("status", status))?;
    let kind: i64 = kind.parse().map_err(|_| cursor.invalid("status", status))?;
    let warn_time: u32 = warn.parse().map_err(|_| cursor.invalid("status", status))?;

    Ok(TodoItem {
        name,
        content,
        place,
        label,
        kind: Kind::from(kind),
        level: Level::from(level),
        todo_time,
        done,
        warn_time,
        starred: false,
        order: 0,
    })
}

/// Boolean spellings the legacy writer may have produced
fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(name: &str, day: u32, hour: u32) -> String {
        format!("1\n{name}\n1\nwork\n2\n2025 3 {day} {hour} 30\n1\noffice\n1\nbring notes\nfalse 1 15\n")
    }

    #[test]
    fn test_parse_single_record() {
        let src = format!("1\n{}", record("Standup", 4, 9));
        let parsed = parse_legacy(&src);
        assert!(parsed.error.is_none());
        assert_eq!(parsed.declared, 1);
        assert_eq!(parsed.todos.len(), 1);

        let item = &parsed.todos[0];
        assert_eq!(item.name, "Standup");
        assert_eq!(item.label, "work");
        assert_eq!(item.level, Level::High);
        assert_eq!(item.todo_time, at(4, 9, 30));
        assert_eq!(item.place, "office");
        assert_eq!(item.content, "bring notes");
        assert!(!item.done);
        assert_eq!(item.kind, Kind::Task);
        assert_eq!(item.warn_time, 15);
        assert_eq!(item.order, 0);
    }

    #[test]
    fn test_multi_line_blocks() {
        let src = "1\n2\nfirst line\nsecond line\n0\n0\n2025 3 1 8 0\n0\n3\na\n\nc\ntrue 0 0\n";
        let parsed = parse_legacy(src);
        let item = &parsed.todos[0];
        assert_eq!(item.name, "first line\nsecond line");
        assert_eq!(item.label, "");
        assert_eq!(item.place, "");
        assert_eq!(item.content, "a\n\nc");
        assert!(item.done);
        assert_eq!(item.kind, Kind::Event);
    }

    #[test]
    fn test_truncated_stream_keeps_complete_records() {
        let mut src = String::from("5\n");
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            src.push_str(&record(name, 10 + i as u32, 8));
        }
        src.push_str("1\nd\n1\n");

        let parsed = parse_legacy(&src);
        assert_eq!(parsed.declared, 5);
        assert_eq!(parsed.todos.len(), 3);
        assert_eq!(parsed.dropped, vec!["1", "d", "1"]);
        assert!(matches!(
            parsed.error,
            Some(LegacyParseError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_bad_date_stops_parse() {
        let src = format!(
            "2\n{}1\nbroken\n0\n0\n2025 2 30 8 0\n0\n0\nfalse 0 0\n",
            record("ok", 1, 8)
        );
        let parsed = parse_legacy(&src);
        assert_eq!(parsed.todos.len(), 1);
        assert_eq!(parsed.dropped.first().map(String::as_str), Some("1"));
        assert!(matches!(
            parsed.error,
            Some(LegacyParseError::Invalid { field: "date", .. })
        ));
    }

    #[test]
    fn test_bad_count_yields_nothing() {
        let parsed = parse_legacy("many\n1\nx\n");
        assert!(parsed.todos.is_empty());
        assert_eq!(parsed.dropped.len(), 3);
        assert!(matches!(parsed.error, Some(LegacyParseError::BadCount(_))));
    }

    #[test]
    fn test_empty_source() {
        let parsed = parse_legacy("");
        assert!(parsed.todos.is_empty());
        assert!(parsed.error.is_none());
        assert!(parsed.dropped.is_empty());
    }

    #[test]
    fn test_windows_line_endings() {
        let src = record("crlf", 2, 7).replace('\n', "\r\n");
        let parsed = parse_legacy(&format!("1\r\n{}", src));
        assert_eq!(parsed.todos.len(), 1);
        assert_eq!(parsed.todos[0].name, "crlf");
        assert_eq!(parsed.todos[0].warn_time, 15);
    }

    #[test]
    fn test_out_of_range_level_reads_low() {
        let src = "1\n1\nx\n0\n9\n2025 3 1 8 0\n0\n0\nF 0 0\n";
        let parsed = parse_legacy(src);
        assert_eq!(parsed.todos[0].level, Level::Low);
    }
}
