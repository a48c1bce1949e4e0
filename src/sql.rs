//! Display-only SQL parameter inlining.
//!
//! Reports show the statement that failed with its bound parameters written
//! in, so it can be pasted into a SQL console:
//!
//! ```rust
//! use reportkit::sql;
//!
//! let shown = sql::inline(
//!     "SELECT * FROM users WHERE id = ? AND name = ?",
//!     &[&7, &"O'Hara"],
//! );
//! assert_eq!(shown, "SELECT * FROM users WHERE id = 7 AND name = 'O''Hara'");
//! ```
//!
//! The output is meant for humans. It is never used to build the statement
//! that is actually executed.

use core::fmt;
use std::{borrow::Cow, time::Duration};

/// Queries slower than this deserve a warning.
///
/// Shared threshold for the SQL execution layer; the reporter does not time
/// queries itself.
pub const QUERY_TIME_WARNING: Duration = Duration::from_millis(200);

/// Queries slower than this should be cancelled to free the connection.
///
/// Shared threshold for the SQL execution layer; the reporter does not
/// enforce it.
pub const QUERY_DEADLINE: Duration = Duration::from_secs(5);

/// A value that can be written into a statement as a SQL literal.
pub trait SqlParam {
    /// Writes the literal form of `self`.
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Replaces the placeholders in `query` with literal renderings of `params`.
///
/// - `?` placeholders bind to the parameters in order.
/// - `$N` placeholders bind to the N-th parameter, counting from 1.
/// - Placeholders inside quoted strings, quoted identifiers and `--`
///   comments are left alone.
/// - A placeholder with no matching parameter is kept as written.
pub fn inline(query: &str, params: &[&dyn SqlParam]) -> String {
    let mut out = String::with_capacity(query.len() + params.len() * 8);
    let mut next_positional = 0usize;
    let mut chars = query.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                let end = closing_quote(query, start, c);
                out.push_str(&query[start..end]);
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
            }
            '-' if query[start..].starts_with("--") => {
                let end = query[start..]
                    .find('\n')
                    .map_or(query.len(), |offset| start + offset);
                out.push_str(&query[start..end]);
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
            }
            '?' => {
                match params.get(next_positional) {
                    Some(param) => push_literal(&mut out, *param, "?"),
                    None => out.push('?'),
                }
                next_positional += 1;
            }
            '$' => {
                let digits_start = start + 1;
                let digits_len = query[digits_start..]
                    .bytes()
                    .take_while(u8::is_ascii_digit)
                    .count();
                let digits = &query[digits_start..digits_start + digits_len];
                let param = digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| params.get(index));
                match param {
                    Some(param) if !digits.is_empty() => {
                        push_literal(&mut out, *param, &query[start..digits_start + digits_len]);
                        for _ in 0..digits_len {
                            chars.next();
                        }
                    }
                    _ => out.push('$'),
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Returns the byte offset just past the quote closing the one at `start`.
/// Doubled quotes are escapes. An unterminated quote runs to the end.
fn closing_quote(query: &str, start: usize, quote: char) -> usize {
    let bytes = query.as_bytes();
    let quote = quote as u8;
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn push_literal(out: &mut String, param: &dyn SqlParam, placeholder: &str) {
    let mark = out.len();
    if param.write_literal(out).is_err() {
        out.truncate(mark);
        out.push_str(placeholder);
    }
}

fn quoted(out: &mut dyn fmt::Write, text: &str) -> fmt::Result {
    out.write_char('\'')?;
    for (i, part) in text.split('\'').enumerate() {
        if i > 0 {
            out.write_str("''")?;
        }
        out.write_str(part)?;
    }
    out.write_char('\'')
}

macro_rules! sql_param_as_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SqlParam for $ty {
                fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
                    write!(out, "{self}")
                }
            }
        )*
    };
}

sql_param_as_number!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl SqlParam for f32 {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if self.is_finite() {
            write!(out, "{self}")
        } else {
            quoted(out, &self.to_string())
        }
    }
}

impl SqlParam for f64 {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if self.is_finite() {
            write!(out, "{self}")
        } else {
            quoted(out, &self.to_string())
        }
    }
}

impl SqlParam for bool {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(if *self { "true" } else { "false" })
    }
}

impl SqlParam for char {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let mut buf = [0u8; 4];
        quoted(out, self.encode_utf8(&mut buf))
    }
}

impl SqlParam for str {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, self)
    }
}

impl SqlParam for String {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, self)
    }
}

impl SqlParam for Cow<'_, str> {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, self)
    }
}

impl<T: SqlParam + ?Sized> SqlParam for &T {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        (**self).write_literal(out)
    }
}

impl<T: SqlParam + ?Sized> SqlParam for Box<T> {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        (**self).write_literal(out)
    }
}

impl<T: SqlParam> SqlParam for Option<T> {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Some(value) => value.write_literal(out),
            None => out.write_str("NULL"),
        }
    }
}

/// Comma separated, for `IN (?)` lists.
impl<T: SqlParam> SqlParam for [T] {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            value.write_literal(out)?;
        }
        Ok(())
    }
}

impl<T: SqlParam> SqlParam for Vec<T> {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.as_slice().write_literal(out)
    }
}

impl<T: SqlParam, const N: usize> SqlParam for [T; N] {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.as_slice().write_literal(out)
    }
}

impl<Tz: chrono::TimeZone> SqlParam for chrono::DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, &self.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
    }
}

impl SqlParam for chrono::NaiveDateTime {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, &self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl SqlParam for chrono::NaiveDate {
    fn write_literal(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        quoted(out, &self.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_placeholders() {
        assert_eq!(
            inline("SELECT * FROM t WHERE id = ?", &[&5]),
            "SELECT * FROM t WHERE id = 5"
        );
        assert_eq!(
            inline("UPDATE t SET a = ?, b = ? WHERE c = ?", &[&1.5, &true, &None::<i32>]),
            "UPDATE t SET a = 1.5, b = true WHERE c = NULL"
        );
    }

    #[test]
    fn test_numbered_placeholders() {
        assert_eq!(
            inline("SELECT $2::int, $1, $10", &[&"a", &7]),
            "SELECT 7::int, 'a', $10"
        );
        assert_eq!(inline("SELECT $ FROM t", &[&1]), "SELECT $ FROM t");
        assert_eq!(inline("SELECT $0", &[&1]), "SELECT $0");
    }

    #[test]
    fn test_missing_params_keep_placeholder() {
        assert_eq!(inline("a = ? AND b = ?", &[&1]), "a = 1 AND b = ?");
        assert_eq!(inline("a = ?", &[]), "a = ?");
    }

    #[test]
    fn test_strings_are_escaped() {
        assert_eq!(inline("name = ?", &[&"it's"]), "name = 'it''s'");
        assert_eq!(inline("c = ?", &[&'x']), "c = 'x'");
        let owned = String::from("plain");
        assert_eq!(inline("name = ?", &[&owned]), "name = 'plain'");
    }

    #[test]
    fn test_quoted_sections_are_skipped() {
        assert_eq!(
            inline("SELECT '?', \"col?\" FROM t WHERE a = ?", &[&1]),
            "SELECT '?', \"col?\" FROM t WHERE a = 1"
        );
        assert_eq!(
            inline("SELECT 'it''s ?' WHERE a = ?", &[&2]),
            "SELECT 'it''s ?' WHERE a = 2"
        );
        assert_eq!(
            inline("SELECT a -- why?\nFROM t WHERE b = ?", &[&3]),
            "SELECT a -- why?\nFROM t WHERE b = 3"
        );
        assert_eq!(inline("SELECT 'open ?", &[&1]), "SELECT 'open ?");
    }

    #[test]
    fn test_lists() {
        let ids = vec![1, 2, 3];
        assert_eq!(
            inline("SELECT * FROM t WHERE id IN (?)", &[&ids]),
            "SELECT * FROM t WHERE id IN (1, 2, 3)"
        );
        assert_eq!(inline("IN (?)", &[&["a", "b"]]), "IN ('a', 'b')");
    }

    #[test]
    fn test_timestamps() {
        let at = chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(inline("at = ?", &[&at]), "at = '2026-10-18 09:30:00'");
        assert_eq!(
            inline("at = ?", &[&at.and_utc()]),
            "at = '2026-10-18 09:30:00+00:00'"
        );
        assert_eq!(inline("d = ?", &[&at.date()]), "d = '2026-10-18'");
    }

    #[test]
    fn test_non_ascii_query() {
        assert_eq!(inline("SELECT 'ü' || ?", &[&"ß"]), "SELECT 'ü' || 'ß'");
    }
}
