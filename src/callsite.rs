//! Call-site resolution.
//!
//! Reports carry the source location of the code that produced them. There
//! are two ways to obtain it:
//!
//! - [`CallSite::caller`] reads the location the compiler threads through
//!   `#[track_caller]` functions. This is exact, free, and what the
//!   [`Reporter`](crate::Reporter) uses.
//! - [`locate`], [`locate_all`] and [`frames`] walk the live stack with the
//!   [`backtrace`](https://docs.rs/backtrace) crate. They need debug info and
//!   the `backtrace` feature; without either they degrade to empty results.
//!
//! ## Usage
//!
//! ```rust
//! use reportkit::callsite::{self, CallSite};
//!
//! let site = CallSite::caller();
//! assert_eq!(site.line, line!() - 1);
//!
//! // Either empty or "<file>:<line>".
//! let located = callsite::locate();
//! # let _ = located;
//! ```

use core::{fmt, panic::Location};

/// Maximum number of candidate frames inspected by the stack walker.
pub const MAX_FRAMES: usize = 15;

/// A source location captured through `#[track_caller]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// The source file, as the compiler saw it.
    pub file: &'static str,
    /// The line number.
    pub line: u32,
    /// The column number.
    pub column: u32,
}

impl CallSite {
    /// Returns the location of the caller.
    ///
    /// Inside a chain of `#[track_caller]` functions this is the location of
    /// the first call that is not itself tracked.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// Formats as `file:line`.
impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single resolved stack frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Short name of the function, without its module path or generics.
    pub function: String,
    /// File path from the debug information.
    pub file: String,
    /// Line number, when the debug information has one.
    pub line: Option<u32>,
}

/// Formats as `file:line`, or just `file` when the line is unknown.
impl fmt::Display for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// Controls which frames the stack walker reports.
///
/// # Examples
///
/// ```rust
/// use reportkit::callsite::{self, FrameFilter};
///
/// let filter = FrameFilter {
///     skipped_initial_crates: &["backtrace", "reportkit", "std", "core", "alloc", "tokio"],
///     ..FrameFilter::DEFAULT
/// };
/// for frame in callsite::frames(&filter) {
///     println!("{} - {frame}", frame.function);
/// }
/// ```
#[derive(Copy, Clone, Debug)]
pub struct FrameFilter {
    /// Crates whose frames are skipped while they are at the top of the
    /// stack. These frames do not count towards `max_frames`.
    pub skipped_initial_crates: &'static [&'static str],
    /// Maximum number of frames inspected after the initial skip.
    pub max_frames: usize,
}

impl FrameFilter {
    /// Skips the walker's own frames and inspects [`MAX_FRAMES`] frames.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &["backtrace", "reportkit", "core", "std", "alloc"],
        max_frames: MAX_FRAMES,
    };
}

impl Default for FrameFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Returns the first frame above the resolver that has a file and a line,
/// formatted as `file:line`.
///
/// Returns an empty string when no frame within [`MAX_FRAMES`] resolves,
/// for example in binaries without debug info.
#[must_use]
#[inline(never)]
pub fn locate() -> String {
    frames(&FrameFilter::DEFAULT)
        .into_iter()
        .find(|frame| frame.line.is_some())
        .map(|frame| frame.to_string())
        .unwrap_or_default()
}

/// Returns every frame whose path contains `/<app_name>/`, innermost first,
/// formatted as `file:line`.
#[must_use]
#[inline(never)]
pub fn locate_all(app_name: &str) -> Vec<String> {
    if app_name.is_empty() {
        return Vec::new();
    }
    let unix = format!("/{app_name}/");
    let windows = format!("\\{app_name}\\");

    frames(&FrameFilter::DEFAULT)
        .into_iter()
        .filter(|frame| frame.file.contains(&unix) || frame.file.contains(&windows))
        .map(|frame| frame.to_string())
        .collect()
}

/// Walks the current stack and returns the frames selected by `filter`,
/// innermost first.
#[cfg(feature = "backtrace")]
#[must_use]
#[inline(never)]
pub fn frames(filter: &FrameFilter) -> Vec<CallFrame> {
    walker::capture(filter)
}

/// Walks the current stack and returns the frames selected by `filter`,
/// innermost first.
///
/// Stack walking is disabled without the `backtrace` feature; this always
/// returns an empty list.
#[cfg(not(feature = "backtrace"))]
#[must_use]
pub fn frames(_filter: &FrameFilter) -> Vec<CallFrame> {
    Vec::new()
}

#[cfg(feature = "backtrace")]
mod walker {
    use std::{borrow::Cow, sync::OnceLock};

    use backtrace::BytesOrWideString;

    use super::{CallFrame, FrameFilter};

    const REPORTKIT_SRC: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/");

    pub(super) fn capture(filter: &FrameFilter) -> Vec<CallFrame> {
        let mut initial_filtering = !filter.skipped_initial_crates.is_empty();
        let mut inspected = 0usize;
        let mut frames = Vec::new();

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                // Frames without a symbol name or a file say nothing useful.
                let (Some(sym), Some(filename_raw)) = (symbol.name(), symbol.filename_raw()) else {
                    return;
                };
                if inspected >= filter.max_frames {
                    return;
                }

                let path = filename_raw.to_str_lossy();
                let crate_name = crate_name(&filename_raw);

                if initial_filtering {
                    if let Some(name) = &crate_name
                        && filter.skipped_initial_crates.contains(&&**name)
                    {
                        return;
                    }
                    initial_filtering = false;
                }

                inspected += 1;
                frames.push(CallFrame {
                    function: function_name(&format!("{sym:#}")).to_string(),
                    file: path.into_owned(),
                    line: symbol.lineno(),
                });
            });

            inspected < filter.max_frames
        });

        frames
    }

    /// Works out which crate a source path belongs to, for the paths where
    /// that is possible: the standard library, the Cargo registry and this
    /// crate.
    fn crate_name(path: &BytesOrWideString<'_>) -> Option<Cow<'static, str>> {
        static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
        let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
            [
                // - /lib/rustlib/src/rust/library/{std|core|alloc}/src/...
                // - /rustc/{40-char-hash}/library/{std|core|alloc}/src/...
                regex::Regex::new(
                    r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
                )
                .expect("built-in regex pattern for std library paths should be valid"),
                // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
                regex::Regex::new(
                    r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
                )
                .expect("built-in regex pattern for cargo registry paths should be valid"),
            ]
        });

        let path = path.to_string();
        if let Some(captures) = std_regex.captures(&path) {
            return captures.get(1).map(|m| m.as_str().to_string().into());
        }
        if let Some(captures) = registry_regex.captures(&path) {
            return captures.get(1).map(|m| m.as_str().to_string().into());
        }
        if path.starts_with(REPORTKIT_SRC) {
            return Some(Cow::Borrowed("reportkit"));
        }
        None
    }

    /// Extracts the bare function name from a demangled symbol such as
    /// `<app::Handler as app::Service>::call::{{closure}}`.
    pub(super) fn function_name(s: &str) -> &str {
        let mut word_start = 0usize;
        let mut word_end = 0usize;
        let mut angle_nesting_level = 0u64;
        let mut curly_nesting_level = 0u64;
        let mut potential_function_arrow = false;
        let mut inside_word = false;

        for (i, c) in s.char_indices() {
            if curly_nesting_level == 0 && angle_nesting_level == 0 {
                if !inside_word && unicode_ident::is_xid_start(c) {
                    word_start = i;
                    inside_word = true;
                } else if inside_word && !unicode_ident::is_xid_continue(c) {
                    word_end = i;
                    inside_word = false;
                }
            }

            let was_potential_function_arrow = potential_function_arrow;
            potential_function_arrow = c == '-';

            if c == '<' {
                angle_nesting_level = angle_nesting_level.saturating_add(1);
            } else if c == '>' && !was_potential_function_arrow {
                angle_nesting_level = angle_nesting_level.saturating_sub(1);
            } else if c == '{' {
                curly_nesting_level = curly_nesting_level.saturating_add(1);
                if !inside_word && curly_nesting_level == 1 && angle_nesting_level == 0 {
                    word_start = i;
                    inside_word = true;
                }
            } else if c == '}' {
                curly_nesting_level = curly_nesting_level.saturating_sub(1);
                if inside_word && curly_nesting_level == 0 {
                    word_end = i + 1;
                    inside_word = false;
                }
            }
        }

        if word_start < word_end {
            &s[word_start..word_end]
        } else {
            &s[word_start..]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_matches_call_line() {
        let site = CallSite::caller();
        assert_eq!(site.file, file!());
        assert_eq!(site.line, line!() - 2);
        assert_eq!(site.to_string(), format!("{}:{}", file!(), line!() - 3));
    }

    #[track_caller]
    fn tracked() -> CallSite {
        CallSite::caller()
    }

    #[test]
    fn test_caller_propagates_through_track_caller() {
        let expected = line!() + 1;
        let site = tracked();
        assert_eq!(site.line, expected);
    }

    #[test]
    fn test_frame_display() {
        let frame = CallFrame {
            function: "handle".to_string(),
            file: "/srv/shop/src/main.rs".to_string(),
            line: Some(12),
        };
        assert_eq!(frame.to_string(), "/srv/shop/src/main.rs:12");

        let frame = CallFrame { line: None, ..frame };
        assert_eq!(frame.to_string(), "/srv/shop/src/main.rs");
    }

    #[test]
    fn test_locate_all_with_empty_app_name() {
        assert!(locate_all("").is_empty());
    }

    #[test]
    fn test_frames_respect_bound() {
        let filter = FrameFilter {
            max_frames: 3,
            ..FrameFilter::DEFAULT
        };
        assert!(frames(&filter).len() <= 3);
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn test_function_name() {
        use super::walker::function_name;

        assert_eq!(function_name("shop::orders::create"), "create");
        assert_eq!(
            function_name("<shop::Handler as shop::Service>::call"),
            "call"
        );
        assert_eq!(function_name("shop::main::{{closure}}"), "{{closure}}");
        assert_eq!(
            function_name("core::ops::function::FnOnce::call_once<fn() -> i32, ()>"),
            "call_once"
        );
    }
}
