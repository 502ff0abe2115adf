//! Path data splitting.
//!
//! A single `<path>` often encodes several visually separate shapes as
//! subpaths. [`split_path_data_on_move_to`] cuts its `d` value at every
//! moveto so each subpath can become its own piece, rewriting relative
//! movetos into absolute ones so every chunk stands on its own.

use std::sync::OnceLock;

use regex::Regex;
use svgtypes::{PathParser, PathSegment};

use crate::num::fmt_num;

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([AaCcHhLlMmQqSsTtVvZz])([^AaCcHhLlMmQqSsTtVvZz]*)").expect("valid regex")
    })
}

/// Parses one command segment (`command` followed by its argument text)
/// into its segments, one per packed repetition.
///
/// Parsing stops at the first malformed group, so incomplete trailing
/// coordinates are dropped.
pub fn parse_command_segments(command: char, args: &str) -> Vec<PathSegment> {
    // Path data has to open with a moveto; the leading `M0 0` is skipped.
    let data = format!("M0 0 {command}{args}");
    PathParser::from(data.as_str())
        .skip(1)
        .map_while(Result::ok)
        .collect()
}

// ============================================================================
// PathCursor
// ============================================================================

/// Pen position tracked while walking path commands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathCursor {
    pub current_x: f64,
    pub current_y: f64,
    pub subpath_start_x: f64,
    pub subpath_start_y: f64,
}

impl PathCursor {
    /// Advances the cursor past one command segment.
    ///
    /// Every repetition packed into the segment is applied.
    pub fn advance(&mut self, command: char, args: &str) {
        for segment in parse_command_segments(command, args) {
            self.apply(segment);
        }
    }

    /// Moves the pen to the end point of `segment`.
    pub fn apply(&mut self, segment: PathSegment) {
        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                self.move_pen(x, y, abs);
                self.subpath_start_x = self.current_x;
                self.subpath_start_y = self.current_y;
            }
            PathSegment::LineTo { abs, x, y }
            | PathSegment::SmoothQuadratic { abs, x, y }
            | PathSegment::Quadratic { abs, x, y, .. }
            | PathSegment::SmoothCurveTo { abs, x, y, .. }
            | PathSegment::CurveTo { abs, x, y, .. }
            | PathSegment::EllipticalArc { abs, x, y, .. } => self.move_pen(x, y, abs),
            PathSegment::HorizontalLineTo { abs, x } => {
                self.current_x = if abs { x } else { self.current_x + x };
            }
            PathSegment::VerticalLineTo { abs, y } => {
                self.current_y = if abs { y } else { self.current_y + y };
            }
            PathSegment::ClosePath { .. } => {
                self.current_x = self.subpath_start_x;
                self.current_y = self.subpath_start_y;
            }
        }
    }

    fn move_pen(&mut self, x: f64, y: f64, abs: bool) {
        if abs {
            self.current_x = x;
            self.current_y = y;
        } else {
            self.current_x += x;
            self.current_y += y;
        }
    }
}

// ============================================================================
// Splitting
// ============================================================================

/// Rewrites a relative `m` segment as an absolute `M` from the cursor
/// position before the move. Extra coordinate pairs (implicit linetos) are
/// kept as a relative `l` continuation. Other segments pass through.
fn normalize_move_segment(command: char, args: &str, cursor: &PathCursor) -> String {
    if command != 'm' {
        return format!("{command}{args}");
    }

    let segments = parse_command_segments(command, args);
    let Some(&PathSegment::MoveTo { x, y, .. }) = segments.first() else {
        return format!("{command}{args}");
    };

    let abs_x = cursor.current_x + x;
    let abs_y = cursor.current_y + y;
    let continuation = segments[1..]
        .iter()
        .filter_map(|segment| match *segment {
            PathSegment::LineTo { x, y, .. } => Some(format!("{} {}", fmt_num(x), fmt_num(y))),
            _ => None,
        })
        .collect::<Vec<_>>();
    if continuation.is_empty() {
        return format!("M{} {}", fmt_num(abs_x), fmt_num(abs_y));
    }

    format!(
        "M{} {} l{}",
        fmt_num(abs_x),
        fmt_num(abs_y),
        continuation.join(" ")
    )
}

/// Splits one path `d` value into standalone subpath strings, one per
/// moveto command.
///
/// - Blank input yields no chunks.
/// - Input without any recognizable command letter is returned unchanged as
///   a single chunk.
/// - A relative `m` is rewritten to an absolute `M` so chunks that relied on
///   earlier subpaths stay positioned correctly on their own.
///
/// ```
/// use aikon_renderer::split_path_data_on_move_to;
///
/// assert_eq!(
///     split_path_data_on_move_to("M0 0zm10 10 5 0z"),
///     vec!["M0 0z", "M10 10 l5 0z"],
/// );
/// ```
pub fn split_path_data_on_move_to(path_data: &str) -> Vec<String> {
    let trimmed = path_data.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cursor = PathCursor::default();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut matched_any = false;

    for captures in segment_regex().captures_iter(trimmed) {
        matched_any = true;
        let command = captures[1].chars().next().unwrap_or('M');
        let args = captures.get(2).map_or("", |m| m.as_str());

        if matches!(command, 'M' | 'm') && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
        }

        current.push_str(&normalize_move_segment(command, args, &cursor));
        cursor.advance(command, args);
    }

    if !matched_any {
        tracing::debug!(path_data = trimmed, "path data has no commands; keeping it whole");
        return vec![trimmed.to_string()];
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    if chunks.is_empty() {
        vec![trimmed.to_string()]
    } else {
        chunks
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_subpath_is_untouched() {
        let d = "M10 10L20 20L30 10Z";
        assert_eq!(split_path_data_on_move_to(d), vec![d]);
    }

    #[test]
    fn splits_multiple_subpaths() {
        assert_eq!(
            split_path_data_on_move_to("M10 10L20 20Z M40 40L50 50Z M70 70L90 90Z"),
            vec!["M10 10L20 20Z", "M40 40L50 50Z", "M70 70L90 90Z"]
        );
    }

    #[test]
    fn relative_moves_become_absolute() {
        assert_eq!(
            split_path_data_on_move_to("m10 10 l20 20 z m40 40 l10 10 z"),
            vec!["M10 10l20 20 z", "M50 50l10 10 z"]
        );
    }

    #[test]
    fn mixed_relative_and_absolute_moves() {
        assert_eq!(
            split_path_data_on_move_to("m10 10 l20 20 z M40 40L50 50Z M70 70L90 90Z"),
            vec!["M10 10l20 20 z", "M40 40L50 50Z", "M70 70L90 90Z"]
        );
    }

    #[test]
    fn extra_relative_move_pairs_become_relative_lineto() {
        assert_eq!(
            split_path_data_on_move_to("M0 0zm10 10 5 0z"),
            vec!["M0 0z", "M10 10 l5 0z"]
        );
    }

    #[test]
    fn lone_relative_move_is_normalized() {
        assert_eq!(split_path_data_on_move_to("m10 10 z"), vec!["M10 10z"]);
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(split_path_data_on_move_to("  ").is_empty());
        assert!(split_path_data_on_move_to("").is_empty());
    }

    #[test]
    fn unknown_text_is_one_chunk() {
        assert_eq!(split_path_data_on_move_to("----"), vec!["----"]);
    }

    #[test]
    fn every_command_without_moves_stays_whole() {
        let d = "M0 0L10 10l1 2H8h2V9v1C1 2 3 4 5 6c1 1 1 1 2 2S1 1 2 2s1 1 2 2Q1 1 2 2q1 1 2 2T3 3t1 1A1 1 0 0 1 4 4a1 1 0 0 1 1 1Z";
        assert_eq!(split_path_data_on_move_to(d), vec![d]);
    }

    #[test]
    fn quadratic_endpoint_feeds_next_relative_move() {
        assert_eq!(
            split_path_data_on_move_to("M0 0Q5 5 10 10 M20 20L30 30"),
            vec!["M0 0Q5 5 10 10", "M20 20L30 30"]
        );
        assert_eq!(
            split_path_data_on_move_to("M0 0Q5 5 10 10m5 5h1"),
            vec!["M0 0Q5 5 10 10", "M15 15h1"]
        );
    }

    #[test]
    fn close_resets_to_subpath_start() {
        // After `z` the pen returns to (100, 100), so `m1 1` lands at (101, 101).
        assert_eq!(
            split_path_data_on_move_to("M100 100l50 0l0 50z m1 1h2"),
            vec!["M100 100l50 0l0 50z", "M101 101h2"]
        );
    }

    #[test]
    fn absolute_move_count_matches_chunk_count() {
        let d = "M1 1h1M2 2h1M3 3h1M4 4h1";
        let chunks = split_path_data_on_move_to(d);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|chunk| chunk.starts_with('M')));
    }

    #[test]
    fn cursor_handles_packed_repetitions() {
        let mut cursor = PathCursor::default();
        cursor.advance('M', "1 1 5 5");
        assert_eq!((cursor.current_x, cursor.current_y), (5.0, 5.0));
        assert_eq!((cursor.subpath_start_x, cursor.subpath_start_y), (1.0, 1.0));

        cursor.advance('c', "0 0 0 0 1 1 0 0 0 0 2 2");
        assert_eq!((cursor.current_x, cursor.current_y), (8.0, 8.0));

        cursor.advance('a', "1 1 0 0 1 -3 -3");
        assert_eq!((cursor.current_x, cursor.current_y), (5.0, 5.0));

        cursor.advance('z', "");
        assert_eq!((cursor.current_x, cursor.current_y), (1.0, 1.0));
    }

    #[test]
    fn compact_arc_flags_advance_the_cursor() {
        assert_eq!(
            split_path_data_on_move_to("M0 0a5 5 0 1 1 10 0m5 5h1"),
            vec!["M0 0a5 5 0 1 1 10 0", "M15 5h1"]
        );
        assert_eq!(
            split_path_data_on_move_to("M0 0a5 5 0 1110 0m5 5h1"),
            vec!["M0 0a5 5 0 1110 0", "M15 5h1"]
        );

        let mut cursor = PathCursor::default();
        cursor.advance('a', "2 2 0 01-4 4 2 2 0 104 4");
        assert_eq!((cursor.current_x, cursor.current_y), (0.0, 8.0));
    }

    #[test]
    fn segments_parse_exponents_and_packed_decimals() {
        let segments = parse_command_segments('l', "1e2-.5.25.5");
        assert_eq!(
            segments,
            vec![
                PathSegment::LineTo { abs: false, x: 100.0, y: -0.5 },
                PathSegment::LineTo { abs: false, x: 0.25, y: 0.5 },
            ]
        );
    }

    #[test]
    fn incomplete_trailing_group_is_dropped() {
        let mut cursor = PathCursor::default();
        cursor.advance('L', "4 4 9");
        assert_eq!((cursor.current_x, cursor.current_y), (4.0, 4.0));
    }
}
