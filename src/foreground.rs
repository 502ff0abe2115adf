//! Chooses between whole-icon and per-piece foreground styling.

use std::borrow::Cow;

use crate::breakout::{BreakoutCache, decompose};
use crate::compositor::build_piece_styled_svg;
use crate::parse::ParseCache;
use crate::style::{BlinkTarget, PathStylingConfig, SurfaceStyle};

/// Foreground markup ready for the composite assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundComposite<'a> {
    /// Markup to place in the base layer.
    pub svg: Cow<'a, str>,
    /// Style the assembler should paint the layers with, or `None` when
    /// paint is already baked into `svg`.
    pub style: Option<&'a SurfaceStyle>,
}

/// Prepares the base icon for compositing.
///
/// Without path styling (`path_styling` is `None` or disabled) the icon is
/// passed through untouched and painted as a whole by the assembler. With
/// path styling the icon is decomposed into pieces and each piece is styled
/// on its own, falling back to `foreground` for pieces without an override.
pub fn build_foreground_composite<'a>(
    svg: &'a str,
    foreground: &'a SurfaceStyle,
    path_styling: Option<&PathStylingConfig>,
    blink: Option<&BlinkTarget>,
    parse_cache: &mut ParseCache,
    breakout_cache: &mut BreakoutCache,
) -> ForegroundComposite<'a> {
    let Some(config) = path_styling.filter(|config| config.enabled) else {
        return ForegroundComposite {
            svg: Cow::Borrowed(svg),
            style: Some(foreground),
        };
    };

    let breakout = decompose(svg, breakout_cache, parse_cache);
    tracing::debug!(
        pieces = breakout.pieces.len(),
        overrides = config.path_styles.len(),
        "styling foreground per piece"
    );

    ForegroundComposite {
        svg: Cow::Owned(build_piece_styled_svg(
            &breakout,
            foreground,
            &config.path_styles,
            blink,
        )),
        style: None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0L4 4Z M8 8L9 9Z"/></svg>"#;

    fn caches() -> (ParseCache, BreakoutCache) {
        (ParseCache::new(), BreakoutCache::new())
    }

    #[test]
    fn disabled_styling_passes_icon_through() {
        let (mut parse_cache, mut breakout_cache) = caches();
        let style = SurfaceStyle::foreground();
        let config = PathStylingConfig::default();

        for path_styling in [None, Some(&config)] {
            let out = build_foreground_composite(
                ICON,
                &style,
                path_styling,
                None,
                &mut parse_cache,
                &mut breakout_cache,
            );
            assert!(matches!(out.svg, Cow::Borrowed(svg) if svg == ICON));
            assert_eq!(out.style, Some(&style));
        }
        assert!(breakout_cache.is_empty());
    }

    #[test]
    fn enabled_styling_bakes_paint_per_piece() {
        let (mut parse_cache, mut breakout_cache) = caches();
        let style = SurfaceStyle::foreground();
        let mut config = PathStylingConfig {
            enabled: true,
            ..PathStylingConfig::default()
        };
        config.path_styles.insert(
            "piece-2".to_string(),
            SurfaceStyle {
                flat_color: "#ff0000".to_string(),
                ..SurfaceStyle::foreground()
            },
        );

        let out = build_foreground_composite(
            ICON,
            &style,
            Some(&config),
            None,
            &mut parse_cache,
            &mut breakout_cache,
        );
        assert_eq!(out.style, None);
        assert!(out.svg.contains(r#"data-foreground-piece-id="piece-1""#));
        assert!(out.svg.contains(r##"<path d="M0 0L4 4Z" fill="#ffffff"/>"##));
        assert!(out.svg.contains(r##"fill="#ff0000""##));
        assert_eq!(breakout_cache.len(), 1);
    }

    #[test]
    fn blink_target_is_forwarded() {
        let (mut parse_cache, mut breakout_cache) = caches();
        let style = SurfaceStyle::foreground();
        let config = PathStylingConfig {
            enabled: true,
            ..PathStylingConfig::default()
        };
        let blink = BlinkTarget::new("piece-1", 7);

        let out = build_foreground_composite(
            ICON,
            &style,
            Some(&config),
            Some(&blink),
            &mut parse_cache,
            &mut breakout_cache,
        );
        assert!(out.svg.contains(r#"data-blink-token="7""#));
    }
}
