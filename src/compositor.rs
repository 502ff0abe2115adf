//! Per-piece styling of a decomposed icon.

use crate::breakout::Breakout;
use crate::markup::escape_attribute;
use crate::paint::{
    IdSequence, blend_declarations, centered_transform, inner_shadow_filter_def,
    outer_shadow_filter, paint_markup,
};
use crate::style::{BlinkTarget, PieceStyles, SurfaceStyle};

macro_rules! hover_vignette_id {
    () => {
        "aikon-piece-hover-vignette"
    };
}

/// Id of the hover highlight filter included in every styled output.
pub const PIECE_HOVER_VIGNETTE_FILTER_ID: &str = hover_vignette_id!();

const PIECE_HOVER_VIGNETTE_FILTER: &str = concat!(
    r#"<filter id=""#,
    hover_vignette_id!(),
    r##"" x="-20%" y="-20%" width="140%" height="140%" color-interpolation-filters="sRGB">"##,
    r##"<feFlood flood-color="#3a9cff" flood-opacity="0.24" result="blue-veil" />"##,
    r##"<feComposite in="blue-veil" in2="SourceAlpha" operator="in" result="veil-fill" />"##,
    r##"<feBlend in="SourceGraphic" in2="veil-fill" mode="screen" result="tinted" />"##,
    r##"<feGaussianBlur in="SourceAlpha" stdDeviation="6" result="alpha-blur" />"##,
    r##"<feFlood flood-color="#3a9cff" flood-opacity="0.26" result="blue-glow-color" />"##,
    r##"<feComposite in="blue-glow-color" in2="alpha-blur" operator="in" result="blue-glow" />"##,
    r##"<feMerge><feMergeNode in="tinted" /><feMergeNode in="blue-glow" /></feMerge>"##,
    r##"</filter>"##,
);

const BLINK_ANIMATION: &str =
    r#"<animate attributeName="opacity" values="1;0.15;1;0.15;1" dur="0.75s" repeatCount="1" />"#;

/// Renders every piece of `breakout` with its own style into one document.
///
/// Each piece uses its entry in `overrides`, or `default_style` when it has
/// none. Fill, stroke, transform, shadow and blend are applied per piece and
/// every piece is tagged with `data-foreground-piece-id`.
///
/// When `blink` names a piece, that piece is emitted last with a one-shot
/// opacity pulse so it stays on top of anything it overlaps.
///
/// Generated ids (`fg-piece-gradient-<n>`, `fg-piece-inner-shadow-<n>`)
/// restart at 1 on every call, so identical input yields identical output.
pub fn build_piece_styled_svg(
    breakout: &Breakout,
    default_style: &SurfaceStyle,
    overrides: &PieceStyles,
    blink: Option<&BlinkTarget>,
) -> String {
    let mut defs = vec![PIECE_HOVER_VIGNETTE_FILTER.to_string()];
    let mut gradient_ids = IdSequence::new("fg-piece-gradient");
    let mut shadow_ids = IdSequence::new("fg-piece-inner-shadow");

    let mut pieces = String::new();
    let mut blinking = None;

    for piece in &breakout.pieces {
        let style = overrides.get(&piece.id).unwrap_or(default_style);

        let painted = paint_markup(&piece.markup, style, true, &mut defs, &mut gradient_ids);
        let transform = centered_transform(style);
        let body = if transform.is_empty() {
            painted
        } else {
            format!(r#"<g transform="{transform}">{painted}</g>"#)
        };

        let filter_attr = match inner_shadow_filter_def(&shadow_ids.peek_id(), style) {
            Some(def) => {
                let id = shadow_ids.next_id();
                defs.push(def);
                format!(r#" filter="url(#{id})""#)
            }
            None => String::new(),
        };

        let mut declarations = String::new();
        if let Some(shadow) = outer_shadow_filter(style) {
            declarations.push_str(&format!("filter:{shadow};"));
        }
        if let Some(blend) = blend_declarations(style) {
            declarations.push_str(&blend);
        }
        let style_attr = if declarations.is_empty() {
            String::new()
        } else {
            format!(r#" style="{declarations}""#)
        };

        match blink {
            Some(target) if target.piece_id == piece.id => {
                blinking = Some(format!(
                    r#"<g data-foreground-piece-id="{}" data-blink-token="{}"{filter_attr}>{BLINK_ANIMATION}<g{style_attr}>{body}</g></g>"#,
                    piece.id, target.token
                ));
            }
            _ => pieces.push_str(&format!(
                r#"<g data-foreground-piece-id="{}"{filter_attr}{style_attr}>{body}</g>"#,
                piece.id
            )),
        }
    }

    if let Some(markup) = blinking {
        pieces.push_str(&markup);
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">\n  <defs>{}{}</defs>\n  {}\n</svg>",
        escape_attribute(&breakout.view_box),
        breakout.defs,
        defs.concat(),
        pieces
    )
}

// ============================================================================
// Tests
// ============================================================================
