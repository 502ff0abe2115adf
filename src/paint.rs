//! Paint, stroke, shadow, blend and transform builders.
//!
//! Shared by the per-piece compositor and the composite assembler, so a
//! style renders the same whether it lands on one piece, a whole layer, or
//! the background.

use std::str::FromStr;

use palette::{Srgb, Srgba};

use crate::markup::{
    Element, escape_attribute, parse_fragment, remove_style_property, set_style_property, style_property,
};
use crate::num::fmt_num;
use crate::style::{BlendMode, GradientKind, PaintKind, ShadowMode, StrokeStyle, SurfaceStyle};

/// Element names treated as drawable primitives.
pub const PRIMITIVE_TAGS: [&str; 7] = [
    "path", "circle", "rect", "ellipse", "polygon", "polyline", "line",
];

/// Returns `true` if `element` is one of [`PRIMITIVE_TAGS`].
pub fn is_primitive(element: &Element) -> bool {
    PRIMITIVE_TAGS.contains(&element.local_name())
}

// ============================================================================
// Auto-color fills
// ============================================================================

/// Returns `true` for fills that count as "unset": empty, black or white.
///
/// Whitespace and case are ignored, so `RGB(0, 0, 0)` and `#FFF` both
/// qualify. Any other explicit color is treated as intentional artwork.
///
/// ```
/// use aikon_renderer::is_auto_color_fill;
///
/// assert!(is_auto_color_fill(""));
/// assert!(is_auto_color_fill("#000"));
/// assert!(is_auto_color_fill("White"));
/// assert!(!is_auto_color_fill("#00ff00"));
/// ```
pub fn is_auto_color_fill(fill: &str) -> bool {
    let normalized: String = fill
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();

    match normalized.as_str() {
        "" | "rgb(0,0,0)" | "rgb(255,255,255)" => return true,
        _ => {}
    }

    let color = if let Some(hex) = normalized.strip_prefix('#') {
        if hex.len() != 3 && hex.len() != 6 {
            return false;
        }
        match Srgb::<u8>::from_str(hex) {
            Ok(color) => color,
            Err(_) => return false,
        }
    } else {
        match palette::named::from_str(&normalized) {
            Some(color) => color,
            None => return false,
        }
    };

    matches!(color.into_components(), (0, 0, 0) | (255, 255, 255))
}

/// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` into a color and an
/// alpha in `[0, 1]`.
pub fn parse_hex_color(input: &str) -> Option<(Srgb<u8>, f64)> {
    let hex = input.trim().strip_prefix('#')?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 | 6 => Srgb::<u8>::from_str(hex).ok().map(|color| (color, 1.0)),
        4 | 8 => Srgba::<u8>::from_str(hex)
            .ok()
            .map(|color| (color.color, f64::from(color.alpha) / 255.0)),
        _ => None,
    }
}

/// Replaces auto-color fills on every primitive under `root`.
///
/// A fill declared in the inline style wins over the `fill` attribute and is
/// rewritten in place. Primitives with any other explicit fill are skipped.
pub fn apply_fill(root: &mut Element, fill_value: &str) {
    root.for_each_descendant_mut(&mut |element| {
        if !is_primitive(element) {
            return;
        }

        let fill_attr = element.attribute("fill").unwrap_or_default().trim().to_string();
        let style_attr = element.attribute("style").unwrap_or_default().trim().to_string();
        let style_fill = if style_attr.is_empty() {
            None
        } else {
            style_property(&style_attr, "fill").map(str::to_string)
        };

        let has_explicit_fill = !fill_attr.is_empty() || style_fill.is_some();
        let fill_source = style_fill.as_deref().unwrap_or(fill_attr.as_str());
        if has_explicit_fill && !is_auto_color_fill(fill_source) {
            return;
        }

        if style_fill.is_some() {
            element.set_attribute("style", set_style_property(&style_attr, "fill", fill_value));
        } else {
            element.set_attribute("fill", fill_value);
        }
    });
}

// ============================================================================
// Strokes
// ============================================================================

/// Dash array and line cap for a stroke style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrokePattern {
    pub dash_array: Option<String>,
    pub line_cap: Option<&'static str>,
}

/// Computes the dash pattern for `kind` at `width`.
pub fn stroke_pattern(kind: StrokeStyle, width: f64) -> StrokePattern {
    let dashes = |on: f64, off: f64| Some(format!("{},{}", fmt_num(on), fmt_num(off)));

    match kind {
        StrokeStyle::Dashed => StrokePattern {
            dash_array: dashes(width * 4.0, width * 2.0),
            line_cap: None,
        },
        StrokeStyle::Dotted => StrokePattern {
            dash_array: dashes(width, width),
            line_cap: Some("round"),
        },
        StrokeStyle::Double => StrokePattern {
            dash_array: dashes(width * 2.0, width * 0.5),
            line_cap: Some("butt"),
        },
        StrokeStyle::Solid | StrokeStyle::None => StrokePattern::default(),
    }
}

/// Strokes every primitive under `root` using the style's frame settings.
///
/// Does nothing when the width is not positive or the stroke style is
/// `none`. Elements with an inline style get the stroke merged into it;
/// the others get presentation attributes.
pub fn apply_stroke(root: &mut Element, style: &SurfaceStyle) {
    let width = style.frame_width.max(0.0);
    if width <= 0.0 || style.stroke_style == StrokeStyle::None {
        return;
    }

    let color = if style.frame_color.is_empty() {
        "#000000"
    } else {
        style.frame_color.as_str()
    };
    let width_text = fmt_num(width);
    let pattern = stroke_pattern(style.stroke_style, width);

    root.for_each_descendant_mut(&mut |element| {
        if !is_primitive(element) {
            return;
        }

        let style_attr = element.attribute("style").unwrap_or_default().trim().to_string();
        if !style_attr.is_empty() {
            let mut next = set_style_property(&style_attr, "stroke", color);
            next = set_style_property(&next, "stroke-width", &width_text);
            next = match &pattern.dash_array {
                Some(dash) => set_style_property(&next, "stroke-dasharray", dash),
                None => remove_style_property(&next, "stroke-dasharray"),
            };
            next = match pattern.line_cap {
                Some(cap) => set_style_property(&next, "stroke-linecap", cap),
                None => remove_style_property(&next, "stroke-linecap"),
            };
            element.set_attribute("style", next);
            return;
        }

        element.set_attribute("stroke", color);
        element.set_attribute("stroke-width", width_text.as_str());
        match &pattern.dash_array {
            Some(dash) => element.set_attribute("stroke-dasharray", dash.as_str()),
            None => element.remove_attribute("stroke-dasharray"),
        }
        match pattern.line_cap {
            Some(cap) => element.set_attribute("stroke-linecap", cap),
            None => element.remove_attribute("stroke-linecap"),
        }
    });
}

// ============================================================================
// Gradients and paint application
// ============================================================================

/// Sequential id allocator scoped to a single render call.
#[derive(Debug, Clone)]
pub struct IdSequence {
    prefix: &'static str,
    issued: usize,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, issued: 0 }
    }

    /// Returns `<prefix>-<n>`, starting at 1.
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("{}-{}", self.prefix, self.issued)
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek_id(&self) -> String {
        format!("{}-{}", self.prefix, self.issued + 1)
    }
}

/// Builds a two-stop gradient definition.
pub fn gradient_def(id: &str, kind: GradientKind, from: &str, to: &str) -> String {
    let stops = format!(
        r#"<stop offset="0%" stop-color="{}" /><stop offset="100%" stop-color="{}" />"#,
        escape_attribute(from),
        escape_attribute(to)
    );
    let (x1, y1, x2, y2) = match kind {
        GradientKind::Radial => {
            return format!(
                r#"<radialGradient id="{id}" cx="50%" cy="50%" r="70%">{stops}</radialGradient>"#
            );
        }
        GradientKind::Horizontal => ("0%", "50%", "100%", "50%"),
        GradientKind::Vertical => ("50%", "0%", "50%", "100%"),
        GradientKind::DiagonalForward => ("0%", "0%", "100%", "100%"),
        GradientKind::DiagonalBackward => ("100%", "0%", "0%", "100%"),
    };
    format!(
        r#"<linearGradient id="{id}" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}">{stops}</linearGradient>"#
    )
}

/// Resolves the fill value for `style`, allocating a gradient definition
/// into `defs` when the style paints with a gradient.
pub fn resolve_fill(style: &SurfaceStyle, defs: &mut Vec<String>, ids: &mut IdSequence) -> String {
    match style.paint {
        PaintKind::Flat => style.flat_color.clone(),
        PaintKind::None => "none".to_string(),
        PaintKind::Gradient => {
            let id = ids.next_id();
            defs.push(gradient_def(
                &id,
                style.gradient_type,
                &style.gradient_from,
                &style.gradient_to,
            ));
            format!("url(#{id})")
        }
    }
}

/// Applies the style's fill and stroke to a markup fragment.
///
/// The fragment is parsed once; if it cannot be parsed it is returned
/// unchanged, though a gradient id is still consumed so later ids do not
/// shift.
pub fn paint_markup(
    markup: &str,
    style: &SurfaceStyle,
    stroke: bool,
    defs: &mut Vec<String>,
    ids: &mut IdSequence,
) -> String {
    let fill = resolve_fill(style, defs, ids);

    let mut root = match parse_fragment(markup) {
        Ok(root) => root,
        Err(err) => {
            tracing::debug!(error = %err, "leaving unparsable fragment unpainted");
            return markup.to_string();
        }
    };

    apply_fill(&mut root, &fill);
    if stroke {
        apply_stroke(&mut root, style);
    }
    root.inner_markup()
}

// ============================================================================
// Transforms
// ============================================================================

/// Offset, rotation, scale/flip and skew operations for a surface, each
/// prefixed with a space, or an empty string when all are identity.
///
/// Offsets are percentages of half the 512-unit canvas.
pub fn transform_operations(style: &SurfaceStyle) -> String {
    let scale = style.frame_scale / 100.0;
    let scale_x = scale * if style.flip_x { -1.0 } else { 1.0 };
    let scale_y = scale * if style.flip_y { -1.0 } else { 1.0 };

    let mut operations = String::new();
    if style.position_x != 0.0 || style.position_y != 0.0 {
        let x = style.position_x / 100.0 * 256.0;
        let y = style.position_y / 100.0 * 256.0;
        operations.push_str(&format!(" translate({} {})", fmt_num(x), fmt_num(y)));
    }
    if style.frame_rotate != 0.0 {
        operations.push_str(&format!(" rotate({})", fmt_num(style.frame_rotate)));
    }
    if scale_x != 1.0 || scale_y != 1.0 {
        operations.push_str(&format!(" scale({} {})", fmt_num(scale_x), fmt_num(scale_y)));
    }
    if style.skew_x != 0.0 {
        operations.push_str(&format!(" skewX({})", fmt_num(style.skew_x)));
    }
    if style.skew_y != 0.0 {
        operations.push_str(&format!(" skewY({})", fmt_num(style.skew_y)));
    }
    operations
}

/// [`transform_operations`] anchored on the canvas center, or an empty
/// string when there is nothing to apply.
pub fn centered_transform(style: &SurfaceStyle) -> String {
    let operations = transform_operations(style);
    if operations.is_empty() {
        return String::new();
    }
    format!("translate(256 256){operations} translate(-256 -256)")
}

// ============================================================================
// Shadows
// ============================================================================

fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

/// Blur and offsets of an enabled shadow in the given mode, or `None` when
/// the shadow is off, in the other mode, or has no visible extent.
fn shadow_geometry(style: &SurfaceStyle, mode: ShadowMode) -> Option<(f64, f64, f64)> {
    if !style.shadow_enabled || style.shadow_mode != mode {
        return None;
    }

    let blur = or_zero(style.shadow_blur).max(0.0);
    let dx = or_zero(style.shadow_offset_x);
    let dy = or_zero(style.shadow_offset_y);
    if blur == 0.0 && dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some((blur, dx, dy))
}

/// CSS `drop-shadow(...)` for an outer shadow.
pub fn outer_shadow_filter(style: &SurfaceStyle) -> Option<String> {
    let (blur, dx, dy) = shadow_geometry(style, ShadowMode::Outer)?;
    let color = if style.shadow_color.is_empty() {
        "rgba(0, 0, 0, 0.7)"
    } else {
        style.shadow_color.as_str()
    };
    Some(format!(
        "drop-shadow({}px {}px {}px {color})",
        fmt_num(dx),
        fmt_num(dy),
        fmt_num(blur)
    ))
}

/// Filter definition that paints an inner shadow along the inside edges of
/// the source alpha.
///
/// Hex colors with an alpha channel become a flood color plus opacity;
/// any other color is used verbatim at full opacity.
pub fn inner_shadow_filter_def(id: &str, style: &SurfaceStyle) -> Option<String> {
    let (blur, dx, dy) = shadow_geometry(style, ShadowMode::Inner)?;

    let raw_color = if style.shadow_color.is_empty() {
        "#000000"
    } else {
        style.shadow_color.as_str()
    };
    let (flood_color, flood_opacity) = match parse_hex_color(raw_color) {
        Some((color, alpha)) => {
            let (r, g, b) = color.into_components();
            (format!("rgb({r},{g},{b})"), alpha.clamp(0.0, 1.0))
        }
        None => (raw_color.to_string(), 1.0),
    };

    Some(format!(
        concat!(
            r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%">"#,
            r#"  <feOffset dx="{dx}" dy="{dy}" in="SourceAlpha" result="offset" />"#,
            r#"  <feGaussianBlur in="offset" stdDeviation="{blur}" result="blur" />"#,
            r#"  <feComposite in="blur" in2="SourceAlpha" operator="arithmetic" k2="-1" k3="1" result="inner" />"#,
            r#"  <feFlood flood-color="{color}" flood-opacity="{opacity}" result="flood" />"#,
            r#"  <feComposite in="flood" in2="inner" operator="in" result="shadow" />"#,
            r#"  <feComposite in="shadow" in2="SourceGraphic" operator="over" />"#,
            r#"</filter>"#,
        ),
        id = id,
        dx = fmt_num(dx),
        dy = fmt_num(dy),
        blur = fmt_num(blur),
        color = flood_color,
        opacity = fmt_num(flood_opacity),
    ))
}

// ============================================================================
// Blend
// ============================================================================

/// Clamps an opacity to `[0, 1]`, mapping non-finite values to `1`.
pub fn clamp_opacity(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 1.0 }
}

/// `mix-blend-mode` and `opacity` declarations, each terminated by `;`, or
/// `None` for the default blend state.
pub fn blend_declarations(style: &SurfaceStyle) -> Option<String> {
    let mut declarations = String::new();
    if style.blend_mode != BlendMode::Normal {
        declarations.push_str(&format!("mix-blend-mode:{};", style.blend_mode.as_css()));
    }
    let opacity = clamp_opacity(style.blend_opacity);
    if opacity != 1.0 {
        declarations.push_str(&format!("opacity:{};", fmt_num(opacity)));
    }
    (!declarations.is_empty()).then_some(declarations)
}

// ============================================================================
// Tests
// ============================================================================
