//! Final composite assembly.
//!
//! A composite stacks, on a 512×512 canvas:
//!
//! 1. a background shape with its own paint, stroke and shadow,
//! 2. up to two icon layers, recolored by the foreground style,
//! 3. a filter chain of global effects,
//!
//! optionally clipped to the background outline and wrapped in an
//! interpolated animation transform.

use crate::markup::escape_attribute;
use crate::num::{fmt_num, lerp};
use crate::paint::{
    IdSequence, blend_declarations, gradient_def, inner_shadow_filter_def, outer_shadow_filter,
    paint_markup, stroke_pattern, transform_operations,
};
use crate::parse::{ParseCache, parse_markup};
use crate::style::{
    AnimationState, BackgroundShape, EffectsState, LayerState, PaintKind, PreviewTransform,
    StrokeStyle, SurfaceStyle,
};

const CANVAS_CENTER: f64 = 256.0;
const SHAPE_RADIUS: f64 = 240.0;
const STAR_INNER_RADIUS: f64 = 108.0;

const BACKGROUND_CLIP_ID: &str = "bg-clip";
const BACKGROUND_GRADIENT_ID: &str = "bg-gradient";
const BACKGROUND_INNER_SHADOW_ID: &str = "bg-inner-shadow";
const FOREGROUND_INNER_SHADOW_ID: &str = "fg-inner-shadow";

// ============================================================================
// Inputs
// ============================================================================

/// One icon layer: its markup and placement.
#[derive(Debug, Clone, Copy)]
pub struct LayerInput<'a> {
    /// Source markup; `None` leaves the layer empty.
    pub svg: Option<&'a str>,
    pub state: &'a LayerState,
}

impl<'a> LayerInput<'a> {
    /// Uses the layer's own source.
    pub fn resolve(state: &'a LayerState) -> Self {
        Self {
            svg: state.source.as_ref().and_then(|source| source.resolve()),
            state,
        }
    }

    /// Uses `svg` in place of the layer's source.
    pub fn with_svg(svg: &'a str, state: &'a LayerState) -> Self {
        Self {
            svg: Some(svg),
            state,
        }
    }
}

/// Everything a composite is built from.
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    pub base: LayerInput<'a>,
    pub overlay: LayerInput<'a>,
    pub effects: &'a EffectsState,
    pub animation: &'a AnimationState,
    pub background: &'a SurfaceStyle,
    /// Foreground paint for both layers. `None` when the layer markup is
    /// already styled, as with per-piece styling.
    pub foreground: Option<&'a SurfaceStyle>,
}

// ============================================================================
// Assembly
// ============================================================================

/// Assembles the composite document.
///
/// With `animation_progress` set, the foreground is wrapped in a transform
/// interpolated between the animation's start and end placement; without
/// it the wrapper carries no transform.
///
/// Output depends only on the inputs: generated ids are numbered in a fixed
/// order on every call.
pub fn build_composite_svg(
    inputs: &CompositeInputs<'_>,
    parse_cache: &mut ParseCache,
    animation_progress: Option<f64>,
) -> String {
    let mut defs = Vec::new();
    let mut gradient_ids = IdSequence::new("fg-gradient");

    let base = build_layer_markup(
        &inputs.base,
        inputs.foreground,
        parse_cache,
        &mut defs,
        &mut gradient_ids,
    );
    let overlay = build_layer_markup(
        &inputs.overlay,
        inputs.foreground,
        parse_cache,
        &mut defs,
        &mut gradient_ids,
    );
    let background = build_background_markup(inputs.background);

    let wrapper_transform = match animation_progress {
        Some(progress) => format!(
            r#" transform="{}""#,
            animation_transform(inputs.animation, progress)
        ),
        None => String::new(),
    };

    let filter = filter_chain(inputs.foreground, inputs.effects);
    let blend = inputs.foreground.and_then(blend_declarations);
    let inner_shadow = inputs
        .foreground
        .and_then(|style| inner_shadow_filter_def(FOREGROUND_INNER_SHADOW_ID, style));
    let clip_attr = if inputs.foreground.is_some_and(|style| style.clip_to_background) {
        format!(r#" clip-path="url(#{BACKGROUND_CLIP_ID})""#)
    } else {
        String::new()
    };

    let layers = match inner_shadow {
        Some(def) => {
            defs.push(def);
            format!(r#"<g filter="url(#{FOREGROUND_INNER_SHADOW_ID})">{base}{overlay}</g>"#)
        }
        None => format!("{base}{overlay}"),
    };

    let mut declarations = String::new();
    if !filter.is_empty() {
        declarations.push_str(&format!("filter:{filter};"));
    }
    if let Some(blend) = blend {
        declarations.push_str(&blend);
    }
    let layer_content = if declarations.is_empty() {
        layers
    } else {
        format!(r#"<g style="{}">{layers}</g>"#, escape_attribute(&declarations))
    };

    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 512 512\" style=\"isolation:isolate;\">\n",
            "  <defs>{bg_defs}{defs}</defs>\n",
            "  {bg_shape}\n",
            "  <g{wrapper}{clip}>\n",
            "    <g data-foreground-root=\"true\">{content}</g>\n",
            "  </g>\n",
            "</svg>",
        ),
        bg_defs = background.defs,
        defs = defs.concat(),
        bg_shape = background.shape,
        wrapper = wrapper_transform,
        clip = clip_attr,
        content = layer_content,
    )
}

/// Interpolated animation placement at `progress`.
pub fn preview_transform(animation: &AnimationState, progress: f64) -> PreviewTransform {
    PreviewTransform {
        x: lerp(animation.start_x, animation.end_x, progress),
        y: lerp(animation.start_y, animation.end_y, progress),
        scale: lerp(animation.start_scale, animation.end_scale, progress),
        rotate: lerp(animation.start_rotate, animation.end_rotate, progress),
    }
}

fn animation_transform(animation: &AnimationState, progress: f64) -> String {
    let placement = preview_transform(animation, progress);
    format!(
        "translate(256 256) translate({} {}) rotate({}) scale({}) translate(-256 -256)",
        fmt_num(placement.x),
        fmt_num(placement.y),
        fmt_num(placement.rotate),
        fmt_num(placement.scale)
    )
}

/// Foreground outer shadow, global drop shadow, blur, hue rotation and
/// saturation, in that order, skipping identity entries.
fn filter_chain(foreground: Option<&SurfaceStyle>, effects: &EffectsState) -> String {
    let mut parts = Vec::new();

    if let Some(shadow) = foreground.and_then(outer_shadow_filter) {
        parts.push(shadow);
    }
    if effects.shadow_blur != 0.0 || effects.shadow_x != 0.0 || effects.shadow_y != 0.0 {
        parts.push(format!(
            "drop-shadow({}px {}px {}px {})",
            fmt_num(effects.shadow_x),
            fmt_num(effects.shadow_y),
            fmt_num(effects.shadow_blur),
            effects.shadow_color
        ));
    }
    if effects.blur != 0.0 {
        parts.push(format!("blur({}px)", fmt_num(effects.blur)));
    }
    if effects.hue_rotate != 0.0 {
        parts.push(format!("hue-rotate({}deg)", fmt_num(effects.hue_rotate)));
    }
    if effects.saturate != 100.0 {
        parts.push(format!("saturate({}%)", fmt_num(effects.saturate)));
    }

    parts.join(" ")
}

// ============================================================================
// Layers
// ============================================================================

fn build_layer_markup(
    layer: &LayerInput<'_>,
    foreground: Option<&SurfaceStyle>,
    parse_cache: &mut ParseCache,
    defs: &mut Vec<String>,
    gradient_ids: &mut IdSequence,
) -> String {
    let Some(svg) = layer.svg else {
        return String::new();
    };
    let parsed = parse_markup(svg, parse_cache);
    let state = layer.state;

    let mut transform = format!(
        "translate(256 256) translate({} {}) rotate({}) scale({})",
        fmt_num(state.x),
        fmt_num(state.y),
        fmt_num(state.rotate),
        fmt_num(state.scale)
    );
    if let Some(style) = foreground {
        transform.push_str(&transform_operations(style));
    }
    transform.push_str(" translate(-256 -256)");

    let inner = match foreground {
        Some(style) => paint_markup(&parsed.inner, style, false, defs, gradient_ids),
        None => parsed.inner.clone(),
    };
    let layer_defs = if parsed.defs.is_empty() {
        String::new()
    } else {
        format!("<defs>{}</defs>", parsed.defs)
    };

    format!(
        r#"<g transform="{transform}" opacity="{}"><svg x="0" y="0" width="512" height="512" viewBox="{}" preserveAspectRatio="xMidYMid meet">{layer_defs}{inner}</svg></g>"#,
        fmt_num(state.opacity),
        escape_attribute(&parsed.view_box)
    )
}

// ============================================================================
// Background
// ============================================================================

/// Background definitions and the visible shape element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundMarkup {
    /// Gradient (if any), the `bg-clip` clip path, and the inner shadow
    /// filter (if any).
    pub defs: String,
    /// The shape element; empty when nothing would be visible.
    pub shape: String,
    /// The `bg-clip` clip path, also included in `defs`.
    pub clip_path: String,
}

/// Builds the background shape and a clip path with the same outline and
/// transform.
pub fn build_background_markup(background: &SurfaceStyle) -> BackgroundMarkup {
    let transform = shape_transform(background.frame_rotate, background.frame_scale);
    let clip_path = format!(
        r#"<clipPath id="{BACKGROUND_CLIP_ID}">{}</clipPath>"#,
        shape_element(background.shape, "", &transform)
    );

    let has_frame = background.frame_width > 0.0;
    let fill = match background.paint {
        PaintKind::None if !has_frame => None,
        PaintKind::None => Some("none".to_string()),
        PaintKind::Flat => Some(escape_attribute(&background.flat_color)),
        PaintKind::Gradient => Some(format!("url(#{BACKGROUND_GRADIENT_ID})")),
    };

    let mut defs = String::new();
    if background.paint == PaintKind::Gradient {
        defs.push_str(&gradient_def(
            BACKGROUND_GRADIENT_ID,
            background.gradient_type,
            &background.gradient_from,
            &background.gradient_to,
        ));
    }
    defs.push_str(&clip_path);
    let inner_shadow = inner_shadow_filter_def(BACKGROUND_INNER_SHADOW_ID, background);
    if let Some(def) = &inner_shadow {
        defs.push_str(def);
    }

    let Some(fill) = fill else {
        return BackgroundMarkup {
            defs,
            shape: String::new(),
            clip_path,
        };
    };

    let (stroke, stroke_width) = if has_frame {
        (background.frame_color.as_str(), background.frame_width)
    } else {
        ("none", 0.0)
    };
    let (stroke, dash) = stroke_attributes(stroke, stroke_width, background.stroke_style);
    let style = match outer_shadow_filter(background) {
        Some(shadow) => format!(r#" style="filter:{};""#, escape_attribute(&shadow)),
        None => String::new(),
    };
    let attributes = format!(
        r#" fill="{fill}" stroke="{}" stroke-width="{}"{dash}{transform}{style}"#,
        escape_attribute(&stroke),
        fmt_num(stroke_width)
    );
    let leading = if inner_shadow.is_some() {
        format!(r#" filter="url(#{BACKGROUND_INNER_SHADOW_ID})""#)
    } else {
        String::new()
    };

    BackgroundMarkup {
        defs,
        shape: shape_element(background.shape, &leading, &attributes),
        clip_path,
    }
}

/// Resolves the stroke color and dash attributes for a background frame.
/// A `none` stroke style hides an otherwise visible frame.
fn stroke_attributes(stroke: &str, width: f64, style: StrokeStyle) -> (String, String) {
    if width <= 0.0 || stroke == "none" {
        return (stroke.to_string(), String::new());
    }
    if style == StrokeStyle::None {
        return ("none".to_string(), String::new());
    }

    let pattern = stroke_pattern(style, width);
    let mut dash = String::new();
    if let Some(dash_array) = pattern.dash_array {
        dash.push_str(&format!(r#" stroke-dasharray="{dash_array}""#));
    }
    if let Some(cap) = pattern.line_cap {
        dash.push_str(&format!(r#" stroke-linecap="{cap}""#));
    }
    (stroke.to_string(), dash)
}

fn shape_transform(rotate: f64, scale_percent: f64) -> String {
    let scale = scale_percent.max(0.0) / 100.0;
    if rotate == 0.0 && scale == 1.0 {
        return String::new();
    }
    format!(
        r#" transform="translate(256 256) rotate({}) scale({}) translate(-256 -256)""#,
        fmt_num(rotate),
        fmt_num(scale)
    )
}

/// `<tag{leading} geometry{trailing} />` for a background outline.
fn shape_element(shape: BackgroundShape, leading: &str, trailing: &str) -> String {
    let (tag, geometry) = match shape {
        BackgroundShape::Circle => ("circle", r#"cx="256" cy="256" r="240""#.to_string()),
        BackgroundShape::Triangle => ("polygon", r#"points="256,16 496,496 16,496""#.to_string()),
        BackgroundShape::Square => ("rect", r#"x="0" y="0" width="512" height="512""#.to_string()),
        BackgroundShape::RoundedSquare => (
            "rect",
            r#"x="0" y="0" width="512" height="512" rx="64" ry="64""#.to_string(),
        ),
        BackgroundShape::Star5 => ("polygon", format!(r#"points="{}""#, star_points(5, 0.0))),
        BackgroundShape::Star6 => ("polygon", format!(r#"points="{}""#, star_points(6, 0.0))),
        BackgroundShape::Star7 => ("polygon", format!(r#"points="{}""#, star_points(7, 0.0))),
        BackgroundShape::Hexa => (
            "polygon",
            format!(r#"points="{}""#, regular_polygon_points(6, 0.0)),
        ),
        BackgroundShape::Octa => (
            "polygon",
            format!(r#"points="{}""#, regular_polygon_points(8, 0.0)),
        ),
    };
    format!("<{tag}{leading} {geometry}{trailing} />")
}

fn vertex(angle_deg: f64, radius: f64) -> String {
    let angle = angle_deg.to_radians();
    let x = CANVAS_CENTER + angle.cos() * radius;
    let y = CANVAS_CENTER + angle.sin() * radius;
    format!("{x:.3},{y:.3}")
}

/// Alternating outer/inner vertices of a star, first point straight up.
pub fn star_points(points: u32, rotation_deg: f64) -> String {
    let count = points * 2;
    let step = 360.0 / f64::from(count);
    (0..count)
        .map(|index| {
            let radius = if index % 2 == 0 {
                SHAPE_RADIUS
            } else {
                STAR_INNER_RADIUS
            };
            vertex(rotation_deg - 90.0 + step * f64::from(index), radius)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Vertices of a regular polygon, first point straight up.
pub fn regular_polygon_points(sides: u32, rotation_deg: f64) -> String {
    let step = 360.0 / f64::from(sides);
    (0..sides)
        .map(|index| vertex(rotation_deg - 90.0 + step * f64::from(index), SHAPE_RADIUS))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================
