//! Serializable style and state model.
//!
//! Every type here round-trips through JSON with the camelCase keys used by
//! persisted editor state, so a profile saved by a frontend can be rendered
//! as-is. All structs accept partial input: missing fields take their
//! defaults.
//!
//! # Example
//!
//! ```
//! use aikon_renderer::{CompositionProfile, PaintKind, SurfaceStyle};
//!
//! let json = r##"{ "foreground": { "type": "gradient", "gradientTo": "#336699" } }"##;
//! let profile = CompositionProfile::from_json(json).unwrap();
//!
//! assert_eq!(profile.foreground.paint, PaintKind::Gradient);
//! assert_eq!(profile.foreground.gradient_from, "#ffffff");
//! assert_eq!(profile.background, SurfaceStyle::background());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::raster::SvgSource;

// ============================================================================
// Enumerations
// ============================================================================

/// How a surface is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PaintKind {
    None,
    #[default]
    Flat,
    Gradient,
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum GradientKind {
    #[default]
    Radial,
    Horizontal,
    Vertical,
    DiagonalForward,
    DiagonalBackward,
}

/// Background outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BackgroundShape {
    Circle,
    Triangle,
    #[default]
    Square,
    RoundedSquare,
    Star5,
    Star6,
    Star7,
    /// Regular hexagon.
    Hexa,
    /// Regular octagon.
    Octa,
}

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Dotted,
    Double,
    #[default]
    None,
}

/// Whether a shadow falls outside the shape or inside its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ShadowMode {
    #[default]
    Outer,
    Inner,
}

/// CSS `mix-blend-mode` values supported for surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    Color,
    Luminosity,
}

impl BlendMode {
    /// The CSS keyword for this mode.
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::SoftLight => "soft-light",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

// ============================================================================
// SurfaceStyle
// ============================================================================

/// Style shared by the background, the foreground, and per-piece overrides.
///
/// Numeric fields are passed through to the output as given. Only blend
/// opacity, shadow blur and background scale get clamped when written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SurfaceStyle {
    #[serde(rename = "type")]
    pub paint: PaintKind,
    pub flat_color: String,
    pub gradient_from: String,
    pub gradient_to: String,
    pub gradient_type: GradientKind,
    /// Outline used when this style paints a background.
    pub shape: BackgroundShape,
    pub stroke_style: StrokeStyle,
    /// Stroke width. Zero disables the stroke.
    pub frame_width: f64,
    pub frame_color: String,
    /// Rotation in degrees.
    pub frame_rotate: f64,
    /// Scale in percent; `100` is identity.
    pub frame_scale: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Horizontal offset in percent of half the canvas.
    pub position_x: f64,
    /// Vertical offset in percent of half the canvas.
    pub position_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    /// Clip the foreground to the background outline.
    pub clip_to_background: bool,
    pub shadow_enabled: bool,
    pub shadow_mode: ShadowMode,
    pub shadow_color: String,
    pub shadow_blur: f64,
    pub shadow_offset_x: f64,
    pub shadow_offset_y: f64,
    pub blend_mode: BlendMode,
    pub blend_opacity: f64,
}

impl SurfaceStyle {
    /// Default foreground: flat white with a white-to-silver radial gradient.
    pub fn foreground() -> Self {
        Self {
            paint: PaintKind::Flat,
            flat_color: "#ffffff".to_string(),
            gradient_from: "#ffffff".to_string(),
            gradient_to: "#cccccc".to_string(),
            gradient_type: GradientKind::Radial,
            shape: BackgroundShape::Square,
            stroke_style: StrokeStyle::None,
            frame_width: 0.0,
            frame_color: "#000000".to_string(),
            frame_rotate: 0.0,
            frame_scale: 100.0,
            flip_x: false,
            flip_y: false,
            position_x: 0.0,
            position_y: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            clip_to_background: false,
            shadow_enabled: false,
            shadow_mode: ShadowMode::Outer,
            shadow_color: "#000000".to_string(),
            shadow_blur: 0.0,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            blend_mode: BlendMode::Normal,
            blend_opacity: 1.0,
        }
    }

    /// Default background: a flat black square.
    pub fn background() -> Self {
        Self {
            flat_color: "#000000".to_string(),
            gradient_from: "#000000".to_string(),
            gradient_to: "#222222".to_string(),
            ..Self::foreground()
        }
    }
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self::foreground()
    }
}

// ============================================================================
// Layers, effects, animation
// ============================================================================

/// One image layer of a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct LayerState {
    /// Where the layer's markup comes from. `None` leaves the layer empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SvgSource>,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotate: f64,
    pub opacity: f64,
}

impl LayerState {
    /// A layer showing raw markup with identity placement.
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self {
            source: Some(SvgSource::from_svg(svg)),
            ..Self::default()
        }
    }
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            source: None,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotate: 0.0,
            opacity: 1.0,
        }
    }
}

/// Global post-effects applied to the whole foreground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EffectsState {
    /// Blur radius in pixels.
    pub blur: f64,
    /// Hue rotation in degrees.
    pub hue_rotate: f64,
    /// Saturation in percent; `100` is identity.
    pub saturate: f64,
    pub shadow_x: f64,
    pub shadow_y: f64,
    pub shadow_blur: f64,
    pub shadow_color: String,
}

impl Default for EffectsState {
    fn default() -> Self {
        Self {
            blur: 0.0,
            hue_rotate: 0.0,
            saturate: 100.0,
            shadow_x: 0.0,
            shadow_y: 0.0,
            shadow_blur: 0.0,
            shadow_color: "#000000".to_string(),
        }
    }
}

/// Start and end placement of a whole-icon animation.
///
/// Timing is owned by whoever drives the progress value; `duration` is
/// carried for them and not read by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct AnimationState {
    pub duration: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub start_scale: f64,
    pub start_rotate: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub end_scale: f64,
    pub end_rotate: f64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            duration: 0.6,
            start_x: 0.0,
            start_y: 0.0,
            start_scale: 1.0,
            start_rotate: 0.0,
            end_x: 0.0,
            end_y: 0.0,
            end_scale: 1.0,
            end_rotate: 0.0,
        }
    }
}

/// Interpolated animation placement at one progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PreviewTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotate: f64,
}

// ============================================================================
// Per-piece styling
// ============================================================================

/// Piece id to override style.
pub type PieceStyles = BTreeMap<String, SurfaceStyle>;

/// Per-piece styling switch and overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PathStylingConfig {
    /// When `false` the icon is styled as a whole.
    pub enabled: bool,
    /// Overrides keyed by piece id (`piece-<n>`).
    pub path_styles: PieceStyles,
}

/// A request to pulse one piece once.
///
/// Bumping `token` for the same piece restarts the pulse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct BlinkTarget {
    pub piece_id: String,
    pub token: u64,
}

impl BlinkTarget {
    pub fn new(piece_id: impl Into<String>, token: u64) -> Self {
        Self {
            piece_id: piece_id.into(),
            token,
        }
    }
}

// ============================================================================
// CompositionProfile
// ============================================================================

/// Everything needed to render one composite, in JSON-friendly form.
///
/// # JSON Format
///
/// ```json
/// {
///   "base": { "source": { "svgData": "<svg>...</svg>" }, "scale": 1.0 },
///   "overlay": {},
///   "background": { "type": "gradient", "shape": "star5" },
///   "foreground": { "flatColor": "#ff8800" },
///   "effects": { "hueRotate": 45.0 },
///   "animation": {},
///   "pathStyling": { "enabled": true, "pathStyles": { "piece-1": { "type": "none" } } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CompositionProfile {
    pub base: LayerState,
    pub overlay: LayerState,
    pub background: SurfaceStyle,
    pub foreground: SurfaceStyle,
    pub effects: EffectsState,
    pub animation: AnimationState,
    pub path_styling: PathStylingConfig,
}

impl Default for CompositionProfile {
    fn default() -> Self {
        Self {
            base: LayerState::default(),
            overlay: LayerState::default(),
            background: SurfaceStyle::background(),
            foreground: SurfaceStyle::foreground(),
            effects: EffectsState::default(),
            animation: AnimationState::default(),
            path_styling: PathStylingConfig::default(),
        }
    }
}

impl CompositionProfile {
    /// Creates a profile with default settings and empty layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base layer.
    pub fn with_base(mut self, layer: LayerState) -> Self {
        self.base = layer;
        self
    }

    /// Sets the overlay layer.
    pub fn with_overlay(mut self, layer: LayerState) -> Self {
        self.overlay = layer;
        self
    }

    /// Sets the background style.
    pub fn with_background(mut self, style: SurfaceStyle) -> Self {
        self.background = style;
        self
    }

    /// Sets the foreground style.
    pub fn with_foreground(mut self, style: SurfaceStyle) -> Self {
        self.foreground = style;
        self
    }

    /// Sets the global effects.
    pub fn with_effects(mut self, effects: EffectsState) -> Self {
        self.effects = effects;
        self
    }

    /// Sets the animation endpoints.
    pub fn with_animation(mut self, animation: AnimationState) -> Self {
        self.animation = animation;
        self
    }

    /// Sets per-piece styling.
    pub fn with_path_styling(mut self, config: PathStylingConfig) -> Self {
        self.path_styling = config;
        self
    }

    /// Serializes this profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes this profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_style_uses_persisted_keys() {
        let json = serde_json::to_value(SurfaceStyle::background()).unwrap();
        assert_eq!(json["type"], "flat");
        assert_eq!(json["flatColor"], "#000000");
        assert_eq!(json["gradientType"], "radial");
        assert_eq!(json["shape"], "square");
        assert_eq!(json["strokeStyle"], "none");
        assert_eq!(json["frameScale"], 100.0);
        assert_eq!(json["shadowMode"], "outer");
        assert_eq!(json["blendMode"], "normal");
        assert_eq!(json["blendOpacity"], 1.0);
    }

    #[test]
    fn enums_use_kebab_case() {
        let style: SurfaceStyle = serde_json::from_str(
            r#"{"gradientType":"diagonal-backward","shape":"rounded-square","blendMode":"soft-light","shadowMode":"inner"}"#,
        )
        .unwrap();
        assert_eq!(style.gradient_type, GradientKind::DiagonalBackward);
        assert_eq!(style.shape, BackgroundShape::RoundedSquare);
        assert_eq!(style.blend_mode, BlendMode::SoftLight);
        assert_eq!(style.shadow_mode, ShadowMode::Inner);
        assert_eq!(style.blend_mode.as_css(), "soft-light");
    }

    #[test]
    fn partial_style_fills_defaults() {
        let style: SurfaceStyle = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(style.paint, PaintKind::None);
        assert_eq!(style.frame_scale, 100.0);
        assert_eq!(style.flat_color, "#ffffff");
    }

    #[test]
    fn empty_profile_matches_defaults() {
        let profile = CompositionProfile::from_json("{}").unwrap();
        assert_eq!(profile, CompositionProfile::default());
        assert_eq!(profile.effects.saturate, 100.0);
        assert_eq!(profile.animation.duration, 0.6);
        assert_eq!(profile.base.scale, 1.0);
        assert!(profile.base.source.is_none());
    }

    #[test]
    fn profile_round_trips_through_json() {
        let mut styles = PieceStyles::new();
        styles.insert(
            "piece-2".to_string(),
            SurfaceStyle {
                paint: PaintKind::Gradient,
                ..SurfaceStyle::foreground()
            },
        );
        let profile = CompositionProfile::new()
            .with_base(LayerState::from_svg("<svg/>"))
            .with_path_styling(PathStylingConfig {
                enabled: true,
                path_styles: styles,
            });

        let json = profile.to_json_pretty().unwrap();
        assert!(json.contains("\"svgData\": \"<svg/>\""));
        assert!(json.contains("\"pathStyles\""));
        assert_eq!(CompositionProfile::from_json(&json).unwrap(), profile);
    }

    #[test]
    fn blink_target_serializes_camel_case() {
        let json = serde_json::to_string(&BlinkTarget::new("piece-3", 7)).unwrap();
        assert_eq!(json, r#"{"pieceId":"piece-3","token":7}"#);
    }
}
