//! Layer sources and rasterization of produced documents using resvg/usvg.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Size, Tree};
use serde::{Deserialize, Serialize};

// ============================================================================
// SvgSource
// ============================================================================

/// Markup behind a [`LayerState`](crate::LayerState).
///
/// In profile JSON this is `{"svgData": "<svg ...>"}` for inline markup or
/// `{"emoji": "🦆"}` for a Twemoji glyph.
///
/// ```
/// use aikon_renderer::SvgSource;
///
/// let inline: SvgSource = r#"<svg viewBox="0 0 1 1"/>"#.into();
/// assert!(inline.is_raw());
/// assert_eq!(inline.resolve(), Some(r#"<svg viewBox="0 0 1 1"/>"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum SvgSource {
    #[serde(rename = "svgData")]
    Raw(String),

    /// Looked up in `twemoji-assets`; needs the `twemoji` feature.
    #[serde(rename = "emoji")]
    Emoji(String),
}

impl SvgSource {
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self::Raw(svg.into())
    }

    /// `None` unless Twemoji ships a glyph for `emoji`.
    #[cfg(feature = "twemoji")]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        use twemoji_assets::svg::SvgTwemojiAsset;

        SvgTwemojiAsset::from_emoji(emoji)?;
        Some(Self::Emoji(emoji.to_string()))
    }

    /// The markup to draw, if this source has any.
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::Raw(svg) => Some(svg.as_str()),
            #[cfg(feature = "twemoji")]
            Self::Emoji(emoji) => {
                use twemoji_assets::svg::SvgTwemojiAsset;
                let asset = SvgTwemojiAsset::from_emoji(emoji)?;
                Some(asset.as_ref())
            }
            #[cfg(not(feature = "twemoji"))]
            Self::Emoji(emoji) => {
                tracing::debug!(%emoji, "emoji sources need the twemoji feature");
                None
            }
        }
    }

    pub fn is_emoji(&self) -> bool {
        matches!(self, Self::Emoji(_))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl<S: Into<String>> From<S> for SvgSource {
    fn from(s: S) -> Self {
        Self::Raw(s.into())
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Rasterizes a document so that its longer side spans `size` pixels.
///
/// `None` when usvg rejects the markup or the target has no area.
pub fn render_svg(svg_data: &str, size: u32) -> Option<RgbaImage> {
    let tree = match Tree::from_str(svg_data, &Options::default()) {
        Ok(tree) => tree,
        Err(err) => {
            tracing::debug!(error = %err, "cannot rasterize document");
            return None;
        }
    };

    let (width, height, scale) = fit_to_size(tree.size(), size);
    let mut pixmap = Pixmap::new(width, height)?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Some(straight_alpha_image(&pixmap))
}

/// [`render_svg`] for a layer source; `None` if the source does not resolve.
pub fn render_source(source: &SvgSource, size: u32) -> Option<RgbaImage> {
    render_svg(source.resolve()?, size)
}

/// `data:image/svg+xml;base64,...` form of a document, for surfaces that
/// take image URLs.
pub fn svg_to_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Pixel dimensions and scale factor for drawing `natural` into a
/// `size`-pixel square.
fn fit_to_size(natural: Size, size: u32) -> (u32, u32, f32) {
    let scale = size as f32 / natural.width().max(natural.height());
    (
        (natural.width() * scale).ceil() as u32,
        (natural.height() * scale).ceil() as u32,
        scale,
    )
}

fn straight_alpha_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (target, pixel) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = pixel.demultiply();
        *target = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    img
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{CompositeInputs, LayerInput, build_composite_svg};
    use crate::parse::ParseCache;
    use crate::style::{AnimationState, EffectsState, LayerState, SurfaceStyle};

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="40" fill="#ff0000"/></svg>"##;

    #[test]
    fn render_simple_svg() {
        let img = render_svg(SIMPLE_SVG, 50).unwrap();
        assert_eq!((img.width(), img.height()), (50, 50));

        let center = img.get_pixel(25, 25);
        assert_eq!(center.0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn render_rejects_bad_input() {
        assert!(render_svg("<not-svg", 32).is_none());
        assert!(render_svg(SIMPLE_SVG, 0).is_none());
    }

    #[test]
    fn composite_rasterizes_with_recolored_icon() {
        let base = LayerState::from_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M6 6h12v12H6z"/></svg>"#,
        );
        let overlay = LayerState::default();
        let effects = EffectsState::default();
        let animation = AnimationState::default();
        let background = SurfaceStyle {
            flat_color: "#0000ff".to_string(),
            ..SurfaceStyle::background()
        };
        let foreground = SurfaceStyle::foreground();
        let inputs = CompositeInputs {
            base: LayerInput::resolve(&base),
            overlay: LayerInput::resolve(&overlay),
            effects: &effects,
            animation: &animation,
            background: &background,
            foreground: Some(&foreground),
        };
        let svg = build_composite_svg(&inputs, &mut ParseCache::new(), None);

        let img = render_svg(&svg, 64).unwrap();
        assert_eq!(img.get_pixel(32, 32).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 255, 255]);
    }

    #[test]
    fn translucent_pixels_keep_their_color() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000" fill-opacity="0.5"/></svg>"##;
        let img = render_svg(svg, 10).unwrap();
        let [r, g, b, a] = img.get_pixel(5, 5).0;
        assert!(r >= 254, "red channel {r}");
        assert_eq!((g, b), (0, 0));
        assert!((127..=128).contains(&a), "alpha {a}");
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let natural = Size::from_wh(200.0, 100.0).unwrap();
        assert_eq!(fit_to_size(natural, 50), (50, 25, 0.25));
    }

    #[test]
    fn data_uri_is_base64() {
        assert_eq!(
            svg_to_data_uri("<svg/>"),
            "data:image/svg+xml;base64,PHN2Zy8+"
        );
    }

    #[test]
    fn svg_source_from_raw() {
        let source = SvgSource::from_svg("<svg></svg>");
        assert!(source.is_raw());
        assert!(!source.is_emoji());
        assert_eq!(source.resolve(), Some("<svg></svg>"));

        let converted: SvgSource = "<svg></svg>".into();
        assert_eq!(converted, source);
    }

    #[test]
    fn svg_source_json_shape() {
        let json = serde_json::to_string(&SvgSource::from_svg("<svg/>")).unwrap();
        assert_eq!(json, r#"{"svgData":"<svg/>"}"#);

        let emoji: SvgSource = serde_json::from_str(r#"{"emoji":"🦆"}"#).unwrap();
        assert!(emoji.is_emoji());
    }

    #[cfg(not(feature = "twemoji"))]
    #[test]
    fn emoji_without_feature_resolves_to_nothing() {
        assert_eq!(SvgSource::Emoji("🦆".to_string()).resolve(), None);
    }

    #[cfg(feature = "twemoji")]
    #[test]
    fn svg_source_from_emoji() {
        let source = SvgSource::from_emoji("🦆").expect("duck emoji should be supported");
        assert!(source.is_emoji());
        assert!(source.resolve().unwrap().contains("<svg"));
        assert!(SvgSource::from_emoji("not-an-emoji").is_none());

        let img = render_source(&source, 64).unwrap();
        assert!(img.width() > 0);
    }
}
