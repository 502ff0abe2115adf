//! Stateful composition engine over a [`CompositionProfile`].

use image::RgbaImage;

use crate::breakout::{BreakoutCache, Piece, decompose};
use crate::composite::{CompositeInputs, LayerInput, build_composite_svg};
use crate::foreground::build_foreground_composite;
use crate::parse::ParseCache;
use crate::raster::{render_svg, svg_to_data_uri};
use crate::style::{BlinkTarget, CompositionProfile};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from a [`CompositionProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &CompositionProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> CompositionProfile;
}

// ============================================================================
// IconComposer
// ============================================================================

/// Main composition engine.
///
/// `IconComposer` holds the current [`CompositionProfile`] together with the
/// parse and breakout caches, so repeated renders of the same icon skip
/// re-parsing. Edit the [`profile`](Self::profile) field directly or go
/// through [`Configurable`].
///
/// # Example
///
/// ```
/// use aikon_renderer::{CompositionProfile, IconComposer, LayerState};
///
/// let profile = CompositionProfile::new()
///     .with_base(LayerState::from_svg(r#"<svg viewBox="0 0 24 24"><path d="M4 4h16v16H4z"/></svg>"#));
/// let mut composer = IconComposer::new(profile);
///
/// let svg = composer.render(None);
/// assert!(svg.contains("data-foreground-root"));
///
/// let pieces = composer.pieces();
/// assert_eq!(pieces[0].label, "Path 1");
/// ```
#[derive(Debug, Default)]
pub struct IconComposer {
    /// Current state. Caches are keyed by content, so edits take effect on
    /// the next render.
    pub profile: CompositionProfile,

    parse_cache: ParseCache,
    breakout_cache: BreakoutCache,
}

impl IconComposer {
    pub fn new(profile: CompositionProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// Builds the composite document.
    ///
    /// `animation_progress` places the foreground along the profile's
    /// animation; `None` renders it without the animation transform.
    pub fn render(&mut self, animation_progress: Option<f64>) -> String {
        self.compose(None, animation_progress)
    }

    /// Builds the composite document with a one-shot pulse on one piece.
    ///
    /// Only has a visible effect while path styling is enabled.
    pub fn render_with_blink(
        &mut self,
        blink: &BlinkTarget,
        animation_progress: Option<f64>,
    ) -> String {
        self.compose(Some(blink), animation_progress)
    }

    /// Pieces of the base layer's icon, in document order.
    ///
    /// Empty when the base layer has no resolvable source.
    pub fn pieces(&mut self) -> Vec<Piece> {
        let Some(svg) = self.profile.base.source.as_ref().and_then(|s| s.resolve()) else {
            return Vec::new();
        };
        decompose(svg, &mut self.breakout_cache, &mut self.parse_cache)
            .pieces
            .clone()
    }

    /// Renders the composite to a `size`×`size` image.
    ///
    /// Returns `None` if `size` is zero or the document cannot be rendered.
    pub fn rasterize(&mut self, size: u32, animation_progress: Option<f64>) -> Option<RgbaImage> {
        let svg = self.render(animation_progress);
        render_svg(&svg, size)
    }

    /// Renders the composite as a base64 `data:` URI.
    pub fn render_data_uri(&mut self, animation_progress: Option<f64>) -> String {
        svg_to_data_uri(&self.render(animation_progress))
    }

    /// Clears the parse and breakout caches. Useful for freeing memory.
    pub fn clear_cache(&mut self) {
        self.parse_cache.clear();
        self.breakout_cache.clear();
    }

    fn compose(&mut self, blink: Option<&BlinkTarget>, animation_progress: Option<f64>) -> String {
        let Self {
            profile,
            parse_cache,
            breakout_cache,
        } = self;

        let base = LayerInput::resolve(&profile.base);
        let (base_svg, foreground) = match base.svg {
            Some(svg) => {
                let composite = build_foreground_composite(
                    svg,
                    &profile.foreground,
                    Some(&profile.path_styling),
                    blink,
                    parse_cache,
                    breakout_cache,
                );
                (Some(composite.svg), composite.style)
            }
            None => (
                None,
                (!profile.path_styling.enabled).then_some(&profile.foreground),
            ),
        };

        let inputs = CompositeInputs {
            base: match base_svg.as_deref() {
                Some(svg) => LayerInput::with_svg(svg, &profile.base),
                None => base,
            },
            overlay: LayerInput::resolve(&profile.overlay),
            effects: &profile.effects,
            animation: &profile.animation,
            background: &profile.background,
            foreground,
        };
        build_composite_svg(&inputs, parse_cache, animation_progress)
    }
}

impl Configurable for IconComposer {
    /// Replaces the current state with `profile`.
    ///
    /// # Example
    ///
    /// ```
    /// use aikon_renderer::{CompositionProfile, Configurable, IconComposer, PaintKind, SurfaceStyle};
    ///
    /// let mut composer = IconComposer::default();
    /// let profile = CompositionProfile::new().with_background(SurfaceStyle {
    ///     paint: PaintKind::Gradient,
    ///     ..SurfaceStyle::background()
    /// });
    ///
    /// composer.apply_profile(&profile);
    /// assert!(composer.render(None).contains(r#"id="bg-gradient""#));
    /// ```
    fn apply_profile(&mut self, profile: &CompositionProfile) {
        self.profile = profile.clone();
    }

    fn export_profile(&self) -> CompositionProfile {
        self.profile.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
