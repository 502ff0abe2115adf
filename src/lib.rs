//! aikon-renderer: SVG decomposition and compositing for icon re-skinning
//!
//! This crate takes arbitrary icon markup and re-skins it: recoloring
//! placeholder (black or white) fills, placing the icon on a generated
//! background shape, applying shadows, blend modes, filters and an
//! animation transform, and producing one self-contained SVG document.
//! Icons can also be broken out into [`Piece`]s that are styled one by one.
//!
//! # Example
//!
//! ```
//! use aikon_renderer::{
//!     BackgroundShape, CompositionProfile, IconComposer, LayerState, PaintKind, SurfaceStyle,
//! };
//!
//! let icon = r#"<svg viewBox="0 0 24 24"><path d="M4 4h16v16H4z"/></svg>"#;
//! let profile = CompositionProfile::new()
//!     .with_base(LayerState::from_svg(icon))
//!     .with_background(SurfaceStyle {
//!         paint: PaintKind::Gradient,
//!         shape: BackgroundShape::Star5,
//!         ..SurfaceStyle::background()
//!     });
//!
//! let mut composer = IconComposer::new(profile);
//! let svg = composer.render(None);
//! assert!(svg.contains(r##"fill="#ffffff""##));
//! assert!(svg.contains(r#"<clipPath id="bg-clip"><polygon"#));
//! ```
//!
//! # Serializable Profiles
//!
//! [`CompositionProfile`] round-trips through JSON, and the [`Configurable`]
//! trait moves it in and out of an [`IconComposer`]:
//!
//! ```
//! use aikon_renderer::{CompositionProfile, Configurable, IconComposer};
//!
//! let profile = CompositionProfile::from_json(r#"{"effects": {"blur": 2}}"#).unwrap();
//! let mut composer = IconComposer::default();
//! composer.apply_profile(&profile);
//!
//! assert!(composer.render(None).contains("blur(2px)"));
//! let json = composer.export_profile().to_json().unwrap();
//! ```
//!
//! # Lower-level operations
//!
//! The pieces the composer is built from are public too:
//!
//! ```
//! use aikon_renderer::{is_auto_color_fill, split_path_data_on_move_to};
//!
//! assert_eq!(
//!     split_path_data_on_move_to("M0 0zm10 10 5 0z"),
//!     ["M0 0z", "M10 10 l5 0z"]
//! );
//! assert!(is_auto_color_fill("rgb(255, 255, 255)"));
//! assert!(!is_auto_color_fill("#123456"));
//! ```

mod breakout;
mod composer;
mod composite;
mod compositor;
mod error;
mod foreground;
mod num;
mod parse;
mod path;
mod raster;
mod style;

pub mod markup;
pub mod paint;

pub use breakout::{
    Breakout, BreakoutCache, Piece, decompose, decompose_document, wrap_with_ancestor_context,
};
pub use composer::{Configurable, IconComposer};
pub use composite::{
    BackgroundMarkup, CompositeInputs, LayerInput, build_background_markup, build_composite_svg,
    preview_transform, regular_polygon_points, star_points,
};
pub use compositor::{PIECE_HOVER_VIGNETTE_FILTER_ID, build_piece_styled_svg};
pub use error::MarkupError;
pub use foreground::{ForegroundComposite, build_foreground_composite};
pub use num::{fmt_num, lerp};
pub use paint::is_auto_color_fill;
pub use parse::{
    DEFAULT_VIEW_BOX, ParseCache, ParsedDocument, is_canvas_backdrop, parse_markup,
    parse_view_box_size,
};
pub use path::{PathCursor, parse_command_segments, split_path_data_on_move_to};
pub use raster::{SvgSource, render_source, render_svg, svg_to_data_uri};
pub use style::{
    AnimationState, BackgroundShape, BlendMode, BlinkTarget, CompositionProfile, EffectsState,
    GradientKind, LayerState, PaintKind, PathStylingConfig, PieceStyles, PreviewTransform,
    ShadowMode, StrokeStyle, SurfaceStyle,
};
