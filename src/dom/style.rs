//! Computed style snapshot and the small parsers the renderer needs.

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) 8-bit RGBA color.
///
/// Serialized as a CSS color string; any syntax `csscolorparser` accepts is
/// read (`#fff`, `rgb(0, 0, 0)`, `rgba(...)`, named colors, `transparent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn parse(css: &str) -> Option<Self> {
        let [r, g, b, a] = csscolorparser::parse(css.trim()).ok()?.to_rgba8();
        Some(Self { r, g, b, a })
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::TRANSPARENT
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse(&value).ok_or_else(|| format!("unrecognized color {value:?}"))
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        if c.a == 255 {
            format!("rgb({}, {}, {})", c.r, c.g, c.b)
        } else {
            format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, f32::from(c.a) / 255.0)
        }
    }
}

/// Per-side values in top, right, bottom, left order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Sides<T> {
    pub fn all(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

impl Sides<f32> {
    /// Component-wise sum, used for border + padding insets.
    pub fn plus(&self, other: &Sides<f32>) -> Sides<f32> {
        Sides {
            top: self.top + other.top,
            right: self.right + other.right,
            bottom: self.bottom + other.bottom,
            left: self.left + other.left,
        }
    }
}

/// Per-corner radii.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Corners {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl Corners {
    pub fn all(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top_left <= 0.0 && self.top_right <= 0.0 && self.bottom_right <= 0.0 && self.bottom_left <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundRepeat {
    #[default]
    Repeat,
    RepeatX,
    RepeatY,
    NoRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

/// Font used to measure and paint text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    pub family: String,
    pub size_px: f32,
    pub weight: u16,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size_px: 16.0,
            weight: 400,
            italic: false,
        }
    }
}

/// Resolved style values of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub color: Rgba,
    pub background_color: Rgba,
    /// Raw `background-image` value, e.g. `url("a.png")` or `none`.
    pub background_image: String,
    /// Raw `background-position` value, e.g. `50% 0px`.
    pub background_position: String,
    pub background_repeat: BackgroundRepeat,
    pub border_width: Sides<f32>,
    pub border_color: Sides<Rgba>,
    pub border_radius: Corners,
    pub padding: Sides<f32>,
    pub overflow: Overflow,
    pub font: FontSpec,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            background_color: Rgba::TRANSPARENT,
            background_image: "none".to_string(),
            background_position: "0% 0%".to_string(),
            background_repeat: BackgroundRepeat::Repeat,
            border_width: Sides::default(),
            border_color: Sides::all(Rgba::BLACK),
            border_radius: Corners::default(),
            padding: Sides::default(),
            overflow: Overflow::Visible,
            font: FontSpec::default(),
        }
    }
}

impl ComputedStyle {
    /// Border plus padding on each side.
    pub fn content_inset(&self) -> Sides<f32> {
        self.border_width.plus(&self.padding)
    }

    pub fn background_image_url(&self) -> Option<&str> {
        parse_css_url(&self.background_image)
    }

    pub fn background_position(&self) -> BackgroundPosition {
        BackgroundPosition::parse(&self.background_position)
    }
}

/// Extract the target of a CSS `url(...)` value, stripping optional quotes.
pub fn parse_css_url(value: &str) -> Option<&str> {
    let inner = value.trim().strip_prefix("url(")?;
    let end = inner.rfind(')')?;
    let target = inner[..end].trim().trim_matches(|c| c == '"' || c == '\'');
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// One axis of a background position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionComponent {
    Percent(f32),
    Px(f32),
}

impl PositionComponent {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token {
            "left" | "top" => return Some(Self::Percent(0.0)),
            "center" => return Some(Self::Percent(50.0)),
            "right" | "bottom" => return Some(Self::Percent(100.0)),
            _ => {}
        }
        if let Some(p) = token.strip_suffix('%') {
            return p.trim().parse().ok().map(Self::Percent);
        }
        let number = token.strip_suffix("px").unwrap_or(token);
        number.trim().parse().ok().map(Self::Px)
    }

    /// Offset of a tile of `tile` pixels inside an area of `area` pixels.
    ///
    /// Percentages align the same point of the tile and the area; lengths are
    /// truncated to whole pixels.
    pub fn resolve(&self, area: f32, tile: f32) -> f32 {
        match *self {
            Self::Percent(p) => ((area - tile) * (p / 100.0)).round(),
            Self::Px(px) => px.trunc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundPosition {
    pub x: PositionComponent,
    pub y: PositionComponent,
}

impl Default for BackgroundPosition {
    fn default() -> Self {
        Self {
            x: PositionComponent::Percent(0.0),
            y: PositionComponent::Percent(0.0),
        }
    }
}

impl BackgroundPosition {
    /// Parse a computed `background-position`. A single value leaves the
    /// other axis centered. A vertical keyword given first is swapped only
    /// when followed by a horizontal keyword.
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split_whitespace();
        let first = parts.next();
        let second = parts.next();
        let (first, second) = match (first, second) {
            (Some(a @ ("top" | "bottom")), Some(b @ ("left" | "right" | "center"))) => (Some(b), Some(a)),
            (Some(a @ ("top" | "bottom")), None) => (Some("center"), Some(a)),
            other => other,
        };
        let default = Self::default();
        let x = first.and_then(PositionComponent::parse).unwrap_or(default.x);
        let y = match (first, second) {
            (Some(_), None) => PositionComponent::Percent(50.0),
            (_, Some(tok)) => PositionComponent::parse(tok).unwrap_or(default.y),
            (None, None) => default.y,
        };
        Self { x, y }
    }
}
