//! Mask canvas editor.
//!
//! The editor shows the original scaled to fit a viewport and records
//! freehand strokes on two surfaces of identical size: the visible surface
//! (original plus translucent strokes, what the user sees) and the hidden mask
//! surface (strokes only, on transparency). Saving exports the mask surface.
//!
//! Lifecycle: [`MaskEditor::open`] loads the image (Loading → Ready); pointer
//! down/move/up toggle between [`EditorState::Ready`] and
//! [`EditorState::Drawing`]; [`MaskEditor::save`] and [`MaskEditor::cancel`]
//! consume the editor and end the session.

use std::io::Cursor;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::record::{EncodedImage, SourceFile};

/// Smallest brush width in canvas pixels.
pub const MIN_BRUSH_SIZE: f32 = 10.0;
/// Largest brush width in canvas pixels.
pub const MAX_BRUSH_SIZE: f32 = 100.0;
/// Brush width when the editor opens.
pub const DEFAULT_BRUSH_SIZE: f32 = 30.0;

/// Stroke color, `rgba(0, 122, 255, 0.5)`.
pub const STROKE_RGB: [u8; 3] = [0, 122, 255];
/// Stroke opacity.
pub const STROKE_ALPHA: f32 = 0.5;

/// Available drawing area, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Viewport {
    /// A viewport of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 1.0)
                .ok_or_else(|| format!("invalid viewport dimension {v:?}"))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

/// Size an image is rendered at after scale-to-fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSize {
    /// Rendered width.
    pub width: f32,
    /// Rendered height.
    pub height: f32,
}

impl RenderSize {
    /// Pixel size of a canvas holding this render (fractions truncated, at least 1).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn canvas_size(self) -> (u32, u32) {
        ((self.width as u32).max(1), (self.height as u32).max(1))
    }
}

/// Largest size of an `image_width × image_height` image that fits `viewport`
/// with its aspect ratio preserved.
///
/// Images relatively wider than the viewport fit its width; all others fit its height.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_to_viewport(image_width: u32, image_height: u32, viewport: Viewport) -> RenderSize {
    let image_ratio = image_width as f32 / image_height.max(1) as f32;
    let viewport_ratio = viewport.width / viewport.height;
    if image_ratio > viewport_ratio {
        RenderSize {
            width: viewport.width,
            height: viewport.width / image_ratio,
        }
    } else {
        RenderSize {
            width: viewport.height * image_ratio,
            height: viewport.height,
        }
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// A point at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Raw pointer input in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    /// Mouse cursor position.
    Mouse {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
    /// Active touch points; only the first is used.
    Touch {
        /// Touches in contact order.
        touches: Vec<Point>,
    },
}

impl PointerInput {
    /// Viewport position of the pointer, if there is one.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Mouse { x, y } => Some(Point::new(*x, *y)),
            Self::Touch { touches } => touches.first().copied(),
        }
    }
}

/// Map raw pointer input to canvas-local coordinates.
#[must_use]
pub fn canvas_point(input: &PointerInput, canvas_origin: Point) -> Option<Point> {
    input
        .position()
        .map(|p| Point::new(p.x - canvas_origin.x, p.y - canvas_origin.y))
}

/// A pointer event delivered to the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Button pressed or touch started.
    Down(PointerInput),
    /// Pointer moved or touch dragged.
    Move(PointerInput),
    /// Button released or touch ended.
    Up,
    /// Pointer left the canvas.
    Leave,
}

/// Interaction state of an open editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Waiting for a stroke.
    Ready,
    /// A stroke is being drawn.
    Drawing,
}

/// One recorded stroke, as pointer positions in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Brush size to switch to before drawing; keeps the current size if absent.
    #[serde(default)]
    pub brush_size: Option<f32>,
    /// Path, starting at the pointer-down position.
    pub points: Vec<Point>,
}

/// Parse a JSON array of [`Stroke`]s.
///
/// # Errors
///
/// Returns [`crate::Error::Strokes`] if the JSON does not describe strokes.
pub fn parse_strokes(json: &str) -> Result<Vec<Stroke>> {
    Ok(serde_json::from_str(json)?)
}

/// Stroke in progress.
///
/// `coverage` holds the highest coverage each pixel received from this stroke,
/// so overlapping segments of one stroke never darken it. The base surfaces are
/// the pixels before the stroke started.
struct ActiveStroke {
    width: f32,
    last: Point,
    coverage: Vec<f32>,
    display_base: RgbaImage,
    mask_base: RgbaImage,
}

/// Interactive mask editor for one image.
pub struct MaskEditor {
    display: RgbaImage,
    mask: RgbaImage,
    viewport: Viewport,
    brush_size: f32,
    stroke: Option<ActiveStroke>,
    strokes: usize,
}

impl MaskEditor {
    /// Load `source` and prepare surfaces scaled to fit `viewport`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Image`] if the source cannot be decoded.
    pub fn open(source: &SourceFile, viewport: Viewport) -> Result<Self> {
        let image = image::load_from_memory(&source.bytes)?;
        Ok(Self::from_image(&image, viewport))
    }

    /// Prepare surfaces for an already decoded image.
    #[must_use]
    pub fn from_image(image: &DynamicImage, viewport: Viewport) -> Self {
        let (width, height) =
            fit_to_viewport(image.width(), image.height(), viewport).canvas_size();
        let display = imageops::resize(&image.to_rgba8(), width, height, FilterType::Triangle);
        debug!(
            source_width = image.width(),
            source_height = image.height(),
            width,
            height,
            "editor surfaces ready"
        );
        Self {
            display,
            mask: RgbaImage::new(width, height),
            viewport,
            brush_size: DEFAULT_BRUSH_SIZE,
            stroke: None,
            strokes: 0,
        }
    }

    /// Current interaction state.
    #[must_use]
    pub fn state(&self) -> EditorState {
        if self.stroke.is_some() {
            EditorState::Drawing
        } else {
            EditorState::Ready
        }
    }

    /// Pixel size shared by both surfaces.
    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Offset of the canvas inside the viewport (the canvas is centered).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn canvas_origin(&self) -> Point {
        let (w, h) = self.canvas_size();
        Point::new(
            ((self.viewport.width - w as f32) / 2.0).max(0.0),
            ((self.viewport.height - h as f32) / 2.0).max(0.0),
        )
    }

    /// The visible surface: scaled original plus strokes.
    #[must_use]
    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    /// The hidden mask surface: strokes only.
    #[must_use]
    pub fn mask(&self) -> &RgbaImage {
        &self.mask
    }

    /// Brush width used by the next stroke.
    #[must_use]
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Number of strokes started this session.
    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.strokes
    }

    /// Change the brush width, clamped to the supported range.
    ///
    /// Strokes already started keep their width.
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = if size.is_nan() {
            DEFAULT_BRUSH_SIZE
        } else {
            size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
        };
    }

    /// Dispatch a raw pointer event.
    pub fn handle(&mut self, event: &PointerEvent) {
        let origin = self.canvas_origin();
        match event {
            PointerEvent::Down(input) => {
                if let Some(p) = canvas_point(input, origin) {
                    self.pointer_down(p);
                }
            }
            PointerEvent::Move(input) => {
                if let Some(p) = canvas_point(input, origin) {
                    self.pointer_move(p);
                }
            }
            PointerEvent::Up | PointerEvent::Leave => self.pointer_up(),
        }
    }

    /// Begin a stroke at canvas-local `at`. Nothing is painted until the pointer moves.
    pub fn pointer_down(&mut self, at: Point) {
        let (w, h) = self.canvas_size();
        self.stroke = Some(ActiveStroke {
            width: self.brush_size,
            last: at,
            coverage: vec![0.0; (w as usize) * (h as usize)],
            display_base: self.display.clone(),
            mask_base: self.mask.clone(),
        });
        self.strokes += 1;
    }

    /// Extend the active stroke to `to`, painting both surfaces. Ignored when not drawing.
    pub fn pointer_move(&mut self, to: Point) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        paint_segment(stroke, &mut self.display, &mut self.mask, to);
        stroke.last = to;
    }

    /// End the active stroke; painted strokes are kept.
    pub fn pointer_up(&mut self) {
        self.stroke = None;
    }

    /// Draw recorded strokes as if they had been performed with a pointer.
    ///
    /// Points are viewport positions and go through the same canvas-origin
    /// mapping as live pointer events.
    pub fn replay(&mut self, strokes: &[Stroke]) {
        for stroke in strokes {
            if let Some(size) = stroke.brush_size {
                self.set_brush_size(size);
            }
            let Some((first, rest)) = stroke.points.split_first() else {
                continue;
            };
            self.handle(&PointerEvent::Down(PointerInput::Mouse {
                x: first.x,
                y: first.y,
            }));
            for p in rest {
                self.handle(&PointerEvent::Move(PointerInput::Mouse { x: p.x, y: p.y }));
            }
            self.handle(&PointerEvent::Up);
        }
    }

    /// Export the mask surface as a PNG and end the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Image`] if PNG encoding fails.
    pub fn save(self) -> Result<EncodedImage> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.mask).write_to(&mut buf, ImageFormat::Png)?;
        debug!(strokes = self.strokes, bytes = buf.get_ref().len(), "mask exported");
        Ok(EncodedImage::new("image/png", buf.into_inner()))
    }

    /// Discard the session without exporting anything.
    pub fn cancel(self) {
        debug!(strokes = self.strokes, "mask editor cancelled");
    }
}

/// Paint the capsule from `stroke.last` to `to` onto both surfaces.
///
/// A capsule per segment yields round caps, and the union of consecutive
/// capsules yields round joins.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
fn paint_segment(stroke: &mut ActiveStroke, display: &mut RgbaImage, mask: &mut RgbaImage, to: Point) {
    let (w, h) = mask.dimensions();
    let half = stroke.width / 2.0;
    let a = stroke.last;

    let min_x = (a.x.min(to.x) - half - 1.0).floor().max(0.0) as i64;
    let min_y = (a.y.min(to.y) - half - 1.0).floor().max(0.0) as i64;
    let max_x = ((a.x.max(to.x) + half + 1.0).ceil() as i64).min(i64::from(w) - 1);
    let max_y = ((a.y.max(to.y) + half + 1.0).ceil() as i64).min(i64::from(h) - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let cov = (half + 0.5 - distance_to_segment(center, a, to)).clamp(0.0, 1.0);
            let idx = (y as usize) * (w as usize) + x as usize;
            if cov <= stroke.coverage[idx] {
                continue;
            }
            stroke.coverage[idx] = cov;
            let (px, py) = (x as u32, y as u32);
            let alpha = STROKE_ALPHA * cov;
            display.put_pixel(px, py, source_over(*stroke.display_base.get_pixel(px, py), alpha));
            mask.put_pixel(px, py, source_over(*stroke.mask_base.get_pixel(px, py), alpha));
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let (apx, apy) = (p.x - a.x, p.y - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (apx - abx * t, apy - aby * t);
    (dx * dx + dy * dy).sqrt()
}

/// Composite the stroke color at `alpha` over `dst` (non-premultiplied RGBA).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn source_over(dst: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let da = f32::from(dst[3]) / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for (i, &src) in STROKE_RGB.iter().enumerate() {
        let c = (f32::from(src) * alpha + f32::from(dst[i]) * da * (1.0 - alpha)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_editor(w: u32, h: u32, viewport: Viewport) -> MaskEditor {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])));
        MaskEditor::from_image(&img, viewport)
    }

    #[test]
    fn fit_to_height_for_tall_image() {
        let size = fit_to_viewport(1000, 2000, Viewport::new(800.0, 600.0));
        assert!((size.height - 600.0).abs() < f32::EPSILON);
        assert!((size.width - 300.0).abs() < f32::EPSILON);
        assert_eq!(size.canvas_size(), (300, 600));
    }

    #[test]
    fn fit_to_width_for_wide_image() {
        let size = fit_to_viewport(2000, 500, Viewport::new(800.0, 600.0));
        assert!((size.width - 800.0).abs() < f32::EPSILON);
        assert!((size.height - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn equal_ratio_fits_height() {
        let size = fit_to_viewport(400, 300, Viewport::new(800.0, 600.0));
        assert_eq!(size.canvas_size(), (800, 600));
    }

    #[test]
    fn canvas_size_truncates_fractions() {
        let size = fit_to_viewport(1000, 3000, Viewport::new(800.0, 600.0));
        assert_eq!(size.canvas_size(), (200, 600));
        let size = fit_to_viewport(3, 1000, Viewport::new(800.0, 600.0));
        assert_eq!(size.canvas_size(), (1, 600));
    }

    #[test]
    fn viewport_parses_dimensions() {
        assert_eq!("800x600".parse::<Viewport>().unwrap(), Viewport::new(800.0, 600.0));
        assert_eq!("1024X768".parse::<Viewport>().unwrap(), Viewport::new(1024.0, 768.0));
        assert!("800".parse::<Viewport>().is_err());
        assert!("0x600".parse::<Viewport>().is_err());
        assert!("axb".parse::<Viewport>().is_err());
    }

    #[test]
    fn pointer_mapping_subtracts_canvas_origin() {
        let origin = Point::new(100.0, 20.0);
        let mouse = PointerInput::Mouse { x: 150.0, y: 70.0 };
        assert_eq!(canvas_point(&mouse, origin), Some(Point::new(50.0, 50.0)));

        let touch = PointerInput::Touch {
            touches: vec![Point::new(150.0, 70.0), Point::new(0.0, 0.0)],
        };
        assert_eq!(canvas_point(&touch, origin), Some(Point::new(50.0, 50.0)));

        let empty = PointerInput::Touch { touches: vec![] };
        assert_eq!(canvas_point(&empty, origin), None);
    }

    #[test]
    fn surfaces_share_scaled_size() {
        let editor = white_editor(1000, 2000, Viewport::new(800.0, 600.0));
        assert_eq!(editor.canvas_size(), (300, 600));
        assert_eq!(editor.display().dimensions(), (300, 600));
        assert_eq!(editor.canvas_origin(), Point::new(250.0, 0.0));
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut editor = white_editor(10, 10, Viewport::default());
        assert!((editor.brush_size() - DEFAULT_BRUSH_SIZE).abs() < f32::EPSILON);
        editor.set_brush_size(5.0);
        assert!((editor.brush_size() - MIN_BRUSH_SIZE).abs() < f32::EPSILON);
        editor.set_brush_size(500.0);
        assert!((editor.brush_size() - MAX_BRUSH_SIZE).abs() < f32::EPSILON);
        editor.set_brush_size(42.0);
        assert!((editor.brush_size() - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn stroke_paints_both_surfaces_in_lockstep() {
        let mut editor = white_editor(100, 100, Viewport::new(100.0, 100.0));
        editor.set_brush_size(10.0);
        editor.pointer_down(Point::new(20.0, 50.0));
        assert_eq!(editor.state(), EditorState::Drawing);
        editor.pointer_move(Point::new(80.0, 50.0));
        editor.pointer_up();
        assert_eq!(editor.state(), EditorState::Ready);

        let m = editor.mask().get_pixel(50, 50);
        assert_eq!(m.0, [0, 122, 255, 128]);
        let d = editor.display().get_pixel(50, 50);
        assert_eq!(d[3], 255);
        assert!(d[0] < 200 && d[2] == 255);

        // Outside the brush radius both surfaces are untouched.
        assert_eq!(editor.mask().get_pixel(50, 70)[3], 0);
        assert_eq!(editor.display().get_pixel(50, 70).0, [255, 255, 255, 255]);
        // Round cap extends past the endpoints.
        assert!(editor.mask().get_pixel(17, 50)[3] > 0);
    }

    #[test]
    fn overlapping_segments_of_one_stroke_do_not_darken() {
        let mut editor = white_editor(100, 100, Viewport::new(100.0, 100.0));
        editor.pointer_down(Point::new(20.0, 50.0));
        editor.pointer_move(Point::new(80.0, 50.0));
        editor.pointer_move(Point::new(20.0, 50.0));
        editor.pointer_up();
        assert_eq!(editor.mask().get_pixel(50, 50)[3], 128);
    }

    #[test]
    fn separate_strokes_accumulate() {
        let mut editor = white_editor(100, 100, Viewport::new(100.0, 100.0));
        for _ in 0..2 {
            editor.pointer_down(Point::new(20.0, 50.0));
            editor.pointer_move(Point::new(80.0, 50.0));
            editor.pointer_up();
        }
        assert_eq!(editor.stroke_count(), 2);
        let alpha = editor.mask().get_pixel(50, 50)[3];
        assert!((190..=192).contains(&alpha), "alpha {alpha}");
    }

    #[test]
    fn moves_without_pointer_down_paint_nothing() {
        let mut editor = white_editor(50, 50, Viewport::new(50.0, 50.0));
        editor.pointer_move(Point::new(10.0, 10.0));
        editor.pointer_move(Point::new(40.0, 40.0));
        assert!(editor.mask().pixels().all(|p| p[3] == 0));

        editor.pointer_down(Point::new(25.0, 25.0));
        editor.pointer_up();
        assert!(editor.mask().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn brush_change_mid_stroke_keeps_stroke_width() {
        let mut editor = white_editor(100, 100, Viewport::new(100.0, 100.0));
        editor.set_brush_size(10.0);
        editor.pointer_down(Point::new(10.0, 50.0));
        editor.set_brush_size(100.0);
        editor.pointer_move(Point::new(90.0, 50.0));
        editor.pointer_up();
        assert_eq!(editor.mask().get_pixel(50, 70)[3], 0);
    }

    #[test]
    fn handle_maps_viewport_events() {
        let mut editor = white_editor(100, 50, Viewport::new(100.0, 100.0));
        assert_eq!(editor.canvas_origin(), Point::new(0.0, 25.0));
        editor.handle(&PointerEvent::Down(PointerInput::Touch {
            touches: vec![Point::new(10.0, 50.0)],
        }));
        editor.handle(&PointerEvent::Move(PointerInput::Mouse { x: 90.0, y: 50.0 }));
        editor.handle(&PointerEvent::Leave);
        assert_eq!(editor.state(), EditorState::Ready);
        assert!(editor.mask().get_pixel(50, 25)[3] > 0);
        assert_eq!(editor.mask().get_pixel(50, 48)[3], 0);
    }

    #[test]
    fn empty_save_is_transparent_png_of_canvas_size() {
        let editor = white_editor(1000, 2000, Viewport::new(800.0, 600.0));
        let png = editor.save().unwrap();
        assert_eq!(png.mime_type, "image/png");
        let decoded = png.decode().unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (300, 600));
        assert!(decoded.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn replay_draws_parsed_strokes() {
        let strokes = parse_strokes(
            r#"[{"brush_size": 20, "points": [{"x": 5, "y": 5}, {"x": 45, "y": 5}]},
                {"points": []}]"#,
        )
        .unwrap();
        let mut editor = white_editor(50, 50, Viewport::new(50.0, 50.0));
        editor.replay(&strokes);
        assert_eq!(editor.stroke_count(), 1);
        assert!((editor.brush_size() - 20.0).abs() < f32::EPSILON);
        assert!(editor.mask().get_pixel(25, 5)[3] > 0);
        assert_eq!(editor.state(), EditorState::Ready);
    }

    #[test]
    fn replay_maps_viewport_points_through_canvas_origin() {
        let strokes = parse_strokes(
            r#"[{"points": [{"x": 260, "y": 100}, {"x": 300, "y": 100}]}]"#,
        )
        .unwrap();
        let mut replayed = white_editor(1000, 2000, Viewport::new(800.0, 600.0));
        assert_eq!(replayed.canvas_origin(), Point::new(250.0, 0.0));
        replayed.replay(&strokes);

        let mut live = white_editor(1000, 2000, Viewport::new(800.0, 600.0));
        live.handle(&PointerEvent::Down(PointerInput::Mouse { x: 260.0, y: 100.0 }));
        live.handle(&PointerEvent::Move(PointerInput::Mouse { x: 300.0, y: 100.0 }));
        live.handle(&PointerEvent::Up);

        assert!(replayed.mask().get_pixel(30, 100)[3] > 0);
        assert_eq!(replayed.mask().get_pixel(280, 100)[3], 0);
        assert_eq!(replayed.mask(), live.mask());
    }

    #[test]
    fn parse_strokes_rejects_garbage() {
        assert!(parse_strokes("{not json").is_err());
    }
}
