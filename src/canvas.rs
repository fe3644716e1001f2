//! A small immediate-mode drawing surface with a canvas-style transform stack.

use std::ops::Mul;

use bevy::prelude::*;
use bevy_egui::egui;

/// Translation plus uniform scale: `p * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for Similarity {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Similarity {
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn new(offset: Vec2, scale: f32) -> Self {
        Self { offset, scale }
    }

    pub fn translate(offset: Vec2) -> Self {
        Self { offset, scale: 1.0 }
    }

    pub fn scale(scale: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale,
        }
    }

    /// Scales about `center`: translate to the origin, scale, translate back.
    pub fn about(center: Vec2, scale: f32) -> Self {
        Self::translate(center) * Self::scale(scale) * Self::translate(-center)
    }

    pub fn apply(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }

    pub fn inverse_apply(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }
}

/// `a * b` applies `b` first, then `a`.
impl Mul for Similarity {
    type Output = Similarity;

    fn mul(self, inner: Similarity) -> Similarity {
        Similarity {
            offset: self.offset + inner.offset * self.scale,
            scale: self.scale * inner.scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasState {
    pub transform: Similarity,
    pub alpha: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Similarity::IDENTITY,
            alpha: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StateStack {
    current: CanvasState,
    saved: Vec<CanvasState>,
}

impl StateStack {
    pub fn current(&self) -> CanvasState {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    pub fn transform(&mut self, t: Similarity) {
        self.current.transform = self.current.transform * t;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.current.alpha = alpha.clamp(0.0, 1.0);
    }
}

/// Drawing calls take coordinates in the space set up by `transform`.
/// Stroke widths and radii scale with it.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn transform(&mut self, t: Similarity);
    fn set_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color);
    /// Closed outline through `points`.
    fn polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<Stroke>);
    fn polyline(&mut self, points: &[Vec2], stroke: Stroke);
    fn dashed_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke, dash: f32);
    fn circle(&mut self, center: Vec2, radius: f32, fill: Color);
}

/// Paints into an egui layer, in logical window pixels.
pub struct EguiCanvas {
    painter: egui::Painter,
    state: StateStack,
}

impl EguiCanvas {
    pub fn new(painter: egui::Painter) -> Self {
        Self {
            painter,
            state: StateStack::default(),
        }
    }

    fn pos(&self, point: Vec2) -> egui::Pos2 {
        let p = self.state.current().transform.apply(point);
        egui::pos2(p.x, p.y)
    }

    fn color(&self, color: Color) -> egui::Color32 {
        let c = color.to_srgba();
        let alpha = c.alpha * self.state.current().alpha;
        egui::Color32::from_rgba_unmultiplied(
            channel(c.red),
            channel(c.green),
            channel(c.blue),
            channel(alpha),
        )
    }

    fn stroke(&self, stroke: Stroke) -> egui::Stroke {
        egui::Stroke::new(
            stroke.width * self.state.current().transform.scale,
            self.color(stroke.color),
        )
    }
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Canvas for EguiCanvas {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn transform(&mut self, t: Similarity) {
        self.state.transform(t);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.set_alpha(alpha);
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color) {
        let rect = egui::Rect::from_two_pos(self.pos(min), self.pos(min + size));
        self.painter.rect_filled(rect, 0.0, self.color(color));
    }

    fn polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<Stroke>) {
        if points.len() < 2 {
            return;
        }
        let path: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        let fill = fill.map_or(egui::Color32::TRANSPARENT, |c| self.color(c));
        let stroke = stroke.map_or(egui::Stroke::NONE, |s| self.stroke(s));
        self.painter
            .add(egui::Shape::convex_polygon(path, fill, stroke));
    }

    fn polyline(&mut self, points: &[Vec2], stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        let path: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        let stroke = self.stroke(stroke);
        self.painter.add(egui::Shape::line(path, stroke));
    }

    fn dashed_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke, dash: f32) {
        let dash = dash * self.state.current().transform.scale;
        let path = [self.pos(from), self.pos(to)];
        let stroke = self.stroke(stroke);
        self.painter
            .extend(egui::Shape::dashed_line(&path, stroke, dash, dash));
    }

    fn circle(&mut self, center: Vec2, radius: f32, fill: Color) {
        let radius = radius * self.state.current().transform.scale;
        self.painter
            .circle_filled(self.pos(center), radius, self.color(fill));
    }
}
