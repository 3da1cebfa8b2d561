//! Drawing surface abstraction and the per-mode draw algorithms.
//!
//! Draw algorithms only ever talk to a [`Surface`]. The crate ships two
//! implementations: [`Raster`], a software rasterizer backed by an RGBA image
//! that can be snapshotted to disk, and [`CommandList`], which records the
//! primitives so tests can assert on exact geometry.

mod modes;
mod raster;

pub use modes::{renderer_for, BackgroundPolicy, FrameInput, ModeRenderer};
pub use raster::Raster;

use crate::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Output collaborator: a fixed-size drawing surface.
pub trait Surface {
    /// Current size in pixels. The scheduler re-dimensions grids when this changes.
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color);

    /// Open polyline through `points`.
    fn stroke_path(&mut self, points: &[Point], width: f32, color: Color);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    /// Arc from `start` to `end` radians, clockwise in screen space.
    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Color,
    );

    fn fill_polygon(&mut self, points: &[Point], color: Color);

    /// Draws `text` with its top-left corner at `at`.
    fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color);

    /// Covers the whole surface with `color`.
    fn fill(&mut self, color: Color) {
        let (width, height) = self.size();
        self.fill_rect(Rect::new(0.0, 0.0, width as f32, height as f32), color);
    }
}

/// A recorded drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect(Rect, Color),
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    Path {
        points: Vec<Point>,
        width: f32,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
    },
    Arc {
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Color,
    },
    Polygon(Vec<Point>, Color),
    Text {
        text: String,
        at: Point,
        size: f32,
        color: Color,
    },
}

/// Surface that records every primitive instead of rasterizing it.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for CommandList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn stroke_path(&mut self, points: &[Point], width: f32, color: Color) {
        self.commands.push(DrawCommand::Path {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Color,
    ) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start,
            end,
            width,
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.commands.push(DrawCommand::Polygon(points.to_vec(), color));
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            size,
            color,
        });
    }
}
