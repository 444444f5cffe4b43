//! Schematic floor-plan rendering.
//!
//! Rooms are placed by percentage inside a canvas that keeps the layout's
//! aspect ratio. The 3D mode is a projection applied while drawing; room
//! coordinates are never touched.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, BorderType, Borders, Paragraph, Widget, Wrap,
    },
};

use crate::model::{LayoutData, Room, RoomType};

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f64 = 2.0;

/// Width in px of the reference canvas the 3D transform is expressed in.
const REFERENCE_WIDTH: f64 = 650.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStyle {
    pub fill: Color,
    pub border: Color,
    pub text: Color,
}

pub fn room_style(kind: RoomType) -> RoomStyle {
    let (fill, border, text) = match kind {
        RoomType::Living => ((239, 246, 255), (59, 130, 246), (30, 58, 138)),
        RoomType::Bedroom => ((250, 245, 255), (168, 85, 247), (88, 28, 135)),
        RoomType::Kitchen => ((255, 247, 237), (249, 115, 22), (124, 45, 18)),
        RoomType::Bathroom => ((236, 254, 255), (6, 182, 212), (22, 78, 99)),
        RoomType::Hallway => ((250, 250, 249), (168, 162, 158), (28, 25, 23)),
        RoomType::Outdoor => ((236, 253, 245), (16, 185, 129), (6, 78, 59)),
        RoomType::Office => ((238, 242, 255), (99, 102, 241), (49, 46, 129)),
        RoomType::Dining => ((255, 251, 235), (245, 158, 11), (120, 53, 15)),
        RoomType::Other => ((248, 250, 252), (148, 163, 184), (30, 41, 59)),
    };
    RoomStyle {
        fill: rgb(fill),
        border: rgb(border),
        text: rgb(text),
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Legend rows: each distinct room type once, first appearance first.
pub fn legend(layout: &LayoutData) -> Vec<(RoomType, RoomStyle)> {
    layout
        .room_types()
        .into_iter()
        .map(|kind| (kind, room_style(kind)))
        .collect()
}

/// `round(width)m x round(height)m`
pub fn dimension_label(room: &Room) -> String {
    format!(
        "{}m x {}m",
        room.width.round() as i64,
        room.height.round() as i64
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Flat,
    Perspective,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Flat => ViewMode::Perspective,
            ViewMode::Perspective => ViewMode::Flat,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Flat => "2D VIEW",
            ViewMode::Perspective => "3D VIEW",
        }
    }

    pub fn projection(&self) -> Projection {
        match self {
            ViewMode::Flat => Projection::FLAT,
            ViewMode::Perspective => Projection::TILTED,
        }
    }
}

/// A CSS-style `perspective() rotateX() rotateZ() translateY()` chain plus
/// a lift applied to rooms, in reference px around the canvas centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub perspective: f64,
    pub rotate_x_deg: f64,
    pub rotate_z_deg: f64,
    pub translate_y: f64,
    pub room_lift: f64,
}

impl Projection {
    pub const FLAT: Projection = Projection {
        perspective: 0.0,
        rotate_x_deg: 0.0,
        rotate_z_deg: 0.0,
        translate_y: 0.0,
        room_lift: 0.0,
    };

    pub const TILTED: Projection = Projection {
        perspective: 1200.0,
        rotate_x_deg: 45.0,
        rotate_z_deg: -15.0,
        translate_y: -20.0,
        room_lift: 20.0,
    };

    pub fn is_flat(&self) -> bool {
        *self == Projection::FLAT
    }

    /// Maps a point (px, origin at the canvas centre, y down) to screen px.
    pub fn apply(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        let y = y + self.translate_y;

        let (sin_z, cos_z) = self.rotate_z_deg.to_radians().sin_cos();
        let (x, y) = (x * cos_z - y * sin_z, x * sin_z + y * cos_z);

        let (sin_x, cos_x) = self.rotate_x_deg.to_radians().sin_cos();
        let (y, z) = (y * cos_x - z * sin_x, y * sin_x + z * cos_x);

        if self.perspective > 0.0 {
            let scale = self.perspective / (self.perspective - z).max(1.0);
            (x * scale, y * scale)
        } else {
            (x, y)
        }
    }
}

fn shrink(area: Rect, horizontal: u16, vertical: u16) -> Rect {
    Rect {
        x: area.x.saturating_add(horizontal),
        y: area.y.saturating_add(vertical),
        width: area.width.saturating_sub(horizontal * 2),
        height: area.height.saturating_sub(vertical * 2),
    }
}

/// Largest centred rect inside `area` whose on-screen shape has the given
/// width/height ratio.
pub fn fit_canvas(area: Rect, aspect: f64) -> Rect {
    if area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };

    let full_width_height = f64::from(area.width) / aspect / CELL_ASPECT;
    let (width, height) = if full_width_height <= f64::from(area.height) {
        (area.width, (full_width_height.round() as u16).max(1))
    } else {
        let width = (f64::from(area.height) * CELL_ASPECT * aspect).round() as u16;
        (width.clamp(1, area.width), area.height)
    };

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn edge(percent: f64, span: u16) -> u16 {
    let fraction = (percent / 100.0).clamp(0.0, 1.0);
    (fraction * f64::from(span)).round() as u16
}

/// Cells covered by `room` inside `canvas`. Edges come from cumulative
/// percentages, so abutting rooms abut on screen. Anything outside the
/// canvas is clipped; `None` when nothing is left to draw.
pub fn place_room(canvas: Rect, room: &Room) -> Option<Rect> {
    let left = edge(room.x, canvas.width);
    let right = edge(room.x + room.width, canvas.width);
    let top = edge(room.y, canvas.height);
    let bottom = edge(room.y + room.height, canvas.height);

    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        canvas.x + left,
        canvas.y + top,
        right - left,
        bottom - top,
    ))
}

pub fn place_rooms<'a>(canvas: Rect, layout: &'a LayoutData) -> Vec<(&'a Room, Rect)> {
    layout
        .rooms
        .iter()
        .filter_map(|room| place_room(canvas, room).map(|area| (room, area)))
        .collect()
}

const SCALE_MARKER: &str = "├────┤ SCALE 1:100";

/// The workspace pane: header, canvas, legend.
pub struct FloorPlan<'a> {
    layout: Option<&'a LayoutData>,
    mode: ViewMode,
    focused: bool,
}

impl<'a> FloorPlan<'a> {
    pub fn new(layout: Option<&'a LayoutData>, mode: ViewMode) -> Self {
        Self {
            layout,
            mode,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for FloorPlan<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = match self.layout {
            Some(layout) if !layout.is_empty() => layout,
            _ => {
                render_placeholder(area, buf);
                return;
            }
        };

        let border_color = if self.focused { Color::Cyan } else { Color::DarkGray };
        let title = layout.description.as_deref().unwrap_or("Draft Plan");
        let toggle_style = match self.mode {
            ViewMode::Flat => Style::default().bg(Color::DarkGray).fg(Color::White),
            ViewMode::Perspective => Style::default().bg(Color::Blue).fg(Color::White).bold(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(Line::from(vec![
                Span::styled(format!(" {} ", title), Style::default().bold()),
                Span::styled("Architectural Schematic ", Style::default().fg(Color::DarkGray)),
            ]))
            .title_top(
                Line::from(vec![
                    Span::styled(format!(" {} ", self.mode.label()), toggle_style),
                    Span::raw(" "),
                    Span::styled(" Export PNG ", Style::default().fg(Color::DarkGray)),
                    Span::raw(" "),
                ])
                .right_aligned(),
            );

        let inner = block.inner(area);
        block.render(area, buf);

        let [plan_area, legend_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        let projection = self.mode.projection();
        if projection.is_flat() {
            render_flat(layout, plan_area, buf);
        } else {
            render_tilted(layout, projection, plan_area, buf);
        }
        render_legend(layout, legend_area, buf);
    }
}

fn render_placeholder(area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    block.render(area, buf);

    let top_padding = inner.height.saturating_sub(4) / 2;
    let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::default()).collect();
    lines.push(Line::from(Span::styled(
        "Canvas Ready",
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Share your space requirements in the chat to generate a schematic floor plan.",
        Style::default().fg(Color::DarkGray),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

fn render_flat(layout: &LayoutData, area: Rect, buf: &mut Buffer) {
    // One row under the canvas for the scale marker, one cell for the frame.
    let available = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let canvas = fit_canvas(shrink(available, 1, 1), layout.aspect_ratio());
    if canvas.width == 0 || canvas.height == 0 {
        return;
    }

    let frame = Rect::new(canvas.x - 1, canvas.y - 1, canvas.width + 2, canvas.height + 2);
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(Color::White))
        .render(frame, buf);

    for (room, cell_area) in place_rooms(canvas, layout) {
        render_room(room, cell_area, buf);
    }

    let scale_y = frame.y + frame.height;
    if scale_y < area.y + area.height {
        buf.set_string(
            frame.x,
            scale_y,
            SCALE_MARKER,
            Style::default().fg(Color::DarkGray),
        );
    }
}

fn render_room(room: &Room, area: Rect, buf: &mut Buffer) {
    let style = room_style(room.kind);
    let fill = Style::default().bg(style.fill).fg(style.text);

    if area.width < 3 || area.height < 3 {
        buf.set_style(area, fill);
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(style.border).bg(style.fill))
        .style(fill);
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![Line::from(Span::styled(
        room.name.to_uppercase(),
        Style::default().fg(style.text).add_modifier(Modifier::BOLD),
    ))];
    if inner.height >= 2 {
        lines.push(Line::from(Span::styled(
            dimension_label(room),
            Style::default().fg(style.text).add_modifier(Modifier::DIM),
        )));
    }
    let top_padding = inner.height.saturating_sub(lines.len() as u16) / 2;
    let text_area = Rect {
        y: inner.y + top_padding,
        height: inner.height - top_padding,
        ..inner
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(text_area, buf);
}

/// Projects a percentage point of the layout into screen px.
fn project_point(projection: &Projection, layout: &LayoutData, x: f64, y: f64, z: f64) -> (f64, f64) {
    let width = REFERENCE_WIDTH;
    let height = REFERENCE_WIDTH / layout.aspect_ratio();
    projection.apply(
        x / 100.0 * width - width / 2.0,
        y / 100.0 * height - height / 2.0,
        z,
    )
}

/// Screen-space outline of a percentage rectangle, clockwise from top-left.
fn project_rect(
    projection: &Projection,
    layout: &LayoutData,
    (x, y, w, h): (f64, f64, f64, f64),
    z: f64,
) -> [(f64, f64); 4] {
    [
        project_point(projection, layout, x, y, z),
        project_point(projection, layout, x + w, y, z),
        project_point(projection, layout, x + w, y + h, z),
        project_point(projection, layout, x, y + h, z),
    ]
}

/// Canvas bounds covering `points`, padded and stretched to the area's
/// on-screen proportions so the plan is not distorted.
fn bounds_for(points: &[(f64, f64)], area: Rect) -> ([f64; 2], [f64; 2]) {
    let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
    let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
    for &(x, y) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let pad_x = (max_x - min_x).max(1.0) * 0.08;
    let pad_y = (max_y - min_y).max(1.0) * 0.08;
    let (mut min_x, mut max_x) = (min_x - pad_x, max_x + pad_x);
    let (mut min_y, mut max_y) = (min_y - pad_y, max_y + pad_y);

    let target = f64::from(area.width) / (f64::from(area.height.max(1)) * CELL_ASPECT);
    let current = (max_x - min_x) / (max_y - min_y);
    if current < target {
        let extra = ((max_y - min_y) * target - (max_x - min_x)) / 2.0;
        min_x -= extra;
        max_x += extra;
    } else {
        let extra = ((max_x - min_x) / target - (max_y - min_y)) / 2.0;
        min_y -= extra;
        max_y += extra;
    }
    ([min_x, max_x], [min_y, max_y])
}

fn render_tilted(layout: &LayoutData, projection: Projection, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let outline = project_rect(&projection, layout, (0.0, 0.0, 100.0, 100.0), 0.0);
    let rooms: Vec<(&Room, [(f64, f64); 4])> = layout
        .rooms
        .iter()
        .map(|room| {
            let quad = project_rect(
                &projection,
                layout,
                (room.x, room.y, room.width, room.height),
                projection.room_lift,
            );
            (room, quad)
        })
        .collect();

    let mut points: Vec<(f64, f64)> = outline.to_vec();
    for (_, quad) in &rooms {
        points.extend_from_slice(quad);
    }
    // Canvas y grows upwards.
    let flipped: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x, -y)).collect();
    let (x_bounds, y_bounds) = bounds_for(&flipped, area);
    let units_per_cell = (x_bounds[1] - x_bounds[0]) / f64::from(area.width);
    let units_per_row = (y_bounds[1] - y_bounds[0]) / f64::from(area.height);
    let centred_x = |text: &str, cx: f64| {
        let half = text.chars().count() as f64 / 2.0 * units_per_cell;
        (cx - half).max(x_bounds[0])
    };

    // The scale marker sits one row under the lowest corner of the outline,
    // starting at its leftmost corner.
    let scale_x = outline.iter().map(|p| p.0).fold(f64::MAX, f64::min).max(x_bounds[0]);
    let scale_y = (-outline.iter().map(|p| p.1).fold(f64::MIN, f64::max) - units_per_row)
        .max(y_bounds[0]);

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            draw_quad(ctx, &outline, Color::White);
            for (room, quad) in &rooms {
                draw_quad(ctx, quad, room_style(room.kind).border);
            }
            ctx.layer();
            for (room, quad) in &rooms {
                let cx = quad.iter().map(|p| p.0).sum::<f64>() / 4.0;
                let cy = -quad.iter().map(|p| p.1).sum::<f64>() / 4.0;
                let colour = room_style(room.kind).border;

                let label = room.name.to_uppercase();
                ctx.print(
                    centred_x(&label, cx),
                    cy,
                    Line::styled(label, Style::default().fg(colour).bold()),
                );

                let dims = dimension_label(room);
                ctx.print(
                    centred_x(&dims, cx),
                    (cy - units_per_row).max(y_bounds[0]),
                    Line::styled(dims, Style::default().fg(colour).add_modifier(Modifier::DIM)),
                );
            }
            ctx.print(
                scale_x,
                scale_y,
                Line::styled(SCALE_MARKER, Style::default().fg(Color::DarkGray)),
            );
        })
        .render(area, buf);
}

fn draw_quad(ctx: &mut ratatui::widgets::canvas::Context, quad: &[(f64, f64); 4], color: Color) {
    for i in 0..4 {
        let (x1, y1) = quad[i];
        let (x2, y2) = quad[(i + 1) % 4];
        ctx.draw(&CanvasLine::new(x1, -y1, x2, -y2, color));
    }
}

fn render_legend(layout: &LayoutData, area: Rect, buf: &mut Buffer) {
    let mut spans: Vec<Span> = Vec::new();
    for (kind, style) in legend(layout) {
        spans.push(Span::styled("■", Style::default().fg(style.border)));
        spans.push(Span::styled(
            format!(" {}  ", kind.as_str().to_uppercase()),
            Style::default().fg(Color::Gray),
        ));
    }
    Paragraph::new(Line::from(spans)).render(area, buf);

    let note = "*Draft visualization only";
    let width = note.len() as u16;
    if area.width > width {
        buf.set_string(
            area.x + area.width - width,
            area.y,
            note,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, x: f64, y: f64, width: f64, height: f64, kind: RoomType) -> Room {
        Room {
            id: id.to_string(),
            name: format!("Room {}", id),
            x,
            y,
            width,
            height,
            kind,
        }
    }

    fn halves() -> LayoutData {
        LayoutData {
            rooms: vec![
                room("a", 0.0, 0.0, 50.0, 100.0, RoomType::Bedroom),
                room("b", 50.0, 0.0, 50.0, 100.0, RoomType::Kitchen),
            ],
            total_width: 100.0,
            total_height: 100.0,
            description: Some("Halves".to_string()),
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_halves_span_canvas_without_overlap() {
        let canvas = Rect::new(2, 1, 40, 20);
        let layout = halves();
        let placed = place_rooms(canvas, &layout);

        assert_eq!(placed.len(), 2);
        let (_, left) = placed[0];
        let (_, right) = placed[1];
        assert_eq!(left, Rect::new(2, 1, 20, 20));
        assert_eq!(right, Rect::new(22, 1, 20, 20));
        assert!(!left.intersects(right));
        assert_eq!(left.width + right.width, canvas.width);
    }

    #[test]
    fn test_odd_canvas_width_still_tiles() {
        let canvas = Rect::new(0, 0, 33, 10);
        let layout = LayoutData {
            rooms: vec![
                room("a", 0.0, 0.0, 33.3, 100.0, RoomType::Living),
                room("b", 33.3, 0.0, 33.3, 100.0, RoomType::Dining),
                room("c", 66.6, 0.0, 33.4, 100.0, RoomType::Office),
            ],
            total_width: 100.0,
            total_height: 100.0,
            description: None,
        };
        let placed = place_rooms(canvas, &layout);
        let widths: u16 = placed.iter().map(|(_, r)| r.width).sum();
        assert_eq!(widths, 33);
        for pair in placed.windows(2) {
            assert_eq!(pair[0].1.right(), pair[1].1.left());
        }
    }

    #[test]
    fn test_out_of_bounds_room_is_clipped() {
        let canvas = Rect::new(0, 0, 20, 10);
        let spill = room("s", 80.0, 50.0, 50.0, 80.0, RoomType::Outdoor);
        assert_eq!(place_room(canvas, &spill), Some(Rect::new(16, 5, 4, 5)));

        let outside = room("o", 120.0, 0.0, 10.0, 10.0, RoomType::Outdoor);
        assert_eq!(place_room(canvas, &outside), None);
    }

    #[test]
    fn test_fit_canvas_keeps_aspect() {
        // Square plan in a wide area: height-bound, width doubled for cells.
        let square = fit_canvas(Rect::new(0, 0, 100, 20), 1.0);
        assert_eq!(square.height, 20);
        assert_eq!(square.width, 40);
        assert_eq!(square.x, 30);

        // Wide plan in a tall area: width-bound.
        let wide = fit_canvas(Rect::new(0, 0, 40, 40), 2.0);
        assert_eq!(wide.width, 40);
        assert_eq!(wide.height, 10);
        assert_eq!(wide.y, 15);
    }

    #[test]
    fn test_fit_canvas_handles_degenerate_input() {
        assert_eq!(fit_canvas(Rect::new(0, 0, 0, 10), 1.0).width, 0);
        let fallback = fit_canvas(Rect::new(0, 0, 20, 10), f64::NAN);
        assert_eq!(fallback, Rect::new(0, 0, 20, 10));
    }

    #[test]
    fn test_toggle_twice_restores_projection() {
        let mode = ViewMode::Flat;
        assert_eq!(mode.toggle(), ViewMode::Perspective);
        assert_eq!(mode.toggle().toggle(), mode);
        assert_eq!(mode.toggle().toggle().projection(), mode.projection());
        assert!(mode.projection().is_flat());
        assert!(!mode.toggle().projection().is_flat());
    }

    #[test]
    fn test_flat_projection_is_identity() {
        assert_eq!(Projection::FLAT.apply(12.5, -40.0, 20.0), (12.5, -40.0));
    }

    #[test]
    fn test_tilted_projection_moves_points() {
        let (x, y) = Projection::TILTED.apply(100.0, 100.0, 0.0);
        assert!((x - 100.0).abs() > 1.0 || (y - 100.0).abs() > 1.0);
        // Foreshortened along the tilt axis.
        let (_, top) = Projection::TILTED.apply(0.0, -200.0, 0.0);
        let (_, bottom) = Projection::TILTED.apply(0.0, 200.0, 0.0);
        assert!(bottom - top < 400.0);
    }

    #[test]
    fn test_rendering_does_not_modify_rooms() {
        let layout = halves();
        let before = layout.clone();
        let area = Rect::new(0, 0, 60, 24);
        for mode in [ViewMode::Flat, ViewMode::Perspective, ViewMode::Flat] {
            let mut buf = Buffer::empty(area);
            FloorPlan::new(Some(&layout), mode).render(area, &mut buf);
        }
        assert_eq!(layout, before);
    }

    #[test]
    fn test_missing_layout_renders_placeholder() {
        let area = Rect::new(0, 0, 90, 12);
        let mut buf = Buffer::empty(area);
        FloorPlan::new(None, ViewMode::Flat).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Canvas Ready"));
        assert!(!text.contains("SCALE"));
    }

    #[test]
    fn test_empty_layout_renders_placeholder() {
        let layout = LayoutData {
            rooms: Vec::new(),
            total_width: 100.0,
            total_height: 100.0,
            description: Some("Nothing".to_string()),
        };
        let area = Rect::new(0, 0, 90, 12);
        let mut buf = Buffer::empty(area);
        FloorPlan::new(Some(&layout), ViewMode::Perspective).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Canvas Ready"));
        assert!(!text.contains("Nothing"));
    }

    #[test]
    fn test_flat_render_shows_rooms_and_legend() {
        let layout = halves();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        FloorPlan::new(Some(&layout), ViewMode::Flat).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Halves"));
        assert!(text.contains("2D VIEW"));
        assert!(text.contains("ROOM A"));
        assert!(text.contains("ROOM B"));
        assert!(text.contains("50m x 100m"));
        assert!(text.contains("BEDROOM"));
        assert!(text.contains("KITCHEN"));
        assert!(text.contains("SCALE 1:100"));
    }

    #[test]
    fn test_flat_render_colours_rooms_by_type() {
        let layout = halves();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        FloorPlan::new(Some(&layout), ViewMode::Flat).render(area, &mut buf);

        let bedroom_fill = room_style(RoomType::Bedroom).fill;
        let kitchen_fill = room_style(RoomType::Kitchen).fill;
        assert!(buf.content.iter().any(|c| c.bg == bedroom_fill));
        assert!(buf.content.iter().any(|c| c.bg == kitchen_fill));
    }

    #[test]
    fn test_perspective_render_keeps_labels() {
        let layout = halves();
        let area = Rect::new(0, 0, 100, 40);
        let render = |mode| {
            let mut buf = Buffer::empty(area);
            FloorPlan::new(Some(&layout), mode).render(area, &mut buf);
            buffer_text(&buf)
        };
        let flat = render(ViewMode::Flat);
        let tilted = render(ViewMode::Perspective);

        assert!(flat.contains("2D VIEW"));
        assert!(tilted.contains("3D VIEW"));
        for text in [&flat, &tilted] {
            assert!(text.contains("ROOM A"));
            assert!(text.contains("ROOM B"));
            assert!(text.contains("50m x 100m"));
            assert!(text.contains("SCALE 1:100"));
            assert!(text.contains("BEDROOM"));
        }
    }

    #[test]
    fn test_legend_is_deduplicated() {
        let mut layout = halves();
        layout.rooms.push(room("c", 0.0, 0.0, 10.0, 10.0, RoomType::Bedroom));
        let kinds: Vec<RoomType> = legend(&layout).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![RoomType::Bedroom, RoomType::Kitchen]);
    }

    #[test]
    fn test_every_type_has_distinct_border() {
        let borders: Vec<Color> = RoomType::all().iter().map(|k| room_style(*k).border).collect();
        for (i, a) in borders.iter().enumerate() {
            for b in &borders[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_dimension_label_rounds() {
        let r = room("d", 0.0, 0.0, 33.4, 66.6, RoomType::Other);
        assert_eq!(dimension_label(&r), "33m x 67m");
    }
}
