use gpui::{
    App, BorderStyle, Bounds, ContentMask, Corners, Edges, PathBuilder, Pixels, TextRun, Window,
    font, point, px, quad,
};

use crate::geom::{ScreenPoint, ScreenRect};
use crate::render::{Color, LineStyle, RenderCommand, RenderList, TextAlign, TextStyle};
use crate::timeline::Timeline;

use super::state::TimelineFrame;

pub(crate) fn paint_frame(
    timeline: &Timeline,
    frame: &TimelineFrame,
    window: &mut Window,
    cx: &mut App,
) {
    let origin = frame.origin;
    let width = timeline.compositor().width();
    let axis = timeline.compositor().axis();
    let axis_rect = ScreenRect::from_xywh(origin.x, origin.y, width, frame.axis_height);
    with_clip(window, axis_rect, |window| paint_list(axis, origin, window, cx));

    for slot in &frame.rows {
        let Some(renderer) = timeline.renderer(&slot.id) else {
            continue;
        };
        let row_origin = ScreenPoint::new(origin.x, origin.y + slot.top);
        let clip = ScreenRect::from_xywh(row_origin.x, row_origin.y, width, slot.height);
        with_clip(window, clip, |window| {
            paint_list(renderer.underlay(), row_origin, window, cx);
            let mut layer = 0;
            while let Some(surface) = renderer.layer_surface(layer) {
                paint_list(surface.visible(), row_origin, window, cx);
                layer += 1;
            }
            paint_list(renderer.overlay(), row_origin, window, cx);
        });
    }
}

fn paint_list(list: &RenderList, origin: ScreenPoint, window: &mut Window, cx: &mut App) {
    for command in list.commands() {
        match command {
            RenderCommand::Rect { rect, color } => {
                paint_rect(window, offset_rect(*rect, origin), *color, 0.0);
            }
            RenderCommand::Circle {
                center,
                radius,
                color,
            } => {
                let center = offset(*center, origin);
                let bounds = ScreenRect::from_xywh(
                    center.x - radius,
                    center.y - radius,
                    radius * 2.0,
                    radius * 2.0,
                );
                paint_rect(window, bounds, *color, *radius);
            }
            RenderCommand::Path { points, style } => {
                paint_path(window, points, origin, *style);
            }
            RenderCommand::Text {
                position,
                text,
                style,
            } => {
                paint_text(window, cx, offset(*position, origin), text, style);
            }
        }
    }
}

fn paint_rect(window: &mut Window, rect: ScreenRect, color: Color, radius: f64) {
    window.paint_quad(quad(
        to_bounds(rect),
        Corners::all(px(radius as f32)),
        to_rgba(color),
        Edges::all(px(0.0)),
        to_rgba(Color::TRANSPARENT),
        BorderStyle::default(),
    ));
}

fn paint_path(window: &mut Window, points: &[ScreenPoint], origin: ScreenPoint, style: LineStyle) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let mut builder = PathBuilder::stroke(px(style.width.max(0.5) as f32));
    builder.move_to(to_point(offset(*first, origin)));
    for next in rest {
        builder.line_to(to_point(offset(*next, origin)));
    }
    if let Ok(path) = builder.build() {
        window.paint_path(path, to_rgba(style.color));
    }
}

fn paint_text(
    window: &mut Window,
    cx: &mut App,
    position: ScreenPoint,
    text: &str,
    style: &TextStyle,
) {
    if text.is_empty() {
        return;
    }
    let run = TextRun {
        len: text.len(),
        font: font(".SystemUIFont"),
        color: to_hsla(style.color),
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    let shaped = window.text_system().shape_line(
        text.to_string().into(),
        px(style.size as f32),
        &[run],
        None,
    );
    let width = f64::from(f32::from(shaped.width));
    let line_height = shaped.ascent + shaped.descent;
    let x = match style.align {
        TextAlign::Left => position.x,
        TextAlign::Center => position.x - width * 0.5,
        TextAlign::Right => position.x - width,
    };
    let y = position.y - f64::from(f32::from(line_height)) * 0.5;
    let _ = shaped.paint(to_point(ScreenPoint::new(x, y)), line_height, window, cx);
}

fn offset(point: ScreenPoint, origin: ScreenPoint) -> ScreenPoint {
    ScreenPoint::new(point.x + origin.x, point.y + origin.y)
}

fn offset_rect(rect: ScreenRect, origin: ScreenPoint) -> ScreenRect {
    ScreenRect::new(offset(rect.min, origin), offset(rect.max, origin))
}

fn to_point(value: ScreenPoint) -> gpui::Point<Pixels> {
    point(px(value.x as f32), px(value.y as f32))
}

fn to_rgba(color: Color) -> gpui::Rgba {
    gpui::Rgba {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}

pub(crate) fn to_hsla(color: Color) -> gpui::Hsla {
    gpui::Hsla::from(to_rgba(color))
}

fn to_bounds(rect: ScreenRect) -> Bounds<Pixels> {
    Bounds::from_corners(to_point(rect.min), to_point(rect.max))
}

fn with_clip(window: &mut Window, rect: ScreenRect, f: impl FnOnce(&mut Window)) {
    let mask = ContentMask {
        bounds: to_bounds(rect),
    };
    window.with_content_mask(Some(mask), f);
}
