use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

const GRID_STEP: f32 = 56.0;

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity).round() as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + GRID_STEP;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += GRID_STEP;
    }

    let mut y = rect.top() + GRID_STEP;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += GRID_STEP;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn opacity_scales_alpha_only() {
        let color = Color32::from_rgb(0xc0, 0x39, 0x2b);
        assert_eq!(with_opacity(color, 1.0), color);

        let faded = with_opacity(color, 0.1);
        assert_eq!(faded.a(), 26);
        assert_eq!(with_opacity(color, -1.0).a(), 0);
    }

    #[test]
    fn circles_partly_inside_are_visible() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(50.0, 50.0), 1.0));
        assert!(circle_visible(rect, pos2(-3.0, 50.0), 4.0));
        assert!(!circle_visible(rect, pos2(-10.0, 50.0), 4.0));
    }
}
