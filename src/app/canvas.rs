use eframe::egui::{self, Align2, Color32, FontId, Id, PointerButton, Sense, Stroke, Ui, vec2};

use crate::view::Hover;

use super::ViewerApp;
use super::render_utils::{circle_visible, draw_background, with_opacity};

const NODE_OUTLINE: Color32 = Color32::WHITE;

impl ViewerApp {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        if self.dataset_changed.replace(false) || self.view.is_none() {
            self.sync_view(rect.size());
        }

        let Some(view) = self.view.as_mut() else {
            let message = if self.store.pending_fetches() > 0 {
                "Loading snapshot..."
            } else {
                "No snapshot loaded"
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(16.0),
                Color32::from_gray(220),
            );
            return;
        };
        view.set_viewport(rect.size());

        if view.graph().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "This snapshot has no nodes",
                FontId::proportional(16.0),
                Color32::from_gray(220),
            );
            return;
        }

        // The view works in canvas-local coordinates.
        let origin = rect.min.to_vec2();
        let pointer = response.hover_pos().map(|position| position - origin);

        if response.drag_started_by(PointerButton::Primary)
            && let Some(press) = ui.input(|input| input.pointer.press_origin())
        {
            view.drag_start_at(press - origin);
        }
        if response.dragged() && view.drag_move(response.drag_delta()) {
            ui.ctx().request_repaint();
        }
        if response.drag_stopped() {
            view.drag_end();
        }

        if response.double_clicked()
            && let Some(point) = pointer
        {
            view.remove_at(point);
        }

        match pointer {
            Some(point) if view.dragging().is_none() => {
                view.pointer_moved(point);
                view.hover_at(point);
            }
            Some(_) => {}
            None if view.lens_active() => view.pointer_left(),
            None => {}
        }

        if view.tick() {
            ui.ctx().request_repaint();
        }

        let ctx = ui.ctx();
        let frame = view.frame();
        let fade = frame.fade_secs;

        for edge in &frame.edges {
            let opacity =
                ctx.animate_value_with_time(Id::new(("edge", edge.index)), edge.opacity, fade);
            painter.line_segment(
                [edge.from + origin, edge.to + origin],
                Stroke::new(edge.width, with_opacity(edge.color, opacity)),
            );
        }

        for node in &frame.nodes {
            let opacity =
                ctx.animate_value_with_time(Id::new(("node", node.index)), node.opacity, fade);
            let center = node.center + origin;
            if !circle_visible(rect, center, node.radius) {
                continue;
            }
            painter.circle_filled(center, node.radius, with_opacity(node.color, opacity));
            painter.circle_stroke(
                center,
                node.radius,
                Stroke::new(1.5, with_opacity(NODE_OUTLINE, opacity)),
            );
        }

        if view.hover() != Hover::None {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        if let Some(tooltip) = &frame.tooltip {
            painter.text(
                tooltip.anchor + origin + vec2(8.0, -8.0),
                Align2::LEFT_BOTTOM,
                &tooltip.text,
                FontId::proportional(12.0),
                Color32::from_gray(240),
            );
        }
    }
}
