pub mod performance_view;
pub mod process_table;
pub mod settings;
pub mod stats_view;

use egui::Vec2;

/// Formats a KB/s figure, switching to MB/s above 1024 KB/s
pub fn format_rate(kbps: f32) -> String {
    if kbps > 1024.0 {
        format!("{:.1} MB/s", kbps / 1024.0)
    } else {
        format!("{:.1} KB/s", kbps)
    }
}

/// Line chart of one history series.
///
/// `y_max` pins the upper bound (percent charts); `None` lets it follow the data.
pub fn metric_plot(
    ui: &mut egui::Ui,
    id: impl std::hash::Hash,
    height: f32,
    history: &[f32],
    max_points: usize,
    y_max: Option<f64>,
) {
    let mut plot = egui_plot::Plot::new(id)
        .height(height)
        .show_axes(true)
        .set_margin_fraction(Vec2::ZERO)
        .include_x(0.0)
        .include_x(max_points as f64)
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false);
    if let Some(y_max) = y_max {
        plot = plot.include_y(y_max);
    }

    plot.show(ui, |plot_ui| {
        let points: egui_plot::PlotPoints = history
            .iter()
            .enumerate()
            .map(|(i, value)| [i as f64, *value as f64])
            .collect();
        plot_ui.line(egui_plot::Line::new(points));
    });
}
