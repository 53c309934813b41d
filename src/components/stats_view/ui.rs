use crate::components::format_rate;
use crate::metrics::SeriesStats;
use crate::presenter::ChartSnapshot;

pub fn show_history_stats(ui: &mut egui::Ui, charts: &ChartSnapshot, process_count: usize) {
    let stats = &charts.stats;
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            stat_lines(ui, "CPU", stats.cpu, |v| format!("{v:.1}%"));
            stat_lines(ui, "Memory", stats.memory, |v| format!("{v:.1}%"));
        });

        ui.add_space(32.0);

        ui.vertical(|ui| {
            stat_lines(ui, "Network", stats.network, format_rate);
            stat_lines(ui, "Disk", stats.disk, |v| format!("{v:.1}%"));
        });

        ui.add_space(32.0);

        ui.vertical(|ui| {
            ui.label(format!("Total Processes: {}", process_count));
            ui.label(format!("History: {}/{} points", charts.cpu.len(), charts.capacity));
        });
    });
    ui.add_space(8.0);
}

fn stat_lines(
    ui: &mut egui::Ui,
    name: &str,
    stats: Option<SeriesStats>,
    format: impl Fn(f32) -> String,
) {
    match stats {
        Some(stats) => {
            ui.label(format!("{} Average: {}", name, format(stats.average)));
            ui.label(format!("{} Peak: {}", name, format(stats.peak)));
        }
        None => {
            ui.label(format!("{}: no data", name));
        }
    }
}
