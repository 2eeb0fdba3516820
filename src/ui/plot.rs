use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Points};

use crate::color::{ValueColorScale, trend_color};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Series plot with fitted trend line (central panel)
// ---------------------------------------------------------------------------

/// Render the selected range of the series and its least-squares line.
pub fn trend_plot(ui: &mut Ui, state: &AppState) {
    let (Some(series), Some(range)) = (&state.series, state.range) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a CSV to explore a dataset  (sidebar → Open CSV…)");
        });
        return;
    };

    let rows = series.in_range(range);
    let unit = state
        .classification
        .as_ref()
        .map(|c| c.labels.unit.clone())
        .unwrap_or_default();
    let fact_pack = state.facts.as_ref().and_then(|f| f.as_ref().ok());
    let scale = fact_pack.map(|fp| ValueColorScale::new(fp.trough(), fp.peak()));

    Plot::new("trend_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label(unit)
        .height(340.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let points: PlotPoints = rows
                .iter()
                .map(|o| [o.year as f64, o.value])
                .collect();
            plot_ui.line(
                Line::new(points)
                    .name("Observed")
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );

            if let Some(scale) = scale {
                for o in rows {
                    plot_ui.points(
                        Points::new(vec![[o.year as f64, o.value]])
                            .radius(2.5)
                            .color(scale.color_for(o.value)),
                    );
                }
            }

            if let Some(fp) = fact_pack {
                let (x0, x1) = (range.start as f64, range.end as f64);
                let trend: PlotPoints = vec![[x0, fp.trend_at(x0)], [x1, fp.trend_at(x1)]].into();
                plot_ui.line(
                    Line::new(trend)
                        .name("Trend line")
                        .color(trend_color())
                        .style(LineStyle::dashed_loose())
                        .width(2.0),
                );
            }
        });
}
