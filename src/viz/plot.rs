use ratatui::{prelude::*, widgets::*};

use crate::algo::a3c::{worker_name, EpisodeReport};

/// Scatter plot of one worker's episode scores against its own episode index
struct Plot {
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
}

impl Plot {
    fn new() -> Self {
        Self {
            x_bounds: [0.0, 1.0],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
        }
    }

    fn push(&mut self, score: f64) {
        let x = self.data.len() as f64;
        self.x_bounds[1] = self.x_bounds[1].max(x);
        self.y_bounds[0] = self.y_bounds[0].min(score);
        self.y_bounds[1] = self.y_bounds[1].max(score);
        self.data.push((x, score));
    }

    fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
        bounds.iter().map(|x| format!("{x:.1}").bold()).collect()
    }
}

impl Widget for &Plot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let y_bounds = if self.data.is_empty() {
            [0.0, 1.0]
        } else {
            self.y_bounds
        };

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .cyan()
            .data(&self.data);

        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(Plot::labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title("Reward")
            .dark_gray()
            .labels(Plot::labels(y_bounds))
            .bounds(y_bounds);

        Chart::new(vec![dataset])
            .block(Block::bordered().border_type(BorderType::Rounded))
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One [`Plot`] per worker, selectable with tabs
pub(super) struct WorkerPlots {
    names: Vec<String>,
    plots: Vec<Plot>,
    selected: usize,
}

impl WorkerPlots {
    pub fn new(workers: usize) -> Self {
        Self {
            names: (0..workers).map(worker_name).collect(),
            plots: (0..workers).map(|_| Plot::new()).collect(),
            selected: 0,
        }
    }

    pub fn next(&mut self) {
        if !self.plots.is_empty() {
            self.selected = (self.selected + 1) % self.plots.len();
        }
    }

    pub fn prev(&mut self) {
        let len = self.plots.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn update(&mut self, report: &EpisodeReport) {
        if let Some(plot) = self.plots.get_mut(report.worker) {
            plot.push(report.score.into());
        }
    }
}

impl Widget for &WorkerPlots {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.names.iter().map(String::as_str))
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render(plot_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_go_to_their_worker() {
        let mut plots = WorkerPlots::new(2);
        plots.update(&EpisodeReport {
            worker: 1,
            episode: 1,
            score: 12.0,
        });
        plots.update(&EpisodeReport {
            worker: 1,
            episode: 2,
            score: 30.0,
        });
        plots.update(&EpisodeReport {
            worker: 5,
            episode: 3,
            score: 1.0,
        });

        assert!(plots.plots[0].data.is_empty());
        assert_eq!(plots.plots[1].data, [(0.0, 12.0), (1.0, 30.0)]);
        assert_eq!(plots.plots[1].y_bounds, [12.0, 30.0]);
        assert_eq!(plots.names, ["w00", "w01"]);
    }

    #[test]
    fn tab_selection_wraps() {
        let mut plots = WorkerPlots::new(3);
        plots.prev();
        assert_eq!(plots.selected, 2);
        plots.next();
        assert_eq!(plots.selected, 0);
    }
}
