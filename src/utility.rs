use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    graphs::Point,
    search::progress::{AStarProgress, AStarSubProgress},
};

pub fn get_progressbar(job_name: &str, len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_message(job_name.to_string());
    if let Ok(style) = ProgressStyle::with_template(
        " {msg} {wide_bar} {pos}/{len} estimated remaining: {eta_precise}",
    ) {
        bar.set_style(style);
    }
    bar
}

/// Shows the progress of a single route build on a percent bar.
pub struct RouteProgressBar {
    progress: AStarProgress,
    bar: ProgressBar,
}

impl RouteProgressBar {
    pub fn new(job_name: &str, start: Point, finish: Point) -> RouteProgressBar {
        let mut progress = AStarProgress::new();
        progress.append_sub_progress(AStarSubProgress::new(start, finish, 1.0));
        RouteProgressBar {
            progress,
            bar: get_progressbar(job_name, 100),
        }
    }

    pub fn hidden(start: Point, finish: Point) -> RouteProgressBar {
        let mut route_progress = RouteProgressBar::new("", start, finish);
        route_progress.bar = ProgressBar::hidden();
        route_progress
    }

    /// Reports a vertex at `current` reached by the wave heading to `target`.
    pub fn update(&mut self, current: &Point, target: &Point) -> f64 {
        let percent = self.progress.update_progress(current, target);
        self.bar.set_position(percent as u64);
        percent
    }

    pub fn finish(&mut self) {
        self.progress.push_and_drop_last_sub_progress();
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::RouteProgressBar;
    use crate::graphs::Point;

    #[test]
    fn bar_follows_route_progress() {
        let start = Point::new(0.0, 0.0);
        let finish = Point::new(0.0, 10.0);
        let mut route_progress = RouteProgressBar::hidden(start, finish);

        let percent = route_progress.update(&Point::new(0.0, 5.0), &finish);
        assert_eq!(route_progress.bar.position(), percent as u64);
        route_progress.finish();
    }
}
