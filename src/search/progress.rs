use crate::graphs::Point;

/// Upper bound of reported progress. The last percent is left for whatever
/// the caller does after the search.
pub const MAX_PERCENT: f64 = 99.0;

/// One stage of a route build, owning `contribution` of the whole progress.
///
/// Spatial stages estimate their progress from how close the forward and
/// backward waves got to their targets.
#[derive(Clone, Debug, PartialEq)]
pub struct AStarSubProgress {
    current_progress: f64,
    contribution: f64,
    full_distance: f64,
    forward_distance: f64,
    backward_distance: f64,
    finish: Point,
}

impl AStarSubProgress {
    pub fn new(start: Point, finish: Point, contribution: f64) -> AStarSubProgress {
        assert!(contribution > 0.0, "contribution has to be positive");
        let full_distance = start.distance(&finish);
        AStarSubProgress {
            current_progress: 0.0,
            contribution,
            full_distance,
            forward_distance: full_distance,
            backward_distance: full_distance,
            finish,
        }
    }

    /// A stage without geometry, only advanced by its children.
    pub fn with_contribution(contribution: f64) -> AStarSubProgress {
        AStarSubProgress {
            current_progress: 0.0,
            contribution,
            full_distance: 0.0,
            forward_distance: 0.0,
            backward_distance: 0.0,
            finish: Point::default(),
        }
    }

    /// Takes a vertex at `current` reached by the wave heading to `target`.
    /// Targets other than the stage's finish count as the backward wave.
    pub fn update_progress(&mut self, current: &Point, target: &Point) -> f64 {
        if self.full_distance == 0.0 {
            return self.current_progress;
        }

        let distance = current.distance(target);
        let to_update = if *target == self.finish {
            &mut self.forward_distance
        } else {
            &mut self.backward_distance
        };
        *to_update = to_update.min(distance);

        let part = (2.0 - (self.forward_distance + self.backward_distance) / self.full_distance)
            .clamp(0.0, 1.0);
        self.current_progress = self.current_progress.max(self.contribution * part);
        self.current_progress
    }

    /// Progress including the share `sub_progress` of the next stage.
    pub fn update_with_sub_progress(&self, sub_progress: f64) -> f64 {
        self.current_progress + self.contribution * sub_progress
    }

    /// Adds a finished child worth `progress`.
    pub fn flush(&mut self, progress: f64) {
        self.current_progress += self.contribution * progress;
    }

    pub fn max_contribution(&self) -> f64 {
        self.contribution
    }
}

/// Nested progress of a route build in percent, never decreasing and never
/// above [`MAX_PERCENT`].
///
/// Every appended stage is a child of the previous one; updates go to the
/// innermost stage and are folded outwards.
#[derive(Clone, Debug)]
pub struct AStarProgress {
    last_percent: f64,
    sub_progresses: Vec<AStarSubProgress>,
}

impl Default for AStarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AStarProgress {
    pub fn new() -> AStarProgress {
        AStarProgress {
            last_percent: 0.0,
            sub_progresses: vec![AStarSubProgress::with_contribution(MAX_PERCENT / 100.0)],
        }
    }

    pub fn last_percent(&self) -> f64 {
        self.last_percent
    }

    pub fn append_sub_progress(&mut self, sub_progress: AStarSubProgress) {
        self.sub_progresses.push(sub_progress);
    }

    pub fn drop_last_sub_progress(&mut self) {
        assert!(!self.sub_progresses.is_empty(), "no progress stage left");
        self.sub_progresses.pop();
    }

    /// Closes the innermost stage, crediting its whole share to its parent.
    pub fn push_and_drop_last_sub_progress(&mut self) {
        assert!(
            self.sub_progresses.len() > 1,
            "the root progress stage can not be dropped"
        );
        let last = self.sub_progresses.len() - 1;
        let finished = self.sub_progresses[last].max_contribution();
        self.sub_progresses[last - 1].flush(finished);
        self.drop_last_sub_progress();
    }

    pub fn update_progress(&mut self, current: &Point, target: &Point) -> f64 {
        let mut stages = self.sub_progresses.iter_mut().rev();
        let mut progress = match stages.next() {
            Some(innermost) => innermost.update_progress(current, target),
            None => return self.last_percent,
        };
        for stage in stages {
            progress = stage.update_with_sub_progress(progress);
        }

        self.last_percent = self.last_percent.max(progress * 100.0).min(MAX_PERCENT);
        self.last_percent
    }
}
