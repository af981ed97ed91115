// AutomationClip - a placeable parameter curve

use uuid::Uuid;

use crate::sequencer::timebase::Beats;

use super::ExtraFields;

/// One breakpoint of an automation curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationPoint {
    pub time: Beats,
    pub value: f64,
}

impl AutomationPoint {
    pub fn new(time: Beats, value: f64) -> Self {
        assert!(time.value() >= 0.0, "Automation point time must be >= 0");
        Self { time, value }
    }
}

/// A parameter curve that can be placed on the playlist
///
/// Points are kept sorted by time; the clip's extent is the last point.
#[derive(Debug)]
pub struct AutomationClip {
    id: Uuid,
    points: Vec<AutomationPoint>,
    extra: ExtraFields,
}

impl AutomationClip {
    pub fn create() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            points: Vec::new(),
            extra: ExtraFields::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a point, keeping the curve sorted by time
    pub fn add_point(&mut self, point: AutomationPoint) {
        let index = self
            .points
            .partition_point(|existing| existing.time.value() <= point.time.value());
        self.points.insert(index, point);
    }

    pub fn remove_point(&mut self, index: usize) -> AutomationPoint {
        self.points.remove(index)
    }

    /// Musical extent: the time of the last point, zero when empty
    pub fn duration(&self) -> Beats {
        self.points.last().map_or(Beats::ZERO, |point| point.time)
    }

    /// Curve value at `time`, linearly interpolated between breakpoints
    ///
    /// Clamps to the first/last value outside the curve; `None` for an
    /// empty clip.
    pub fn value_at(&self, time: Beats) -> Option<f64> {
        let first = self.points.first()?;
        if time.value() <= first.time.value() {
            return Some(first.value);
        }
        let last = self.points.last()?;
        if time.value() >= last.time.value() {
            return Some(last.value);
        }

        let after = self
            .points
            .partition_point(|point| point.time.value() <= time.value());
        let left = self.points[after - 1];
        let right = self.points[after];
        let span = right.time.value() - left.time.value();
        if span <= 0.0 {
            return Some(right.value);
        }
        let t = (time.value() - left.time.value()) / span;
        Some(left.value + (right.value - left.value) * t)
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }
}
