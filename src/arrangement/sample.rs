// Sample - a placeable audio region
// The PCM itself lives in the external audio engine; this side carries only
// the identity and the musical extent used for placement

use uuid::Uuid;

use crate::sequencer::timebase::Beats;

use super::ExtraFields;

/// An audio region that can be placed on the playlist
#[derive(Debug)]
pub struct Sample {
    id: Uuid,
    name: String,
    duration: Beats,
    extra: ExtraFields,
}

impl Sample {
    pub fn create(name: impl Into<String>, duration: Beats) -> Self {
        Self::with_id(Uuid::new_v4(), name, duration)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>, duration: Beats) -> Self {
        assert!(duration.value() > 0.0, "Sample duration must be > 0");
        Self {
            id,
            name: name.into(),
            duration,
            extra: ExtraFields::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Natural musical extent of the region
    pub fn duration(&self) -> Beats {
        self.duration
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_creation() {
        let sample = Sample::create("kick", Beats::new(0.5));
        assert_eq!(sample.name(), "kick");
        assert_eq!(sample.duration(), Beats::new(0.5));
    }

    #[test]
    #[should_panic(expected = "duration must be > 0")]
    fn test_zero_duration_rejected() {
        Sample::create("empty", Beats::ZERO);
    }
}
