// Musical time representation
// Handles conversion between beats, ticks, and real time

use std::fmt;
use std::ops::{Add, Sub};

/// Pulses per quarter note used for tick scheduling
/// Standard MIDI resolution
pub const PPQN: u64 = 480;

/// A position or span in musical time, measured in beats
///
/// Beats are the unit used at every scheduling boundary; conversion to
/// engine ticks happens inside the transport.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Beats(pub f64);

impl Beats {
    pub const ZERO: Beats = Beats(0.0);

    /// Creates a beat value
    pub fn new(beats: f64) -> Self {
        assert!(beats.is_finite(), "Beat value must be finite");
        Self(beats)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Convert to ticks, rounding up
    ///
    /// Ceiling rounding guarantees an event never fires before its nominal
    /// musical time. Values within float noise of a tick boundary snap to
    /// it instead of spilling onto the next tick.
    pub fn to_ticks(&self) -> Ticks {
        assert!(self.0 >= 0.0, "Cannot convert a negative beat value to ticks");
        let exact = self.0 * PPQN as f64;
        let nearest = exact.round();
        if (exact - nearest).abs() < 1e-9 {
            Ticks(nearest as u64)
        } else {
            Ticks(exact.ceil() as u64)
        }
    }

    /// Duration of this many beats in seconds at the given tempo
    pub fn to_seconds(&self, tempo: &Tempo) -> f64 {
        self.0 * tempo.beat_duration_seconds()
    }

    pub fn max(self, other: Beats) -> Beats {
        if other.0 > self.0 { other } else { self }
    }
}

impl Add for Beats {
    type Output = Beats;
    fn add(self, rhs: Beats) -> Beats {
        Beats(self.0 + rhs.0)
    }
}

impl Sub for Beats {
    type Output = Beats;
    fn sub(self, rhs: Beats) -> Beats {
        Beats(self.0 - rhs.0)
    }
}

impl From<f64> for Beats {
    fn from(beats: f64) -> Self {
        Beats::new(beats)
    }
}

impl fmt::Display for Beats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} beats", self.0)
    }
}

/// A position or span on the tick grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Ticks = Ticks(0);

    pub fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Convert back to beats (exact, PPQN divides the tick count)
    pub fn to_beats(&self) -> Beats {
        Beats(self.0 as f64 / PPQN as f64)
    }
}

impl Add for Ticks {
    type Output = Ticks;
    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0 + rhs.0)
    }
}

impl Sub for Ticks {
    type Output = Ticks;
    fn sub(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    /// BPM must be in range [20.0, 999.0]
    pub fn new(bpm: f64) -> Self {
        assert!(
            (20.0..=999.0).contains(&bpm),
            "BPM must be between 20 and 999"
        );
        Self { bpm }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        assert!(
            (20.0..=999.0).contains(&bpm),
            "BPM must be between 20 and 999"
        );
        self.bpm = bpm;
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "Time signature numerator must be > 0");
        assert!(
            denominator.is_power_of_two(),
            "Time signature denominator must be power of 2"
        );
        Self {
            numerator,
            denominator,
        }
    }

    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Number of beats per bar
    pub fn beats_per_bar(&self) -> Beats {
        Beats(self.numerator as f64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_to_ticks_exact() {
        assert_eq!(Beats::new(1.0).to_ticks(), Ticks(480));
        assert_eq!(Beats::new(0.0).to_ticks(), Ticks(0));
        assert_eq!(Beats::new(2.5).to_ticks(), Ticks(1200));
    }

    #[test]
    fn test_beats_to_ticks_rounds_up() {
        // 1/1000 of a beat is 0.48 ticks; must round to 1, never 0
        assert_eq!(Beats::new(0.001).to_ticks(), Ticks(1));
        // Just over a beat must land strictly after the beat
        assert_eq!(Beats::new(1.0001).to_ticks(), Ticks(481));
    }

    #[test]
    fn test_ticks_to_beats_round_trip() {
        let ticks = Ticks(1234);
        assert_eq!(ticks.to_beats().to_ticks(), ticks);
    }

    #[test]
    fn test_beats_arithmetic() {
        let sum = Beats::new(1.5) + Beats::new(2.5);
        assert_eq!(sum, Beats::new(4.0));
        assert_eq!(Beats::new(3.0).max(Beats::new(4.0)), Beats::new(4.0));
    }

    #[test]
    fn test_tempo() {
        let tempo = Tempo::new(120.0);
        assert_eq!(tempo.bpm(), 120.0);
        assert_eq!(tempo.beat_duration_seconds(), 0.5);
        assert_eq!(Beats::new(2.0).to_seconds(&tempo), 1.0);
    }

    #[test]
    #[should_panic(expected = "BPM must be between 20 and 999")]
    fn test_invalid_tempo() {
        Tempo::new(1000.0);
    }

    #[test]
    fn test_time_signature() {
        let ts = TimeSignature::four_four();
        assert_eq!(ts.beats_per_bar(), Beats::new(4.0));
        assert_eq!(ts.to_string(), "4/4");
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_invalid_time_signature() {
        TimeSignature::new(4, 3);
    }

    #[test]
    #[should_panic(expected = "negative beat value")]
    fn test_negative_beats_to_ticks() {
        Beats::new(-1.0).to_ticks();
    }
}
