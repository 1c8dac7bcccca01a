//! Tone → color mapping for the analysis panel.
//!
//! The model reports a single tone word. Known words map to a fixed color
//! category; anything else falls back to [`DEFAULT_TONE_COLOR`].

use serde::{Deserialize, Serialize};

/// Color categories used to render the detected tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToneColor {
    /// Upbeat, warm, enthusiastic.
    Positive,
    /// Hostile or irritated.
    Negative,
    /// Sad, somber, reflective.
    Melancholy,
    /// Worried or uncertain.
    Anxious,
    /// Professional, academic.
    Formal,
    /// Relaxed, conversational.
    Casual,
    /// Unrecognized or flat.
    Neutral,
}

pub const DEFAULT_TONE_COLOR: ToneColor = ToneColor::Neutral;

/// Known tone words, lower-case.
pub const TONE_COLORS: &[(&str, ToneColor)] = &[
    ("happy", ToneColor::Positive),
    ("joyful", ToneColor::Positive),
    ("optimistic", ToneColor::Positive),
    ("confident", ToneColor::Positive),
    ("enthusiastic", ToneColor::Positive),
    ("excited", ToneColor::Positive),
    ("friendly", ToneColor::Positive),
    ("encouraging", ToneColor::Positive),
    ("angry", ToneColor::Negative),
    ("frustrated", ToneColor::Negative),
    ("aggressive", ToneColor::Negative),
    ("hostile", ToneColor::Negative),
    ("sarcastic", ToneColor::Negative),
    ("critical", ToneColor::Negative),
    ("sad", ToneColor::Melancholy),
    ("melancholic", ToneColor::Melancholy),
    ("somber", ToneColor::Melancholy),
    ("reflective", ToneColor::Melancholy),
    ("nostalgic", ToneColor::Melancholy),
    ("anxious", ToneColor::Anxious),
    ("worried", ToneColor::Anxious),
    ("uncertain", ToneColor::Anxious),
    ("nervous", ToneColor::Anxious),
    ("formal", ToneColor::Formal),
    ("professional", ToneColor::Formal),
    ("academic", ToneColor::Formal),
    ("authoritative", ToneColor::Formal),
    ("casual", ToneColor::Casual),
    ("informal", ToneColor::Casual),
    ("conversational", ToneColor::Casual),
    ("playful", ToneColor::Casual),
    ("humorous", ToneColor::Casual),
    ("neutral", ToneColor::Neutral),
    ("objective", ToneColor::Neutral),
];

impl ToneColor {
    /// CSS hex color for this category.
    pub fn hex(&self) -> &'static str {
        match self {
            ToneColor::Positive => "#4ade80",
            ToneColor::Negative => "#f87171",
            ToneColor::Melancholy => "#60a5fa",
            ToneColor::Anxious => "#facc15",
            ToneColor::Formal => "#a78bfa",
            ToneColor::Casual => "#2dd4bf",
            ToneColor::Neutral => "#9ca3af",
        }
    }

    /// Look up the color for a tone name, ignoring case.
    pub fn for_tone(name: &str) -> Self {
        let name = name.to_lowercase();
        TONE_COLORS
            .iter()
            .find(|(tone, _)| *tone == name)
            .map(|(_, color)| *color)
            .unwrap_or(DEFAULT_TONE_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tone_maps_to_its_category() {
        assert_eq!(ToneColor::for_tone("angry"), ToneColor::Negative);
        assert_eq!(ToneColor::for_tone("angry").hex(), "#f87171");
        assert_eq!(ToneColor::for_tone("Joyful"), ToneColor::Positive);
        assert_eq!(ToneColor::for_tone("FORMAL"), ToneColor::Formal);
    }

    #[test]
    fn test_unknown_tone_maps_to_default() {
        assert_eq!(ToneColor::for_tone("bewildered"), DEFAULT_TONE_COLOR);
        assert_eq!(ToneColor::for_tone(""), DEFAULT_TONE_COLOR);
        // Only exact lower-cased matches count.
        assert_eq!(ToneColor::for_tone(" angry "), DEFAULT_TONE_COLOR);
        assert_eq!(DEFAULT_TONE_COLOR.hex(), "#9ca3af");
    }

    #[test]
    fn test_table_keys_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for (tone, _) in TONE_COLORS {
            assert_eq!(*tone, tone.to_lowercase());
            assert!(seen.insert(*tone), "duplicate tone {tone}");
        }
    }
}
