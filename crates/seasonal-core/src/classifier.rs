//! Personal color classifier.
//!
//! Additive scoring over four sampled colors (hair, eye, skin, lip). Each
//! rule awards points to a pair of seasons; the season with the highest
//! total wins, ties going to the earlier season in [`Season::ALL`].

use crate::color::{brightness, saturation, skin_tone, tone, Rgb, Tone};
use crate::season::{Season, SeasonInfo};
use serde::{Deserialize, Serialize};

// --- Scoring thresholds. The analysis summary reuses these. ---
const EYE_BRIGHT_THRESHOLD: f32 = 40.0;
const EYE_NUDGE_THRESHOLD: f32 = 30.0;
const SKIN_BRIGHT_THRESHOLD: f32 = 140.0;
const HAIR_BRIGHT_THRESHOLD: f32 = 50.0;
const SKIN_SATURATION_THRESHOLD: f32 = 25.0;
const AVERAGE_SATURATION_THRESHOLD: f32 = 25.0;
const CONTRAST_THRESHOLD: f32 = 100.0;

/// The four colors sampled from a portrait. This is the only classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSample {
    pub hair: Rgb,
    pub eye: Rgb,
    pub skin: Rgb,
    pub lip: Rgb,
}

/// Non-negative score per season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeasonScores {
    pub spring: u32,
    pub summer: u32,
    pub autumn: u32,
    pub winter: u32,
}

impl SeasonScores {
    pub fn get(&self, season: Season) -> u32 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
        }
    }

    fn add(&mut self, season: Season, points: u32) {
        match season {
            Season::Spring => self.spring += points,
            Season::Summer => self.summer += points,
            Season::Autumn => self.autumn += points,
            Season::Winter => self.winter += points,
        }
    }

    fn award(&mut self, seasons: &[Season], points: u32) {
        for &season in seasons {
            self.add(season, points);
        }
    }

    /// Stable argmax: a later season must strictly beat the current best.
    pub fn best(&self) -> Season {
        let mut best = Season::ALL[0];
        for season in Season::ALL.into_iter().skip(1) {
            if self.get(season) > self.get(best) {
                best = season;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessLabel {
    Bright,
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationLabel {
    Vivid,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastLabel {
    High,
    Low,
}

/// Human-readable rationale derived alongside the scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub skin_tone: Tone,
    pub lip_tone: Tone,
    pub brightness: BrightnessLabel,
    pub saturation: SaturationLabel,
    pub contrast: ContrastLabel,
    pub contrast_value: f32,
    pub skin_brightness: f32,
    pub hair_brightness: f32,
    pub eye_brightness: f32,
    pub average_saturation: f32,
}

/// Result of classifying one [`ColorSample`].
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub season: Season,
    pub scores: SeasonScores,
    pub info: &'static SeasonInfo,
    pub analysis: Analysis,
}

/// Classify a color sample. Always produces a result.
pub fn diagnose(sample: &ColorSample) -> Diagnosis {
    use Season::*;

    let skin = skin_tone(sample.skin);
    let lip = tone(sample.lip);

    let eye_brightness = brightness(sample.eye);
    let skin_brightness = brightness(sample.skin);
    let hair_brightness = brightness(sample.hair);

    let skin_saturation = saturation(sample.skin);
    let average_saturation = (saturation(sample.lip) + saturation(sample.hair)) / 2.0;
    let contrast = (hair_brightness - skin_brightness).abs();

    let mut scores = SeasonScores::default();

    // Base color: skin carries the most weight, lips confirm.
    match skin {
        Tone::Warm => scores.award(&[Spring, Autumn], 3),
        Tone::Cool => scores.award(&[Summer, Winter], 3),
    }
    match lip {
        Tone::Warm => scores.award(&[Spring, Autumn], 1),
        Tone::Cool => scores.award(&[Summer, Winter], 1),
    }

    if eye_brightness > EYE_BRIGHT_THRESHOLD {
        scores.award(&[Spring, Summer], 2);
    } else {
        scores.award(&[Autumn, Winter], 2);
    }

    if skin_brightness > SKIN_BRIGHT_THRESHOLD {
        scores.award(&[Spring, Summer, Winter], 1);
    } else {
        scores.award(&[Autumn], 2);
    }

    if hair_brightness > HAIR_BRIGHT_THRESHOLD {
        scores.award(&[Spring, Summer], 1);
    } else {
        scores.award(&[Autumn, Winter], 1);
    }

    if skin_saturation > SKIN_SATURATION_THRESHOLD {
        scores.award(&[Spring, Autumn], 1);
    } else {
        scores.award(&[Summer, Winter], 1);
    }

    if average_saturation > AVERAGE_SATURATION_THRESHOLD {
        scores.award(&[Spring, Winter], 2);
    } else {
        scores.award(&[Summer, Autumn], 2);
    }

    if contrast > CONTRAST_THRESHOLD {
        scores.award(&[Winter], 3);
        scores.award(&[Spring], 1);
    } else {
        scores.award(&[Summer, Autumn], 2);
    }

    // Nudges for borderline samples.
    if skin == Tone::Warm && eye_brightness > EYE_NUDGE_THRESHOLD {
        scores.award(&[Spring], 1);
    }
    if skin == Tone::Cool && contrast < CONTRAST_THRESHOLD {
        scores.award(&[Summer], 1);
    }

    let season = scores.best();

    tracing::debug!(
        %season,
        spring = scores.spring,
        summer = scores.summer,
        autumn = scores.autumn,
        winter = scores.winter,
        contrast,
        "personal color scored"
    );

    let analysis = Analysis {
        skin_tone: skin,
        lip_tone: lip,
        brightness: if skin_brightness > SKIN_BRIGHT_THRESHOLD {
            BrightnessLabel::Bright
        } else {
            BrightnessLabel::Deep
        },
        saturation: if average_saturation > AVERAGE_SATURATION_THRESHOLD {
            SaturationLabel::Vivid
        } else {
            SaturationLabel::Soft
        },
        contrast: if contrast > CONTRAST_THRESHOLD {
            ContrastLabel::High
        } else {
            ContrastLabel::Low
        },
        contrast_value: contrast,
        skin_brightness,
        hair_brightness,
        eye_brightness,
        average_saturation,
    };

    Diagnosis {
        season,
        scores,
        info: season.info(),
        analysis,
    }
}
