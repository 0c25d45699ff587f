//! Season archetypes and their static reference data.
//!
//! Everything here is fixed lookup data: descriptive records, swatch
//! palettes, and the hair shades offered for each season.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Personal-color season. Declaration order is the tie-break precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// All seasons in precedence order.
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }

    pub fn info(&self) -> &'static SeasonInfo {
        match self {
            Season::Spring => &SPRING,
            Season::Summer => &SUMMER,
            Season::Autumn => &AUTUMN,
            Season::Winter => &WINTER,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown season: {0:?} (expected spring, summer, autumn or winter)")]
pub struct UnknownSeason(pub String);

impl FromStr for Season {
    type Err = UnknownSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            _ => Err(UnknownSeason(s.to_string())),
        }
    }
}

/// Descriptive record shown alongside a diagnosis.
#[derive(Debug, Serialize)]
pub struct SeasonInfo {
    pub name: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
    pub characteristics: [&'static str; 4],
    /// Six signature swatches, `#RRGGBB`.
    pub swatches: [&'static str; 6],
    pub recommendations: &'static str,
    pub avoid: &'static str,
}

/// A named hair shade from a season's palette.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HairShade {
    pub name: &'static str,
    pub hex: &'static str,
}

/// A recommended hair color, with the wording used when asking a
/// generative model to apply it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HairRecommendation {
    pub name: &'static str,
    pub hex: &'static str,
    /// Short color label, e.g. "honey blonde".
    pub prompt_label: &'static str,
    /// Longer description passed as the edit instruction.
    pub prompt_description: &'static str,
}

static SPRING: SeasonInfo = SeasonInfo {
    name: "スプリング（イエベ春）",
    name_en: "Spring",
    description: "Bright, translucent skin with a yellow base. Eyes are clear and light, \
                  and the overall impression is lively and youthful.",
    characteristics: [
        "Skin: light, glowing, yellow-based",
        "Eyes: light brown, caramel",
        "Hair: light brown, chestnut",
        "Mood: radiant, fresh, energetic",
    ],
    swatches: ["#FFD700", "#FF6B9D", "#87CEEB", "#98FB98", "#FFA07A", "#FFE4B5"],
    recommendations: "Light, vivid colors: coral pink, peach, ivory, turquoise.",
    avoid: "Dark colors, strongly blue-based colors, and dull tones such as gray.",
};

static SUMMER: SeasonInfo = SeasonInfo {
    name: "サマー（ブルベ夏）",
    name_en: "Summer",
    description: "Translucent, blue-based skin with a soft, refined look. Eyes are a gentle \
                  grayish brown or black, and the overall impression is elegant and cool.",
    characteristics: [
        "Skin: light, translucent, blue-based",
        "Eyes: soft brown, grayish black",
        "Hair: soft black, grayish brown",
        "Mood: graceful, refined, cool",
    ],
    swatches: ["#E6E6FA", "#B0C4DE", "#DDA0DD", "#F0E68C", "#87CEEB", "#FFB6C1"],
    recommendations: "Soft, pale colors: lavender, rose pink, mint blue, baby pink.",
    avoid: "Deep colors, strongly yellow-based colors, orange and brown.",
};

static AUTUMN: SeasonInfo = SeasonInfo {
    name: "オータム（イエベ秋）",
    name_en: "Autumn",
    description: "Matte, yellow-based skin with a deep, settled look. Eyes are deep brown or \
                  golden, and the overall impression is chic and mature.",
    characteristics: [
        "Skin: matte, yellow-based, ochre",
        "Eyes: deep brown, dark brown",
        "Hair: dark brown, burnt umber",
        "Mood: chic, calm, mature",
    ],
    swatches: ["#8B4513", "#D2691E", "#F4A460", "#BDB76B", "#808000", "#CD853F"],
    recommendations: "Deep, warm colors: terracotta, mustard, khaki, brown, beige.",
    avoid: "Overly bright colors, strongly blue-based colors, pastels.",
};

static WINTER: SeasonInfo = SeasonInfo {
    name: "ウィンター（ブルベ冬）",
    name_en: "Winter",
    description: "Clear, blue-based skin with strong contrast between light and dark. Eyes \
                  are deep black, and the overall impression is sharp and cool.",
    characteristics: [
        "Skin: porcelain or healthy blue-based",
        "Eyes: black, dark brown, high contrast",
        "Hair: black, dark shades",
        "Mood: cool, sharp, striking",
    ],
    swatches: ["#000000", "#FFFFFF", "#FF1493", "#4169E1", "#9370DB", "#00CED1"],
    recommendations: "Clear, defined colors: pure white, black, royal blue, shocking pink.",
    avoid: "Strongly yellow-based colors, beige, orange and other warm tones.",
};

const SPRING_SHADES: [HairShade; 6] = [
    HairShade { name: "Honey Blonde", hex: "#D4A574" },
    HairShade { name: "Golden Brown", hex: "#B8860B" },
    HairShade { name: "Light Caramel", hex: "#C68642" },
    HairShade { name: "Warm Beige", hex: "#D2B48C" },
    HairShade { name: "Copper Brown", hex: "#B87333" },
    HairShade { name: "Peach Blonde", hex: "#E6B88A" },
];

const SUMMER_SHADES: [HairShade; 6] = [
    HairShade { name: "Ash Blonde", hex: "#C4B5A0" },
    HairShade { name: "Rose Brown", hex: "#9B7B7B" },
    HairShade { name: "Soft Greige", hex: "#B8AFA8" },
    HairShade { name: "Lavender Ash", hex: "#A895A0" },
    HairShade { name: "Cool Beige", hex: "#C9B8A3" },
    HairShade { name: "Silver Gray", hex: "#A8A8A0" },
];

const AUTUMN_SHADES: [HairShade; 6] = [
    HairShade { name: "Dark Brown", hex: "#654321" },
    HairShade { name: "Chestnut", hex: "#8B4513" },
    HairShade { name: "Mahogany", hex: "#823D3D" },
    HairShade { name: "Autumn Red", hex: "#A0522D" },
    HairShade { name: "Deep Copper", hex: "#A0522D" },
    HairShade { name: "Warm Black", hex: "#3C2F2F" },
];

const WINTER_SHADES: [HairShade; 6] = [
    HairShade { name: "Jet Black", hex: "#1C1C1C" },
    HairShade { name: "Cool Black", hex: "#252525" },
    HairShade { name: "Blue Black", hex: "#1F2937" },
    HairShade { name: "Silver", hex: "#C0C0C0" },
    HairShade { name: "Platinum Blonde", hex: "#E5E4E2" },
    HairShade { name: "Burgundy", hex: "#800020" },
];

const SPRING_PICKS: [HairRecommendation; 3] = [
    HairRecommendation {
        name: "Honey Blonde",
        hex: "#D4A574",
        prompt_label: "honey blonde",
        prompt_description: "warm honey blonde with golden highlights",
    },
    HairRecommendation {
        name: "Light Caramel",
        hex: "#C68642",
        prompt_label: "light caramel",
        prompt_description: "light caramel brown with warm undertones",
    },
    HairRecommendation {
        name: "Golden Brown",
        hex: "#B8860B",
        prompt_label: "golden brown",
        prompt_description: "rich golden brown with amber tones",
    },
];

const SUMMER_PICKS: [HairRecommendation; 3] = [
    HairRecommendation {
        name: "Ash Blonde",
        hex: "#C4B5A0",
        prompt_label: "ash blonde",
        prompt_description: "cool ash blonde with silver undertones",
    },
    HairRecommendation {
        name: "Soft Greige",
        hex: "#B8AFA8",
        prompt_label: "soft greige",
        prompt_description: "soft greige (grey-beige blend) with cool tones",
    },
    HairRecommendation {
        name: "Rose Brown",
        hex: "#9B7B7B",
        prompt_label: "rose brown",
        prompt_description: "rose brown with subtle pink undertones",
    },
];

const AUTUMN_PICKS: [HairRecommendation; 3] = [
    HairRecommendation {
        name: "Chestnut",
        hex: "#8B4513",
        prompt_label: "chestnut",
        prompt_description: "deep chestnut brown with warm red tones",
    },
    HairRecommendation {
        name: "Mahogany",
        hex: "#823D3D",
        prompt_label: "mahogany",
        prompt_description: "rich mahogany with reddish-brown tones",
    },
    HairRecommendation {
        name: "Dark Brown",
        hex: "#654321",
        prompt_label: "dark brown",
        prompt_description: "deep dark brown with warm undertones",
    },
];

const WINTER_PICKS: [HairRecommendation; 3] = [
    HairRecommendation {
        name: "Jet Black",
        hex: "#1C1C1C",
        prompt_label: "jet black",
        prompt_description: "pure jet black with cool blue undertones",
    },
    HairRecommendation {
        name: "Blue Black",
        hex: "#1F2937",
        prompt_label: "blue black",
        prompt_description: "blue-black with subtle blue highlights",
    },
    HairRecommendation {
        name: "Platinum Blonde",
        hex: "#E5E4E2",
        prompt_label: "platinum blonde",
        prompt_description: "icy platinum blonde with silver highlights",
    },
];

/// Six hair shades suited to `season`.
pub fn hair_palette(season: Season) -> &'static [HairShade; 6] {
    match season {
        Season::Spring => &SPRING_SHADES,
        Season::Summer => &SUMMER_SHADES,
        Season::Autumn => &AUTUMN_SHADES,
        Season::Winter => &WINTER_SHADES,
    }
}

/// The three candidate colors rendered for a generation batch.
pub fn recommended_hair_colors(season: Season) -> &'static [HairRecommendation; 3] {
    match season {
        Season::Spring => &SPRING_PICKS,
        Season::Summer => &SUMMER_PICKS,
        Season::Autumn => &AUTUMN_PICKS,
        Season::Winter => &WINTER_PICKS,
    }
}
