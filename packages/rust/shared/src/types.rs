//! Core domain types for Vendorwatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// VendorProfile
// ---------------------------------------------------------------------------

/// A vendor registry row: the sources we know about for one competitor.
///
/// All source fields are optional; a collection stage that finds nothing
/// configured for its category simply fetches nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorProfile {
    /// Unique identifier (UUID v7, time-sortable).
    pub id: String,
    /// Vendor name, unique across the registry. This is the key every
    /// pipeline stage correlates on.
    pub name: String,
    /// Marketing site URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Blog URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_url: Option<String>,
    /// Product documentation URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Changelog / release notes URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
    /// Video channel handle (e.g. `@AcmeHQ`) or channel ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_channel: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl VendorProfile {
    /// Create a new profile with a generated id and current timestamps.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            website_url: None,
            blog_url: None,
            docs_url: None,
            changelog_url: None,
            video_channel: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// URLs the web-content stage should scrape (site + blog).
    pub fn marketing_urls(&self) -> Vec<String> {
        [&self.website_url, &self.blog_url]
            .into_iter()
            .flatten()
            .filter(|u| !u.is_empty())
            .cloned()
            .collect()
    }

    /// URLs the web-content stage should scrape for docs (docs + changelog).
    pub fn docs_urls(&self) -> Vec<String> {
        [&self.docs_url, &self.changelog_url]
            .into_iter()
            .flatten()
            .filter(|u| !u.is_empty())
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Notes payloads
// ---------------------------------------------------------------------------

/// An opaque encoded image payload from the notes store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImageData {
    /// Render as a `data:` URL for multimodal model requests.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Everything the notes store holds for one vendor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesBundle {
    /// Free-text notes.
    pub text: String,
    /// Screenshot attachments, in discovery order.
    pub images: Vec<ImageData>,
}

impl NotesBundle {
    /// True when there is neither text nor any image.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.images.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Synthesis section configuration
// ---------------------------------------------------------------------------

/// How many sections the synthesis asks for.
///
/// The section set is configuration data, not structure: consumers parse the
/// report by heading text, so the labels below are a stable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisDepth {
    /// Four-section synthesis: launches, pricing, strategy, gaps.
    #[default]
    Standard,
    /// Eight-section synthesis adding use cases, architecture, UX, and
    /// watch points.
    Deep,
}

impl std::str::FromStr for SynthesisDepth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            other => Err(format!("unknown depth '{other}' (expected standard or deep)")),
        }
    }
}

impl std::fmt::Display for SynthesisDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

/// One named section of a vendor synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    /// Stable key used in storage and the run record.
    pub key: &'static str,
    /// Literal markdown heading label. Stable contract for report consumers.
    pub label: &'static str,
    /// Guidance embedded into the synthesis prompt under this heading.
    pub guidance: &'static str,
}

const STANDARD_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "recent_launches",
        label: "Recent Feature Launches & Updates",
        guidance: "What has this vendor shipped recently? Be specific with feature names if mentioned.",
    },
    SectionSpec {
        key: "pricing_signals",
        label: "Pricing Signals",
        guidance: "Any pricing changes, new tiers, freemium moves, or enterprise positioning signals?",
    },
    SectionSpec {
        key: "strategic_direction",
        label: "Strategic Direction",
        guidance: "Where does this vendor appear to be headed in the next 6-12 months based on their messaging, launches, and content focus?",
    },
    SectionSpec {
        key: "competitive_gaps",
        label: "Gaps vs Your Product",
        guidance: "What capabilities does this vendor have that may be ahead of your product? What are they not doing well that could be an advantage for you?",
    },
];

const DEEP_SECTIONS: &[SectionSpec] = &[
    STANDARD_SECTIONS[0],
    SectionSpec {
        key: "use_cases",
        label: "Use Cases & Target Segments",
        guidance: "Which specific use cases and customer segments is this vendor targeting?",
    },
    SectionSpec {
        key: "technical_details",
        label: "Technical Architecture & Integrations",
        guidance: "Protocols, APIs, integrations, and architecture signals visible in the material.",
    },
    SectionSpec {
        key: "ui_ux",
        label: "UI & UX Observations",
        guidance: "Interface patterns and notable UX details, including anything visible in attached screenshots.",
    },
    STANDARD_SECTIONS[1],
    STANDARD_SECTIONS[2],
    STANDARD_SECTIONS[3],
    SectionSpec {
        key: "watch_points",
        label: "Key Watch Points",
        guidance: "The top three things to monitor closely about this vendor in the next quarter.",
    },
];

/// The configured section set for a given depth.
pub fn sections_for(depth: SynthesisDepth) -> &'static [SectionSpec] {
    match depth {
        SynthesisDepth::Standard => STANDARD_SECTIONS,
        SynthesisDepth::Deep => DEEP_SECTIONS,
    }
}
