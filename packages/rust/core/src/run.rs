//! The run record: the single state object threaded through the pipeline.
//!
//! Every stage consumes the record and returns a new one with only its owned
//! fields changed. Multi-vendor data accumulates by vendor key; errors are
//! append-only and never cleared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vendorwatch_shared::{ImageData, SynthesisDepth};

/// Inputs for one end-to-end run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Vendor names to analyze, in the order they will be processed.
    pub vendors: Vec<String>,
    /// The research focus steering the synthesis prompts.
    pub research_query: String,
}

/// Per-run tuning knobs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Which section set the synthesis asks for.
    pub depth: SynthesisDepth,
    /// How many recent videos to pull transcripts for per vendor.
    pub max_videos: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            depth: SynthesisDepth::Standard,
            max_videos: 5,
        }
    }
}

/// The last completed stage, for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Created,
    WebCollected,
    VideoCollected,
    NotesCollected,
    Synthesized,
    DeltasComputed,
    ReportRendered,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::WebCollected => "web_collected",
            Self::VideoCollected => "video_collected",
            Self::NotesCollected => "notes_collected",
            Self::Synthesized => "synthesized",
            Self::DeltasComputed => "deltas_computed",
            Self::ReportRendered => "report_rendered",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-vendor accumulator of raw input material.
///
/// Each text field is owned by exactly one collection stage; a stage merging
/// into an existing bundle must not touch fields it does not own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMaterial {
    pub vendor_name: String,
    /// Website + blog text. Owned by the web stage.
    pub web_text: String,
    /// Product docs + changelog text. Owned by the web stage.
    pub docs_text: String,
    /// Video transcript text. Owned by the video stage.
    pub video_text: String,
    /// Scrapbook notes text. Owned by the notes stage.
    pub notes_text: String,
    /// Scrapbook screenshots. Owned by the notes stage.
    pub notes_images: Vec<ImageData>,
}

impl RawMaterial {
    fn new(vendor_name: impl Into<String>) -> Self {
        Self {
            vendor_name: vendor_name.into(),
            ..Self::default()
        }
    }

    /// True when any text field has substance or any image is attached.
    pub fn has_content(&self) -> bool {
        !self.web_text.trim().is_empty()
            || !self.docs_text.trim().is_empty()
            || !self.video_text.trim().is_empty()
            || !self.notes_text.trim().is_empty()
            || !self.notes_images.is_empty()
    }
}

/// One structured analysis for a vendor with usable content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesis {
    pub vendor_name: String,
    /// Extracted section bodies keyed by section key. Derived and lossy:
    /// extraction is best-effort, so a section may be empty.
    pub sections: BTreeMap<String, String>,
    /// The unparsed model response, verbatim. This is the source of truth
    /// and the only copy that gets persisted as a snapshot.
    pub full_text: String,
}

/// Per-vendor comparison outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaResult {
    pub vendor_name: String,
    /// Model-computed delta, the first-run sentinel, or the failure
    /// placeholder.
    pub summary: String,
    /// True iff no prior snapshot existed at comparison time.
    pub is_first_run: bool,
}

/// The single mutable structure flowing through all pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Input vendor order; immutable after run start.
    pub vendors: Vec<String>,
    /// Input research focus; immutable after run start.
    pub research_query: String,
    /// Raw material keyed by vendor name. Keys are always a subset of
    /// `vendors`.
    pub raw_material: BTreeMap<String, RawMaterial>,
    /// One entry per vendor with usable content, in processing order.
    pub syntheses: Vec<Synthesis>,
    /// One entry per synthesized vendor, in synthesis order.
    pub deltas: Vec<DeltaResult>,
    /// Rendered markdown; empty until the render stage.
    pub final_report: String,
    /// Upload link (or diagnostic); empty until upload.
    pub report_link: String,
    /// Accumulated diagnostics, append-only across all stages.
    pub errors: Vec<String>,
    /// Last completed stage.
    pub stage: Stage,
}

impl RunRecord {
    /// Create the empty record for a new run.
    pub fn new(request: RunRequest) -> Self {
        Self {
            vendors: request.vendors,
            research_query: request.research_query,
            raw_material: BTreeMap::new(),
            syntheses: Vec::new(),
            deltas: Vec::new(),
            final_report: String::new(),
            report_link: String::new(),
            errors: Vec::new(),
            stage: Stage::Created,
        }
    }

    /// Merge stage output into a vendor's bundle.
    ///
    /// A bundle is created only when the stage actually has material; an
    /// existing bundle always has the stage's owned fields overwritten (so
    /// re-running a stage is safe). This is what keeps `raw_material` free
    /// of keys for vendors no stage found anything for.
    pub(crate) fn merge_material(
        &mut self,
        vendor_name: &str,
        has_material: bool,
        apply: impl FnOnce(&mut RawMaterial),
    ) {
        match self.raw_material.get_mut(vendor_name) {
            Some(bundle) => apply(bundle),
            None if has_material => {
                let mut bundle = RawMaterial::new(vendor_name);
                apply(&mut bundle);
                self.raw_material.insert(vendor_name.to_string(), bundle);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunRecord {
        RunRecord::new(RunRequest {
            vendors: vec!["Acme".into(), "Globex".into()],
            research_query: "AI features".into(),
        })
    }

    #[test]
    fn new_record_is_empty() {
        let record = record();
        assert!(record.raw_material.is_empty());
        assert!(record.syntheses.is_empty());
        assert!(record.deltas.is_empty());
        assert!(record.errors.is_empty());
        assert_eq!(record.stage, Stage::Created);
    }

    #[test]
    fn merge_creates_only_with_material() {
        let mut record = record();

        record.merge_material("Acme", false, |bundle| {
            bundle.web_text = String::new();
        });
        assert!(!record.raw_material.contains_key("Acme"));

        record.merge_material("Acme", true, |bundle| {
            bundle.web_text = "site text".into();
        });
        assert_eq!(record.raw_material["Acme"].web_text, "site text");
        assert_eq!(record.raw_material["Acme"].vendor_name, "Acme");
    }

    #[test]
    fn merge_preserves_unowned_fields() {
        let mut record = record();
        record.merge_material("Acme", true, |bundle| {
            bundle.web_text = "site text".into();
        });

        // A later stage with no material still overwrites its own field on
        // an existing bundle, and never clobbers the web stage's field.
        record.merge_material("Acme", false, |bundle| {
            bundle.video_text = String::new();
        });
        assert_eq!(record.raw_material["Acme"].web_text, "site text");
        assert_eq!(record.raw_material["Acme"].video_text, "");

        record.merge_material("Acme", true, |bundle| {
            bundle.video_text = "transcript".into();
        });
        assert_eq!(record.raw_material["Acme"].web_text, "site text");
        assert_eq!(record.raw_material["Acme"].video_text, "transcript");
    }

    #[test]
    fn rerun_overwrites_owned_fields() {
        let mut record = record();
        record.merge_material("Acme", true, |bundle| {
            bundle.web_text = "first pass".into();
        });
        record.merge_material("Acme", true, |bundle| {
            bundle.web_text = "second pass".into();
        });
        assert_eq!(record.raw_material["Acme"].web_text, "second pass");
        assert_eq!(record.raw_material.len(), 1);
    }

    #[test]
    fn material_content_check() {
        let mut material = RawMaterial::new("Acme");
        assert!(!material.has_content());

        material.notes_text = "  \n".into();
        assert!(!material.has_content());

        material.notes_images.push(vendorwatch_shared::ImageData {
            media_type: "image/png".into(),
            data: "x".into(),
        });
        assert!(material.has_content());
    }

    #[test]
    fn stage_tags() {
        assert_eq!(Stage::WebCollected.as_str(), "web_collected");
        assert_eq!(Stage::ReportRendered.to_string(), "report_rendered");
    }
}
