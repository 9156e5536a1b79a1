//! The synthesizer stage: one model call per vendor with usable content,
//! producing a structured analysis with deterministically extracted sections.

use tracing::{info, warn};
use vendorwatch_model::ModelRequest;
use vendorwatch_shared::SectionSpec;

use crate::pipeline::StageContext;
use crate::run::{RawMaterial, RunRecord, Stage, Synthesis};
use crate::sections::extract_section;

/// System instruction biasing toward specificity and against fabrication.
const SYNTHESIS_SYSTEM: &str = "\
You are a senior competitive intelligence analyst for a B2B SaaS product team. \
Your job is to synthesize raw intelligence about a competitor and produce a \
structured, actionable report tailored to a specific research focus. Be \
specific and avoid generic statements. Ground every observation in the \
provided content; when something is not covered by the material, state that \
it was not found rather than inventing it.";

const SYNTHESIS_TEMPERATURE: f32 = 0.2;

// Per-field excerpt budgets. Marketing copy gets the largest share;
// transcripts and notes are noisier per character.
const WEB_EXCERPT_CHARS: usize = 4000;
const DOCS_EXCERPT_CHARS: usize = 3000;
const VIDEO_EXCERPT_CHARS: usize = 3000;
const NOTES_EXCERPT_CHARS: usize = 2000;

/// Synthesize accumulated raw material into per-vendor analyses.
///
/// Vendors with no content and no images are skipped with an error; this is
/// the only hard skip in the pipeline. A failed model call excludes that
/// vendor from the output entirely (no partial synthesis is stored).
pub async fn synthesize(mut record: RunRecord, ctx: &StageContext<'_>) -> RunRecord {
    let sections = vendorwatch_shared::sections_for(ctx.options.depth);

    for vendor_name in record.vendors.clone() {
        let Some(material) = record.raw_material.get(&vendor_name).cloned() else {
            continue;
        };

        if !material.has_content() {
            record.errors.push(format!(
                "No content retrieved for {vendor_name}, skipping synthesis."
            ));
            continue;
        }

        let prompt =
            build_synthesis_prompt(&vendor_name, &record.research_query, &material, sections);

        let request = ModelRequest {
            system: SYNTHESIS_SYSTEM,
            prompt: &prompt,
            images: &material.notes_images,
            temperature: SYNTHESIS_TEMPERATURE,
            max_tokens: None,
        };

        match ctx.model.complete(request).await {
            Ok(full_text) => {
                let extracted = sections
                    .iter()
                    .map(|spec| (spec.key.to_string(), extract_section(&full_text, spec.label)))
                    .collect();
                record.syntheses.push(Synthesis {
                    vendor_name,
                    sections: extracted,
                    full_text,
                });
            }
            Err(e) => {
                warn!(vendor = %vendor_name, error = %e, "synthesis failed");
                record
                    .errors
                    .push(format!("Synthesis failed for {vendor_name}: {e}"));
            }
        }
    }

    info!(
        syntheses = record.syntheses.len(),
        vendors = record.vendors.len(),
        "synthesis complete"
    );
    record.stage = Stage::Synthesized;
    record
}

/// Assemble the per-vendor synthesis prompt with bounded excerpts.
fn build_synthesis_prompt(
    vendor_name: &str,
    research_query: &str,
    material: &RawMaterial,
    sections: &[SectionSpec],
) -> String {
    let mut prompt = format!(
        "Competitor: {vendor_name}\nResearch Focus: {research_query}\n\n\
         === WEBSITE & BLOG CONTENT ===\n{}\n\n\
         === PRODUCT DOCS & CHANGELOG ===\n{}\n\n\
         === VIDEO TRANSCRIPTS ===\n{}\n\n\
         === PERSONAL SCRAPBOOK NOTES ===\n{}\n\n\
         ---\nBased on the above, provide a structured analysis in this exact format:\n",
        excerpt(&material.web_text, WEB_EXCERPT_CHARS),
        excerpt(&material.docs_text, DOCS_EXCERPT_CHARS),
        excerpt(&material.video_text, VIDEO_EXCERPT_CHARS),
        excerpt(&material.notes_text, NOTES_EXCERPT_CHARS),
    );

    for spec in sections {
        prompt.push_str(&format!("\n## {}\n[{}]\n", spec.label, spec.guidance));
    }

    if !material.notes_images.is_empty() {
        prompt.push_str(
            "\nThe attached screenshots come from the personal scrapbook; \
             fold anything visible in them into the relevant sections.\n",
        );
    }

    prompt
}

/// Bounded excerpt of a material field, or a placeholder when empty.
fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "Not available".to_string();
    }

    // Truncate on a char boundary; byte slicing panics mid-codepoint
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\n[... truncated ...]", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RunRecord, RunRequest};
    use crate::testutil::{
        EmptyUploader, MULTI_SECTION_RESPONSE, StaticNotes, StubFetcher, StubModel, temp_storage,
    };
    use vendorwatch_shared::{NotesBundle, SynthesisDepth, sections_for};

    fn record_with_material(vendor: &str, web_text: &str) -> RunRecord {
        let mut record = RunRecord::new(RunRequest {
            vendors: vec![vendor.to_string()],
            research_query: "AI features".into(),
        });
        record.merge_material(vendor, !web_text.is_empty(), |bundle| {
            bundle.web_text = web_text.to_string();
        });
        record
    }

    #[tokio::test]
    async fn synthesizes_vendor_with_content() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok(MULTI_SECTION_RESPONSE);
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = synthesize(record_with_material("Acme", "Acme ships X."), &ctx).await;

        assert_eq!(record.syntheses.len(), 1);
        let synthesis = &record.syntheses[0];
        assert_eq!(synthesis.vendor_name, "Acme");
        assert_eq!(synthesis.full_text, MULTI_SECTION_RESPONSE);
        assert_eq!(
            synthesis.sections["recent_launches"],
            "Shipped Agent Studio in July."
        );
        assert!(record.errors.is_empty());
        assert_eq!(model.call_count(), 1);
        assert_eq!(record.stage, Stage::Synthesized);
    }

    #[tokio::test]
    async fn empty_material_is_dropped_with_one_error() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok(MULTI_SECTION_RESPONSE);
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        // Construct a bundle with no usable content in any field
        let mut record = RunRecord::new(RunRequest {
            vendors: vec!["Hollow".into()],
            research_query: "q".into(),
        });
        record.merge_material("Hollow", true, |bundle| {
            bundle.web_text = "   ".into();
        });

        let record = synthesize(record, &ctx).await;

        assert!(record.syntheses.is_empty());
        let mentions: Vec<_> = record
            .errors
            .iter()
            .filter(|e| e.contains("Hollow"))
            .collect();
        assert_eq!(mentions.len(), 1);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn vendor_without_bundle_is_silently_absent() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok(MULTI_SECTION_RESPONSE);
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = RunRecord::new(RunRequest {
            vendors: vec!["Ghost".into()],
            research_query: "q".into(),
        });
        let record = synthesize(record, &ctx).await;

        // The registry miss was the collection stage's error to report, not ours
        assert!(record.syntheses.is_empty());
        assert!(record.errors.is_empty());
    }

    #[tokio::test]
    async fn model_failure_excludes_vendor_but_not_siblings() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle::default());
        // First call (Acme) succeeds, second (Globex) fails
        let model = StubModel::fail_after(MULTI_SECTION_RESPONSE, 1);
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let mut record = RunRecord::new(RunRequest {
            vendors: vec!["Acme".into(), "Globex".into()],
            research_query: "q".into(),
        });
        record.merge_material("Acme", true, |b| b.web_text = "acme text".into());
        record.merge_material("Globex", true, |b| b.web_text = "globex text".into());

        let record = synthesize(record, &ctx).await;

        assert_eq!(record.syntheses.len(), 1);
        assert_eq!(record.syntheses[0].vendor_name, "Acme");
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].contains("Globex"));
        assert!(record.errors[0].starts_with("Synthesis failed for"));
    }

    #[tokio::test]
    async fn output_order_follows_vendor_order() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok(MULTI_SECTION_RESPONSE);
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        // BTreeMap iteration would yield Alpha first; vendor order must win
        let mut record = RunRecord::new(RunRequest {
            vendors: vec!["Zeta".into(), "Alpha".into()],
            research_query: "q".into(),
        });
        record.merge_material("Zeta", true, |b| b.web_text = "z".into());
        record.merge_material("Alpha", true, |b| b.web_text = "a".into());

        let record = synthesize(record, &ctx).await;
        let order: Vec<_> = record
            .syntheses
            .iter()
            .map(|s| s.vendor_name.as_str())
            .collect();
        assert_eq!(order, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn prompt_embeds_excerpts_and_sections() {
        let mut material = RawMaterial::default();
        material.vendor_name = "Acme".into();
        material.web_text = "Long marketing copy.".into();

        let prompt = build_synthesis_prompt(
            "Acme",
            "What AI features?",
            &material,
            sections_for(SynthesisDepth::Standard),
        );

        assert!(prompt.contains("Competitor: Acme"));
        assert!(prompt.contains("Research Focus: What AI features?"));
        assert!(prompt.contains("Long marketing copy."));
        // Empty fields render the placeholder rather than vanishing
        assert!(prompt.contains("=== VIDEO TRANSCRIPTS ===\nNot available"));
        assert!(prompt.contains("## Recent Feature Launches & Updates"));
        assert!(prompt.contains("## Gaps vs Your Product"));
        assert!(!prompt.contains("## Key Watch Points"));

        let deep_prompt = build_synthesis_prompt(
            "Acme",
            "What AI features?",
            &material,
            sections_for(SynthesisDepth::Deep),
        );
        assert!(deep_prompt.contains("## Key Watch Points"));
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("", 100), "Not available");
        assert_eq!(excerpt("short", 100), "short");

        let long = "ä".repeat(50);
        let cut = excerpt(&long, 10);
        assert!(cut.starts_with(&"ä".repeat(10)));
        assert!(cut.ends_with("[... truncated ...]"));
    }
}
