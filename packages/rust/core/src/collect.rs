//! The three source collection stages: web content, video transcripts, and
//! scrapbook notes.
//!
//! All three share one contract: resolve the vendor's sources, fetch through
//! a never-fails collaborator, and merge the result into the vendor's bundle
//! without touching fields owned by other stages. Only the web stage treats
//! a registry miss as an error; the later stages tolerate unknown vendors by
//! fetching nothing. Fetch failures are never logged as errors; they arrive
//! as diagnostic text inside the content itself.

use tracing::{debug, info};

use crate::pipeline::StageContext;
use crate::run::{RunRecord, Stage};

/// Scrape website/blog and docs/changelog text for each vendor.
pub async fn collect_web(mut record: RunRecord, ctx: &StageContext<'_>) -> RunRecord {
    for vendor_name in record.vendors.clone() {
        let profile = match ctx.storage.get_vendor(&vendor_name).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                record
                    .errors
                    .push(format!("Vendor '{vendor_name}' not found in the registry."));
                continue;
            }
            Err(e) => {
                record
                    .errors
                    .push(format!("Registry lookup failed for '{vendor_name}': {e}"));
                continue;
            }
        };

        let marketing_urls = profile.marketing_urls();
        let docs_urls = profile.docs_urls();

        let web_text = if marketing_urls.is_empty() {
            String::new()
        } else {
            ctx.fetcher.fetch_pages(&marketing_urls).await
        };
        let docs_text = if docs_urls.is_empty() {
            String::new()
        } else {
            ctx.fetcher.fetch_pages(&docs_urls).await
        };

        debug!(
            vendor = %vendor_name,
            web_len = web_text.len(),
            docs_len = docs_text.len(),
            "web collection"
        );

        let has_material = !web_text.is_empty() || !docs_text.is_empty();
        record.merge_material(&vendor_name, has_material, |bundle| {
            bundle.web_text = web_text;
            bundle.docs_text = docs_text;
        });
    }

    info!(
        vendors = record.vendors.len(),
        bundles = record.raw_material.len(),
        "web collection complete"
    );
    record.stage = Stage::WebCollected;
    record
}

/// Fetch recent video transcripts for each vendor with a configured channel.
pub async fn collect_video(mut record: RunRecord, ctx: &StageContext<'_>) -> RunRecord {
    for vendor_name in record.vendors.clone() {
        // Unknown vendors were already reported by the web stage
        let Ok(Some(profile)) = ctx.storage.get_vendor(&vendor_name).await else {
            continue;
        };

        let channel = profile.video_channel.unwrap_or_default();
        let video_text = if channel.is_empty() {
            String::new()
        } else {
            ctx.fetcher
                .fetch_transcripts(&channel, ctx.options.max_videos)
                .await
        };

        let has_material = !video_text.is_empty();
        record.merge_material(&vendor_name, has_material, |bundle| {
            bundle.video_text = video_text;
        });
    }

    info!(bundles = record.raw_material.len(), "video collection complete");
    record.stage = Stage::VideoCollected;
    record
}

/// Read scrapbook notes and screenshots for every vendor.
pub async fn collect_notes(mut record: RunRecord, ctx: &StageContext<'_>) -> RunRecord {
    for vendor_name in record.vendors.clone() {
        let bundle = ctx.notes.read_notes(&vendor_name).await;

        if !bundle.images.is_empty() {
            debug!(
                vendor = %vendor_name,
                images = bundle.images.len(),
                "scrapbook images found"
            );
        }

        let has_material = !bundle.is_empty();
        record.merge_material(&vendor_name, has_material, |material| {
            material.notes_text = bundle.text;
            material.notes_images = bundle.images;
        });
    }

    info!(bundles = record.raw_material.len(), "notes collection complete");
    record.stage = Stage::NotesCollected;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RunRecord, RunRequest};
    use crate::testutil::{EmptyUploader, StaticNotes, StubFetcher, StubModel, temp_storage};
    use vendorwatch_shared::{NotesBundle, VendorProfile};

    fn record_for(vendors: &[&str]) -> RunRecord {
        RunRecord::new(RunRequest {
            vendors: vendors.iter().map(|v| v.to_string()).collect(),
            research_query: "AI features".into(),
        })
    }

    #[tokio::test]
    async fn web_stage_collects_known_vendors_and_reports_misses() {
        let storage = temp_storage().await;
        let mut acme = VendorProfile::new("Acme");
        acme.website_url = Some("https://acme.example".into());
        storage.insert_vendor(&acme).await.unwrap();

        let fetcher = StubFetcher::pages("Acme ships X.");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = collect_web(record_for(&["Acme", "Ghost"]), &ctx).await;

        assert_eq!(record.stage, Stage::WebCollected);
        assert_eq!(record.raw_material["Acme"].web_text, "Acme ships X.");
        assert!(!record.raw_material.contains_key("Ghost"));
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].contains("Ghost"));
    }

    #[tokio::test]
    async fn web_stage_skips_fetch_without_urls() {
        let storage = temp_storage().await;
        storage
            .insert_vendor(&VendorProfile::new("Acme"))
            .await
            .unwrap();

        let fetcher = StubFetcher::pages("should not appear");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = collect_web(record_for(&["Acme"]), &ctx).await;

        // No URLs configured: nothing fetched, no bundle created, no error
        assert!(record.raw_material.is_empty());
        assert!(record.errors.is_empty());
        assert_eq!(fetcher.page_calls(), 0);
    }

    #[tokio::test]
    async fn video_stage_merges_without_clobbering_web_text() {
        let storage = temp_storage().await;
        let mut acme = VendorProfile::new("Acme");
        acme.website_url = Some("https://acme.example".into());
        acme.video_channel = Some("@AcmeHQ".into());
        storage.insert_vendor(&acme).await.unwrap();

        let fetcher = StubFetcher::new("site text", "transcript text");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = collect_web(record_for(&["Acme"]), &ctx).await;
        let record = collect_video(record, &ctx).await;

        let bundle = &record.raw_material["Acme"];
        assert_eq!(bundle.web_text, "site text");
        assert_eq!(bundle.video_text, "transcript text");
        assert_eq!(record.stage, Stage::VideoCollected);
    }

    #[tokio::test]
    async fn video_stage_is_silent_about_unknown_vendors() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "transcript");
        let notes = StaticNotes(NotesBundle::default());
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = collect_video(record_for(&["Ghost"]), &ctx).await;
        assert!(record.raw_material.is_empty());
        assert!(record.errors.is_empty());
    }

    #[tokio::test]
    async fn notes_stage_creates_bundles_without_registry() {
        let storage = temp_storage().await;
        let fetcher = StubFetcher::new("", "");
        let notes = StaticNotes(NotesBundle {
            text: "booth notes".into(),
            images: vec![],
        });
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        // Vendor is not registered; notes exist anyway
        let record = collect_notes(record_for(&["Stealthy"]), &ctx).await;
        assert_eq!(record.raw_material["Stealthy"].notes_text, "booth notes");
        assert!(record.errors.is_empty());
    }

    #[tokio::test]
    async fn raw_material_keys_never_exceed_vendor_set() {
        let storage = temp_storage().await;
        let mut acme = VendorProfile::new("Acme");
        acme.website_url = Some("https://acme.example".into());
        storage.insert_vendor(&acme).await.unwrap();

        let fetcher = StubFetcher::new("web", "video");
        let notes = StaticNotes(NotesBundle {
            text: "notes".into(),
            images: vec![],
        });
        let model = StubModel::ok("unused");
        let uploader = EmptyUploader;
        let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader);

        let record = record_for(&["Acme", "Ghost"]);
        let record = collect_web(record, &ctx).await;
        let record = collect_video(record, &ctx).await;
        let record = collect_notes(record, &ctx).await;

        for key in record.raw_material.keys() {
            assert!(record.vendors.contains(key));
        }
        // BTreeMap keying makes duplicates impossible; re-running a stage
        // must not grow the map either
        let size_before = record.raw_material.len();
        let record = collect_notes(record, &ctx).await;
        assert_eq!(record.raw_material.len(), size_before);
    }
}
