use std::borrow::Cow;

use tokio::runtime::Handle;

use super::Viewer;
use crate::atlas::AtlasTransform;
use crate::bundle::{AssetBundle, DroppedFile};
use crate::loader::{DocumentKind, LoadMessage};
use crate::settings::ViewerSettings;
use crate::test_support::{ATLAS, SKELETON, hero_drop, png_bytes};

fn viewer_with(settings: ViewerSettings) -> Viewer {
    Viewer::new(settings, Handle::current(), (800.0, 600.0))
}

async fn loaded() -> Viewer {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(hero_drop());
    viewer.wait_for_load().await;
    assert!(viewer.error().is_none(), "{:?}", viewer.error());
    viewer
}

fn read(generation: u64, kind: DocumentKind, text: &str) -> LoadMessage {
    LoadMessage {
        generation,
        kind,
        result: Ok(text.to_string()),
    }
}

#[tokio::test]
async fn drop_installs_first_skin_and_animation() {
    let viewer = loaded().await;
    assert!(viewer.is_loaded());
    assert_eq!(viewer.current_skin(), Some("Default"));
    assert_eq!(viewer.current_animation(), Some("Walk"));
    assert!(viewer.is_playing());
    assert_eq!(viewer.skins(), ["Default", "Alt"]);
    assert_eq!(viewer.animations(), ["Walk"]);
    assert_eq!(viewer.slots(), ["body", "head"]);
    assert!(viewer.attached_slots().is_empty());
    assert_eq!(viewer.textures().resolved_count(), 1);
}

#[tokio::test]
async fn skeleton_without_skins_or_animations_still_loads() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(vec![
        DroppedFile::from_bytes(
            "bare.json",
            br#"{ "bones": [ { "name": "root" }, { "name": "tip", "parent": "root", "x": 5 } ] }"#.to_vec(),
        ),
        DroppedFile::from_bytes("bare.atlas", ATLAS.as_bytes().to_vec()),
        DroppedFile::from_bytes("body.png", png_bytes(64, 128)),
    ]);
    viewer.wait_for_load().await;

    assert!(viewer.error().is_none(), "{:?}", viewer.error());
    assert!(viewer.is_loaded());
    assert!(viewer.skins().is_empty());
    assert!(viewer.animations().is_empty());
    assert_eq!(viewer.current_skin(), None);
    assert_eq!(viewer.current_animation(), None);
    assert!(!viewer.is_playing());

    // nothing to play
    viewer.play();
    assert!(!viewer.is_playing());
    viewer.tick(0.5);
    assert!(viewer.is_loaded());
}

/// Points the atlas page line at whatever image was dropped as `sprite.png`.
struct RenamePage;

impl AtlasTransform for RenamePage {
    fn transform<'a>(&self, atlas_text: &'a str, _bundle: &AssetBundle) -> Cow<'a, str> {
        Cow::Owned(atlas_text.replace("body.png", "sprite.png"))
    }
}

#[tokio::test]
async fn atlas_transform_rewrites_text_before_parsing() {
    let drop = || {
        vec![
            DroppedFile::from_bytes("skeleton.json", SKELETON.as_bytes().to_vec()),
            DroppedFile::from_bytes("atlas.atlas", ATLAS.as_bytes().to_vec()),
            DroppedFile::from_bytes("sprite.png", png_bytes(64, 128)),
        ]
    };

    let mut plain = viewer_with(ViewerSettings::default());
    plain.load(drop());
    plain.wait_for_load().await;
    assert_eq!(plain.textures().resolved_count(), 0);

    let mut viewer =
        viewer_with(ViewerSettings::default()).with_atlas_transform(Box::new(RenamePage));
    viewer.load(drop());
    viewer.wait_for_load().await;
    assert!(viewer.is_loaded());
    assert_eq!(viewer.textures().resolved_count(), 1);
}

#[tokio::test]
async fn either_arrival_order_assembles_exactly_once() {
    for order in [
        [DocumentKind::Skeleton, DocumentKind::Atlas],
        [DocumentKind::Atlas, DocumentKind::Skeleton],
    ] {
        let mut viewer = viewer_with(ViewerSettings::default());
        viewer.load(hero_drop());
        let generation = viewer.generation();
        let text = |kind: DocumentKind| match kind {
            DocumentKind::Skeleton => SKELETON,
            DocumentKind::Atlas => ATLAS,
        };

        viewer.on_document_read(read(generation, order[0], text(order[0])));
        assert!(!viewer.is_loaded(), "one document must not assemble");
        viewer.on_document_read(read(generation, order[1], text(order[1])));
        assert!(viewer.is_loaded());
        assert_eq!(viewer.current_animation(), Some("Walk"));

        // the background reads of the same drop land afterwards and change nothing
        viewer.attach_overlay("head");
        viewer.wait_for_load().await;
        tokio::task::yield_now().await;
        viewer.poll_loads();
        assert_eq!(viewer.attached_slots(), ["head"]);
    }
}

#[tokio::test]
async fn newer_drop_wins_over_stale_reads() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(hero_drop());
    let stale = viewer.generation();

    let run = SKELETON.replace("Walk", "Run");
    viewer.load(vec![
        DroppedFile::from_bytes("run.json", run.into_bytes()),
        DroppedFile::from_bytes("run.atlas", ATLAS.as_bytes().to_vec()),
        DroppedFile::from_bytes("body.png", png_bytes(64, 128)),
    ]);

    viewer.on_document_read(read(stale, DocumentKind::Skeleton, SKELETON));
    viewer.on_document_read(read(stale, DocumentKind::Atlas, ATLAS));
    assert!(!viewer.is_loaded());

    viewer.wait_for_load().await;
    assert_eq!(viewer.animations(), ["Run"]);
    assert_eq!(viewer.current_animation(), Some("Run"));
}

#[tokio::test]
async fn missing_documents_install_nothing() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("body");

    viewer.load(vec![
        DroppedFile::from_bytes("atlas.atlas", ATLAS.as_bytes().to_vec()),
        DroppedFile::from_bytes("body.png", png_bytes(2, 2)),
    ]);
    assert!(!viewer.is_loaded());
    assert!(!viewer.is_loading());
    assert!(viewer.attached_slots().is_empty());
    assert_eq!(viewer.error().map(|e| e.key), Some("required-files-not-found"));

    viewer.load(Vec::new());
    assert_eq!(viewer.error().map(|e| e.key), Some("no-files"));
}

#[tokio::test]
async fn malformed_skeleton_is_a_parse_error() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(vec![
        DroppedFile::from_bytes("s.json", b"{ not json".to_vec()),
        DroppedFile::from_bytes("a.atlas", ATLAS.as_bytes().to_vec()),
    ]);
    viewer.wait_for_load().await;
    assert!(!viewer.is_loaded());
    assert_eq!(viewer.error().map(|e| e.key), Some("skeleton-parse-failed"));
}

#[tokio::test]
async fn unresolvable_region_fails_assembly() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(vec![
        DroppedFile::from_bytes("s.json", SKELETON.as_bytes().to_vec()),
        DroppedFile::from_bytes("a.atlas", ATLAS.replace("none\nbody\n", "none\nlegs\n").into_bytes()),
    ]);
    viewer.wait_for_load().await;
    assert!(!viewer.is_loaded());
    assert_eq!(viewer.error().map(|e| e.key), Some("assembly-failed"));
}

#[tokio::test]
async fn missing_page_image_is_only_a_warning() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(vec![
        DroppedFile::from_bytes("s.json", SKELETON.as_bytes().to_vec()),
        DroppedFile::from_bytes("a.atlas", ATLAS.as_bytes().to_vec()),
    ]);
    viewer.wait_for_load().await;
    assert!(viewer.is_loaded());
    assert_eq!(viewer.textures().missing_count(), 1);
    let page = &viewer.entity().unwrap().atlas.pages[0];
    assert!(page.texture.is_none());
}

#[tokio::test]
async fn page_image_matches_case_insensitively() {
    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(vec![
        DroppedFile::from_bytes("s.json", SKELETON.as_bytes().to_vec()),
        DroppedFile::from_bytes("a.atlas", ATLAS.as_bytes().to_vec()),
        DroppedFile::from_bytes("BODY.PNG", png_bytes(64, 128)),
    ]);
    viewer.wait_for_load().await;
    let row = viewer.textures().get_texture(0).unwrap();
    assert!(row.is_resolved());
    assert_eq!(row.file.as_deref(), Some("BODY.PNG"));
}

#[tokio::test]
async fn loads_a_drop_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for (name, bytes) in [
        ("hero.json", SKELETON.as_bytes().to_vec()),
        ("hero.atlas", ATLAS.as_bytes().to_vec()),
        ("body.png", png_bytes(64, 128)),
    ] {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        files.push(DroppedFile::from_path(path));
    }

    let mut viewer = viewer_with(ViewerSettings::default());
    viewer.load(files);
    viewer.wait_for_load().await;
    assert!(viewer.is_loaded());
    assert_eq!(viewer.textures().resolved_count(), 1);
}

#[tokio::test]
async fn attach_is_idempotent_and_detach_tolerates_absence() {
    let mut viewer = loaded().await;
    assert!(viewer.attach_overlay("head"));
    assert!(!viewer.attach_overlay("head"));
    assert_eq!(viewer.attached_slots(), ["head"]);
    assert_eq!(viewer.entity().unwrap().markers.len(), 1);

    assert!(viewer.detach_overlay("head"));
    assert!(viewer.attached_slots().is_empty());
    assert!(viewer.entity().unwrap().markers.is_empty());
    assert!(!viewer.detach_overlay("head"));
    assert!(!viewer.attach_overlay("tail"), "unknown slots are never attached");
}

#[tokio::test]
async fn detach_keeps_the_other_markers_indexed() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("body");
    viewer.attach_overlay("head");
    viewer.detach_overlay("body");
    assert_eq!(viewer.attached_slots(), ["head"]);
    assert!(viewer.detach_overlay("head"));
    assert!(viewer.entity().unwrap().markers.is_empty());
}

#[tokio::test]
async fn attach_without_entity_is_a_no_op() {
    let mut viewer = viewer_with(ViewerSettings::default());
    assert!(!viewer.attach_overlay("body"));
    assert!(viewer.attached_slots().is_empty());
}

#[tokio::test]
async fn tick_follows_bones_without_changing_marker_count() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("head");
    let before = viewer.entity().unwrap().markers[0].position;

    viewer.tick(0.5);
    let entity = viewer.entity().unwrap();
    assert_eq!(entity.markers.len(), 1);
    let head = entity.skeleton.find_bone("head").unwrap();
    assert_eq!(entity.markers[0].position, head.world_position);
    assert_ne!(entity.markers[0].position, before);
}

#[tokio::test]
async fn paused_entity_keeps_its_pose() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("head");
    viewer.pause();
    assert!(!viewer.is_playing());
    let before = viewer.entity().unwrap().markers[0].position;
    viewer.tick(0.5);
    assert_eq!(viewer.entity().unwrap().markers[0].position, before);
}

#[tokio::test]
async fn unknown_skin_keeps_previous_state() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("body");
    assert!(!viewer.select_skin("Nope"));
    assert_eq!(viewer.current_skin(), Some("Default"));
    assert_eq!(viewer.warning().map(|w| w.key), Some("skin-not-found"));
    assert_eq!(viewer.attached_slots(), ["body"]);

    assert!(viewer.select_skin("Alt"));
    assert_eq!(viewer.current_skin(), Some("Alt"));
    assert_eq!(viewer.attached_slots(), ["body"]);
}

#[tokio::test]
async fn unknown_animation_is_rejected() {
    let mut viewer = loaded().await;
    assert!(!viewer.select_animation("Fly"));
    assert_eq!(viewer.current_animation(), Some("Walk"));
    assert_eq!(viewer.warning().map(|w| w.key), Some("animation-not-found"));
}

#[tokio::test]
async fn selecting_an_animation_restarts_playback() {
    let mut viewer = loaded().await;
    viewer.tick(0.25);
    viewer.pause();
    assert_eq!(viewer.entity().unwrap().state.time(), 0.25);
    assert!(viewer.select_animation("Walk"));
    assert!(viewer.is_playing());
    let state = &viewer.entity().unwrap().state;
    assert_eq!(state.time(), 0.0);
    assert!(state.is_looping());
    assert_eq!(state.time_scale, 1.0);
}

#[tokio::test]
async fn speed_set_while_paused_applies_on_resume() {
    let mut viewer = loaded().await;
    viewer.pause();
    viewer.set_speed(2.0);
    assert_eq!(viewer.entity().unwrap().state.time_scale, 0.0);
    viewer.toggle_playback();
    assert!(viewer.is_playing());
    assert_eq!(viewer.entity().unwrap().state.time_scale, 2.0);
    viewer.set_speed(0.5);
    assert_eq!(viewer.entity().unwrap().state.time_scale, 0.5);
}

#[tokio::test]
async fn overlay_scale_applies_now_and_later() {
    let mut viewer = loaded().await;
    viewer.attach_overlay("body");
    viewer.set_overlay_scale(2.0);
    viewer.attach_overlay("head");
    let markers = &viewer.entity().unwrap().markers;
    assert!(markers.iter().all(|m| m.local_scale == 2.0));
}

#[tokio::test]
async fn resize_recenters_without_touching_scale() {
    let mut viewer = loaded().await;
    viewer.set_scale(0.5);
    viewer.resize(400.0, 300.0);
    let entity = viewer.entity().unwrap();
    assert_eq!((entity.position.x, entity.position.y), (200.0, 150.0));
    assert_eq!(entity.scale, 0.5);
}

#[tokio::test]
async fn resize_with_fit_clamp_takes_the_smaller_scale() {
    let settings = ViewerSettings {
        fit_to_viewport: true,
        ..ViewerSettings::default()
    };
    let mut viewer = viewer_with(settings);
    viewer.load(hero_drop());
    viewer.wait_for_load().await;
    viewer.set_scale(0.5);

    viewer.resize(400.0, 300.0);
    let fit = viewer.fit_scale().unwrap();
    let entity = viewer.entity().unwrap();
    assert_eq!((entity.position.x, entity.position.y), (200.0, 150.0));
    assert_eq!(entity.scale, 0.5f32.min(fit));

    // a 40x80 figure in a 40x30 surface must shrink below the requested scale
    viewer.resize(40.0, 30.0);
    let fit = viewer.fit_scale().unwrap();
    assert!(fit < 0.5);
    assert!((viewer.entity().unwrap().scale - fit).abs() < 1e-4);

    viewer.set_fit_to_viewport(false);
    assert_eq!(viewer.entity().unwrap().scale, 0.5);
}

#[tokio::test]
async fn repeated_resize_does_not_drift() {
    let mut viewer = loaded().await;
    viewer.resize(400.0, 300.0);
    let (position, pivot) = {
        let e = viewer.entity().unwrap();
        (e.position, e.pivot)
    };
    viewer.tick(0.3);
    viewer.resize(400.0, 300.0);
    let e = viewer.entity().unwrap();
    assert_eq!(e.position, position);
    assert_eq!(e.pivot, pivot);
}

#[tokio::test]
async fn successful_selection_clears_the_warning() {
    let mut viewer = loaded().await;

    assert!(!viewer.select_skin("Nope"));
    assert!(viewer.warning().is_some());
    assert!(viewer.select_skin("Alt"));
    assert!(viewer.warning().is_none());

    assert!(!viewer.select_animation("Fly"));
    assert!(viewer.warning().is_some());
    assert!(viewer.select_animation("Walk"));
    assert!(viewer.warning().is_none());
}

#[tokio::test]
async fn toggle_overlay_flips_attachment() {
    let mut viewer = loaded().await;
    assert!(viewer.toggle_overlay("head"));
    assert_eq!(viewer.attached_slots(), ["head"]);
    assert!(viewer.toggle_overlay("head"));
    assert!(viewer.attached_slots().is_empty());
    assert!(!viewer.toggle_overlay("tail"));
    assert!(viewer.attached_slots().is_empty());
}

#[tokio::test]
async fn slot_filter_ignores_case() {
    let viewer = loaded().await;
    assert_eq!(viewer.filtered_slots("HE"), ["head"]);
    assert_eq!(viewer.filtered_slots(""), ["body", "head"]);
    assert!(viewer.filtered_slots("zzz").is_empty());
}
