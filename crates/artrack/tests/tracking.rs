use artrack::detect::{gray_view, process_rgba_frame};
use artrack::{
    Algorithm, DetectionOutcome, MemoryStore, MissReason, TargetStore, Tracker, TrackerConfig,
};
use std::cell::RefCell;
use std::rc::Rc;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Seeded random-block texture. Rich in strong corners so every detector
/// family extracts a dense feature set; distinct seeds give visually
/// unrelated targets.
fn block_pattern(width: u32, height: u32, seed: u32) -> image::GrayImage {
    let block = 10;
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 24) as u8
    };
    let bw = width.div_ceil(block);
    let bh = height.div_ceil(block);
    let blocks: Vec<u8> = (0..bw * bh).map(|_| next()).collect();
    let mut data = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            data[(y * width + x) as usize] = blocks[((y / block) * bw + x / block) as usize];
        }
    }
    image::GrayImage::from_raw(width, height, data).expect("pattern buffer")
}

fn blank_rgba(width: u32, height: u32) -> Vec<u8> {
    vec![127; (width * height * 4) as usize]
}

#[test]
fn detects_registered_target_in_its_own_image() {
    init_logs();
    let img = block_pattern(240, 240, 7);
    let mut tracker = Tracker::new(TrackerConfig::default(), MemoryStore::new()).expect("tracker");
    tracker
        .add_target("poster", "Poster", &gray_view(&img))
        .expect("add target");

    let outcome = tracker.detect_target(&gray_view(&img));
    let detection = outcome.detection().expect("self-detection");
    assert_eq!(detection.target_id, "poster");
    assert!(detection.match_count >= 12, "too few matches");
    assert!(detection.score > 0.0 && detection.score <= 1.0);

    // an unmoved target maps onto its own corners
    let expected = [(0.0, 0.0), (240.0, 0.0), (240.0, 240.0), (0.0, 240.0)];
    for (corner, (ex, ey)) in detection.corners.iter().zip(expected) {
        assert!(
            (corner.x - ex).abs() < 3.0 && (corner.y - ey).abs() < 3.0,
            "corner {corner:?} too far from ({ex}, {ey})"
        );
    }
}

#[test]
fn every_algorithm_family_self_detects() {
    init_logs();
    let img = block_pattern(240, 240, 21);
    for algorithm in [Algorithm::Fast, Algorithm::Orb, Algorithm::Brisk] {
        let mut config = TrackerConfig::default();
        config.detector.algorithm = algorithm;
        let mut tracker = Tracker::new(config, MemoryStore::new()).expect("tracker");
        tracker
            .add_target("t", "Target", &gray_view(&img))
            .expect("add target");
        let outcome = tracker.detect_target(&gray_view(&img));
        assert!(
            outcome.detection().is_some(),
            "{algorithm:?} failed to self-detect"
        );
    }
}

#[test]
fn blank_frame_misses_with_no_frame_features() {
    init_logs();
    let img = block_pattern(200, 200, 3);
    let mut tracker = Tracker::new(TrackerConfig::default(), MemoryStore::new()).expect("tracker");
    tracker
        .add_target("t", "Target", &gray_view(&img))
        .expect("add target");

    let flat = image::GrayImage::from_raw(200, 200, vec![127; 200 * 200]).expect("flat");
    let outcome = tracker.detect_target(&gray_view(&flat));
    assert!(matches!(
        outcome,
        DetectionOutcome::Missed(MissReason::NoFrameFeatures)
    ));
}

#[test]
fn ranks_the_matching_target_first() {
    init_logs();
    let a = block_pattern(220, 220, 100);
    let b = block_pattern(220, 220, 200);
    let mut tracker = Tracker::new(TrackerConfig::default(), MemoryStore::new()).expect("tracker");
    tracker.add_target("a", "A", &gray_view(&a)).expect("add a");
    tracker.add_target("b", "B", &gray_view(&b)).expect("add b");

    let outcome = tracker.detect_target(&gray_view(&b));
    let detection = outcome.detection().expect("detection");
    assert_eq!(detection.target_id, "b", "wrong target won");
}

#[test]
fn rgba_frames_flow_through_the_sampling_loop() {
    init_logs();
    let mut config = TrackerConfig::default();
    config.detection_interval = 30;
    let mut tracker = Tracker::new(config, MemoryStore::new()).expect("tracker");

    let invocations = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&invocations);
    tracker.start(move |_| *counter.borrow_mut() += 1);

    let frame = blank_rgba(64, 64);
    for _ in 0..59 {
        process_rgba_frame(&mut tracker, 64, 64, &frame).expect("frame");
    }
    assert_eq!(
        *invocations.borrow(),
        1,
        "expected exactly one detection in 59 ticks at interval 30"
    );

    // bad buffer lengths are rejected before reaching the loop
    assert!(process_rgba_frame(&mut tracker, 64, 64, &frame[..100]).is_err());
}

#[test]
fn targets_survive_a_store_round_trip() {
    init_logs();
    let img = block_pattern(200, 200, 55);
    let mut store = MemoryStore::new();
    {
        let mut tracker =
            Tracker::new(TrackerConfig::default(), MemoryStore::new()).expect("tracker");
        tracker
            .add_target("poster", "Poster", &gray_view(&img))
            .expect("add target");
        for record in tracker.store().list_all().expect("list") {
            store.save(&record).expect("save");
        }
    }

    let mut restored = Tracker::new(TrackerConfig::default(), store).expect("tracker");
    assert_eq!(restored.load_from_store().expect("load"), 1);

    let outcome = restored.detect_target(&gray_view(&img));
    assert_eq!(
        outcome.detection().map(|d| d.target_id.as_str()),
        Some("poster"),
        "restored target should be detectable without re-extraction"
    );
}

#[test]
fn removed_target_is_never_detected() {
    init_logs();
    let img = block_pattern(200, 200, 77);
    let mut tracker = Tracker::new(TrackerConfig::default(), MemoryStore::new()).expect("tracker");
    tracker
        .add_target("gone", "Gone", &gray_view(&img))
        .expect("add target");
    tracker.remove_target("gone").expect("remove");

    let outcome = tracker.detect_target(&gray_view(&img));
    assert!(outcome.detection().is_none());
    assert!(tracker.store().is_empty());
}
