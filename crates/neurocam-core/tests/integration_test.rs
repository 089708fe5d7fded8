use neurocam_core::{
    Beat, CamConfig, FrameAssembler, MatchMode, NeuroCam, Pattern, SlotIndex, NO_MATCH_DISTANCE,
};

fn search(cam: &mut NeuroCam, bits: u16) -> neurocam_core::MatchResult {
    cam.search(Pattern(bits), MatchMode::Fuzzy).unwrap()
}

#[test]
fn zero_query_is_exact_with_full_confidence() {
    let mut cam = NeuroCam::default();
    let r = search(&mut cam, 0x000);
    assert!(r.valid);
    assert_eq!(r.slot_index, Some(0));
    assert_eq!(r.distance, 0);
    assert_eq!(r.confidence, 255);
}

#[test]
fn one_bit_off_keeps_partial_confidence() {
    let mut cam = NeuroCam::default();
    let r = search(&mut cam, 0x001);
    assert!(r.valid);
    assert_eq!(r.slot_index, Some(0));
    assert_eq!(r.distance, 1);
    assert!(r.confidence > 0 && r.confidence < 255);
    // second best is bank 3 (0x00F, distance 3): (3 - 1) * 8
    assert_eq!(r.confidence, 16);
}

#[test]
fn all_ones_hits_seeded_slot() {
    let mut cam = NeuroCam::default();
    let r = search(&mut cam, 0xFFF);
    assert_eq!(r.slot, Some(SlotIndex::new(0, 3)));
    assert_eq!(r.distance, 0);
}

#[test]
fn ambiguous_query_has_zero_confidence() {
    let mut cam = NeuroCam::default();
    cam.set_fuzzy_threshold(4).unwrap();
    // 0x03A is 4 bits from both 0x000 and 0x0FF; every bank bottoms out at 4
    let r = search(&mut cam, 0x03A);
    assert!(r.valid);
    assert_eq!(r.distance, 4);
    assert_eq!(r.slot, Some(SlotIndex::new(0, 0)));
    assert_eq!(r.confidence, 0);
}

#[test]
fn seeded_patterns_match_their_addresses() {
    let mut cam = NeuroCam::default();
    let cases = [
        (0x000, 0),
        (0x0FF, 1),
        (0xF00, 2),
        (0xFFF, 3),
        (0xAAA, 4),
        (0x555, 5),
    ];
    for (pattern, addr) in cases {
        let r = cam.search(Pattern(pattern), MatchMode::Exact).unwrap();
        assert!(r.valid, "pattern {:#05x}", pattern);
        assert_eq!(r.slot_index, Some(addr), "pattern {:#05x}", pattern);
        assert_eq!(r.distance, 0);
    }
}

#[test]
fn written_pattern_is_found_at_its_address() {
    let mut cam = NeuroCam::default();
    cam.write_template(0, 0, Pattern(0x123)).unwrap();
    cam.tick();

    let r = cam.search(Pattern(0x123), MatchMode::Exact).unwrap();
    assert!(r.valid);
    assert_eq!(r.slot_index, Some(0));
    assert_eq!(r.distance, 0);
}

#[test]
fn framed_write_round_trips() {
    let mut cam = NeuroCam::default();
    let mut assembler = FrameAssembler::new(12);
    let beats = [
        Beat::data(0, 0x6),
        Beat::data(1, 0x5),
        Beat {
            cycle: 2,
            nibble: 0x4,
            bank: 2,
            address: 3,
        },
    ];
    let mut frame = None;
    for beat in beats {
        frame = assembler.load(beat).unwrap();
    }
    let frame = frame.expect("final beat completes the frame");
    cam.write_frame(&frame).unwrap();
    cam.tick();

    let r = cam.search(Pattern(0x456), MatchMode::Exact).unwrap();
    assert_eq!(r.slot, Some(SlotIndex::new(2, 3)));
    assert_eq!(r.slot_index, Some(11));
}

#[test]
fn tie_break_prefers_lowest_bank_then_offset() {
    let mut cam = NeuroCam::default();
    cam.write_template(2, 1, Pattern(0x0FF)).unwrap();
    cam.tick();
    cam.write_template(1, 3, Pattern(0x0FF)).unwrap();
    cam.tick();
    let r = search(&mut cam, 0x0FF);
    assert_eq!(r.slot, Some(SlotIndex::new(0, 1)));

    cam.write_template(0, 1, Pattern(0x777)).unwrap();
    cam.tick();
    let r = search(&mut cam, 0x0FF);
    assert_eq!(r.slot, Some(SlotIndex::new(1, 3)));
}

#[test]
fn in_flight_query_sees_store_at_evaluation() {
    let mut cam = NeuroCam::default();
    cam.submit_query(Pattern(0x321), MatchMode::Exact).unwrap();
    cam.tick();
    // commits while the query is still in flight
    cam.write_template(3, 2, Pattern(0x321)).unwrap();
    let results = cam.run_until_idle();
    assert_eq!(results.len(), 1);
    assert!(results[0].valid);
    assert_eq!(results[0].slot, Some(SlotIndex::new(3, 2)));
}

#[test]
fn back_to_back_queries_complete_one_per_tick() {
    let mut cam = NeuroCam::default();
    let queries = [0x000, 0x0FF, 0xF00, 0xFFF, 0xAAA];
    let mut completed = Vec::new();
    for q in queries {
        cam.submit_query(Pattern(q), MatchMode::Exact).unwrap();
        if let Some(r) = cam.tick() {
            completed.push(r.slot_index);
        }
    }
    completed.extend(cam.run_until_idle().into_iter().map(|r| r.slot_index));
    assert_eq!(completed, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    assert_eq!(cam.stats().queries_completed, 5);
}

#[test]
fn history_keeps_most_recent_valid_matches() {
    let mut config = CamConfig::default();
    config.geometry.history_depth = 3;
    let mut cam = NeuroCam::new(config).unwrap();

    for q in [0x000, 0x0FF, 0x7B5, 0xF00, 0xFFF] {
        cam.search(Pattern(q), MatchMode::Exact).unwrap();
    }
    // 0x7B5 misses and is not recorded
    let history: Vec<u16> = cam.read_history().iter().map(|e| e.query.bits()).collect();
    assert_eq!(history, vec![0x0FF, 0xF00, 0xFFF]);
    assert!(cam.read_history().iter().all(|e| e.distance == 0));
}

#[test]
fn learning_enabled_globally_learns_fuzzy_misses() {
    let mut cam = NeuroCam::default();
    cam.set_learning_enabled(true);
    cam.set_fuzzy_threshold(1).unwrap();

    let miss = search(&mut cam, 0x137);
    assert!(!miss.valid);
    assert_eq!(miss.learned, Some(SlotIndex::new(4, 0)));

    let hit = search(&mut cam, 0x137);
    assert!(hit.is_exact());
    assert_eq!(hit.slot_index, Some(16));
    assert_eq!(hit.learned, None);
}

#[test]
fn empty_store_reports_no_match_sentinel() {
    let mut config = CamConfig::default();
    config.seed.profile = neurocam_core::SeedProfile::Empty;
    config.geometry.learned_pool_size = 0;
    let mut cam = NeuroCam::new(config).unwrap();
    cam.set_learning_enabled(true);

    let r = search(&mut cam, 0xABC);
    assert!(!r.valid);
    assert_eq!(r.distance, NO_MATCH_DISTANCE);
    assert_eq!(r.learned, None);
}

#[test]
fn aging_decays_unused_counters() {
    let mut cam = NeuroCam::default();
    let slot = SlotIndex::new(1, 2);
    for _ in 0..32 {
        cam.tick();
    }
    assert_eq!(cam.template(slot).unwrap().recency, 253);
    assert_eq!(cam.stats().aging_sweeps, 2);

    // a hit bumps the counter back up
    let r = cam.search(Pattern(0x333), MatchMode::Exact).unwrap();
    assert_eq!(r.slot, Some(slot));
    assert_eq!(cam.template(slot).unwrap().recency, 254);
}

#[test]
fn sixteen_bit_engine_handles_wide_patterns() {
    let mut cam = NeuroCam::new(CamConfig::wide()).unwrap();
    cam.write_template(3, 3, Pattern(0xBEEF)).unwrap();
    cam.tick();
    let r = cam.search(Pattern(0xBEEE), MatchMode::Fuzzy).unwrap();
    assert!(r.valid);
    assert_eq!(r.slot, Some(SlotIndex::new(3, 3)));
    assert_eq!(r.distance, 1);
}
