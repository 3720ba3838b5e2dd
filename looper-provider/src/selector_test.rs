use std::collections::HashMap;
use std::sync::Arc;

use super::{LayerSelector, Tier, parse_codec_filter, truncate};
use crate::{
    catalog::{Catalog, Ladder},
    error::LooperError,
    rotation::RotationCounter,
    spec::VideoCodec,
};

/// One H.264 and one VP8 ladder.
fn two_ladder_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(
        vec![
            Ladder::generate("butterfly", VideoCodec::H264, &[150, 400, 2000]),
            Ladder::generate("crescent", VideoCodec::Vp8, &[150, 600, 2000]),
        ],
        vec!["change-ken".to_string()],
    ))
}

// ------------------------------------------------------------------------
// Tier and filter parsing
// ------------------------------------------------------------------------

#[test]
fn test_tier_parse() {
    assert_eq!(Tier::parse("low"), Tier::Low);
    assert_eq!(Tier::parse("medium"), Tier::Medium);
    assert_eq!(Tier::parse("high"), Tier::High);
    assert_eq!(Tier::parse(""), Tier::High);
    assert_eq!(Tier::parse("ultra"), Tier::High);
    assert_eq!(Tier::Low.layer_count(), 1);
    assert_eq!(Tier::Medium.layer_count(), 2);
    assert_eq!(Tier::High.layer_count(), 3);
}

#[test]
fn test_parse_codec_filter() {
    assert_eq!(parse_codec_filter("").unwrap(), None);
    assert_eq!(parse_codec_filter("h264").unwrap(), Some(VideoCodec::H264));
    assert_eq!(parse_codec_filter("VP8").unwrap(), Some(VideoCodec::Vp8));
    match parse_codec_filter("av1") {
        Err(LooperError::NoMatchingLadder { codec }) => assert_eq!(codec, "av1"),
        other => panic!("Expected NoMatchingLadder, got {:?}", other),
    }
}

// ------------------------------------------------------------------------
// Truncation
// ------------------------------------------------------------------------

#[test]
fn test_truncate_simulcast_keeps_prefix() {
    let ladder = Ladder::generate("butterfly", VideoCodec::H264, &[150, 400, 2000]);
    for (tier, expected) in [(Tier::Low, 1), (Tier::Medium, 2), (Tier::High, 3)] {
        let specs = truncate(&ladder, tier, true).unwrap();
        assert_eq!(specs.len(), expected);
        assert_eq!(&specs[..], &ladder.specs()[..expected]);
    }
}

#[test]
fn test_truncate_without_simulcast_keeps_top_of_prefix() {
    let ladder = Ladder::generate("butterfly", VideoCodec::H264, &[150, 400, 2000]);

    let low = truncate(&ladder, Tier::Low, false).unwrap();
    assert_eq!(low, vec![ladder.specs()[0].clone()]);

    let medium = truncate(&ladder, Tier::Medium, false).unwrap();
    assert_eq!(medium, vec![ladder.specs()[1].clone()]);

    let high = truncate(&ladder, Tier::High, false).unwrap();
    assert_eq!(high, vec![ladder.specs()[2].clone()]);
}

#[test]
fn test_truncate_short_ladder_invalid_tier() {
    let ladder = Ladder::generate("neon", VideoCodec::Vp8, &[150, 600]);
    assert!(truncate(&ladder, Tier::Medium, true).is_ok());
    match truncate(&ladder, Tier::High, false) {
        Err(LooperError::InvalidTier {
            tier,
            requested,
            available,
            ..
        }) => {
            assert_eq!(tier, Tier::High);
            assert_eq!(requested, 3);
            assert_eq!(available, 2);
        }
        other => panic!("Expected InvalidTier, got {:?}", other),
    }
}

// ------------------------------------------------------------------------
// Selection
// ------------------------------------------------------------------------

#[test]
fn test_select_low_h264_returns_lowest_h264_layer() {
    let catalog = two_ladder_catalog();
    let selector = LayerSelector::new(Arc::clone(&catalog));
    let specs = selector
        .select(Tier::Low, Some(VideoCodec::H264), true)
        .unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0], catalog.video_ladders()[0].specs()[0]);
    assert_eq!(specs[0].kbps, 150);
    assert_eq!(specs[0].height, 180);
}

#[test]
fn test_select_high_without_simulcast_returns_top_layer() {
    let catalog = two_ladder_catalog();
    let selector = LayerSelector::new(Arc::clone(&catalog));
    for _ in 0..4 {
        let specs = selector.select(Tier::High, None, false).unwrap();
        assert_eq!(specs.len(), 1);
        let ladder = catalog
            .video_ladders()
            .iter()
            .find(|l| l.prefix() == specs[0].prefix)
            .unwrap();
        assert_eq!(&specs[0], ladder.specs().last().unwrap());
    }
}

#[test]
fn test_layer_counts_for_every_combination() {
    let selector = LayerSelector::new(Catalog::builtin());
    for codec in [None, Some(VideoCodec::H264), Some(VideoCodec::Vp8)] {
        for tier in [Tier::Low, Tier::Medium, Tier::High] {
            let simulcast = selector.select(tier, codec, true).unwrap();
            assert_eq!(simulcast.len(), tier.layer_count());
            let single = selector.select(tier, codec, false).unwrap();
            assert_eq!(single.len(), 1);
        }
    }
}

#[test]
fn test_filter_only_returns_matching_codec() {
    let selector = LayerSelector::new(Catalog::builtin());
    for codec in [VideoCodec::H264, VideoCodec::Vp8] {
        for _ in 0..12 {
            let specs = selector.select(Tier::High, Some(codec), true).unwrap();
            assert!(specs.iter().all(|s| s.codec == codec));
        }
    }
}

#[test]
fn test_no_matching_ladder() {
    let catalog = Arc::new(Catalog::new(
        vec![Ladder::generate("butterfly", VideoCodec::H264, &[150, 400, 2000])],
        vec!["change-ken".to_string()],
    ));
    let selector = LayerSelector::new(catalog);
    match selector.select(Tier::High, Some(VideoCodec::Vp8), true) {
        Err(LooperError::NoMatchingLadder { codec }) => assert_eq!(codec, "vp8"),
        other => panic!("Expected NoMatchingLadder, got {:?}", other),
    }
    // rotation is not advanced when nothing matches
    assert_eq!(selector.rotation().count(), 0);
}

#[test]
fn test_rotation_visits_every_ladder_once_per_cycle() {
    let selector = LayerSelector::new(Catalog::builtin());
    let total = selector.catalog().video_ladders().len();
    for _ in 0..3 {
        let mut seen: Vec<String> = (0..total)
            .map(|_| selector.select(Tier::Low, None, true).unwrap()[0].prefix.clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
    }
}

#[test]
fn test_rotation_within_filtered_set() {
    let selector = LayerSelector::new(Catalog::builtin());
    let mut seen: Vec<String> = (0..3)
        .map(|_| {
            selector.select(Tier::Low, Some(VideoCodec::Vp8), true).unwrap()[0]
                .prefix
                .clone()
        })
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["crescent", "neon", "tunnel"]);
}

#[test]
fn test_injected_rotation_starts_where_told() {
    let catalog = two_ladder_catalog();
    let selector = LayerSelector::with_rotation(Arc::clone(&catalog), RotationCounter::starting_at(1));
    // count becomes 2, 2 % 2 == 0
    let specs = selector.select(Tier::Low, None, true).unwrap();
    assert_eq!(specs[0].prefix, "butterfly");
    let specs = selector.select(Tier::Low, None, true).unwrap();
    assert_eq!(specs[0].prefix, "crescent");
}

#[test]
fn test_concurrent_selection() {
    let selector = Arc::new(LayerSelector::new(Catalog::builtin()));
    let workers = 16;
    let per_worker = 60;
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let selector = Arc::clone(&selector);
            std::thread::spawn(move || {
                (0..per_worker)
                    .map(|_| selector.select(Tier::Medium, None, true).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut per_ladder: HashMap<String, usize> = HashMap::new();
    for handle in handles {
        for specs in handle.join().unwrap() {
            assert_eq!(specs.len(), 2);
            *per_ladder.entry(specs[0].prefix.clone()).or_default() += 1;
        }
    }
    assert_eq!(per_ladder.values().sum::<usize>(), workers * per_worker);
    // 960 selections over 6 ladders
    assert_eq!(per_ladder.len(), 6);
    assert!(per_ladder.values().all(|&n| n == workers * per_worker / 6));
}
