use std::collections::BTreeSet;

use fixchain_core::{Device, GuideStep, GuideSummary, SanitizedGuideContent, SearchHit};
use fixchain_graph::nodes::{
    clean_completion, format_community, format_official, pick_device, select_guide, tokenize,
    COMMUNITY_BANNER,
};
use fixchain_graph::ExecutionConfig;

fn guide(id: u64, title: &str, summary: &str) -> GuideSummary {
    GuideSummary {
        id,
        title: title.to_string(),
        summary: summary.to_string(),
    }
}

fn device(id: &str, name: &str) -> Device {
    Device {
        id: id.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn tokenize_splits_on_punctuation_and_lowercases() {
    let tokens = tokenize("PS5: Fan-noise, LOUD!");
    let expected: BTreeSet<String> = ["ps5", "fan", "noise", "loud"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(tokens, expected);
}

#[test]
fn select_prefers_highest_overlap() {
    let guides = vec![
        guide(1, "PlayStation 5 Disc Drive Replacement", ""),
        guide(2, "PlayStation 5 Fan Replacement", "Replace a noisy fan"),
    ];
    let picked = select_guide("PlayStation 5 fan noise", &guides).unwrap();
    assert_eq!(picked.id, 2);
}

#[test]
fn select_breaks_ties_by_earliest_position() {
    let guides = vec![
        guide(7, "Battery Replacement", ""),
        guide(8, "Battery Connector Replacement", ""),
        guide(9, "Screen Replacement", ""),
    ];
    let picked = select_guide("battery", &guides).unwrap();
    assert_eq!(picked.id, 7);

    let picked = select_guide("nothing in common", &guides).unwrap();
    assert_eq!(picked.id, 7);
}

#[test]
fn select_repeated_query_words_count_once() {
    let guides = vec![
        guide(1, "Fan Fan Fan", ""),
        guide(2, "Fan Cleaning", "dust"),
    ];
    let picked = select_guide("fan fan fan dust", &guides).unwrap();
    assert_eq!(picked.id, 2);
}

#[test]
fn select_is_reproducible() {
    let guides = vec![
        guide(1, "Fan Replacement", "fan"),
        guide(2, "Fan Cleaning", "fan"),
    ];
    let first = select_guide("clean the fan", &guides).map(|g| g.id);
    for _ in 0..10 {
        assert_eq!(select_guide("clean the fan", &guides).map(|g| g.id), first);
    }
    assert_eq!(select_guide("anything", &[]), None);
}

#[test]
fn device_exact_name_match_beats_order() {
    let devices = vec![
        device("PlayStation_5_Digital", "PlayStation 5 Digital Edition"),
        device("PlayStation_5", "PlayStation 5"),
    ];
    assert_eq!(pick_device("playstation 5", &devices).unwrap().id, "PlayStation_5");
    assert_eq!(
        pick_device("PS5 fan", &devices).unwrap().id,
        "PlayStation_5_Digital"
    );
    assert!(pick_device("PS5", &[]).is_none());

    let accented = vec![device("Xperia", "Xperia"), device("Ecran_Phone", "ÉCRAN Phone")];
    assert_eq!(pick_device(" écran phone ", &accented).unwrap().id, "Ecran_Phone");
}

#[test]
fn completion_is_reduced_to_first_line() {
    assert_eq!(
        clean_completion("\n\"PlayStation 5 fan noise\"\nbecause the user said ps5"),
        Some("PlayStation 5 fan noise".to_string())
    );
    assert_eq!(
        clean_completion("Normalized query: iPhone 12 battery"),
        Some("iPhone 12 battery".to_string())
    );
    assert_eq!(clean_completion("   \n ``` "), None);
}

fn sample_guide() -> SanitizedGuideContent {
    SanitizedGuideContent {
        title: "PlayStation 5 Fan Replacement".to_string(),
        subject: "PlayStation 5".to_string(),
        introduction: "Replace a noisy fan.".to_string(),
        difficulty: "Moderate".to_string(),
        time_required: String::new(),
        tools: ["Spudger".to_string(), "Phillips #1".to_string()].into(),
        parts: BTreeSet::new(),
        steps: vec![
            GuideStep {
                order: 1,
                text: "Remove the cover".to_string(),
                image_urls: vec![
                    "https://img.example.com/1.jpg".to_string(),
                    "https://img.example.com/2.jpg".to_string(),
                ],
                tools: BTreeSet::new(),
                parts: BTreeSet::new(),
            },
            GuideStep {
                order: 2,
                text: "Lift the fan out".to_string(),
                image_urls: Vec::new(),
                tools: BTreeSet::new(),
                parts: BTreeSet::new(),
            },
        ],
    }
}

#[test]
fn official_format_has_heading_steps_and_images() {
    let text = format_official(&sample_guide());

    assert!(text.starts_with("# PlayStation 5 Fan Replacement\n"));
    assert!(text.contains("**Time Required:** N/A"));
    assert!(text.contains("## Tools Needed\n- Phillips #1\n- Spudger\n"));
    assert!(!text.contains("## Parts"));
    let step_one = text.find("### Step 1").unwrap();
    let step_two = text.find("### Step 2").unwrap();
    assert!(step_one < step_two);
    assert!(text.contains("![Step 1](https://img.example.com/1.jpg)\n\n![Step 1](https://img.example.com/2.jpg)"));
}

#[test]
fn formatting_is_deterministic() {
    let guide = sample_guide();
    assert_eq!(format_official(&guide), format_official(&guide.clone()));

    let hits = vec![SearchHit {
        title: "Forum thread".to_string(),
        snippet: "Try this".to_string(),
        url: "https://forum.example.com/t/1".to_string(),
    }];
    assert_eq!(
        format_community("xq9000 broken", &hits),
        format_community("xq9000 broken", &hits)
    );
}

#[test]
fn community_format_carries_banner_and_sources() {
    let hits = vec![
        SearchHit {
            title: "Forum thread".to_string(),
            snippet: "Try this".to_string(),
            url: "https://forum.example.com/t/1".to_string(),
        },
        SearchHit {
            title: "Blog".to_string(),
            snippet: String::new(),
            url: "https://blog.example.com".to_string(),
        },
    ];

    let text = format_community("xq9000 broken", &hits);

    assert!(text.starts_with(COMMUNITY_BANNER));
    assert!(text.contains("unverified community sources"));
    assert!(text.contains("**Query:** xq9000 broken"));
    assert!(text.contains("### 1. Forum thread\nTry this\n[Source](https://forum.example.com/t/1)"));
    assert!(text.contains("### 2. Blog\n[Source](https://blog.example.com)"));
}

#[test]
fn fallback_query_appends_suffix() {
    let config = ExecutionConfig::default();
    assert_eq!(config.fallback_query("  xq9000 broken "), "xq9000 broken repair guide");

    let config = ExecutionConfig {
        fallback_query_suffix: String::new(),
        ..ExecutionConfig::default()
    };
    assert_eq!(config.fallback_query("xq9000"), "xq9000");
}
