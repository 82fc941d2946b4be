// tests/dedup_order.rs
use news_briefing::ingest::dedup::{title_similarity, DedupVerdict, NearDuplicateDetector};

const T1: &str = "Sports council audit finds misuse of subsidies";
const T2: &str = "Sports council audit finds misuse of subsidy funds";
const OTHER: &str = "Webtoon standard contract revised after complaints";

fn run(order: &[(&str, &str)]) -> Vec<String> {
    let mut d = NearDuplicateDetector::new(0.6);
    order
        .iter()
        .filter(|(link, title)| d.check_and_insert(link, title).is_accepted())
        .map(|(_, title)| title.to_string())
        .collect()
}

#[test]
fn first_seen_wins_in_either_order() {
    assert!(title_similarity(T1, T2) >= 0.6);
    assert_eq!(
        run(&[("https://a.test/1", T1), ("https://b.test/2", T2)]),
        vec![T1.to_string()]
    );
    assert_eq!(
        run(&[("https://b.test/2", T2), ("https://a.test/1", T1)]),
        vec![T2.to_string()]
    );
}

#[test]
fn same_link_is_rejected_even_with_new_title() {
    let mut d = NearDuplicateDetector::new(0.6);
    assert!(d.check_and_insert("https://a.test/1", T1).is_accepted());
    assert_eq!(
        d.check_and_insert(" https://a.test/1 ", OTHER),
        DedupVerdict::DuplicateLink
    );
    assert_eq!(d.accepted_count(), 1);
}

#[test]
fn no_two_survivors_share_a_link_even_when_empty() {
    let kept = run(&[("", T1), ("", OTHER), ("https://a.test/9", OTHER)]);
    assert_eq!(kept, vec![T1.to_string()]);
}

#[test]
fn accepted_titles_stay_pairwise_below_threshold() {
    let titles = [
        T1,
        T2,
        OTHER,
        "Webtoon standard contract revised after complaint",
        "Heritage impact assessment halts resort project",
        "Museum safety lapses flagged in ministry review",
        "Museum safety lapses flagged in ministry reviews",
    ];
    let mut d = NearDuplicateDetector::new(0.6);
    let kept: Vec<&str> = titles
        .iter()
        .enumerate()
        .filter(|(i, t)| d.check_and_insert(&format!("https://n.test/{i}"), t).is_accepted())
        .map(|(_, t)| *t)
        .collect();

    assert_eq!(kept.len(), 4);
    for (i, a) in kept.iter().enumerate() {
        for b in &kept[i + 1..] {
            assert!(title_similarity(a, b) <= 0.6, "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn only_ratios_above_threshold_are_rejected() {
    let mut d = NearDuplicateDetector::new(0.6);
    assert!(d.check_and_insert("https://a.test/1", "abcdefghij").is_accepted());
    // exactly 0.6 is not "above"
    assert_eq!(d.check("https://a.test/2", "abcdefWXYZ"), DedupVerdict::Accepted);
    match d.check("https://a.test/3", "abcdefghXY") {
        DedupVerdict::SimilarTitle { similarity } => assert!(similarity > 0.6),
        other => panic!("expected SimilarTitle, got {other:?}"),
    }
}
