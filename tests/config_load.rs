// tests/config_load.rs
use news_briefing::config::{resolve_secret, BriefingConfig, SearchProviderKind, ENV_CONFIG_PATH};
use news_briefing::ingest::recency::DateParsePolicy;
use news_briefing::BasketPriority;
use std::{env, fs};

const SAMPLE: &str = r#"
[search]
provider = "google_news"
sort = "sim"

[filter]
lookback_hours = 48
date_parse_policy = "keep"
noise_words = ["festival", "  "]

[drafting]
provider = "mock"

[[baskets]]
name = "Governance"
priority = "primary"
keywords = ["audit"]

[[baskets]]
name = "Recall"
priority = "recall"
keywords = ["ministry controversy"]
"#;

#[test]
fn parses_sections_and_enums() {
    let cfg = BriefingConfig::parse(SAMPLE).unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.search.provider, SearchProviderKind::GoogleNews);
    assert_eq!(
        cfg.search.sort,
        news_briefing::ingest::types::SortOrder::Relevance
    );
    assert_eq!(cfg.filter.lookback(), chrono::Duration::hours(48));
    assert_eq!(cfg.filter.date_parse_policy, DateParsePolicy::Keep);
    assert_eq!(cfg.filter.noise_words, vec!["festival".to_string()]);
    assert_eq!(cfg.baskets[1].priority, BasketPriority::Recall);
    // untouched sections keep defaults
    assert_eq!(cfg.history.retention, 5);
    assert_eq!(cfg.email.smtp_port, 465);
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/briefing.toml");
    let cfg = BriefingConfig::load_from(std::path::Path::new(path)).unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.baskets.len(), 5);
    assert_eq!(cfg.baskets[4].priority, BasketPriority::Recall);
    assert!(!cfg.filter.noise_words.is_empty());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing on disk -> defaults, no baskets
    let cfg = BriefingConfig::load_default().unwrap();
    assert!(cfg.baskets.is_empty());

    // 2) ./config/briefing.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/briefing.toml"), SAMPLE).unwrap();
    let cfg = BriefingConfig::load_default().unwrap();
    assert_eq!(cfg.baskets.len(), 2);

    // 3) env var wins
    let p_env = tmp.path().join("other.toml");
    fs::write(
        &p_env,
        "[[baskets]]\nname = \"Only\"\nkeywords = [\"k\"]\n",
    )
    .unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = BriefingConfig::load_default().unwrap();
    assert_eq!(cfg.baskets.len(), 1);
    assert_eq!(cfg.baskets[0].priority, BasketPriority::Secondary);

    // 4) env var pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(BriefingConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_placeholder_resolves_from_environment() {
    env::set_var("BRIEFING_TEST_SECRET", "s3cret");
    assert_eq!(resolve_secret("ENV", "BRIEFING_TEST_SECRET").unwrap(), "s3cret");

    env::set_var("BRIEFING_TEST_SECRET", "   ");
    assert!(resolve_secret("ENV", "BRIEFING_TEST_SECRET").is_err());

    env::remove_var("BRIEFING_TEST_SECRET");
    assert!(resolve_secret("ENV", "BRIEFING_TEST_SECRET").is_err());
}

#[serial_test::serial]
#[test]
fn drafting_key_follows_provider() {
    let cfg = BriefingConfig::parse(SAMPLE).unwrap();
    assert_eq!(cfg.drafting.resolved_api_key().unwrap(), "");

    let mut gemini = cfg.drafting.clone();
    gemini.provider = "Gemini".to_string();
    env::set_var("GEMINI_API_KEY", "g-key");
    assert_eq!(gemini.resolved_api_key().unwrap(), "g-key");
    env::remove_var("GEMINI_API_KEY");
    assert!(gemini.resolved_api_key().is_err());
}
