use bookrag_core::config::{validate_params, Settings};
use bookrag_core::error::Error;
use bookrag_core::types::RetrievalParams;
use figment::Jail;

#[test]
fn defaults_match_demo_constants() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        let s = Settings::from_figment(Settings::figment_for_env("dev")).expect("settings");
        assert_eq!(s.chunking.chunk_size, 300);
        assert_eq!(s.chunking.chunk_overlap, 100);
        assert_eq!(s.retrieval.k, 3);
        assert!((s.retrieval.relevance_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(s.embedding.model, "text-embedding-ada-002");
        assert_eq!(s.data.source_dir, "data/books");
        assert!(!s.openai.has_api_key());
        Ok(())
    });
}

#[test]
fn files_and_env_are_layered() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("config.toml", "[retrieval]\nk = 4\n[data]\nstore_dir = \"db\"\n")?;
        jail.create_file("config.prod.toml", "[retrieval]\nk = 6\n")?;
        jail.set_env("APP_CHAT__MODEL", "gpt-4o-mini");
        jail.set_env("OPENAI_API_KEY", "sk-test");

        let dev = Settings::from_figment(Settings::figment_for_env("dev")).expect("dev");
        assert_eq!(dev.retrieval.k, 4);
        assert_eq!(dev.data.store_dir, "db");

        let prod = Settings::from_figment(Settings::figment_for_env("prod")).expect("prod");
        assert_eq!(prod.retrieval.k, 6);
        assert_eq!(prod.chat.model, "gpt-4o-mini");
        assert_eq!(prod.openai.require_api_key().expect("key"), "sk-test");
        Ok(())
    });
}

#[test]
fn invalid_chunking_is_rejected() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("config.toml", "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n")?;
        let err = Settings::from_figment(Settings::figment_for_env("dev")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
        Ok(())
    });
}

#[test]
fn api_key_debug_is_redacted() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("OPENAI_API_KEY", "sk-secret");
        let s = Settings::from_figment(Settings::figment_for_env("dev")).expect("settings");
        assert!(!format!("{:?}", s).contains("sk-secret"));
        Ok(())
    });
}

#[test]
fn retrieval_params_bounds() {
    assert!(validate_params(&RetrievalParams { k: 1, relevance_threshold: 0.0 }).is_ok());
    assert!(validate_params(&RetrievalParams { k: 10, relevance_threshold: 1.0 }).is_ok());
    assert!(validate_params(&RetrievalParams { k: 0, relevance_threshold: 0.5 }).is_err());
    assert!(validate_params(&RetrievalParams { k: 11, relevance_threshold: 0.5 }).is_err());
    assert!(validate_params(&RetrievalParams { k: 3, relevance_threshold: 1.1 }).is_err());
}
