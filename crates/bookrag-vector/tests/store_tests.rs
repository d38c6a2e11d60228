use bookrag_core::traits::Retriever;
use bookrag_core::types::Chunk;
use bookrag_vector::{LanceStore, StoreBuilder};
use tempfile::TempDir;

fn unit(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot] = 1.0;
    v
}

fn sample_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("data/books/alice.md", "Alice followed the rabbit.".into(), 0, 0),
        Chunk::new("data/books/alice.md", "The Queen of Hearts shouted.".into(), 20, 1),
        Chunk::new("data/books/other.md", "Unrelated notes on gardening.".into(), 0, 0),
    ]
}

async fn build_store(
    target: &std::path::Path,
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
) -> anyhow::Result<()> {
    let mut builder = StoreBuilder::create(target).await?;
    builder.add(chunks, vectors).await?;
    builder.commit("test-embedder", 2).await?;
    Ok(())
}

#[tokio::test]
async fn build_commit_and_search() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    let chunks = sample_chunks();
    let vectors = vec![unit(4, 0), unit(4, 1), unit(4, 2)];
    build_store(&target, &chunks, &vectors).await?;

    assert!(target.is_dir());
    assert!(!tmp.path().join(".store.staging").exists());

    let store = LanceStore::open(&target).await?;
    assert!(store.is_present());
    assert_eq!(store.embedder_id(), Some("test-embedder"));
    assert_eq!(store.count_rows().await?, 3);
    let meta = store.meta().unwrap();
    assert_eq!(meta.dimension, 4);
    assert_eq!(meta.document_count, 2);
    assert_eq!(meta.chunk_count, 3);

    let results = store.retrieve(&unit(4, 1), 2).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, "data/books/alice.md:1");
    assert!((results[0].score - 1.0).abs() < 1e-4);
    assert!(results[0].score >= results[1].score);
    for r in &results {
        assert!((0.0..=1.0).contains(&r.score));
    }
    Ok(())
}

#[tokio::test]
async fn scores_are_descending_for_mixed_vectors() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    let s = std::f32::consts::FRAC_1_SQRT_2;
    let vectors = vec![vec![1.0, 0.0, 0.0], vec![s, s, 0.0], vec![0.0, 0.0, 1.0]];
    build_store(&target, &sample_chunks(), &vectors).await?;

    let store = LanceStore::open(&target).await?;
    let results = store.retrieve(&[1.0, 0.0, 0.0], 3).await?;
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["data/books/alice.md:0", "data/books/alice.md:1", "data/books/other.md:0"]
    );
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results[2].score < 0.1);
    Ok(())
}

#[tokio::test]
async fn all_chunks_roundtrips_fields() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    let chunks = sample_chunks();
    build_store(&target, &chunks, &[unit(3, 0), unit(3, 1), unit(3, 2)]).await?;

    let store = LanceStore::open(&target).await?;
    let stored = store.all_chunks().await?;
    assert_eq!(stored, chunks);
    Ok(())
}

#[tokio::test]
async fn dropped_builder_keeps_previous_store() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    build_store(&target, &sample_chunks(), &[unit(3, 0), unit(3, 1), unit(3, 2)]).await?;

    {
        let mut builder = StoreBuilder::create(&target).await?;
        builder.add(&sample_chunks()[..1], &[unit(3, 0)]).await?;
        // a dimension change mid-build fails the batch
        let err = builder.add(&sample_chunks()[1..2], &[unit(5, 0)]).await;
        assert!(err.is_err());
    }

    assert!(!tmp.path().join(".store.staging").exists());
    let store = LanceStore::open(&target).await?;
    assert_eq!(store.count_rows().await?, 3);
    Ok(())
}

#[tokio::test]
async fn empty_commit_produces_empty_store() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    build_store(&target, &sample_chunks(), &[unit(3, 0), unit(3, 1), unit(3, 2)]).await?;

    let builder = StoreBuilder::create(&target).await?;
    let meta = builder.commit("test-embedder", 0).await?;
    assert_eq!(meta.chunk_count, 0);

    let store = LanceStore::open(&target).await?;
    assert!(store.is_present());
    assert_eq!(store.count_rows().await?, 0);
    assert!(store.retrieve(&unit(3, 0), 3).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn absent_store_retrieves_nothing() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("missing");
    let store = LanceStore::open(&target).await?;
    assert!(!store.is_present());
    assert_eq!(store.embedder_id(), None);
    assert!(store.retrieve(&unit(3, 0), 3).await?.is_empty());
    assert!(LanceStore::open_existing(&target).await.is_err());

    std::fs::create_dir_all(&target)?;
    let store = LanceStore::open(&target).await?;
    assert!(!store.is_present());
    Ok(())
}

#[tokio::test]
async fn query_dimension_must_match() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    build_store(&target, &sample_chunks(), &[unit(3, 0), unit(3, 1), unit(3, 2)]).await?;
    let store = LanceStore::open(&target).await?;
    assert!(store.retrieve(&unit(4, 0), 3).await.is_err());
    Ok(())
}

#[tokio::test]
async fn moderate_similarity_clears_default_threshold() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let target = tmp.path().join("store");
    // cosine similarities 0.8, 0.75 and 0.0 against the query below
    let vectors = vec![
        vec![0.8, 0.6, 0.0],
        vec![0.75, 0.0, (1.0f32 - 0.75 * 0.75).sqrt()],
        vec![0.0, 0.0, 1.0],
    ];
    build_store(&target, &sample_chunks(), &vectors).await?;

    let store = LanceStore::open(&target).await?;
    let results = store.retrieve(&[1.0, 0.0, 0.0], 3).await?;
    assert_eq!(results[0].chunk.id, "data/books/alice.md:0");
    assert!((results[0].score - 0.717).abs() < 1e-3, "{}", results[0].score);
    assert!(results[0].score >= 0.7);
    assert!((results[1].score - 0.646).abs() < 1e-3, "{}", results[1].score);
    assert!(results[1].score < 0.7);
    assert_eq!(results[2].score, 0.0);
    Ok(())
}
