//! End-to-end ingestion and question answering over real PDF bytes

mod common;

use common::*;
use docchat_rag::config::DedupPolicy;
use docchat_rag::ingestion::{IngestStage, PdfLoader};
use docchat_rag::providers::{EmbeddingProvider, HashingEmbedder};
use docchat_rag::storage::SqliteVectorStore;
use docchat_rag::{Error, IngestOutcome, FALLBACK_ANSWER};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_loader_extracts_pages_in_order() {
    let loaded = PdfLoader.load_bytes("menu.pdf", &bistro_menu()).unwrap();

    assert_eq!(loaded.document.page_count, 2);
    assert_eq!(loaded.pages.len(), 2);
    assert_eq!(loaded.pages[0].number, 1);
    assert!(loaded.pages[0].text.contains("Opening hours"));
    assert!(loaded.pages[1].text.contains("Grilled salmon with lemon butter $24.00"));
    assert!(loaded.pages.iter().all(|p| p.document_id == loaded.document.id));
}

#[tokio::test]
async fn test_bistro_question_is_answered_from_menu() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), llm.clone()).await;

    let report = chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();
    assert_eq!(report.outcome, IngestOutcome::Indexed { chunks: 2 });
    assert!(dir.path().join("data").join("menu.pdf").exists());
    assert_eq!(
        report.stages,
        vec![
            IngestStage::Idle,
            IngestStage::Loading,
            IngestStage::Chunking,
            IngestStage::Embedding,
            IngestStage::CheckingDuplicate,
            IngestStage::Inserting,
            IngestStage::Done,
        ]
    );

    let answer = chat.answer_question("How much is the grilled salmon?").await.unwrap();
    assert!(!answer.is_fallback);
    assert!(answer.text.contains("$24.00"), "unexpected answer: {}", answer.text);
    assert!(answer.sources[0].chunk.content.contains("Grilled salmon"));
    assert_eq!(answer.sources[0].chunk.source.page_number, 2);
    assert_eq!(llm.calls(), 1);

    let prompt = llm.prompts.lock()[0].clone();
    assert!(prompt.contains("Question:\nHow much is the grilled salmon?"));
    assert!(prompt.contains(FALLBACK_ANSWER));
}

#[tokio::test]
async fn test_out_of_context_question_gets_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;
    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();

    let answer = chat.answer_question("Do you offer valet parking?").await.unwrap();
    assert_eq!(answer.text, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_empty_store_returns_fallback_without_models() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), llm.clone()).await;

    let answer = chat.answer_question("What time do you open?").await.unwrap();
    assert_eq!(answer.text, FALLBACK_ANSWER);
    assert!(answer.is_fallback);
    assert!(answer.sources.is_empty());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_legacy_guard_skips_any_document_once_non_empty() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::StoreNonEmpty), ScriptedLlm::new()).await;

    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();
    let before = chat.stats().await.unwrap().entries;

    let other = build_pdf(&[&["Wine list", "House red $8 per glass"]]);
    let report = chat.upload_document("wine.pdf", &other).await.unwrap();

    assert!(matches!(report.outcome, IngestOutcome::Skipped { .. }));
    assert_eq!(report.stages.last(), Some(&IngestStage::Done));
    assert!(!report.stages.contains(&IngestStage::Inserting));
    assert_eq!(chat.stats().await.unwrap().entries, before);
}

#[tokio::test]
async fn test_content_hash_policy_indexes_distinct_documents_once() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;

    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();
    let wine = build_pdf(&[&["Wine list", "House red $8 per glass"]]);
    let report = chat.upload_document("wine.pdf", &wine).await.unwrap();
    assert_eq!(report.outcome, IngestOutcome::Indexed { chunks: 1 });

    // same bytes under a new name
    let again = chat.upload_document("menu-copy.pdf", &bistro_menu()).await.unwrap();
    assert!(matches!(again.outcome, IngestOutcome::Skipped { .. }));

    let stats = chat.stats().await.unwrap();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.documents, 2);
}

#[tokio::test]
async fn test_reopened_index_answers_without_reingesting() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), DedupPolicy::ContentHash);

    {
        let chat = open_chat(config.clone(), ScriptedLlm::new()).await;
        chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();
    }

    let chat = open_chat(config, ScriptedLlm::new()).await;
    assert_eq!(chat.stats().await.unwrap().entries, 2);
    let answer = chat.answer_question("How much is the chocolate lava cake?").await.unwrap();
    assert!(answer.text.contains("$9.00"), "unexpected answer: {}", answer.text);
}

#[tokio::test]
async fn test_invalid_pdf_fails_at_loading_and_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;

    let err = chat.upload_document("notes.pdf", b"definitely not a pdf").await.unwrap_err();
    assert!(matches!(err, Error::Ingest { stage: IngestStage::Loading, .. }));
    assert!(matches!(err.root(), Error::Load { .. }));
    assert_eq!(chat.stats().await.unwrap().entries, 0);
}

#[tokio::test]
async fn test_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;

    let err = chat
        .process_document(&dir.path().join("nowhere.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::Load { .. }));
}

#[tokio::test]
async fn test_upload_strips_path_components() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;

    let report = chat.upload_document("../../menu.pdf", &bistro_menu()).await.unwrap();
    assert_eq!(report.document.filename, "menu.pdf");
    assert!(dir.path().join("data").join("menu.pdf").exists());
    assert!(!dir.path().join("menu.pdf").exists());
}

#[tokio::test]
async fn test_process_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), ScriptedLlm::new()).await;
    let path = write_pdf(dir.path(), "hours.pdf", &[&["Open daily 11am to 10pm"]]);

    let report = chat.process_document(&path).await.unwrap();
    assert!(report.was_indexed());
    assert_eq!(chat.documents().await.unwrap()[0].filename, "hours.pdf");
}

#[tokio::test]
async fn test_single_chunk_closing_time() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), llm.clone()).await;

    let menu = build_pdf(&[&["The bistro closes at 10pm"]]);
    let report = chat.upload_document("bistro.pdf", &menu).await.unwrap();
    assert_eq!(report.outcome, IngestOutcome::Indexed { chunks: 1 });

    let answer = chat.answer_question("When does the bistro close?").await.unwrap();
    assert!(answer.text.contains("10pm"), "unexpected answer: {}", answer.text);
    assert_eq!(answer.sources.len(), 1);
}

#[tokio::test]
async fn test_unrelated_question_reaches_model_and_gets_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::ContentHash), llm.clone()).await;
    let menu = build_pdf(&[&["The bistro closes at 10pm"]]);
    chat.upload_document("bistro.pdf", &menu).await.unwrap();

    let answer = chat.answer_question("What is the capital of France?").await.unwrap();
    assert_eq!(answer.text, FALLBACK_ANSWER);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_reopening_without_writes_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), DedupPolicy::ContentHash);
    {
        let chat = open_chat(config.clone(), ScriptedLlm::new()).await;
        chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();
    }

    let vector = HashingEmbedder::new(DIMENSIONS)
        .unwrap()
        .embed("grilled salmon price")
        .await
        .unwrap();

    let first = SqliteVectorStore::open_or_create(&config.storage.index_dir).unwrap();
    let first_results = first.query(&vector, 4).unwrap();
    let first_count = first.count().unwrap();
    drop(first);

    let second = SqliteVectorStore::open_or_create(&config.storage.index_dir).unwrap();
    let second_results = second.query(&vector, 4).unwrap();

    assert_eq!(second.count().unwrap(), first_count);
    assert_eq!(first_count, 2);
    assert_eq!(first_results.len(), second_results.len());
    for (a, b) in first_results.iter().zip(&second_results) {
        assert_eq!(a.chunk.id, b.chunk.id);
        assert_eq!(a.score, b.score);
    }
}

#[tokio::test]
async fn test_legacy_guard_skips_reupload_of_textless_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let chat = open_chat(test_config(dir.path(), DedupPolicy::StoreNonEmpty), ScriptedLlm::new()).await;
    let blank = build_pdf(&[&[]]);

    let first = chat.upload_document("blank.pdf", &blank).await.unwrap();
    assert_eq!(first.outcome, IngestOutcome::Indexed { chunks: 0 });

    let second = chat.upload_document("blank.pdf", &blank).await.unwrap();
    assert!(matches!(second.outcome, IngestOutcome::Skipped { .. }));
    assert!(!second.stages.contains(&IngestStage::Inserting));

    let stats = chat.stats().await.unwrap();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.documents, 1);
}

#[tokio::test]
async fn test_query_embedding_failure_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = SwitchableEmbedder::new();
    let llm = ScriptedLlm::new();
    let config = test_config(dir.path(), DedupPolicy::ContentHash);
    let chat = open_chat_with(config, embedder.clone(), llm.clone()).await;
    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();

    embedder.set_mode(EmbedMode::Fail);
    let err = chat.answer_question("How much is the soup?").await.unwrap_err();

    assert!(matches!(err, Error::Query { .. }));
    assert!(matches!(err.root(), Error::Embedding(_)));
    assert_eq!(llm.calls(), 0);
    assert_eq!(chat.stats().await.unwrap().entries, 2);
}

#[tokio::test]
async fn test_query_generation_failure_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(FailingLlm::default());
    let config = test_config(dir.path(), DedupPolicy::ContentHash);
    let chat = open_chat_with(config, SwitchableEmbedder::new(), llm.clone()).await;
    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();

    let err = chat.answer_question("How much is the soup?").await.unwrap_err();

    assert!(matches!(err, Error::Query { .. }));
    assert!(matches!(err.root(), Error::Synthesis(_)));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(chat.stats().await.unwrap().entries, 2);
}

#[tokio::test]
async fn test_query_embedding_timeout_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = SwitchableEmbedder::new();
    let llm = ScriptedLlm::new();
    let mut config = test_config(dir.path(), DedupPolicy::ContentHash);
    config.embeddings.timeout_secs = 1;
    let chat = open_chat_with(config, embedder.clone(), llm.clone()).await;
    chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap();

    embedder.set_mode(EmbedMode::Stall);
    let err = chat.answer_question("How much is the soup?").await.unwrap_err();

    assert!(matches!(err, Error::Query { .. }));
    assert!(matches!(err.root(), Error::Timeout { .. }));
    assert_eq!(llm.calls(), 0);
    assert_eq!(chat.stats().await.unwrap().entries, 2);
}

#[tokio::test]
async fn test_ingest_embedding_timeout_fails_embedding_stage() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = SwitchableEmbedder::new();
    let mut config = test_config(dir.path(), DedupPolicy::ContentHash);
    config.embeddings.timeout_secs = 1;
    let chat = open_chat_with(config, embedder.clone(), ScriptedLlm::new()).await;

    embedder.set_mode(EmbedMode::Stall);
    let err = chat.upload_document("menu.pdf", &bistro_menu()).await.unwrap_err();

    assert!(matches!(err, Error::Ingest { stage: IngestStage::Embedding, .. }));
    assert!(matches!(err.root(), Error::Timeout { .. }));
    let stats = chat.stats().await.unwrap();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.documents, 0);
}
