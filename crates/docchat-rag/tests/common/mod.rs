//! Shared fixtures: in-memory PDFs, a scripted generator and test configs

#![allow(dead_code)]

use async_trait::async_trait;
use docchat_rag::config::{DedupPolicy, EmbeddingBackend, LlmBackend, RagConfig};
use docchat_rag::providers::{EmbeddingProvider, HashingEmbedder, LlmProvider, LocalVectorStore};
use docchat_rag::{DocumentChat, Error, Result, FALLBACK_ANSWER};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DIMENSIONS: usize = 512;

/// Build a PDF with one page per entry; each line gets its own text object
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![50.into(), (780 - 16 * i as i64).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a PDF into `dir` and return its path
pub fn write_pdf(dir: &Path, name: &str, pages: &[&[&str]]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

pub fn bistro_menu() -> Vec<u8> {
    build_pdf(&[
        &[
            "Byte and Spice Bistro",
            "Opening hours: Monday to Friday 11am to 10pm",
            "Weekend brunch: Saturday and Sunday 9am to 3pm",
        ],
        &[
            "Menu",
            "Tomato basil soup $6.50",
            "Grilled salmon with lemon butter $24.00",
            "Chocolate lava cake $9.00",
        ],
    ])
}

/// Generator that follows the instruction contract using plain string matching:
/// it answers with the context line sharing the most keywords with the
/// question, or the fallback sentence when no line shares any.
pub struct ScriptedLlm {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.rfind(start).map(|i| i + start.len()).unwrap_or(0);
    let to = prompt[from..].find(end).map(|i| from + i).unwrap_or(prompt.len());
    &prompt[from..to]
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        let context = section(prompt, "Context:\n", "\n\nQuestion:");
        let question = section(prompt, "Question:\n", "\n\nAnswer:").to_lowercase();
        let keywords: Vec<&str> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .collect();

        let mut best: Option<(&str, usize)> = None;
        for line in context.lines() {
            let lower = line.to_lowercase();
            let hits = keywords.iter().filter(|k| lower.contains(*k)).count();
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((line, hits));
            }
        }

        let answer = best
            .map(|(line, _)| line.to_string())
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
        Ok(answer)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Generator whose every call fails
#[derive(Default)]
pub struct FailingLlm {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::synthesis("model overloaded"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-1"
    }
}

/// How `SwitchableEmbedder` answers the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    Normal,
    Fail,
    Stall,
}

/// Hashing embedder that can be switched to fail or hang mid-test
pub struct SwitchableEmbedder {
    inner: HashingEmbedder,
    mode: Mutex<EmbedMode>,
}

impl SwitchableEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashingEmbedder::new(DIMENSIONS).unwrap(),
            mode: Mutex::new(EmbedMode::Normal),
        })
    }

    pub fn set_mode(&self, mode: EmbedMode) {
        *self.mode.lock() = mode;
    }
}

#[async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mode = *self.mode.lock();
        match mode {
            EmbedMode::Normal => self.inner.embed(text).await,
            EmbedMode::Fail => Err(Error::embedding("embedding model offline")),
            EmbedMode::Stall => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                self.inner.embed(text).await
            }
        }
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "switchable"
    }
}

/// Offline config rooted at `root`
pub fn test_config(root: &Path, dedup: DedupPolicy) -> RagConfig {
    let mut config = RagConfig::default();
    config.storage.data_dir = root.join("data");
    config.storage.index_dir = root.join("vector_index");
    config.embeddings.provider = EmbeddingBackend::Hashing;
    config.embeddings.dimensions = DIMENSIONS;
    config.llm.provider = LlmBackend::Ollama;
    config.ingestion.dedup = dedup;
    config
}

/// Facade over the hashing embedder, an on-disk index and the scripted generator
pub async fn open_chat(config: RagConfig, llm: Arc<ScriptedLlm>) -> DocumentChat {
    open_chat_with(config, Arc::new(HashingEmbedder::new(DIMENSIONS).unwrap()), llm).await
}

/// Facade over an on-disk index and the given models
pub async fn open_chat_with(
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
) -> DocumentChat {
    let store = LocalVectorStore::open_or_create(&config.storage.index_dir).unwrap();
    DocumentChat::with_providers(config, embedder, llm, Arc::new(store))
        .await
        .unwrap()
}
