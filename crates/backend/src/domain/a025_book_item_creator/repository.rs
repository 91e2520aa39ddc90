use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use contracts::domain::a025_book_item_creator::{BookItemCreator, DocStatus};
use contracts::domain::common::AggregateRoot;
use tokio::sync::RwLock;

/// In-memory хранилище документов Book Item Creator, ключ = номер документа
pub struct BookItemCreatorRepository {
    docs: RwLock<BTreeMap<String, BookItemCreator>>,
    sequence: AtomicU32,
}

impl BookItemCreatorRepository {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            sequence: AtomicU32::new(0),
        }
    }

    /// Следующий номер документа вида "BIC-00001"
    pub fn next_name(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("BIC-{:05}", n)
    }

    pub async fn insert(&self, doc: BookItemCreator) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(doc.name()) {
            anyhow::bail!("{} {} already exists", BookItemCreator::element_name(), doc.name());
        }
        tracing::debug!("{}: inserted {}", BookItemCreator::full_name(), doc.name());
        docs.insert(doc.name().to_string(), doc);
        Ok(())
    }

    /// Перезаписать существующий документ
    pub async fn save(&self, doc: &BookItemCreator) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(doc.name()) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(())
            }
            None => anyhow::bail!("{} {} not found", BookItemCreator::element_name(), doc.name()),
        }
    }

    pub async fn get(&self, name: &str) -> Option<BookItemCreator> {
        self.docs.read().await.get(name).cloned()
    }

    pub async fn list_all(&self) -> Vec<BookItemCreator> {
        self.docs.read().await.values().cloned().collect()
    }

    /// Проведённый документ (кроме `exclude`), в строках которого есть ISBN.
    /// Возвращает (номер документа, класс).
    pub async fn find_isbn_owner(
        &self,
        isbn: &str,
        exclude: Option<&str>,
    ) -> Option<(String, String)> {
        let isbn = isbn.trim();
        let docs = self.docs.read().await;
        docs.values()
            .filter(|d| d.docstatus == DocStatus::Submitted)
            .filter(|d| Some(d.name()) != exclude)
            .find_map(|d| {
                d.class_details
                    .iter()
                    .find(|r| r.isbn_barcode == isbn)
                    .map(|r| (d.name().to_string(), r.class.clone()))
            })
    }
}

impl Default for BookItemCreatorRepository {
    fn default() -> Self {
        Self::new()
    }
}
