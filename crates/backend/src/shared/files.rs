use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Загруженный или сформированный сервером файл
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// In-memory хранилище файлов (CSV импорт, выгрузки)
///
/// Файлы старше `retention` удаляются при каждом сохранении.
pub struct FileStore {
    public_prefix: String,
    retention: Duration,
    files: RwLock<HashMap<Uuid, StoredFile>>,
}

impl FileStore {
    pub fn new(public_prefix: &str, retention: Duration) -> Self {
        Self {
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            retention,
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Сохранить файл и вернуть его публичный URL
    pub async fn save(&self, file_name: &str, content_type: &str, content: Vec<u8>) -> String {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let file = StoredFile {
            id,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            content,
            created_at: now,
        };

        let mut files = self.files.write().await;
        let before = files.len();
        files.retain(|_, f| now - f.created_at < self.retention);
        let expired = before - files.len();
        if expired > 0 {
            tracing::debug!("Evicted {} expired files", expired);
        }
        files.insert(id, file);

        tracing::debug!("Stored file {} as {}", file_name, id);
        self.url_for(id)
    }

    pub fn url_for(&self, id: Uuid) -> String {
        format!("{}/{}", self.public_prefix, id)
    }

    pub async fn get(&self, id: Uuid) -> Option<StoredFile> {
        self.files.read().await.get(&id).cloned()
    }

    /// Найти файл по URL, выданному `save`
    pub async fn get_by_url(&self, file_url: &str) -> Option<StoredFile> {
        let id = self.id_from_url(file_url)?;
        self.get(id).await
    }

    /// Забрать файл по URL: после чтения он удаляется из хранилища
    pub async fn take_by_url(&self, file_url: &str) -> Option<StoredFile> {
        let id = self.id_from_url(file_url)?;
        self.files.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    fn id_from_url(&self, file_url: &str) -> Option<Uuid> {
        let id = file_url
            .trim()
            .strip_prefix(&self.public_prefix)?
            .trim_start_matches('/');
        Uuid::parse_str(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_resolve_by_url() {
        let store = FileStore::new("/api/u508/files/", Duration::minutes(60));
        let url = store.save("a.csv", "text/csv", b"Class\n".to_vec()).await;
        assert!(url.starts_with("/api/u508/files/"));
        let file = store.get_by_url(&url).await.unwrap();
        assert_eq!(file.file_name, "a.csv");
        assert!(store.get_by_url("/other/prefix").await.is_none());
        assert!(store.get_by_url("/api/u508/files/not-a-uuid").await.is_none());
    }

    #[tokio::test]
    async fn test_taken_file_is_removed() {
        let store = FileStore::new("/api/u508/files", Duration::minutes(60));
        let url = store.save("rows.csv", "text/csv", b"Class\n".to_vec()).await;

        assert!(store.take_by_url(&url).await.is_some());
        assert!(store.take_by_url(&url).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_expired_files_are_evicted_on_save() {
        let store = FileStore::new("/api/u508/files", Duration::zero());
        let first = store.save("old.csv", "text/csv", Vec::new()).await;
        let second = store.save("new.csv", "text/csv", Vec::new()).await;

        assert!(store.get_by_url(&first).await.is_none());
        assert!(store.get_by_url(&second).await.is_some());
        assert_eq!(store.len().await, 1);
    }
}
