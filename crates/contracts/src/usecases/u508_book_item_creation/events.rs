use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::progress::ProgressSnapshot;
use crate::domain::a025_book_item_creator::CreationStatus;
use crate::usecases::common::UseCaseError;

/// Имя события realtime-канала о ходе создания товаров
pub const PROGRESS_EVENT: &str = "book_item_creation_progress";

/// Тело события прогресса в одном из двух форматов
///
/// Порядок вариантов важен: сначала пробуется формат со счётчиками.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressPayload {
    /// `{docname, success, failed, total}` (+ необязательный `current`)
    Counts {
        docname: String,
        success: u32,
        failed: u32,
        total: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current: Option<u32>,
    },
    /// Старый формат по одной строке: `{docname, class, status, current, total}`
    Legacy {
        docname: String,
        class: String,
        status: String,
        current: u32,
        total: u32,
    },
}

impl ProgressPayload {
    pub fn counts(docname: &str, snapshot: ProgressSnapshot) -> Self {
        ProgressPayload::Counts {
            docname: docname.to_string(),
            success: snapshot.success(),
            failed: snapshot.failed(),
            total: snapshot.total(),
            current: Some(snapshot.processed()),
        }
    }

    pub fn docname(&self) -> &str {
        match self {
            ProgressPayload::Counts { docname, .. } => docname,
            ProgressPayload::Legacy { docname, .. } => docname,
        }
    }
}

/// Событие прогресса после нормализации
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub docname: String,
    pub snapshot: ProgressSnapshot,
    /// Сервер обработал все строки; для старого формата `current >= total`,
    /// даже если часть исходов не дошла до клиента
    pub finished: bool,
}

impl ProgressEvent {
    pub fn new(docname: impl Into<String>, snapshot: ProgressSnapshot) -> Self {
        Self {
            docname: docname.into(),
            finished: snapshot.is_complete(),
            snapshot,
        }
    }
}

#[derive(Debug, Default)]
struct SeenClasses {
    created: HashSet<String>,
    failed: HashSet<String>,
}

/// Приводит оба формата события к `ProgressSnapshot`
///
/// Для старого формата success и failed считаются только по классам, чей исход
/// реально пришёл ("Created" / "Failed"); пропущенные строки остаются в очереди.
/// Поэтому нормализатор хранит состояние по документу.
#[derive(Debug, Default)]
pub struct ProgressNormalizer {
    seen: HashMap<String, SeenClasses>,
}

impl ProgressNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Разобрать JSON тела события
    pub fn decode(&mut self, raw: &str) -> Result<ProgressEvent, UseCaseError> {
        let payload: ProgressPayload = serde_json::from_str(raw).map_err(|e| {
            UseCaseError::validation("Malformed progress event").with_details(e.to_string())
        })?;
        self.normalize(payload)
    }

    pub fn normalize(&mut self, payload: ProgressPayload) -> Result<ProgressEvent, UseCaseError> {
        match payload {
            ProgressPayload::Counts {
                docname,
                success,
                failed,
                total,
                ..
            } => Ok(ProgressEvent::new(
                docname,
                ProgressSnapshot::new(success, failed, total)?,
            )),
            ProgressPayload::Legacy {
                docname,
                class,
                status,
                current,
                total,
            } => {
                let seen = self.seen.entry(docname.clone()).or_default();
                match CreationStatus::parse(&status) {
                    Some(CreationStatus::Created) => {
                        seen.failed.remove(&class);
                        seen.created.insert(class);
                    }
                    Some(CreationStatus::Failed) => {
                        if !seen.created.contains(&class) {
                            seen.failed.insert(class);
                        }
                    }
                    _ => {}
                }
                let snapshot = ProgressSnapshot::new(
                    seen.created.len() as u32,
                    seen.failed.len() as u32,
                    total,
                )?;
                Ok(ProgressEvent {
                    docname,
                    snapshot,
                    finished: total > 0 && current >= total,
                })
            }
        }
    }

    /// Забыть накопленное по документу (новый запуск создания)
    pub fn reset(&mut self, docname: &str) {
        self.seen.remove(docname);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_payload() {
        let mut normalizer = ProgressNormalizer::new();
        let event = normalizer
            .decode(r#"{"docname":"BIC-00001","current":2,"total":3,"success":1,"failed":1}"#)
            .unwrap();
        assert_eq!(event.docname, "BIC-00001");
        assert_eq!(event.snapshot, ProgressSnapshot::new(1, 1, 3).unwrap());
    }

    #[test]
    fn test_legacy_payload_counts_distinct_created_classes() {
        let mut normalizer = ProgressNormalizer::new();
        let first = normalizer
            .decode(r#"{"docname":"D","class":"Class 1","status":"Created","current":1,"total":3}"#)
            .unwrap();
        assert_eq!((first.snapshot.success(), first.snapshot.failed()), (1, 0));

        // повтор того же класса не увеличивает success
        let repeat = normalizer
            .decode(r#"{"docname":"D","class":"Class 1","status":"Created","current":1,"total":3}"#)
            .unwrap();
        assert_eq!(repeat.snapshot.success(), 1);

        let failed = normalizer
            .decode(r#"{"docname":"D","class":"Class 2","status":"Failed","current":2,"total":3}"#)
            .unwrap();
        assert_eq!((failed.snapshot.success(), failed.snapshot.failed()), (1, 1));
        assert_eq!(failed.snapshot.pending(), 1);
        assert!(!failed.finished);
    }

    #[test]
    fn test_legacy_unseen_rows_stay_pending() {
        // слушатель подключился к последнему событию запуска
        let mut normalizer = ProgressNormalizer::new();
        let last = normalizer
            .decode(r#"{"docname":"D","class":"Class 3","status":"Created","current":3,"total":3}"#)
            .unwrap();

        assert_eq!(last.snapshot.success(), 1);
        assert_eq!(last.snapshot.failed(), 0);
        assert_eq!(last.snapshot.pending(), 2);
        assert!(!last.snapshot.is_complete());
        assert!(last.finished);
    }

    #[test]
    fn test_counts_payload_finishes_when_all_processed() {
        let mut normalizer = ProgressNormalizer::new();
        let partial = normalizer
            .decode(r#"{"docname":"D","success":1,"failed":0,"total":2}"#)
            .unwrap();
        let done = normalizer
            .decode(r#"{"docname":"D","success":1,"failed":1,"total":2}"#)
            .unwrap();
        assert!(!partial.finished);
        assert!(done.finished);
    }

    #[test]
    fn test_legacy_state_is_per_document() {
        let mut normalizer = ProgressNormalizer::new();
        normalizer
            .decode(r#"{"docname":"A","class":"Class 1","status":"Created","current":1,"total":2}"#)
            .unwrap();
        let other = normalizer
            .decode(r#"{"docname":"B","class":"Class 1","status":"Failed","current":1,"total":2}"#)
            .unwrap();
        assert_eq!((other.snapshot.success(), other.snapshot.failed()), (0, 1));

        normalizer.reset("A");
        let again = normalizer
            .decode(r#"{"docname":"A","class":"Class 2","status":"Failed","current":1,"total":2}"#)
            .unwrap();
        assert_eq!(again.snapshot.success(), 0);
    }

    #[test]
    fn test_rejects_inconsistent_and_malformed_payloads() {
        let mut normalizer = ProgressNormalizer::new();
        let err = normalizer
            .decode(r#"{"docname":"D","success":3,"failed":1,"total":3}"#)
            .unwrap_err();
        assert!(err.is(crate::usecases::common::usecase_result::INVALID_STATE));
        assert!(normalizer.decode(r#"{"docname":"D"}"#).is_err());
    }

    #[test]
    fn test_counts_payload_serializes_flat() {
        let payload = ProgressPayload::counts("D", ProgressSnapshot::new(1, 0, 2).unwrap());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["docname"], "D");
        assert_eq!(json["current"], 1);
        assert_eq!(payload.docname(), "D");
    }
}
