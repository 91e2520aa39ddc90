use serde::{Deserialize, Serialize};

use super::response::RetryResponse;
use crate::domain::a025_book_item_creator::{BookClassDetail, CreationStatus};
use crate::usecases::common::UseCaseError;

/// Счётчики создания товаров по одному документу
///
/// Инвариант: `success + failed <= total`. Конструкторы его проверяют,
/// поэтому `pending()` никогда не уходит в минус.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "RawSnapshot")]
pub struct ProgressSnapshot {
    success: u32,
    failed: u32,
    total: u32,
}

#[derive(Deserialize)]
struct RawSnapshot {
    success: u32,
    failed: u32,
    total: u32,
}

impl TryFrom<RawSnapshot> for ProgressSnapshot {
    type Error = UseCaseError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        ProgressSnapshot::new(raw.success, raw.failed, raw.total)
    }
}

/// Итог завершённого создания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Ещё не все строки обработаны
    Waiting,
    AllCreated,
    AllFailed,
    CompletedWithErrors,
}

impl ProgressOutcome {
    pub fn title(&self) -> &'static str {
        match self {
            ProgressOutcome::Waiting => "Creating Items... Please wait",
            ProgressOutcome::AllCreated => "All Items Created Successfully!",
            ProgressOutcome::AllFailed => "All Items Failed!",
            ProgressOutcome::CompletedWithErrors => "Completed with Some Errors",
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            ProgressOutcome::Waiting => "blue",
            ProgressOutcome::AllCreated => "green",
            ProgressOutcome::AllFailed => "red",
            ProgressOutcome::CompletedWithErrors => "orange",
        }
    }
}

impl ProgressSnapshot {
    pub fn new(success: u32, failed: u32, total: u32) -> Result<Self, UseCaseError> {
        let processed = success.checked_add(failed).ok_or_else(|| {
            UseCaseError::invalid_state("progress counters overflow")
        })?;
        if processed > total {
            return Err(UseCaseError::invalid_state(format!(
                "progress {} created + {} failed exceeds total {}",
                success, failed, total
            )));
        }
        Ok(Self {
            success,
            failed,
            total,
        })
    }

    /// Начальное состояние: ничего не обработано
    pub fn zeroed(total: u32) -> Self {
        Self {
            success: 0,
            failed: 0,
            total,
        }
    }

    /// Пересчёт по строкам документа (Created / Failed / остальное = pending)
    pub fn from_rows(rows: &[BookClassDetail]) -> Self {
        let success = rows
            .iter()
            .filter(|r| r.creation_status == CreationStatus::Created)
            .count() as u32;
        let failed = rows
            .iter()
            .filter(|r| r.creation_status == CreationStatus::Failed)
            .count() as u32;
        Self {
            success,
            failed,
            total: rows.len() as u32,
        }
    }

    /// Ответ повтора `{success, total_failed}`: failed = total_failed - success, pending = 0
    pub fn from_retry(response: &RetryResponse) -> Result<Self, UseCaseError> {
        let failed = response
            .total_failed
            .checked_sub(response.success)
            .ok_or_else(|| {
                UseCaseError::invalid_state(format!(
                    "retry reported {} created out of {} failed",
                    response.success, response.total_failed
                ))
            })?;
        Self::new(response.success, failed, response.total_failed)
    }

    pub fn success(&self) -> u32 {
        self.success
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn processed(&self) -> u32 {
        self.success + self.failed
    }

    pub fn pending(&self) -> u32 {
        self.total - self.processed()
    }

    /// round(100 * processed / total), 0 при total == 0
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let processed = u64::from(self.processed());
        let total = u64::from(self.total);
        ((200 * processed + total) / (2 * total)) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed() == self.total
    }

    pub fn outcome(&self) -> ProgressOutcome {
        if !self.is_complete() {
            ProgressOutcome::Waiting
        } else if self.failed == 0 {
            ProgressOutcome::AllCreated
        } else if self.success == 0 {
            ProgressOutcome::AllFailed
        } else {
            ProgressOutcome::CompletedWithErrors
        }
    }

    /// Ширины сегментов полосы (created, failed, pending) в процентах, сумма 100
    pub fn buckets(&self) -> (f64, f64, f64) {
        if self.total == 0 {
            return (0.0, 0.0, 100.0);
        }
        let total = f64::from(self.total);
        let created = f64::from(self.success) * 100.0 / total;
        let failed = f64::from(self.failed) * 100.0 / total;
        (created, failed, 100.0 - created - failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_counts_over_total() {
        assert!(ProgressSnapshot::new(2, 2, 3).is_err());
        assert!(ProgressSnapshot::new(u32::MAX, 1, u32::MAX).is_err());
        let snapshot = ProgressSnapshot::new(1, 1, 3).unwrap();
        assert_eq!(snapshot.pending(), 1);
    }

    #[test]
    fn test_deserialize_checks_invariant() {
        let ok: ProgressSnapshot =
            serde_json::from_str(r#"{"success":1,"failed":0,"total":2}"#).unwrap();
        assert_eq!(ok.pending(), 1);
        let bad = serde_json::from_str::<ProgressSnapshot>(r#"{"success":3,"failed":0,"total":2}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        assert_eq!(ProgressSnapshot::zeroed(0).percentage(), 0);
        assert_eq!(ProgressSnapshot::new(1, 0, 3).unwrap().percentage(), 33);
        assert_eq!(ProgressSnapshot::new(1, 1, 3).unwrap().percentage(), 67);
        assert_eq!(ProgressSnapshot::new(1, 0, 2).unwrap().percentage(), 50);
        assert_eq!(ProgressSnapshot::new(2, 1, 3).unwrap().percentage(), 100);
    }

    #[test]
    fn test_buckets_sum_to_hundred() {
        let (created, failed, pending) = ProgressSnapshot::new(1, 1, 3).unwrap().buckets();
        assert!((created + failed + pending - 100.0).abs() < 1e-9);
        assert!(pending > 33.0 && pending < 34.0);
    }

    #[test]
    fn test_outcome() {
        assert_eq!(ProgressSnapshot::zeroed(2).outcome(), ProgressOutcome::Waiting);
        assert_eq!(ProgressSnapshot::new(2, 0, 2).unwrap().outcome(), ProgressOutcome::AllCreated);
        assert_eq!(ProgressSnapshot::new(0, 2, 2).unwrap().outcome(), ProgressOutcome::AllFailed);
        assert_eq!(
            ProgressSnapshot::new(1, 1, 2).unwrap().outcome(),
            ProgressOutcome::CompletedWithErrors
        );
    }

    #[test]
    fn test_from_retry_never_assumes_success() {
        let snapshot = ProgressSnapshot::from_retry(&RetryResponse {
            success: 2,
            total_failed: 3,
        })
        .unwrap();
        assert_eq!((snapshot.success(), snapshot.failed(), snapshot.pending()), (2, 1, 0));
        assert!(ProgressSnapshot::from_retry(&RetryResponse {
            success: 4,
            total_failed: 3,
        })
        .is_err());
    }

    #[test]
    fn test_from_rows_counts_statuses() {
        let mut rows = vec![
            BookClassDetail::new("Class 1"),
            BookClassDetail::new("Class 2"),
            BookClassDetail::new("Class 3"),
        ];
        rows[0].creation_status = CreationStatus::Created;
        rows[1].creation_status = CreationStatus::Failed;
        let snapshot = ProgressSnapshot::from_rows(&rows);
        assert_eq!((snapshot.success(), snapshot.failed(), snapshot.pending()), (1, 1, 1));
    }
}
