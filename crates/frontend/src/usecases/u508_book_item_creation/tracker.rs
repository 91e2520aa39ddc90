//! Трекер прогресса создания товаров
//!
//! Не зависит от DOM: рендер идёт через [`ProgressSurface`], подписка на
//! события через [`RealtimeChannel`]. Поэтому весь жизненный цикл диалога
//! проверяется обычными тестами.

use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_book_item_creation::{ProgressEvent, ProgressOutcome, ProgressSnapshot};

/// Готовые к отображению данные диалога; чистая функция от снимка
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub snapshot: ProgressSnapshot,
    pub percentage: u32,
    /// Ширины сегментов (created, failed, pending) в процентах
    pub buckets: (f64, f64, f64),
    pub outcome: ProgressOutcome,
}

impl ProgressView {
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            snapshot,
            percentage: snapshot.percentage(),
            buckets: snapshot.buckets(),
            outcome: snapshot.outcome(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.outcome.title()
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot.is_complete()
    }
}

/// Куда трекер выводит состояние
pub trait ProgressSurface {
    fn render(&mut self, view: &ProgressView);
    fn set_close_enabled(&mut self, enabled: bool);
    fn show_failure(&mut self, message: &str);
    fn remove(&mut self);
}

/// Живая подписка на события одного документа
pub trait Subscription {
    fn docname(&self) -> &str;
    /// Отписка; повторный вызов ничего не делает
    fn cancel(&mut self);
}

/// Источник событий прогресса
pub trait RealtimeChannel {
    type Subscription: Subscription;

    fn subscribe(&mut self, docname: &str) -> Result<Self::Subscription, UseCaseError>;
}

/// Идентификатор открытого диалога; ответы с чужим токеном игнорируются
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoActiveView,
    StaleView,
    OtherDocument,
    StaleTotal,
    Regression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Rendered,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone)]
struct ActiveView {
    token: ViewToken,
    docname: String,
    snapshot: ProgressSnapshot,
    close_enabled: bool,
}

/// Владеет диалогом прогресса и подпиской на события
pub struct ProgressTracker<S: ProgressSurface, C: RealtimeChannel> {
    surface: S,
    channel: C,
    active: Option<ActiveView>,
    subscription: Option<C::Subscription>,
    next_token: u64,
}

impl<S: ProgressSurface, C: RealtimeChannel> ProgressTracker<S, C> {
    pub fn new(surface: S, channel: C) -> Self {
        Self {
            surface,
            channel,
            active: None,
            subscription: None,
            next_token: 1,
        }
    }

    /// Открывает диалог с нулевым снимком; предыдущий диалог закрывается
    pub fn initialize(&mut self, docname: &str, total: u32) -> Result<ViewToken, UseCaseError> {
        if total == 0 {
            return Err(UseCaseError::invalid_state(
                "Nothing to track: total must be greater than zero",
            ));
        }

        self.teardown();

        let token = ViewToken(self.next_token);
        self.next_token += 1;

        let snapshot = ProgressSnapshot::zeroed(total);
        self.surface.render(&ProgressView::from_snapshot(snapshot));
        self.surface.set_close_enabled(false);
        self.active = Some(ActiveView {
            token,
            docname: docname.to_string(),
            snapshot,
            close_enabled: false,
        });

        Ok(token)
    }

    pub fn apply_event(&mut self, event: &ProgressEvent) -> Applied {
        let Some(active) = self.active.as_mut() else {
            return ignored(IgnoreReason::NoActiveView, &event.docname);
        };
        if event.docname != active.docname {
            return ignored(IgnoreReason::OtherDocument, &event.docname);
        }

        let current = active.snapshot;
        let incoming = event.snapshot;
        if incoming.total() < current.total() {
            return ignored(IgnoreReason::StaleTotal, &event.docname);
        }
        if incoming.total() == current.total()
            && (incoming.success() < current.success() || incoming.failed() < current.failed())
        {
            return ignored(IgnoreReason::Regression, &event.docname);
        }

        Self::render_snapshot(&mut self.surface, active, incoming);
        // сервер закончил, но не все исходы дошли: итог берётся из документа после закрытия
        if event.finished && !active.close_enabled {
            active.close_enabled = true;
            self.surface.set_close_enabled(true);
        }
        Applied::Rendered
    }

    /// Итог из прямого ответа сервера (повторная попытка)
    pub fn apply_result(&mut self, token: ViewToken, snapshot: ProgressSnapshot) -> Applied {
        let Some(active) = self.active.as_mut().filter(|a| a.token == token) else {
            log::debug!("u508: late result for closed progress view ignored");
            return Applied::Ignored(IgnoreReason::StaleView);
        };

        Self::render_snapshot(&mut self.surface, active, snapshot);
        Applied::Rendered
    }

    /// Ошибка удалённого вызова: снимок не трогаем, но даём закрыть диалог
    pub fn report_failure(&mut self, token: ViewToken, message: &str) -> Applied {
        let Some(active) = self.active.as_mut().filter(|a| a.token == token) else {
            log::debug!("u508: late failure for closed progress view ignored: {}", message);
            return Applied::Ignored(IgnoreReason::StaleView);
        };

        self.surface.show_failure(message);
        active.close_enabled = true;
        self.surface.set_close_enabled(true);
        Applied::Rendered
    }

    pub fn teardown(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if self.active.take().is_some() {
            self.surface.remove();
        }
    }

    /// Оставляет ровно одну подписку, на события `docname`
    pub fn subscribe(&mut self, docname: &str) -> Result<(), UseCaseError> {
        if let Some(mut previous) = self.subscription.take() {
            previous.cancel();
        }
        let subscription = self.channel.subscribe(docname)?;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub fn current_token(&self) -> Option<ViewToken> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn docname(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.docname.as_str())
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.active.as_ref().map(|a| a.snapshot)
    }

    pub fn is_close_enabled(&self) -> bool {
        self.active.as_ref().map(|a| a.close_enabled).unwrap_or(false)
    }

    pub fn listener_docname(&self) -> Option<&str> {
        self.subscription.as_ref().map(|s| s.docname())
    }

    fn render_snapshot(surface: &mut S, active: &mut ActiveView, snapshot: ProgressSnapshot) {
        active.snapshot = snapshot;
        surface.render(&ProgressView::from_snapshot(snapshot));
        if snapshot.is_complete() && !active.close_enabled {
            active.close_enabled = true;
            surface.set_close_enabled(true);
        }
    }
}

impl<S: ProgressSurface, C: RealtimeChannel> Drop for ProgressTracker<S, C> {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

fn ignored(reason: IgnoreReason, docname: &str) -> Applied {
    log::debug!("u508: progress event for {} ignored: {:?}", docname, reason);
    Applied::Ignored(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::usecases::u508_book_item_creation::response::RetryResponse;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct SurfaceLog {
        views: Vec<ProgressView>,
        close_enabled: bool,
        failures: Vec<String>,
        visible: bool,
    }

    #[derive(Clone, Default)]
    struct FakeSurface(Rc<RefCell<SurfaceLog>>);

    impl ProgressSurface for FakeSurface {
        fn render(&mut self, view: &ProgressView) {
            let mut log = self.0.borrow_mut();
            log.visible = true;
            log.views.push(view.clone());
        }

        fn set_close_enabled(&mut self, enabled: bool) {
            self.0.borrow_mut().close_enabled = enabled;
        }

        fn show_failure(&mut self, message: &str) {
            self.0.borrow_mut().failures.push(message.to_string());
        }

        fn remove(&mut self) {
            self.0.borrow_mut().visible = false;
        }
    }

    /// (docname, live)
    type Listeners = Rc<RefCell<Vec<(String, bool)>>>;

    struct FakeSubscription {
        docname: String,
        slot: usize,
        listeners: Listeners,
    }

    impl Subscription for FakeSubscription {
        fn docname(&self) -> &str {
            &self.docname
        }

        fn cancel(&mut self) {
            self.listeners.borrow_mut()[self.slot].1 = false;
        }
    }

    #[derive(Clone, Default)]
    struct FakeChannel(Listeners);

    impl FakeChannel {
        fn live(&self) -> Vec<String> {
            self.0
                .borrow()
                .iter()
                .filter(|(_, live)| *live)
                .map(|(doc, _)| doc.clone())
                .collect()
        }
    }

    impl RealtimeChannel for FakeChannel {
        type Subscription = FakeSubscription;

        fn subscribe(&mut self, docname: &str) -> Result<FakeSubscription, UseCaseError> {
            let mut listeners = self.0.borrow_mut();
            listeners.push((docname.to_string(), true));
            Ok(FakeSubscription {
                docname: docname.to_string(),
                slot: listeners.len() - 1,
                listeners: self.0.clone(),
            })
        }
    }

    fn tracker() -> (ProgressTracker<FakeSurface, FakeChannel>, FakeSurface, FakeChannel) {
        let surface = FakeSurface::default();
        let channel = FakeChannel::default();
        (
            ProgressTracker::new(surface.clone(), channel.clone()),
            surface,
            channel,
        )
    }

    fn event(docname: &str, success: u32, failed: u32, total: u32) -> ProgressEvent {
        ProgressEvent::new(docname, ProgressSnapshot::new(success, failed, total).unwrap())
    }

    #[test]
    fn test_initialize_renders_zeroed_snapshot() {
        let (mut tracker, surface, _) = tracker();
        tracker.initialize("BIC-00001", 3).unwrap();

        let log = surface.0.borrow();
        assert!(log.visible);
        assert!(!log.close_enabled);
        let view = log.views.last().unwrap();
        assert_eq!(view.snapshot, ProgressSnapshot::zeroed(3));
        assert_eq!(view.percentage, 0);
        assert_eq!(view.outcome, ProgressOutcome::Waiting);
    }

    #[test]
    fn test_initialize_rejects_zero_total() {
        let (mut tracker, surface, _) = tracker();
        let err = tracker.initialize("BIC-00001", 0).unwrap_err();

        assert!(err.is(contracts::usecases::common::usecase_result::INVALID_STATE));
        assert!(tracker.current_token().is_none());
        assert!(surface.0.borrow().views.is_empty());
    }

    #[test]
    fn test_three_row_scenario() {
        let (mut tracker, surface, _) = tracker();
        tracker.initialize("BIC-00001", 3).unwrap();

        assert_eq!(tracker.apply_event(&event("BIC-00001", 1, 0, 3)), Applied::Rendered);
        assert!(!surface.0.borrow().close_enabled);

        assert_eq!(tracker.apply_event(&event("BIC-00001", 1, 1, 3)), Applied::Rendered);
        {
            let log = surface.0.borrow();
            let view = log.views.last().unwrap();
            assert_eq!(view.snapshot.pending(), 1);
            assert_eq!(view.percentage, 67);
            assert!(!log.close_enabled);
        }

        assert_eq!(tracker.apply_event(&event("BIC-00001", 2, 1, 3)), Applied::Rendered);
        let log = surface.0.borrow();
        assert!(log.close_enabled);
        assert_eq!(
            log.views.last().unwrap().outcome,
            ProgressOutcome::CompletedWithErrors
        );
    }

    #[test]
    fn test_finished_legacy_run_unlocks_close_without_guessing_outcome() {
        let (mut tracker, surface, _) = tracker();
        tracker.initialize("D", 3).unwrap();
        let mut normalizer = contracts::usecases::u508_book_item_creation::ProgressNormalizer::new();
        let last = normalizer
            .decode(r#"{"docname":"D","class":"Class 3","status":"Created","current":3,"total":3}"#)
            .unwrap();

        assert_eq!(tracker.apply_event(&last), Applied::Rendered);

        let log = surface.0.borrow();
        let view = log.views.last().unwrap();
        assert_eq!(view.snapshot.failed(), 0);
        assert_eq!(view.snapshot.pending(), 2);
        assert_ne!(view.outcome, ProgressOutcome::CompletedWithErrors);
        assert!(log.close_enabled);
    }

    #[test]
    fn test_event_for_other_document_changes_nothing() {
        let (mut tracker, surface, _) = tracker();
        tracker.initialize("BIC-00001", 3).unwrap();
        let rendered = surface.0.borrow().views.len();

        let applied = tracker.apply_event(&event("BIC-00002", 3, 0, 3));

        assert_eq!(applied, Applied::Ignored(IgnoreReason::OtherDocument));
        assert_eq!(surface.0.borrow().views.len(), rendered);
        assert_eq!(tracker.snapshot(), Some(ProgressSnapshot::zeroed(3)));
        assert!(!tracker.is_close_enabled());
    }

    #[test]
    fn test_stale_and_regressing_events_are_ignored() {
        let (mut tracker, _, _) = tracker();
        tracker.initialize("BIC-00001", 3).unwrap();
        tracker.apply_event(&event("BIC-00001", 2, 0, 3));

        assert_eq!(
            tracker.apply_event(&event("BIC-00001", 1, 0, 2)),
            Applied::Ignored(IgnoreReason::StaleTotal)
        );
        assert_eq!(
            tracker.apply_event(&event("BIC-00001", 1, 0, 3)),
            Applied::Ignored(IgnoreReason::Regression)
        );
        assert_eq!(tracker.snapshot().unwrap().success(), 2);
    }

    #[test]
    fn test_event_without_view_is_ignored() {
        let (mut tracker, _, _) = tracker();
        assert_eq!(
            tracker.apply_event(&event("BIC-00001", 1, 0, 1)),
            Applied::Ignored(IgnoreReason::NoActiveView)
        );
    }

    #[test]
    fn test_teardown_twice_is_safe() {
        let (mut tracker, surface, channel) = tracker();
        tracker.initialize("BIC-00001", 2).unwrap();
        tracker.subscribe("BIC-00001").unwrap();

        tracker.teardown();
        tracker.teardown();

        assert!(channel.live().is_empty());
        assert!(tracker.listener_docname().is_none());
        assert!(tracker.current_token().is_none());
        assert!(!surface.0.borrow().visible);
    }

    #[test]
    fn test_resubscribe_keeps_single_listener() {
        let (mut tracker, _, channel) = tracker();
        tracker.subscribe("BIC-00001").unwrap();
        tracker.subscribe("BIC-00002").unwrap();

        assert_eq!(channel.live(), vec!["BIC-00002".to_string()]);
        assert_eq!(tracker.listener_docname(), Some("BIC-00002"));
    }

    #[test]
    fn test_retry_result_renders_failed_remainder() {
        let (mut tracker, surface, _) = tracker();
        let token = tracker.initialize("BIC-00001", 3).unwrap();
        let response = RetryResponse {
            success: 2,
            total_failed: 3,
        };

        let applied = tracker.apply_result(token, ProgressSnapshot::from_retry(&response).unwrap());

        assert_eq!(applied, Applied::Rendered);
        let log = surface.0.borrow();
        let view = log.views.last().unwrap();
        assert_eq!(view.snapshot.success(), 2);
        assert_eq!(view.snapshot.failed(), 1);
        assert_eq!(view.snapshot.pending(), 0);
        assert!(log.close_enabled);
    }

    #[test]
    fn test_late_result_after_reinitialize_is_ignored() {
        let (mut tracker, surface, _) = tracker();
        let old = tracker.initialize("BIC-00001", 3).unwrap();
        tracker.teardown();
        tracker.initialize("BIC-00002", 4).unwrap();
        let rendered = surface.0.borrow().views.len();

        let applied = tracker.apply_result(old, ProgressSnapshot::new(3, 0, 3).unwrap());
        let failure = tracker.report_failure(old, "timeout");

        assert_eq!(applied, Applied::Ignored(IgnoreReason::StaleView));
        assert_eq!(failure, Applied::Ignored(IgnoreReason::StaleView));
        assert_eq!(surface.0.borrow().views.len(), rendered);
        assert!(surface.0.borrow().failures.is_empty());
        assert_eq!(tracker.docname(), Some("BIC-00002"));
        assert_eq!(tracker.snapshot(), Some(ProgressSnapshot::zeroed(4)));
    }

    #[test]
    fn test_failure_keeps_snapshot_and_unlocks_close() {
        let (mut tracker, surface, _) = tracker();
        let token = tracker.initialize("BIC-00001", 3).unwrap();
        tracker.apply_event(&event("BIC-00001", 1, 0, 3));

        tracker.report_failure(token, "Request failed");

        assert_eq!(tracker.snapshot().unwrap().success(), 1);
        assert!(tracker.is_close_enabled());
        assert_eq!(surface.0.borrow().failures, vec!["Request failed".to_string()]);
    }

    #[test]
    fn test_reinitialize_cancels_listener() {
        let (mut tracker, _, channel) = tracker();
        tracker.initialize("BIC-00001", 2).unwrap();
        tracker.subscribe("BIC-00001").unwrap();

        tracker.initialize("BIC-00001", 1).unwrap();

        assert!(channel.live().is_empty());
    }

    #[test]
    fn test_drop_cancels_listener() {
        let (mut tracker, _, channel) = tracker();
        tracker.subscribe("BIC-00001").unwrap();
        drop(tracker);

        assert!(channel.live().is_empty());
    }
}
