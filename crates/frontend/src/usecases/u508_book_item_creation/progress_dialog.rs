use contracts::domain::a025_book_item_creator::BookClassDetail;
use contracts::usecases::u508_book_item_creation::ProgressSnapshot;
use leptos::prelude::*;
use thaw::*;

use super::tracker::{ProgressSurface, ProgressView};
use crate::shared::modal::Modal;

/// Состояние диалога прогресса, которое рисует [`ProgressDialog`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressDialogState {
    pub open: bool,
    pub view: Option<ProgressView>,
    pub close_enabled: bool,
    pub failure: Option<String>,
}

/// Поверхность трекера поверх сигнала Leptos
#[derive(Clone, Copy)]
pub struct SignalSurface {
    state: RwSignal<ProgressDialogState>,
}

impl SignalSurface {
    pub fn new(state: RwSignal<ProgressDialogState>) -> Self {
        Self { state }
    }
}

impl ProgressSurface for SignalSurface {
    fn render(&mut self, view: &ProgressView) {
        self.state.update(|s| {
            s.open = true;
            s.view = Some(view.clone());
        });
    }

    fn set_close_enabled(&mut self, enabled: bool) {
        self.state.update(|s| s.close_enabled = enabled);
    }

    fn show_failure(&mut self, message: &str) {
        log::error!("u508: creation request failed: {}", message);
        self.state
            .update(|s| s.failure = Some(format!("Something went wrong: {}", message)));
    }

    fn remove(&mut self) {
        self.state.set(ProgressDialogState::default());
    }
}

/// Трёхцветная полоса: создано / ошибки / в очереди
#[component]
pub fn ProgressBar(#[prop(into)] snapshot: Signal<ProgressSnapshot>) -> impl IntoView {
    let widths = move || snapshot.get().buckets();

    view! {
        <div style="display:flex;height:18px;border-radius:4px;overflow:hidden;background:var(--color-border, #e5e7eb);">
            <div style=move || format!("width:{:.2}%;background:#22c55e;transition:width 0.3s;", widths().0)></div>
            <div style=move || format!("width:{:.2}%;background:#ef4444;transition:width 0.3s;", widths().1)></div>
            <div style=move || format!("width:{:.2}%;background:transparent;", widths().2)></div>
        </div>
    }
}

fn counters(snapshot: ProgressSnapshot) -> impl IntoView {
    view! {
        <div style="display:flex;gap:var(--spacing-md, 12px);margin-top:8px;font-size:0.9em;">
            <span>"Created: " <strong>{snapshot.success()}</strong></span>
            <span>"Failed: " <strong>{snapshot.failed()}</strong></span>
            <span>"Pending: " <strong>{snapshot.pending()}</strong></span>
            <span>{format!("{} / {} ({}%)", snapshot.processed(), snapshot.total(), snapshot.percentage())}</span>
        </div>
    }
}

/// Модальный диалог хода создания; закрыть можно только после завершения
#[component]
pub fn ProgressDialog(
    state: RwSignal<ProgressDialogState>,
    on_close: Callback<()>,
    /// "Просмотреть созданные товары" после завершения
    on_view_items: Callback<()>,
) -> impl IntoView {
    let title = Signal::derive(move || {
        state.with(|s| {
            s.view
                .as_ref()
                .map(|v| v.title().to_string())
                .unwrap_or_default()
        })
    });
    let closable = Signal::derive(move || state.with(|s| s.close_enabled));
    let snapshot = Signal::derive(move || {
        state.with(|s| s.view.as_ref().map(|v| v.snapshot).unwrap_or_default())
    });
    let complete = Signal::derive(move || {
        state.with(|s| s.view.as_ref().map(|v| v.is_complete()).unwrap_or(false))
    });

    view! {
        <Show when=move || state.with(|s| s.open)>
            <Modal title=title on_close=on_close closable=closable>
                <ProgressBar snapshot=snapshot />
                {move || counters(snapshot.get())}

                {move || state.with(|s| s.failure.clone()).map(|failure| view! {
                    <div class="warning-box warning-box--error" style="margin-top:12px;">
                        <span class="warning-box__icon">"⚠"</span>
                        <span class="warning-box__text">{failure}</span>
                    </div>
                })}

                <div style="margin-top:16px;">
                    {move || if complete.get() {
                        view! {
                            <Flex gap=FlexGap::Small>
                                <Button appearance=ButtonAppearance::Primary on_click=move |_| on_view_items.run(())>
                                    "View Created Items"
                                </Button>
                                <Button on_click=move |_| on_close.run(())>"Close"</Button>
                            </Flex>
                        }.into_any()
                    } else if closable.get() {
                        view! {
                            <Button on_click=move |_| on_close.run(())>"Close"</Button>
                        }.into_any()
                    } else {
                        view! {
                            <div class="info-box">"Please wait while items are being created..."</div>
                        }.into_any()
                    }}
                </div>
            </Modal>
        </Show>
    }
}

/// Прогресс по строкам проведённого документа; пересчитывается при каждом рендере
#[component]
pub fn InlineCreationProgress(#[prop(into)] rows: Signal<Vec<BookClassDetail>>) -> impl IntoView {
    let snapshot = Signal::derive(move || rows.with(|r| ProgressSnapshot::from_rows(r)));

    move || {
        let current = snapshot.get();
        if current.total() == 0 {
            return ().into_any();
        }
        let outcome = current.outcome();
        view! {
            <div class="card" style="margin-top:12px;">
                <div class="card__body">
                    <h3 class="section-title">{outcome.title()}</h3>
                    <ProgressBar snapshot=snapshot />
                    {counters(current)}
                </div>
            </div>
        }
        .into_any()
    }
}
