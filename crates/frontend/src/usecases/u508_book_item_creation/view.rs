use contracts::domain::a025_book_item_creator::{
    BookClassDetail, BookItemCreator, BookItemCreatorDto, CreationStatus,
};
use contracts::domain::a026_class_master::ClassGroup;
use contracts::domain::common::AggregateRoot;
use contracts::usecases::u508_book_item_creation::import::{
    csv_template, merge_csv_rows, merge_quick_add, parse_number, CSV_TEMPLATE_FILE_NAME,
};
use contracts::usecases::u508_book_item_creation::ProgressSnapshot;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;
use web_sys::HtmlInputElement;

use super::api;
use super::progress_dialog::{InlineCreationProgress, ProgressDialog, ProgressDialogState, SignalSurface};
use super::realtime::EventSourceChannel;
use super::tracker::ProgressTracker;
use crate::shared::export::{download_csv, download_url};
use crate::shared::modal::Modal;
use crate::shared::page_frame::{PageFrame, PAGE_CAT_USECASE};

type PageTracker = ProgressTracker<SignalSurface, EventSourceChannel>;
type TrackerSlot = StoredValue<Option<PageTracker>, LocalStorage>;

fn with_tracker<R>(tracker: TrackerSlot, f: impl FnOnce(&mut PageTracker) -> R) -> Option<R> {
    tracker.try_update_value(|slot| slot.as_mut().map(f)).flatten()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NoticeKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
struct Notice {
    kind: NoticeKind,
    text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, text: text.into() }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }

    fn class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Info => "info-box",
            NoticeKind::Warning => "warning-box",
            NoticeKind::Error => "warning-box warning-box--error",
        }
    }
}

fn badge_color(indicator: &str) -> BadgeColor {
    match indicator {
        "green" => BadgeColor::Success,
        "red" => BadgeColor::Danger,
        "orange" => BadgeColor::Warning,
        "blue" => BadgeColor::Brand,
        _ => BadgeColor::Subtle,
    }
}

/// Меняет строку по номеру и пересчитывает суммы документа
fn update_row(
    doc: RwSignal<Option<BookItemCreator>>,
    idx: u32,
    f: impl FnOnce(&mut BookClassDetail),
) {
    doc.update(|d| {
        if let Some(d) = d {
            if let Some(row) = d.class_details.iter_mut().find(|r| r.idx == idx) {
                f(row);
                row.recalculate_amount();
            }
            d.calculate_totals();
        }
    });
}

fn text_field(
    label: &'static str,
    doc: RwSignal<Option<BookItemCreator>>,
    editable: Signal<bool>,
    get: fn(&BookItemCreator) -> String,
    set: fn(&mut BookItemCreator, String),
) -> impl IntoView {
    view! {
        <div class="form__group">
            <label class="form__label">{label}</label>
            <input
                class="form__input"
                type="text"
                prop:value=move || doc.with(|d| d.as_ref().map(get).unwrap_or_default())
                prop:disabled=move || !editable.get()
                on:change=move |ev| {
                    let value = event_target_value(&ev);
                    doc.update(|d| if let Some(d) = d { set(d, value) });
                }
            />
        </div>
    }
}

fn number_field(
    label: &'static str,
    doc: RwSignal<Option<BookItemCreator>>,
    editable: Signal<bool>,
    get: fn(&BookItemCreator) -> f64,
    set: fn(&mut BookItemCreator, f64),
) -> impl IntoView {
    view! {
        <div class="form__group">
            <label class="form__label">{label}</label>
            <input
                class="form__input"
                type="number"
                step="0.01"
                prop:value=move || doc.with(|d| d.as_ref().map(get).unwrap_or_default().to_string())
                prop:disabled=move || !editable.get()
                on:change=move |ev| {
                    let value = parse_number(&event_target_value(&ev));
                    doc.update(|d| if let Some(d) = d { set(d, value) });
                }
            />
        </div>
    }
}

/// Страница документа "Book Item Creator"
#[component]
pub fn BookItemCreatorPage() -> impl IntoView {
    let documents = RwSignal::new(Vec::<BookItemCreator>::new());
    let doc = RwSignal::new(None::<BookItemCreator>);
    let notice = RwSignal::new(None::<Notice>);
    let validation_errors = RwSignal::new(Vec::<String>::new());
    let busy = RwSignal::new(false);
    let show_items = RwSignal::new(false);
    let new_class = RwSignal::new(String::new());
    let dialog = RwSignal::new(ProgressDialogState::default());

    // Трекер живёт столько же, сколько страница
    let tracker: TrackerSlot = StoredValue::new_local(None);
    let channel = EventSourceChannel::new(api::endpoint("realtime"), move |event| {
        with_tracker(tracker, |t| {
            t.apply_event(&event);
        });
    });
    tracker.set_value(Some(ProgressTracker::new(SignalSurface::new(dialog), channel)));
    on_cleanup(move || {
        with_tracker(tracker, |t| t.teardown());
    });

    let editable = Signal::derive(move || {
        doc.with(|d| d.as_ref().map(|d| d.is_draft()).unwrap_or(false))
    });
    let submitted = Signal::derive(move || {
        doc.with(|d| d.as_ref().map(|d| d.is_submitted()).unwrap_or(false))
    });
    let has_name = Signal::derive(move || {
        doc.with(|d| d.as_ref().map(|d| !d.name().is_empty()).unwrap_or(false))
    });
    let docname = move || {
        doc.with_untracked(|d| d.as_ref().map(|d| d.name().to_string()))
            .filter(|n| !n.is_empty())
    };

    let refresh_list = move || {
        spawn_local(async move {
            match api::list_documents().await {
                Ok(list) => documents.set(list),
                Err(e) => log::error!("u508: failed to load documents: {}", e),
            }
        });
    };

    let open_document = move |name: String| {
        spawn_local(async move {
            match api::get_document(&name).await {
                Ok(loaded) => {
                    validation_errors.set(Vec::new());
                    doc.set(Some(loaded));
                }
                Err(e) => notice.set(Some(Notice::error(format!("Failed to load {}: {}", name, e)))),
            }
        });
    };

    Effect::new(move || refresh_list());

    let on_new = move |_| {
        notice.set(None);
        validation_errors.set(Vec::new());
        doc.set(Some(BookItemCreator::new_draft(
            String::new(),
            String::new(),
            String::new(),
        )));
    };

    let on_save = move |_| {
        let Some(current) = doc.get_untracked() else { return };
        busy.set(true);
        spawn_local(async move {
            match api::save_document(&BookItemCreatorDto::from(&current)).await {
                Ok(saved) => {
                    notice.set(Some(Notice::info(format!("Saved {}", saved.name()))));
                    doc.set(Some(saved));
                    refresh_list();
                }
                Err(e) => notice.set(Some(Notice::error(e))),
            }
            busy.set(false);
        });
    };

    let on_add_row = move |_| {
        let class = new_class.get_untracked().trim().to_string();
        if class.is_empty() {
            return;
        }
        let mut added = false;
        doc.update(|d| {
            if let Some(d) = d {
                added = d.add_row(BookClassDetail::new(&class));
            }
        });
        if added {
            new_class.set(String::new());
        } else {
            notice.set(Some(Notice::warning(format!("Class {} already exists", class))));
        }
    };

    let on_quick_add = move |group: ClassGroup| {
        spawn_local(async move {
            match api::get_classes_for_quick_add(group).await {
                Ok(classes) => {
                    let mut added = 0;
                    doc.update(|d| {
                        if let Some(d) = d {
                            added = merge_quick_add(d, &classes);
                        }
                    });
                    notice.set(Some(Notice::info(format!(
                        "Added {} classes ({})",
                        added,
                        group.label()
                    ))));
                }
                Err(e) => notice.set(Some(Notice::error(e))),
            }
        });
    };

    let on_csv_selected = move |ev: leptos::ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");
        busy.set(true);
        spawn_local(async move {
            let parsed = match api::upload_file(file).await {
                Ok(uploaded) => api::parse_csv(&uploaded.file_url).await,
                Err(e) => Err(e),
            };
            match parsed {
                Ok(response) if response.success => {
                    let mut summary = None;
                    doc.update(|d| {
                        if let Some(d) = d {
                            summary = Some(merge_csv_rows(d, &response.data));
                        }
                    });
                    if let Some(summary) = summary {
                        let dropped = response.dropped_message();
                        let text = match &dropped {
                            Some(dropped) => format!("{}\n{}", summary.message(), dropped),
                            None => summary.message(),
                        };
                        notice.set(Some(if summary.skipped.is_empty() && dropped.is_none() {
                            Notice::info(text)
                        } else {
                            Notice::warning(text)
                        }));
                    }
                }
                Ok(response) => notice.set(Some(Notice::error(
                    response.error.unwrap_or_else(|| "Failed to parse CSV".to_string()),
                ))),
                Err(e) => notice.set(Some(Notice::error(format!("CSV import failed: {}", e)))),
            }
            busy.set(false);
        });
    };

    let on_download_template = move |_| {
        if let Err(e) = download_csv(&csv_template(), CSV_TEMPLATE_FILE_NAME) {
            notice.set(Some(Notice::error(e)));
        }
    };

    let on_isbn_change = move |idx: u32, value: String| {
        let isbn = value.trim().to_string();
        update_row(doc, idx, |row| row.isbn_barcode = isbn.clone());
        if isbn.is_empty() {
            return;
        }
        let exclude = docname();
        spawn_local(async move {
            match api::check_isbn_exists(&isbn, exclude.as_deref()).await {
                Ok(response) => {
                    if let Some(warning) = response.warning(&isbn) {
                        update_row(doc, idx, |row| {
                            if row.isbn_barcode == isbn {
                                row.isbn_barcode.clear();
                            }
                        });
                        notice.set(Some(Notice::warning(warning)));
                    }
                }
                Err(e) => log::warn!("u508: ISBN check failed for {}: {}", isbn, e),
            }
        });
    };

    let on_submit = move |_| {
        let Some(current) = doc.get_untracked() else { return };
        let mut issues = current.validate_rows();
        issues.extend(current.duplicate_class_issues());
        if current.publication.trim().is_empty() {
            issues.insert(0, "Publication is mandatory".to_string());
        }
        if current.book_name.trim().is_empty() {
            issues.insert(0, "Book Name is mandatory".to_string());
        }
        if !issues.is_empty() {
            validation_errors.set(issues);
            return;
        }
        validation_errors.set(Vec::new());
        notice.set(None);
        busy.set(true);

        spawn_local(async move {
            let saved = match api::save_document(&BookItemCreatorDto::from(&current)).await {
                Ok(saved) => saved,
                Err(e) => {
                    notice.set(Some(Notice::error(e)));
                    busy.set(false);
                    return;
                }
            };
            let name = saved.name().to_string();
            let total = saved.class_details.len() as u32;
            doc.set(Some(saved));

            let opened = with_tracker(tracker, |t| {
                let token = t.initialize(&name, total)?;
                if let Err(e) = t.subscribe(&name) {
                    log::warn!("u508: live progress unavailable: {}", e);
                }
                Ok::<_, contracts::usecases::common::UseCaseError>(token)
            });
            let token = match opened {
                Some(Ok(token)) => token,
                Some(Err(e)) => {
                    notice.set(Some(Notice::error(e.message)));
                    busy.set(false);
                    return;
                }
                None => {
                    busy.set(false);
                    return;
                }
            };

            match api::submit(&name).await {
                Ok(response) => log::info!("u508: {} submitted, {} items queued", response.name, response.total),
                Err(e) => {
                    with_tracker(tracker, |t| t.report_failure(token, &e));
                }
            }
            busy.set(false);
            refresh_list();
        });
    };

    let on_retry = move |_| {
        let Some(current) = doc.get_untracked() else { return };
        let failed = current.failed_count() as u32;
        if failed == 0 {
            notice.set(Some(Notice::info("No failed items to retry")));
            return;
        }
        let name = current.name().to_string();
        let Some(Ok(token)) = with_tracker(tracker, |t| t.initialize(&name, failed)) else {
            return;
        };
        busy.set(true);
        spawn_local(async move {
            match api::retry_failed_items(&name).await {
                Ok(response) => match ProgressSnapshot::from_retry(&response) {
                    Ok(snapshot) => {
                        with_tracker(tracker, |t| t.apply_result(token, snapshot));
                    }
                    Err(e) => {
                        with_tracker(tracker, |t| t.report_failure(token, &e.message));
                    }
                },
                Err(e) => {
                    with_tracker(tracker, |t| t.report_failure(token, &e));
                }
            }
            busy.set(false);
        });
    };

    let on_export = move |_| {
        let Some(name) = docname() else { return };
        spawn_local(async move {
            match api::export_items_to_excel(&name).await {
                Ok(export) => {
                    if let Err(e) = download_url(&api::file_href(&export.file_url), &export.file_name) {
                        notice.set(Some(Notice::error(e)));
                    }
                }
                Err(e) => notice.set(Some(Notice::error(e))),
            }
        });
    };

    let on_duplicate = move |_| {
        let Some(name) = docname() else { return };
        spawn_local(async move {
            match api::duplicate(&name).await {
                Ok(response) => {
                    notice.set(Some(Notice::info(response.message)));
                    open_document(response.name);
                    refresh_list();
                }
                Err(e) => notice.set(Some(Notice::error(e))),
            }
        });
    };

    let on_cancel_doc = move |_| {
        let Some(name) = docname() else { return };
        spawn_local(async move {
            match api::cancel(&name).await {
                Ok(cancelled) => {
                    doc.set(Some(cancelled));
                    refresh_list();
                }
                Err(e) => notice.set(Some(Notice::error(e))),
            }
        });
    };

    let close_dialog = Callback::new(move |_| {
        let name = with_tracker(tracker, |t| {
            let name = t.docname().map(str::to_string);
            t.teardown();
            name
        })
        .flatten();
        if let Some(name) = name {
            open_document(name);
            refresh_list();
        }
    });

    let view_items = Callback::new(move |_| {
        close_dialog.run(());
        show_items.set(true);
    });

    let rows = Signal::derive(move || {
        doc.with(|d| d.as_ref().map(|d| d.class_details.clone()).unwrap_or_default())
    });
    let has_failed = Signal::derive(move || {
        doc.with(|d| d.as_ref().map(|d| d.failed_count() > 0).unwrap_or(false))
    });
    let can_submit = Signal::derive(move || editable.get() && !busy.get());

    view! {
        <PageFrame page_id="u508_book_item_creation--usecase" category=PAGE_CAT_USECASE class="page--wide">
            <div style="display:flex;gap:var(--spacing-md, 12px);align-items:flex-start;">
                <div class="card" style="min-width:220px;">
                    <div class="card__body">
                        <Flex justify=FlexJustify::SpaceBetween align=FlexAlign::Center>
                            <h2 class="section-title">{BookItemCreator::list_name()}</h2>
                            <Button appearance=ButtonAppearance::Primary on_click=on_new>"+ New"</Button>
                        </Flex>
                        <ul style="list-style:none;padding:0;margin:8px 0 0;">
                            {move || documents.get().into_iter().map(|d| {
                                let name = d.name().to_string();
                                let label = format!("{} · {}", d.name(), d.book_name);
                                let status = d.status;
                                view! {
                                    <li style="padding:4px 0;cursor:pointer;" on:click=move |_| open_document(name.clone())>
                                        <span>{label}</span>" "
                                        <Badge appearance=BadgeAppearance::Tint color=badge_color(status.indicator())>
                                            {status.label()}
                                        </Badge>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    </div>
                </div>

                <div class="card" style="flex:1;">
                    <div class="card__body">
                        {move || match doc.get() {
                            None => view! {
                                <div class="info-box">"Select a document or create a new one"</div>
                            }.into_any(),
                            Some(current) => {
                                let title = if current.name().is_empty() {
                                    format!("New {}", BookItemCreator::element_name())
                                } else {
                                    current.name().to_string()
                                };
                                let status = current.status;
                                view! {
                                    <Flex justify=FlexJustify::SpaceBetween align=FlexAlign::Center>
                                        <Flex gap=FlexGap::Small align=FlexAlign::Center>
                                            <h2 class="section-title">{title}</h2>
                                            <Badge appearance=BadgeAppearance::Filled color=badge_color(status.indicator())>
                                                {status.label()}
                                            </Badge>
                                        </Flex>
                                        <Flex gap=FlexGap::Small>
                                            <Show when=move || editable.get()>
                                                <Button on_click=on_save disabled=Signal::derive(move || busy.get())>"Save"</Button>
                                                <Button appearance=ButtonAppearance::Primary on_click=on_submit disabled=Signal::derive(move || !can_submit.get())>
                                                    "Submit & Create Items"
                                                </Button>
                                            </Show>
                                            <Show when=move || submitted.get()>
                                                <Show when=move || has_failed.get()>
                                                    <Button appearance=ButtonAppearance::Primary on_click=on_retry disabled=Signal::derive(move || busy.get())>
                                                        "Retry Failed Items"
                                                    </Button>
                                                </Show>
                                                <Button on_click=on_export>"Export Items"</Button>
                                                <Button on_click=move |_| show_items.set(true)>"View Created Items"</Button>
                                                <Button on_click=on_cancel_doc>"Cancel"</Button>
                                            </Show>
                                            <Show when=move || has_name.get()>
                                                <Button appearance=ButtonAppearance::Secondary on_click=on_duplicate>"Duplicate"</Button>
                                            </Show>
                                        </Flex>
                                    </Flex>
                                }.into_any()
                            }
                        }}

                        {move || notice.get().map(|n| view! {
                            <div class=n.class() style="margin-top:12px;white-space:pre-line;">{n.text.clone()}</div>
                        })}

                        {move || {
                            let errors = validation_errors.get();
                            (!errors.is_empty()).then(|| view! {
                                <div class="warning-box warning-box--error" style="margin-top:12px;">
                                    <span class="warning-box__icon">"⚠"</span>
                                    <ul class="warning-box__text">
                                        {errors.into_iter().map(|e| view! { <li>{e}</li> }).collect_view()}
                                    </ul>
                                </div>
                            })
                        }}

                        <Show when=move || doc.with(|d| d.is_some())>
                            <div class="form-section-group">
                                <div>
                                    <h2 class="section-title">"Book"</h2>
                                    {text_field("Publication", doc, editable, |d| d.publication.clone(), |d, v| d.publication = v)}
                                    {text_field("Book Name", doc, editable, |d| d.book_name.clone(), |d, v| d.book_name = v)}
                                    {text_field("Subject", doc, editable, |d| d.subject.clone(), |d, v| d.subject = v)}
                                    {text_field("Author", doc, editable, |d| d.author.clone(), |d, v| d.author = v)}
                                    {text_field("Edition", doc, editable, |d| d.edition.clone(), |d, v| d.edition = v)}
                                    {number_field(
                                        "Publication Year",
                                        doc,
                                        editable,
                                        |d| d.publication_year.map(f64::from).unwrap_or_default(),
                                        |d, v| d.publication_year = (v > 0.0).then_some(v as i32),
                                    )}
                                </div>
                                <div>
                                    <h2 class="section-title">"Pricing & Stock"</h2>
                                    {text_field("Selling Price List", doc, editable, |d| d.selling_price_list.clone(), |d, v| d.selling_price_list = v)}
                                    {text_field("Buying Price List", doc, editable, |d| d.buying_price_list.clone(), |d, v| d.buying_price_list = v)}
                                    {number_field("Sales Discount %", doc, editable, |d| d.sales_discount_percent, |d, v| d.sales_discount_percent = v)}
                                    {number_field("Purchase Discount %", doc, editable, |d| d.purchase_discount_percent, |d, v| d.purchase_discount_percent = v)}
                                    {text_field("Item Group", doc, editable, |d| d.item_group.clone(), |d, v| d.item_group = v)}
                                    {text_field("UOM", doc, editable, |d| d.uom.clone(), |d, v| d.uom = v)}
                                    {text_field("HSN/SAC Code", doc, editable, |d| d.hsn_sac_code.clone(), |d, v| d.hsn_sac_code = v)}
                                    {text_field("Default Warehouse", doc, editable, |d| d.default_warehouse.clone(), |d, v| d.default_warehouse = v)}
                                </div>
                            </div>

                            <h2 class="section-title">"Class Details"</h2>
                            <Show when=move || editable.get()>
                                <Flex gap=FlexGap::Small style="flex-wrap:wrap;margin-bottom:8px;align-items:center;">
                                    {ClassGroup::all().into_iter().map(|group| view! {
                                        <Button on_click=move |_| on_quick_add(group)>{format!("+ {}", group.label())}</Button>
                                    }).collect_view()}
                                    <input
                                        class="form__input"
                                        style="max-width:160px;"
                                        placeholder="Class"
                                        prop:value=move || new_class.get()
                                        on:input=move |ev| new_class.set(event_target_value(&ev))
                                    />
                                    <Button on_click=on_add_row>"Add Row"</Button>
                                    <label class="button">
                                        "Import CSV"
                                        <input type="file" accept=".csv,text/csv" style="display:none;" on:change=on_csv_selected />
                                    </label>
                                    <Button appearance=ButtonAppearance::Subtle on_click=on_download_template>
                                        "Download Template"
                                    </Button>
                                </Flex>
                            </Show>

                            <table class="table">
                                <thead>
                                    <tr>
                                        <th>"#"</th>
                                        <th>"Class"</th>
                                        <th>"Selling Rate"</th>
                                        <th>"Valuation Rate"</th>
                                        <th>"ISBN/Barcode"</th>
                                        <th>"Opening Stock"</th>
                                        <th>"Amount"</th>
                                        <th>"Status"</th>
                                        <th>"Item Code"</th>
                                        <th>"Remarks"</th>
                                        <th></th>
                                    </tr>
                                </thead>
                                <tbody>
                                    {move || rows.get().into_iter().map(|row| {
                                        let idx = row.idx;
                                        let disabled = !editable.get_untracked();
                                        let status_color = match row.creation_status {
                                            CreationStatus::Created => BadgeColor::Success,
                                            CreationStatus::Failed => BadgeColor::Danger,
                                            CreationStatus::Creating => BadgeColor::Brand,
                                            CreationStatus::Pending => BadgeColor::Subtle,
                                        };
                                        view! {
                                            <tr>
                                                <td>{idx}</td>
                                                <td>{row.class.clone()}</td>
                                                <td>
                                                    <input class="form__input" type="number" step="0.01" prop:disabled=disabled
                                                        prop:value=row.rate.to_string()
                                                        on:change=move |ev| {
                                                            let v = parse_number(&event_target_value(&ev));
                                                            update_row(doc, idx, |r| r.rate = v);
                                                        }
                                                    />
                                                </td>
                                                <td>
                                                    <input class="form__input" type="number" step="0.01" prop:disabled=disabled
                                                        prop:value=row.valuation_rate.to_string()
                                                        on:change=move |ev| {
                                                            let v = parse_number(&event_target_value(&ev));
                                                            update_row(doc, idx, |r| r.valuation_rate = v);
                                                        }
                                                    />
                                                </td>
                                                <td>
                                                    <input class="form__input" type="text" prop:disabled=disabled
                                                        prop:value=row.isbn_barcode.clone()
                                                        on:change=move |ev| on_isbn_change(idx, event_target_value(&ev))
                                                    />
                                                </td>
                                                <td>
                                                    <input class="form__input" type="number" step="1" prop:disabled=disabled
                                                        prop:value=row.opening_stock.to_string()
                                                        on:change=move |ev| {
                                                            let v = parse_number(&event_target_value(&ev));
                                                            update_row(doc, idx, |r| r.opening_stock = v);
                                                        }
                                                    />
                                                </td>
                                                <td>{format!("{:.2}", row.amount)}</td>
                                                <td>
                                                    <Badge appearance=BadgeAppearance::Tint color=status_color>
                                                        {row.creation_status.as_str()}
                                                    </Badge>
                                                </td>
                                                <td>{row.generated_item_code.clone().unwrap_or_default()}</td>
                                                <td>{row.remarks.clone().unwrap_or_default()}</td>
                                                <td>
                                                    <Show when=move || !disabled>
                                                        <button class="button button--icon" on:click=move |_| {
                                                            doc.update(|d| if let Some(d) = d { d.remove_row(idx); });
                                                        }>"×"</button>
                                                    </Show>
                                                </td>
                                            </tr>
                                        }
                                    }).collect_view()}
                                </tbody>
                            </table>

                            <div style="margin-top:8px;">
                                {move || doc.with(|d| d.as_ref().map(|d| format!(
                                    "Items to create: {} · Opening stock: {} · Stock value: {:.2} · Created: {}",
                                    d.total_items_to_create, d.total_opening_stock, d.total_stock_value, d.items_created
                                )))}
                            </div>

                            <Show when=move || submitted.get()>
                                <InlineCreationProgress rows=rows />
                            </Show>
                        </Show>
                    </div>
                </div>
            </div>

            <ProgressDialog state=dialog on_close=close_dialog on_view_items=view_items />

            <Show when=move || show_items.get()>
                <Modal
                    title=Signal::derive(|| "Created Items".to_string())
                    on_close=Callback::new(move |_| show_items.set(false))
                >
                    {move || {
                        let created: Vec<(String, String)> = rows
                            .get()
                            .into_iter()
                            .filter_map(|r| r.generated_item_code.map(|code| (r.class, code)))
                            .collect();
                        if created.is_empty() {
                            view! { <div class="info-box">"No items have been created yet"</div> }.into_any()
                        } else {
                            view! {
                                <table class="table">
                                    <thead><tr><th>"Class"</th><th>"Item Code"</th></tr></thead>
                                    <tbody>
                                        {created.into_iter().map(|(class, code)| view! {
                                            <tr><td>{class}</td><td>{code}</td></tr>
                                        }).collect_view()}
                                    </tbody>
                                </table>
                            }.into_any()
                        }
                    }}
                </Modal>
            </Show>
        </PageFrame>
    }
}
