use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

/// Модальное окно; закрывается по Escape, клику на фон и кнопке,
/// но только пока `closable` истинно
#[component]
pub fn Modal(
    title: Signal<String>,
    on_close: Callback<()>,
    #[prop(into, optional)] closable: Option<Signal<bool>>,
    children: Children,
) -> impl IntoView {
    let closable = closable.unwrap_or_else(|| Signal::derive(|| true));
    let request_close = move || {
        if closable.get_untracked() {
            on_close.run(());
        }
    };

    // Escape; слушатель снимается вместе с окном
    let keydown = Closure::wrap(Box::new(move |event: web_sys::Event| {
        if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
            if keyboard_event.key() == "Escape" {
                request_close();
            }
        }
    }) as Box<dyn FnMut(_)>);

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
    }
    let keydown = StoredValue::new_local(Some(keydown));
    on_cleanup(move || {
        keydown.update_value(|slot| {
            if let (Some(window), Some(listener)) = (web_sys::window(), slot.take()) {
                let _ = window
                    .remove_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref());
            }
        });
    });

    let stop_propagation = move |ev: ev::MouseEvent| {
        ev.stop_propagation();
    };

    view! {
        <div class="modal-overlay" on:click=move |_| request_close()>
            <div class="modal" on:click=stop_propagation>
                <div class="modal-header">
                    <h2 class="modal-title">{move || title.get()}</h2>
                    <button
                        class="button button--icon modal__close"
                        prop:disabled=move || !closable.get()
                        on:click=move |_| request_close()
                    >
                        "×"
                    </button>
                </div>
                <div class="modal-body">
                    {children()}
                </div>
            </div>
        </div>
    }
}
