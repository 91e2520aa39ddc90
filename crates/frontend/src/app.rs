use crate::usecases::u508_book_item_creation::BookItemCreatorPage;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <main class="app">
            <BookItemCreatorPage />
        </main>
    }
}
