//! PageFrame: корневой элемент страницы с метаданными `id` и `data-page-category`

use leptos::prelude::*;

/// Список документов
pub const PAGE_CAT_LIST: &str = "list";

/// Форма одного документа
pub const PAGE_CAT_DETAIL: &str = "detail";

/// Страница-сценарий (создание товаров и т.п.)
pub const PAGE_CAT_USECASE: &str = "usecase";

/// Проверка формата id `{entity}--{category}`
pub fn is_valid_page_id(id: &str) -> bool {
    match id.split_once("--") {
        Some((entity, category)) => !entity.is_empty() && !category.is_empty(),
        None => false,
    }
}

fn page_class(category: &str) -> &'static str {
    match category {
        PAGE_CAT_DETAIL => "page page--detail",
        _ => "page",
    }
}

#[component]
pub fn PageFrame(
    /// id вида "a025_book_item_creator--detail"
    page_id: &'static str,
    category: &'static str,
    #[prop(optional)] class: &'static str,
    children: Children,
) -> impl IntoView {
    debug_assert!(is_valid_page_id(page_id), "bad page id: {}", page_id);

    let base_class = page_class(category);
    let full_class = if class.is_empty() {
        base_class.to_string()
    } else {
        format!("{base_class} {class}")
    };

    view! {
        <div id=page_id class=full_class data-page-category=category>
            {children()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_format() {
        assert!(is_valid_page_id("u508_book_item_creation--usecase"));
        assert!(!is_valid_page_id("u508_book_item_creation"));
        assert!(!is_valid_page_id("--usecase"));
        assert_eq!(page_class(PAGE_CAT_DETAIL), "page page--detail");
        assert_eq!(page_class(PAGE_CAT_LIST), "page");
    }
}
