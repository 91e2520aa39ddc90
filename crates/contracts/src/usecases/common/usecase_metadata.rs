/// Метаданные UseCase для идентификации и маршрутизации
pub trait UseCaseMetadata {
    /// Индекс UseCase (например, "u508")
    fn usecase_index() -> &'static str;

    /// Техническое имя (например, "book_item_creation")
    fn usecase_name() -> &'static str;

    /// Отображаемое имя для UI
    fn display_name() -> &'static str;

    /// Описание UseCase
    fn description() -> &'static str {
        ""
    }

    /// Полное имя вида "u508_book_item_creation"
    fn full_name() -> String {
        format!("{}_{}", Self::usecase_index(), Self::usecase_name())
    }

    /// Префикс HTTP маршрутов UseCase, общий для backend и frontend
    fn api_prefix() -> String {
        format!("/api/{}", Self::usecase_index())
    }

    /// Полный путь маршрута внутри UseCase
    fn api_path(path: &str) -> String {
        format!("{}/{}", Self::api_prefix(), path.trim_start_matches('/'))
    }
}
