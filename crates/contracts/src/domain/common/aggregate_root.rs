use super::EntityMetadata;

/// Трейт для корня агрегата
///
/// Связывает экземпляр документа с его статическими метаданными (индекс, имена для UI).
pub trait AggregateRoot {
    /// Тип идентификатора агрегата
    type Id;

    /// Получить ID записи
    fn id(&self) -> Self::Id;

    /// Номер документа
    fn code(&self) -> &str;

    /// Заголовок документа
    fn description(&self) -> &str;

    /// Метаданные жизненного цикла
    fn metadata(&self) -> &EntityMetadata;

    /// Индекс агрегата в системе (например, "a025")
    fn aggregate_index() -> &'static str;

    /// Техническое имя коллекции (например, "book_item_creator")
    fn collection_name() -> &'static str;

    /// Имя элемента для UI
    fn element_name() -> &'static str;

    /// Имя списка для UI
    fn list_name() -> &'static str;

    /// Полное имя агрегата (например, "a025_book_item_creator")
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
