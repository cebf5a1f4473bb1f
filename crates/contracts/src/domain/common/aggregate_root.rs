use super::EntityMetadata;

/// Трейт для корня агрегата
pub trait AggregateRoot {
    type Id;

    fn id(&self) -> Self::Id;

    fn code(&self) -> &str;

    fn description(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Индекс агрегата в системе (например, "a001")
    fn aggregate_index() -> &'static str;

    /// Имя таблицы/коллекции (без индекса)
    fn collection_name() -> &'static str;

    /// Имя элемента для UI
    fn element_name() -> &'static str;

    /// Имя списка для UI
    fn list_name() -> &'static str;

    /// Полное имя таблицы: "a001_estimate"
    fn table_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
