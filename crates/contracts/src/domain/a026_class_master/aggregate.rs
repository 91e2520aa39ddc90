use serde::{Deserialize, Serialize};

// ============================================================================
// Class Master
// ============================================================================

/// Школьный класс (справочник), для которого создаётся отдельный товар
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMaster {
    /// Ключ справочника (совпадает с отображаемым именем, например "Class 1")
    pub name: String,
    pub class_name: String,
    pub short_code: String,
    /// Порядок сортировки; по нему же определяются группы быстрого добавления
    pub sort_order: u32,
    #[serde(default)]
    pub disabled: bool,
}

impl ClassMaster {
    pub fn new(name: &str, short_code: &str, sort_order: u32) -> Self {
        Self {
            name: name.to_string(),
            class_name: name.to_string(),
            short_code: short_code.to_string(),
            sort_order,
            disabled: false,
        }
    }

    /// Начальное наполнение справочника: Nursery..Class 12
    pub fn default_classes() -> Vec<ClassMaster> {
        let mut classes = vec![
            ClassMaster::new("Nursery", "NUR", 1),
            ClassMaster::new("LKG", "LKG", 2),
            ClassMaster::new("UKG", "UKG", 3),
        ];
        for n in 1..=12u32 {
            classes.push(ClassMaster::new(
                &format!("Class {}", n),
                &format!("C{}", n),
                n + 3,
            ));
        }
        classes
    }
}

// ============================================================================
// Quick add groups
// ============================================================================

/// Группа классов для быстрого добавления строк
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassGroup {
    #[default]
    All,
    /// Nursery - Class 5
    Primary,
    /// Class 6 - Class 10
    Middle,
    /// Class 11 - Class 12
    Senior,
}

impl ClassGroup {
    pub fn all() -> [ClassGroup; 4] {
        [
            ClassGroup::All,
            ClassGroup::Primary,
            ClassGroup::Middle,
            ClassGroup::Senior,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassGroup::All => "all",
            ClassGroup::Primary => "primary",
            ClassGroup::Middle => "middle",
            ClassGroup::Senior => "senior",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClassGroup::All => "All Classes",
            ClassGroup::Primary => "Primary (Nursery-5)",
            ClassGroup::Middle => "Middle (6-10)",
            ClassGroup::Senior => "Senior (11-12)",
        }
    }

    /// Неизвестное значение трактуется как "all"
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" => ClassGroup::Primary,
            "middle" => ClassGroup::Middle,
            "senior" => ClassGroup::Senior,
            _ => ClassGroup::All,
        }
    }

    pub fn contains(&self, sort_order: u32) -> bool {
        match self {
            ClassGroup::All => true,
            ClassGroup::Primary => sort_order <= 8,
            ClassGroup::Middle => (9..=13).contains(&sort_order),
            ClassGroup::Senior => sort_order >= 14,
        }
    }

    /// Активные классы группы, упорядоченные по sort_order
    pub fn select(&self, classes: &[ClassMaster]) -> Vec<ClassMaster> {
        let mut selected: Vec<ClassMaster> = classes
            .iter()
            .filter(|c| !c.disabled && self.contains(c.sort_order))
            .cloned()
            .collect();
        selected.sort_by_key(|c| c.sort_order);
        selected
    }
}
