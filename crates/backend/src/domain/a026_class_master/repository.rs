use contracts::domain::a026_class_master::{ClassGroup, ClassMaster};
use tokio::sync::RwLock;

/// Справочник классов, заполненный значениями по умолчанию
pub struct ClassMasterRepository {
    classes: RwLock<Vec<ClassMaster>>,
}

impl ClassMasterRepository {
    pub fn new() -> Self {
        Self::with_classes(ClassMaster::default_classes())
    }

    pub fn with_classes(classes: Vec<ClassMaster>) -> Self {
        Self {
            classes: RwLock::new(classes),
        }
    }

    pub async fn list_all(&self) -> Vec<ClassMaster> {
        self.classes.read().await.clone()
    }

    pub async fn exists(&self, name: &str) -> bool {
        let name = name.trim();
        self.classes.read().await.iter().any(|c| c.name == name)
    }

    /// Активные классы группы по порядку сортировки
    pub async fn list_for_group(&self, group: ClassGroup) -> Vec<ClassMaster> {
        group.select(&self.classes.read().await)
    }
}

impl Default for ClassMasterRepository {
    fn default() -> Self {
        Self::new()
    }
}
