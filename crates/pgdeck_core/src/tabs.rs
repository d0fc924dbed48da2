use crate::DbRecord;
use futures::future::BoxFuture;
use std::collections::HashMap;

/// Panes hosted by the edit dialog. One compile-time case per pane instead
/// of dispatching on pane-name strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialogTab {
    #[default]
    BaseInfo,
    DbPassword,
    ModifySpecs,
    ReplicationInfo,
    RecommendedConfig,
}

impl DialogTab {
    pub const ALL: &'static [DialogTab] = &[
        DialogTab::BaseInfo,
        DialogTab::DbPassword,
        DialogTab::ModifySpecs,
        DialogTab::ReplicationInfo,
        DialogTab::RecommendedConfig,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DialogTab::BaseInfo => "Basic Info",
            DialogTab::DbPassword => "Database Password",
            DialogTab::ModifySpecs => "Modify Specs",
            DialogTab::ReplicationInfo => "Replication Info",
            DialogTab::RecommendedConfig => "Recommended Configuration",
        }
    }
}

/// One pane of the dialog, responsible for one facet of the record.
///
/// A module receives a read reference to the current record on every
/// display and keeps its own editing state internally; it must not mutate
/// the record it is given. Persisted changes go through the fetch service
/// independently and become visible via the controller's `refresh`.
pub trait TabModule: Send {
    fn render(&mut self, record: &DbRecord);
}

/// Factory invoked the first time a tab is displayed.
pub type TabLoader = Box<dyn Fn() -> BoxFuture<'static, Box<dyn TabModule>> + Send + Sync>;

/// On-demand tab modules, loaded at most once and cached for the dialog's
/// lifetime. The descriptor set is fixed at startup; `register` is only
/// called while wiring the dialog up.
#[derive(Default)]
pub struct TabRegistry {
    loaders: HashMap<DialogTab, TabLoader>,
    loaded: HashMap<DialogTab, Box<dyn TabModule>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tab: DialogTab, loader: TabLoader) {
        self.loaders.insert(tab, loader);
    }

    pub fn is_loaded(&self, tab: DialogTab) -> bool {
        self.loaded.contains_key(&tab)
    }

    /// Display `tab` for `record`, loading its module first if this is the
    /// tab's first display. Tabs with no registered loader are ignored.
    pub async fn activate(&mut self, tab: DialogTab, record: &DbRecord) {
        if !self.loaded.contains_key(&tab) {
            let Some(loader) = self.loaders.get(&tab) else {
                log::warn!("No module registered for tab {:?}", tab);
                return;
            };
            log::debug!("Loading module for tab {:?}", tab);
            let module = loader().await;
            self.loaded.insert(tab, module);
        }

        if let Some(module) = self.loaded.get_mut(&tab) {
            module.render(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTab {
        renders: Arc<AtomicUsize>,
    }

    impl TabModule for CountingTab {
        fn render(&mut self, _record: &DbRecord) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn loads_once_renders_every_activation() {
        let loads = Arc::new(AtomicUsize::new(0));
        let renders = Arc::new(AtomicUsize::new(0));

        let mut registry = TabRegistry::new();
        let loader_loads = loads.clone();
        let loader_renders = renders.clone();
        registry.register(
            DialogTab::BaseInfo,
            Box::new(move || {
                loader_loads.fetch_add(1, Ordering::SeqCst);
                let renders = loader_renders.clone();
                Box::pin(async move { Box::new(CountingTab { renders }) as Box<dyn TabModule> })
            }),
        );

        let record = DbRecord::default();
        registry.activate(DialogTab::BaseInfo, &record).await;
        registry.activate(DialogTab::BaseInfo, &record).await;

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert!(registry.is_loaded(DialogTab::BaseInfo));
    }

    #[tokio::test]
    async fn unregistered_tab_is_ignored() {
        let mut registry = TabRegistry::new();
        registry
            .activate(DialogTab::DbPassword, &DbRecord::default())
            .await;
        assert!(!registry.is_loaded(DialogTab::DbPassword));
    }

    #[test]
    fn labels_and_default() {
        assert_eq!(DialogTab::default(), DialogTab::BaseInfo);
        assert_eq!(DialogTab::ALL.len(), 5);
        assert_eq!(DialogTab::BaseInfo.label(), "Basic Info");
    }
}
