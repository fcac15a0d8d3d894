use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use super::manager::{ManagerCore, Observable};
use super::signals::{ManagerEvent, signal_names};
use crate::error::PlotResult;
use crate::extensions::DataSource;

/// Two-way mapping between actual column names and the names shown to users.
pub trait ColumnNameTranslator {
    fn to_display(&self, actual: &str) -> String;

    /// Inverse mapping; `None` when `display` has no known actual name.
    fn to_actual(&self, display: &str) -> Option<String>;
}

/// Shows actual names unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl ColumnNameTranslator for IdentityTranslator {
    fn to_display(&self, actual: &str) -> String {
        actual.to_owned()
    }

    fn to_actual(&self, display: &str) -> Option<String> {
        Some(display.to_owned())
    }
}

/// Dictionary-backed translator. Unmapped names pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    to_display: IndexMap<String, String>,
    to_actual: IndexMap<String, String>,
}

impl MapTranslator {
    #[must_use]
    pub fn new<I, A, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, D)>,
        A: Into<String>,
        D: Into<String>,
    {
        let mut translator = Self::default();
        for (actual, display) in pairs {
            translator.insert(actual, display);
        }
        translator
    }

    pub fn insert(&mut self, actual: impl Into<String>, display: impl Into<String>) {
        let actual = actual.into();
        let display = display.into();
        self.to_actual.insert(display.clone(), actual.clone());
        self.to_display.insert(actual, display);
    }
}

impl ColumnNameTranslator for MapTranslator {
    fn to_display(&self, actual: &str) -> String {
        self.to_display
            .get(actual)
            .cloned()
            .unwrap_or_else(|| actual.to_owned())
    }

    fn to_actual(&self, display: &str) -> Option<String> {
        self.to_actual
            .get(display)
            .cloned()
            .or_else(|| Some(display.to_owned()))
    }
}

/// Translator built from two closures.
pub struct FnTranslator<D, A> {
    display: D,
    actual: A,
}

impl<D, A> FnTranslator<D, A>
where
    D: Fn(&str) -> String,
    A: Fn(&str) -> Option<String>,
{
    pub fn new(display: D, actual: A) -> Self {
        Self { display, actual }
    }
}

impl<D, A> ColumnNameTranslator for FnTranslator<D, A>
where
    D: Fn(&str) -> String,
    A: Fn(&str) -> Option<String>,
{
    fn to_display(&self, actual: &str) -> String {
        (self.display)(actual)
    }

    fn to_actual(&self, display: &str) -> Option<String> {
        (self.actual)(display)
    }
}

/// Registry of the dataset's columns plus the active name translator.
///
/// Shared by every subplot through `Rc`; only the translator may change
/// after construction.
pub struct ColumnMetadataManager {
    core: ManagerCore,
    columns: IndexSet<String>,
    translator: RefCell<Rc<dyn ColumnNameTranslator>>,
}

impl fmt::Debug for ColumnMetadataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMetadataManager")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl ColumnMetadataManager {
    pub fn new<I, S>(columns: I) -> PlotResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_translator(columns, Rc::new(IdentityTranslator))
    }

    pub fn with_translator<I, S>(
        columns: I,
        translator: Rc<dyn ColumnNameTranslator>,
    ) -> PlotResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let core = ManagerCore::with_signals(
            "column_metadata",
            None,
            &[signal_names::TRANSLATOR_CHANGED],
        )?;
        let columns: IndexSet<String> = columns.into_iter().map(Into::into).collect();
        core.log_debug(format!("column metadata initialized with {} columns", columns.len()));
        Ok(Self {
            core,
            columns,
            translator: RefCell::new(translator),
        })
    }

    /// Reads the column list from a dataset.
    pub fn from_source(source: &dyn DataSource) -> PlotResult<Self> {
        Self::new(source.column_names())
    }

    #[must_use]
    pub fn columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn is_valid_actual_name(&self, actual: &str) -> bool {
        self.columns.contains(actual)
    }

    #[must_use]
    pub fn is_valid_display_name(&self, display: &str) -> bool {
        self.actual_name(display).is_some()
    }

    #[must_use]
    pub fn display_name(&self, actual: &str) -> String {
        self.translator.borrow().to_display(actual)
    }

    /// Actual column for a display name. Falls back to `display` itself when
    /// it already is a known column.
    #[must_use]
    pub fn actual_name(&self, display: &str) -> Option<String> {
        let translated = self.translator.borrow().to_actual(display);
        match translated {
            Some(actual) if self.is_valid_actual_name(&actual) => Some(actual),
            _ if self.is_valid_actual_name(display) => Some(display.to_owned()),
            _ => None,
        }
    }

    #[must_use]
    pub fn all_display_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| self.display_name(column))
            .collect()
    }

    #[must_use]
    pub fn display_names<S: AsRef<str>>(&self, actual: &[S]) -> Vec<String> {
        actual
            .iter()
            .map(|name| self.display_name(name.as_ref()))
            .collect()
    }

    /// Translates display names, skipping the ones without a known column.
    #[must_use]
    pub fn actual_names<S: AsRef<str>>(&self, display: &[S]) -> Vec<String> {
        display
            .iter()
            .filter_map(|name| self.actual_name(name.as_ref()))
            .collect()
    }

    /// Swaps the translator, e.g. after a language change.
    pub fn set_translator(&self, translator: Rc<dyn ColumnNameTranslator>) {
        *self.translator.borrow_mut() = translator;
        self.core.info("column name translator changed", true);
        self.core
            .emit(signal_names::TRANSLATOR_CHANGED, ManagerEvent::TranslatorChanged);
    }
}

impl Observable for ColumnMetadataManager {
    fn manager_core(&self) -> &ManagerCore {
        &self.core
    }
}
