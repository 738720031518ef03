//! Typed options parsed from the annotations attached to a type.
//!
//! Each option names a generated method. An absent option uses the default
//! name; an option given as an empty string disables that capability.

use quarry_model::{Annotation, AnnotationValue};

use crate::error::OptionsError;

/// The configured state of one named hook.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum HookSetting {
    /// Not given: use the documented default name.
    #[default]
    Default,
    /// Given as blank: do not generate this capability.
    Disabled,
    /// Given with an explicit method name.
    Custom(String),
}

impl HookSetting {
    /// Parses the value of option `key`.
    pub fn parse(key: &str, value: Option<&AnnotationValue>) -> Result<Self, OptionsError> {
        let Some(value) = value else {
            return Ok(HookSetting::Default);
        };
        let Some(text) = value.as_str() else {
            return Err(OptionsError::NotAString {
                key: key.to_string(),
            });
        };
        let name = text.trim();
        if name.is_empty() {
            return Ok(HookSetting::Disabled);
        }
        if !is_identifier(name) {
            return Err(OptionsError::InvalidName {
                key: key.to_string(),
                value: text.to_string(),
            });
        }
        Ok(HookSetting::Custom(name.to_string()))
    }

    /// The method name to generate, or `None` when disabled.
    pub fn resolve(&self, default: &str) -> Option<String> {
        match self {
            HookSetting::Default => Some(default.to_string()),
            HookSetting::Disabled => None,
            HookSetting::Custom(name) => Some(name.clone()),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn check_keys(annotation: &Annotation, known: &[&str]) -> Result<(), OptionsError> {
    match annotation.values.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(OptionsError::UnknownOption {
            annotation: annotation.name.simple_name().to_string(),
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

/// Options of the searchable annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// The parameterized search method.
    pub search_method: HookSetting,
    /// The query-string search method.
    pub simple_search_method: HookSetting,
    /// The persistence callback that reindexes the entity.
    pub post_persist_or_update_method: HookSetting,
    /// The persistence callback that removes the entity from the index.
    pub pre_remove_method: HookSetting,
    /// Prefix of the single and bulk index methods.
    pub index_method: HookSetting,
    /// The index removal method.
    pub delete_index_method: HookSetting,
}

impl SearchOptions {
    const KEYS: [&'static str; 6] = [
        "searchMethod",
        "simpleSearchMethod",
        "postPersistOrUpdateMethod",
        "preRemoveMethod",
        "indexMethod",
        "deleteIndexMethod",
    ];

    /// Parses the annotation's attributes. Unknown attributes are an error.
    pub fn parse(annotation: &Annotation) -> Result<Self, OptionsError> {
        check_keys(annotation, &Self::KEYS)?;
        let get = |key: &str| HookSetting::parse(key, annotation.get(key));
        Ok(Self {
            search_method: get("searchMethod")?,
            simple_search_method: get("simpleSearchMethod")?,
            post_persist_or_update_method: get("postPersistOrUpdateMethod")?,
            pre_remove_method: get("preRemoveMethod")?,
            index_method: get("indexMethod")?,
            delete_index_method: get("deleteIndexMethod")?,
        })
    }

    /// Resolves every hook against its default name.
    pub fn hooks(&self) -> SearchHooks {
        SearchHooks {
            search: self.search_method.resolve("search"),
            simple_search: self.simple_search_method.resolve("search"),
            post_persist_or_update: self
                .post_persist_or_update_method
                .resolve("postPersistOrUpdate"),
            pre_remove: self.pre_remove_method.resolve("preRemove"),
            index: self.index_method.resolve("index"),
            delete_index: self.delete_index_method.resolve("deleteIndex"),
        }
    }
}

/// Resolved method names of the search hooks; `None` means disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHooks {
    /// Parameterized search.
    pub search: Option<String>,
    /// Query-string search.
    pub simple_search: Option<String>,
    /// Post-persist/update callback.
    pub post_persist_or_update: Option<String>,
    /// Pre-remove callback.
    pub pre_remove: Option<String>,
    /// Index method prefix.
    pub index: Option<String>,
    /// Index removal.
    pub delete_index: Option<String>,
}

impl Default for SearchHooks {
    fn default() -> Self {
        SearchOptions::default().hooks()
    }
}

/// Options of the web-searchable annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WebSearchOptions {
    /// The search endpoint method.
    pub search_method: HookSetting,
    /// The autocomplete endpoint method.
    pub auto_complete_method: HookSetting,
}

impl WebSearchOptions {
    const KEYS: [&'static str; 2] = ["searchMethod", "autoCompleteMethod"];

    /// Parses the annotation's attributes. Unknown attributes are an error.
    pub fn parse(annotation: &Annotation) -> Result<Self, OptionsError> {
        check_keys(annotation, &Self::KEYS)?;
        Ok(Self {
            search_method: HookSetting::parse("searchMethod", annotation.get("searchMethod"))?,
            auto_complete_method: HookSetting::parse(
                "autoCompleteMethod",
                annotation.get("autoCompleteMethod"),
            )?,
        })
    }

    /// The search endpoint name, or `None` when disabled.
    pub fn search(&self) -> Option<String> {
        self.search_method.resolve("search")
    }

    /// The autocomplete endpoint name, or `None` when disabled.
    pub fn auto_complete(&self) -> Option<String> {
        self.auto_complete_method.resolve("autoComplete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::SEARCHABLE;
    use quarry_model::TypeName;

    fn searchable() -> Annotation {
        Annotation::new(TypeName::known(SEARCHABLE))
    }

    #[test]
    fn absent_options_use_defaults() {
        let hooks = SearchOptions::parse(&searchable()).unwrap().hooks();
        assert_eq!(hooks, SearchHooks::default());
        assert_eq!(hooks.search.as_deref(), Some("search"));
        assert_eq!(hooks.simple_search.as_deref(), Some("search"));
        assert_eq!(hooks.index.as_deref(), Some("index"));
        assert_eq!(hooks.delete_index.as_deref(), Some("deleteIndex"));
        assert_eq!(hooks.post_persist_or_update.as_deref(), Some("postPersistOrUpdate"));
        assert_eq!(hooks.pre_remove.as_deref(), Some("preRemove"));
    }

    #[test]
    fn empty_disables_and_absent_does_not() {
        let options = SearchOptions::parse(&searchable().with("indexMethod", "")).unwrap();
        assert_eq!(options.index_method, HookSetting::Disabled);
        assert_eq!(options.delete_index_method, HookSetting::Default);
        let hooks = options.hooks();
        assert_eq!(hooks.index, None);
        assert_eq!(hooks.delete_index.as_deref(), Some("deleteIndex"));
    }

    #[test]
    fn blank_counts_as_empty() {
        let options = SearchOptions::parse(&searchable().with("searchMethod", "   ")).unwrap();
        assert_eq!(options.search_method, HookSetting::Disabled);
    }

    #[test]
    fn custom_names_are_kept() {
        let options = SearchOptions::parse(&searchable().with("indexMethod", "reindex")).unwrap();
        assert_eq!(options.hooks().index.as_deref(), Some("reindex"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = SearchOptions::parse(&searchable().with("indexMethd", "x")).unwrap_err();
        assert_eq!(
            err,
            OptionsError::UnknownOption {
                annotation: "RooElasticsearchSearchable".into(),
                key: "indexMethd".into(),
            }
        );
    }

    #[test]
    fn non_string_and_bad_names_are_rejected() {
        assert!(matches!(
            SearchOptions::parse(&searchable().with("indexMethod", true)),
            Err(OptionsError::NotAString { .. })
        ));
        assert!(matches!(
            SearchOptions::parse(&searchable().with("indexMethod", "re-index")),
            Err(OptionsError::InvalidName { .. })
        ));
    }

    #[test]
    fn web_search_defaults() {
        let annotation = Annotation::new(TypeName::known(crate::annotations::WEB_SEARCHABLE))
            .with("autoCompleteMethod", "");
        let options = WebSearchOptions::parse(&annotation).unwrap();
        assert_eq!(options.search().as_deref(), Some("search"));
        assert_eq!(options.auto_complete(), None);
    }
}
