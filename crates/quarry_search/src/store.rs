//! The in-memory set of type declarations the physical type provider serves.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use quarry_model::{TypeDecl, TypeName};

/// Shared, mutable view of the project's type declarations.
///
/// Cloning yields another handle to the same declarations. The project
/// writes through one handle; the physical type provider reads through
/// another.
#[derive(Clone, Debug, Default)]
pub struct TypeStore {
    types: Rc<RefCell<IndexMap<TypeName, TypeDecl>>>,
}

impl TypeStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a declaration, returning the previous one.
    pub fn put(&self, decl: TypeDecl) -> Option<TypeDecl> {
        self.types.borrow_mut().insert(decl.name.clone(), decl)
    }

    /// Removes a declaration.
    pub fn remove(&self, name: &TypeName) -> Option<TypeDecl> {
        self.types.borrow_mut().shift_remove(name)
    }

    /// Returns a copy of the declaration for `name`.
    pub fn get(&self, name: &TypeName) -> Option<TypeDecl> {
        self.types.borrow().get(name).cloned()
    }

    /// Names of all declarations, in insertion order.
    pub fn names(&self) -> Vec<TypeName> {
        self.types.borrow().keys().cloned().collect()
    }

    /// Names of the declarations carrying the annotation `marker`.
    pub fn annotated_with(&self, marker: &TypeName) -> Vec<TypeName> {
        self.types
            .borrow()
            .values()
            .filter(|decl| decl.has_annotation(marker))
            .map(|decl| decl.name.clone())
            .collect()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    /// Returns `true` if the store holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.types.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_model::Annotation;

    #[test]
    fn handles_share_contents() {
        let store = TypeStore::new();
        let reader = store.clone();
        let name = TypeName::new("com.example.Person").unwrap();
        store.put(TypeDecl::new(name.clone()));
        assert_eq!(reader.len(), 1);
        assert!(reader.get(&name).is_some());
        reader.remove(&name);
        assert!(store.is_empty());
    }

    #[test]
    fn finds_annotated_types() {
        let store = TypeStore::new();
        let marker = TypeName::known("org.springframework.roo.addon.entity.RooEntity");
        let mut person = TypeDecl::new(TypeName::new("com.example.Person").unwrap());
        person.add_annotation(Annotation::new(marker.clone()));
        store.put(person);
        store.put(TypeDecl::new(TypeName::new("com.example.Util").unwrap()));
        assert_eq!(
            store.annotated_with(&marker),
            vec![TypeName::new("com.example.Person").unwrap()]
        );
    }
}
