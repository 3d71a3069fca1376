//! Builder API for ergonomic graph construction.
//!
//! Provides a fluent interface for filling arrays and objects before they
//! are allocated in a [`Heap`].
//!
//! # Example
//!
//! ```rust
//! use jsonsca::model::{Date, Heap, RegExp};
//!
//! let mut heap = Heap::new();
//! let tags = heap.build_array(|a| a.push("red").push("blue"));
//! let doc = heap.build_object(|o| o
//!     .set("title", "Report")
//!     .set("created", Date::from_epoch_millis(0))
//!     .set("pattern", RegExp::new("^r"))
//!     .set("tags", tags)
//!     .null("owner")
//! );
//! assert!(doc.is_composite());
//! ```
//!
//! Builders cannot express cycles, since an entity's handle only exists once
//! it is allocated. For cyclic graphs allocate first and fill afterwards:
//!
//! ```rust
//! use jsonsca::model::{Heap, Value};
//!
//! let mut heap = Heap::new();
//! let node = heap.alloc_object();
//! heap.get_object_mut(node).unwrap().insert("self", Value::Entity(node));
//! ```

use crate::model::{Entity, Heap, Object, Value};

/// Builder for an object's properties.
#[derive(Debug, Clone, Default)]
pub struct ObjectBuilder {
    object: Object,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.object.insert(key, value.into());
        self
    }

    /// Sets a property to `null`.
    pub fn null(mut self, key: impl Into<String>) -> Self {
        self.object.insert(key, Value::Null);
        self
    }

    /// Sets a property to `undefined`.
    pub fn undefined(mut self, key: impl Into<String>) -> Self {
        self.object.insert(key, Value::Undefined);
        self
    }

    /// Returns the built object without allocating it.
    pub fn build(self) -> Object {
        self.object
    }

    /// Allocates the object in `heap`.
    pub fn build_in(self, heap: &mut Heap) -> Value {
        Value::Entity(heap.alloc(Entity::Object(self.object)))
    }
}

/// Builder for an array's elements.
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    items: Vec<Value>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element.
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.items.push(value.into());
        self
    }

    /// Appends every element of `values`.
    pub fn extend<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.items.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Vec<Value> {
        self.items
    }

    /// Allocates the array in `heap`.
    pub fn build_in(self, heap: &mut Heap) -> Value {
        heap.array(self.items)
    }
}

impl Heap {
    /// Builds and allocates an object.
    pub fn build_object<F>(&mut self, f: F) -> Value
    where
        F: FnOnce(ObjectBuilder) -> ObjectBuilder,
    {
        f(ObjectBuilder::new()).build_in(self)
    }

    /// Builds and allocates an array.
    pub fn build_array<F>(&mut self, f: F) -> Value
    where
        F: FnOnce(ArrayBuilder) -> ArrayBuilder,
    {
        f(ArrayBuilder::new()).build_in(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Date;

    #[test]
    fn test_object_builder() {
        let mut heap = Heap::new();
        let value = heap.build_object(|o| {
            o.set("name", "Alice")
                .set("age", 30)
                .set("born", Date::from_epoch_millis(-1000))
                .null("spouse")
                .undefined("pet")
        });

        let object = heap.get_object(value.as_handle().unwrap()).unwrap();
        assert_eq!(object.len(), 5);
        assert_eq!(object.get("name").and_then(Value::as_str), Some("Alice"));
        assert_eq!(object.get("age").and_then(Value::as_i64), Some(30));
        assert_eq!(object.get("spouse"), Some(&Value::Null));
        assert_eq!(object.get("pet"), Some(&Value::Undefined));
    }

    #[test]
    fn test_array_builder_shares_handles() {
        let mut heap = Heap::new();
        let shared = heap.build_object(|o| o.set("x", 1));
        let list = heap.build_array(|a| {
            a.push(shared.clone())
                .push(shared.clone())
                .extend([1i64, 2])
        });

        let items = heap.get_array(list.as_handle().unwrap()).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], items[1]);
        assert_eq!(items[2].as_i64(), Some(1));
    }
}
