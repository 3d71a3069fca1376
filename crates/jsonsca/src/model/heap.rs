//! Arena storage for composite values.
//!
//! Composites are allocated once and addressed by [`Handle`]. Identity is the
//! handle: two structurally equal objects allocated separately are different
//! entities, and a handle stored in several places is one shared entity.
//! Cycles are just handles pointing back into the arena.

use indexmap::IndexMap;

use crate::model::Value;

/// Index of an entity within one [`Heap`].
///
/// Handles are only meaningful for the heap that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Position of the entity in its heap.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Bytes of a binary leaf, or a locator a [`ByteSource`](crate::codec::ByteSource)
/// resolves to bytes during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Bytes already held in memory.
    Inline(Vec<u8>),
    /// An opaque locator (path, URL, object key, ...).
    External(String),
}

impl Payload {
    /// Returns the inline bytes, if any.
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Inline(bytes) => Some(bytes),
            Payload::External(_) => None,
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Inline(bytes)
    }
}

/// An opaque binary value with a MIME type.
///
/// A blob with a `name` is a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub name: Option<String>,
    pub payload: Payload,
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            mime_type: mime_type.into(),
            name: None,
            payload: payload.into(),
        }
    }

    /// Creates a named blob (a file).
    pub fn file(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            name: Some(name.into()),
            payload: payload.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.name.is_some()
    }
}

/// A typed pixel buffer.
///
/// Colour space is not modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Payload,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: impl Into<Payload>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

/// A keyed collection of properties.
///
/// Properties keep insertion order; inserting an existing key replaces its
/// value without moving it. Equality compares properties in order.
#[derive(Debug, Clone, Default)]
pub struct Object {
    properties: IndexMap<String, Value>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            properties: IndexMap::with_capacity(capacity),
        }
    }

    /// Sets a property, returning the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.properties.get_mut(key)
    }

    /// Removes a property, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

/// A composite value stored in a heap.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Array(Vec<Value>),
    Object(Object),
    Blob(Blob),
    ImageData(ImageData),
}

impl Entity {
    /// Returns the entity kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Array(_) => "array",
            Entity::Object(_) => "object",
            Entity::Blob(blob) if blob.is_file() => "file",
            Entity::Blob(_) => "blob",
            Entity::ImageData(_) => "imagedata",
        }
    }
}

/// Arena owning every composite of a value graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heap {
    entities: Vec<Entity>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
        }
    }

    /// Stores an entity and returns its handle.
    pub fn alloc(&mut self, entity: Entity) -> Handle {
        let handle = Handle(self.entities.len());
        self.entities.push(entity);
        handle
    }

    /// Allocates an empty array, to be filled later.
    pub fn alloc_array(&mut self) -> Handle {
        self.alloc(Entity::Array(Vec::new()))
    }

    /// Allocates an empty object, to be filled later.
    pub fn alloc_object(&mut self) -> Handle {
        self.alloc(Entity::Object(Object::new()))
    }

    /// Allocates an array holding `items`.
    pub fn array(&mut self, items: Vec<Value>) -> Value {
        Value::Entity(self.alloc(Entity::Array(items)))
    }

    /// Allocates an object holding `properties`.
    pub fn object<K: Into<String>>(
        &mut self,
        properties: impl IntoIterator<Item = (K, Value)>,
    ) -> Value {
        let mut object = Object::new();
        for (key, value) in properties {
            object.insert(key, value);
        }
        Value::Entity(self.alloc(Entity::Object(object)))
    }

    pub fn blob(&mut self, blob: Blob) -> Value {
        Value::Entity(self.alloc(Entity::Blob(blob)))
    }

    pub fn image_data(&mut self, image: ImageData) -> Value {
        Value::Entity(self.alloc(Entity::ImageData(image)))
    }

    /// Replaces the entity behind `handle`, returning the old one.
    ///
    /// Returns `None` (and stores nothing) if the handle is not from this heap.
    pub fn replace(&mut self, handle: Handle, entity: Entity) -> Option<Entity> {
        self.entities
            .get_mut(handle.index())
            .map(|slot| std::mem::replace(slot, entity))
    }

    pub fn get(&self, handle: Handle) -> Option<&Entity> {
        self.entities.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        self.entities.get_mut(handle.index())
    }

    /// Resolves a value to its entity, if it is a composite of this heap.
    pub fn resolve(&self, value: &Value) -> Option<&Entity> {
        value.as_handle().and_then(|h| self.get(h))
    }

    pub fn get_array(&self, handle: Handle) -> Option<&Vec<Value>> {
        match self.get(handle)? {
            Entity::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get_array_mut(&mut self, handle: Handle) -> Option<&mut Vec<Value>> {
        match self.get_mut(handle)? {
            Entity::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get_object(&self, handle: Handle) -> Option<&Object> {
        match self.get(handle)? {
            Entity::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn get_object_mut(&mut self, handle: Handle) -> Option<&mut Object> {
        match self.get_mut(handle)? {
            Entity::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn get_blob(&self, handle: Handle) -> Option<&Blob> {
        match self.get(handle)? {
            Entity::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn get_image_data(&self, handle: Handle) -> Option<&ImageData> {
        match self.get(handle)? {
            Entity::ImageData(image) => Some(image),
            _ => None,
        }
    }

    /// Number of entities allocated.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A value together with the heap its composites live in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub heap: Heap,
    pub root: Value,
}

impl Graph {
    pub fn new(heap: Heap, root: Value) -> Self {
        Self { heap, root }
    }

    /// Resolves the root to its entity, if it is a composite.
    pub fn root_entity(&self) -> Option<&Entity> {
        self.heap.resolve(&self.root)
    }
}
