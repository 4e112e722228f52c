//! Dense ordered-list management for sibling entities.

use uuid::Uuid;

use storyforge_core::model::{Chapter, Scene};

/// An entity that occupies a dense 1..N position among its siblings.
pub trait Ordered {
    /// Entity identifier.
    fn id(&self) -> Uuid;
    /// Current position.
    fn order(&self) -> u32;
    /// Overwrites the position (used only by reindexing).
    fn set_order(&mut self, order: u32);
}

impl Ordered for Chapter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl Ordered for Scene {
    fn id(&self) -> Uuid {
        self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// An ordered sibling list whose positions are always exactly `{1..N}`.
///
/// The collection is synchronous and side-effect-free beyond its own
/// vector; serializing concurrent mutations is the caller's job (the
/// workspace does it through busy keys). Reordering by drag/drop is not
/// supported.
#[derive(Debug, Clone)]
pub struct OrderedCollection<T: Ordered> {
    items: Vec<T>,
}

// Manual impl: the derive would demand `T: Default`, which the entity
// types do not (and should not) provide.
impl<T: Ordered> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ordered> OrderedCollection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The position a newly appended item receives: `max + 1`, or `1` when
    /// the collection is empty.
    #[must_use]
    pub fn next_order(&self) -> u32 {
        self.items.last().map_or(1, |item| item.order() + 1)
    }

    /// Inserts a server-confirmed item at the position its order dictates.
    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.items.sort_by_key(Ordered::order);
        self.debug_assert_dense();
    }

    /// Removes the item with `id` and renumbers the remainder to `1..N-1`,
    /// preserving relative order. Returns the removed item.
    pub fn remove_and_reindex(&mut self, id: Uuid) -> Option<T> {
        let position = self.items.iter().position(|item| item.id() == id)?;
        let removed = self.items.remove(position);
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_order(u32::try_from(index).unwrap_or(u32::MAX - 1) + 1);
        }
        self.debug_assert_dense();
        Some(removed)
    }

    /// Replaces the whole collection with a server-provided list, sorted by
    /// the server's orders and trusted verbatim.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.items.sort_by_key(Ordered::order);
        self.debug_assert_dense();
    }

    /// Applies `f` to the item with `id`. Returns whether it was found.
    pub fn update(&mut self, id: Uuid, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// The item with `id`, if present.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// All items, ascending by order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn debug_assert_dense(&self) {
        debug_assert!(
            self.items
                .iter()
                .enumerate()
                .all(|(index, item)| item.order() as usize == index + 1),
            "sibling orders must be exactly 1..N"
        );
    }
}

impl<T: Ordered + Clone> OrderedCollection<T> {
    /// Snapshot of all items for the rendering layer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}
