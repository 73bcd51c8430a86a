//! Managed list items.
//!
//! A [`ManagedItem`] is the list engine's record of one row: display fields,
//! string properties and an opaque link to caller data. Items are cheap
//! shared handles; clones refer to the same item.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──add──► Attached(id) ──remove/reset/replace──► Invalidated
//! ```
//!
//! An attached item mirrors every field write onto its native row. An
//! invalidated item is frozen: getters return empty values, [`pos`](ManagedItem::pos)
//! returns `None` and setters fail with [`ItemError::Invalidated`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_listsync_core::logging::targets;
use horizon_listsync_core::{ControlError, ItemError};

use super::control::{ContextMenuEntry, NativeRow, RowData, RowHandle};
use super::identity::{ID_PROPERTY, INDEX_PROPERTY, IdentityAllocator, ItemId};
use super::view::{ViewHandle, write_row};

/// Opaque reference to caller-owned data behind an item.
pub type DataSource = Arc<dyn Any + Send + Sync>;

/// Hook run once when an item leaves its list.
pub(crate) type DestroyHook = Box<dyn FnOnce() + Send + Sync>;

/// The list an attached item reports to.
///
/// Implemented by the list engine. Items call it only while holding no item
/// lock, so the engine may lock its own state and then individual items.
pub(crate) trait ItemOwner: Send + Sync {
    /// Current display position of `item`.
    fn position_of(&self, item: &ManagedItem) -> Option<usize>;

    /// Native row currently displaying `item`.
    fn row_for(&self, item: &ManagedItem) -> Option<RowHandle>;

    /// Record a property name in the list's normalized key set.
    fn note_property_key(&self, key: &str);

    /// The list's normalized property key set.
    fn property_keys(&self) -> Vec<String>;
}

enum ItemState {
    Unattached,
    Attached {
        id: ItemId,
        owner: Weak<dyn ItemOwner>,
        view: ViewHandle,
    },
    Invalidated,
}

struct ItemInner {
    data: RowData,
    data_source: Option<DataSource>,
    state: ItemState,
    on_destroy: Option<DestroyHook>,
}

/// Where a field write should land once the item lock is released.
enum WriteTarget {
    Nowhere,
    Row(RowHandle, ItemId),
    Lookup(Arc<dyn ItemOwner>, ItemId),
}

/// One entry of a managed list.
#[derive(Clone)]
pub struct ManagedItem {
    inner: Arc<RwLock<ItemInner>>,
}

impl Default for ManagedItem {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for ManagedItem {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ManagedItem {}

impl fmt::Debug for ManagedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        let mut s = f.debug_struct("ManagedItem");
        s.field("label", &inner.data.label);
        match &inner.state {
            ItemState::Unattached => s.field("state", &"Unattached"),
            ItemState::Attached { id, view, .. } => {
                s.field("id", id).field("view", view)
            }
            ItemState::Invalidated => s.field("state", &"Invalidated"),
        };
        s.finish()
    }
}

impl ManagedItem {
    /// Create an unattached item with a primary label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ItemInner {
                data: RowData {
                    label: label.into(),
                    ..Default::default()
                },
                data_source: None,
                state: ItemState::Unattached,
                on_destroy: None,
            })),
        }
    }

    /// Set the secondary label.
    pub fn with_label2(self, label: impl Into<String>) -> Self {
        self.inner.write().data.label2 = label.into();
        self
    }

    /// Set the icon art reference.
    pub fn with_icon(self, icon: impl Into<String>) -> Self {
        self.inner.write().data.icon = icon.into();
        self
    }

    /// Set the thumbnail art reference.
    pub fn with_thumbnail(self, thumbnail: impl Into<String>) -> Self {
        self.inner.write().data.thumbnail = thumbnail.into();
        self
    }

    /// Set the path or URI.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.inner.write().data.path = path.into();
        self
    }

    /// Link caller data to the item.
    pub fn with_data_source<T: Any + Send + Sync>(self, source: T) -> Self {
        self.inner.write().data_source = Some(Arc::new(source));
        self
    }

    /// Link an already shared data reference to the item.
    pub fn with_shared_data_source(self, source: DataSource) -> Self {
        self.inner.write().data_source = Some(source);
        self
    }

    /// Set an initial property.
    pub fn with_property(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner
            .write()
            .data
            .properties
            .insert(key.into(), value.into());
        self
    }

    /// Returns `true` if both handles refer to the same item.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// The primary label.
    pub fn label(&self) -> String {
        self.inner.read().data.label.clone()
    }

    /// The secondary label.
    pub fn label2(&self) -> String {
        self.inner.read().data.label2.clone()
    }

    /// The icon art reference.
    pub fn icon(&self) -> String {
        self.inner.read().data.icon.clone()
    }

    /// The thumbnail art reference.
    pub fn thumbnail(&self) -> String {
        self.inner.read().data.thumbnail.clone()
    }

    /// The path or URI.
    pub fn path(&self) -> String {
        self.inner.read().data.path.clone()
    }

    /// A property value, `""` if unset.
    pub fn property(&self, key: &str) -> String {
        self.inner
            .read()
            .data
            .properties
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// All properties set on the item.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.inner.read().data.properties.clone()
    }

    /// Context-menu entries attached to the item.
    pub fn context_menu_items(&self) -> Vec<ContextMenuEntry> {
        self.inner.read().data.context_menu.clone()
    }

    /// The linked caller data.
    pub fn data_source(&self) -> Option<DataSource> {
        self.inner.read().data_source.clone()
    }

    /// The linked caller data, downcast to `T`.
    pub fn data_source_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data_source()?.downcast::<T>().ok()
    }

    /// The native selected flag.
    pub fn is_selected(&self) -> bool {
        self.inner.read().data.selected
    }

    /// The identity token issued when the item was last attached.
    pub fn identity(&self) -> Option<ItemId> {
        match &self.inner.read().state {
            ItemState::Attached { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns `true` if the item still carries `id`.
    ///
    /// Deferred work captures the token before it starts and checks it here
    /// before applying its result; a replaced or removed item never matches.
    pub fn has_identity(&self, id: ItemId) -> bool {
        self.identity() == Some(id)
    }

    /// Returns `false` once the item has been invalidated.
    pub fn is_valid(&self) -> bool {
        !matches!(self.inner.read().state, ItemState::Invalidated)
    }

    /// Returns `true` if the item belongs to a live list.
    pub fn is_attached(&self) -> bool {
        self.owner().is_some()
    }

    /// Display position inside the owning list.
    pub fn pos(&self) -> Option<usize> {
        self.owner()?.position_of(self)
    }

    /// The current binding to a native row.
    pub fn view(&self) -> ViewHandle {
        match &self.inner.read().state {
            ItemState::Attached { view, .. } => view.clone(),
            _ => ViewHandle::Detached,
        }
    }

    /// The native row displaying the item, looked up and bound if needed.
    ///
    /// Fails with [`ItemError::Detached`] when the item has no reachable
    /// row: never attached, its list is gone, or views are suspended.
    pub fn native_row(&self) -> Result<RowHandle, ItemError> {
        let target = {
            let inner = self.inner.read();
            if matches!(inner.state, ItemState::Invalidated) {
                return Err(ItemError::Invalidated);
            }
            write_target(&inner.state)
        };
        self.resolve(target)
            .map(|(row, _)| row)
            .ok_or(ItemError::Detached)
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Set the primary label.
    pub fn set_label(&self, label: impl Into<String>) -> Result<(), ItemError> {
        let label = label.into();
        self.mutate(|d| d.label = label.clone(), |row, ()| row.set_label(&label))
    }

    /// Set the secondary label.
    pub fn set_label2(&self, label: impl Into<String>) -> Result<(), ItemError> {
        let label = label.into();
        self.mutate(|d| d.label2 = label.clone(), |row, ()| row.set_label2(&label))
    }

    /// Set the icon art reference.
    pub fn set_icon(&self, icon: impl Into<String>) -> Result<(), ItemError> {
        let icon = icon.into();
        self.mutate(
            |d| {
                d.icon = icon.clone();
                d.thumbnail.clone()
            },
            |row, thumbnail| row.set_art(&icon, &thumbnail),
        )
    }

    /// Set the thumbnail art reference.
    pub fn set_thumbnail(&self, thumbnail: impl Into<String>) -> Result<(), ItemError> {
        let thumbnail = thumbnail.into();
        self.mutate(
            |d| {
                d.thumbnail = thumbnail.clone();
                d.icon.clone()
            },
            |row, icon| row.set_art(&icon, &thumbnail),
        )
    }

    /// Set the path or URI.
    pub fn set_path(&self, path: impl Into<String>) -> Result<(), ItemError> {
        let path = path.into();
        self.mutate(|d| d.path = path.clone(), |row, ()| row.set_path(&path))
    }

    /// Set a string property.
    ///
    /// The key joins the owning list's normalized key set, so every other
    /// row is blanked for it on the next refresh.
    pub fn set_property(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ItemError> {
        let key = key.into();
        let value = value.into();
        self.mutate(
            |d| {
                d.properties.insert(key.clone(), value.clone());
            },
            |row, ()| row.set_property(&key, &value),
        )?;
        if let Some(owner) = self.owner() {
            owner.note_property_key(&key);
        }
        Ok(())
    }

    /// Set several properties at once.
    pub fn set_properties<I, K, V>(&self, pairs: I) -> Result<(), ItemError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.set_property(key, value)?;
        }
        Ok(())
    }

    /// Set every key in `keys` to the same value.
    pub fn set_property_for_all<K: AsRef<str>>(
        &self,
        keys: &[K],
        value: &str,
    ) -> Result<(), ItemError> {
        for key in keys {
            self.set_property(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Set a boolean property, stored as `"1"` or `""`.
    pub fn set_bool_property(&self, key: impl Into<String>, value: bool) -> Result<(), ItemError> {
        self.set_property(key, if value { "1" } else { "" })
    }

    /// Blank every field and property value, then rewrite the whole row.
    pub fn clear(&self) -> Result<(), ItemError> {
        let (target, snapshot) = {
            let mut inner = self.inner.write();
            if matches!(inner.state, ItemState::Invalidated) {
                return Err(ItemError::Invalidated);
            }
            let data = &mut inner.data;
            data.label.clear();
            data.label2.clear();
            data.icon.clear();
            data.thumbnail.clear();
            data.path.clear();
            for value in data.properties.values_mut() {
                value.clear();
            }
            (write_target(&inner.state), inner.data.clone())
        };

        let Some((row, id)) = self.resolve(target) else {
            return Ok(());
        };
        let keys = self.owner().map(|o| o.property_keys()).unwrap_or_default();
        if let Err(e) = write_row(row.as_ref(), id, &snapshot, &keys) {
            log_write_failure(&e);
        }
        Ok(())
    }

    /// Attach context-menu entries, optionally replacing existing ones.
    pub fn add_context_menu_items(
        &self,
        items: Vec<ContextMenuEntry>,
        replace: bool,
    ) -> Result<(), ItemError> {
        self.mutate(
            |d| {
                if replace {
                    d.context_menu.clear();
                }
                d.context_menu.extend(items.iter().cloned());
            },
            |row, ()| row.add_context_menu_items(&items, replace),
        )
    }

    /// Set the native selected flag.
    pub fn select(&self, selected: bool) -> Result<(), ItemError> {
        self.mutate(|d| d.selected = selected, |row, ()| row.set_selected(selected))
    }

    /// Register a hook run exactly once when the item leaves its list.
    pub fn set_on_destroy<F>(&self, hook: F) -> Result<(), ItemError>
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        if matches!(inner.state, ItemState::Invalidated) {
            return Err(ItemError::Invalidated);
        }
        inner.on_destroy = Some(Box::new(hook));
        Ok(())
    }

    /// Replace the linked caller data.
    pub fn set_data_source(&self, source: Option<DataSource>) -> Result<(), ItemError> {
        let mut inner = self.inner.write();
        if matches!(inner.state, ItemState::Invalidated) {
            return Err(ItemError::Invalidated);
        }
        inner.data_source = source;
        Ok(())
    }

    // =========================================================================
    // Engine interface
    // =========================================================================

    /// Address of the shared item, for identity sets.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Attach to a list, issuing a fresh identity token.
    ///
    /// Returns the row data to materialize, stamped with the token.
    pub(crate) fn attach(
        &self,
        ids: &mut IdentityAllocator,
        owner: Weak<dyn ItemOwner>,
    ) -> Result<RowData, ItemError> {
        let mut inner = self.inner.write();
        match &inner.state {
            ItemState::Invalidated => return Err(ItemError::Invalidated),
            ItemState::Attached { owner, .. } if owner.strong_count() > 0 => {
                return Err(ItemError::AlreadyAttached);
            }
            _ => {}
        }
        let id = ids.next_id();
        inner.state = ItemState::Attached {
            id,
            owner,
            view: ViewHandle::Detached,
        };
        Ok(stamped(&inner.data, id))
    }

    /// Issue a new identity token while staying attached, dropping the row.
    pub(crate) fn reissue(&self, ids: &mut IdentityAllocator) -> Option<RowData> {
        let mut inner = self.inner.write();
        let ItemState::Attached { id, view, .. } = &mut inner.state else {
            return None;
        };
        *id = ids.next_id();
        *view = ViewHandle::Detached;
        let id = *id;
        Some(stamped(&inner.data, id))
    }

    /// Invalidate the item, returning its destroy hook.
    pub(crate) fn invalidate(&self) -> Option<DestroyHook> {
        let mut inner = self.inner.write();
        inner.state = ItemState::Invalidated;
        inner.data = RowData::default();
        inner.data_source = None;
        inner.on_destroy.take()
    }

    /// Swap the current view for `view`, returning the previous one.
    pub(crate) fn replace_view(&self, view: ViewHandle) -> ViewHandle {
        match &mut self.inner.write().state {
            ItemState::Attached { view: current, .. } => std::mem::replace(current, view),
            _ => ViewHandle::Detached,
        }
    }

    /// Bind `row` and rewrite every field onto it, recording `index` as the
    /// item's display position.
    pub(crate) fn bind_row<'a>(
        &self,
        row: RowHandle,
        keys: impl IntoIterator<Item = &'a String>,
        index: usize,
    ) -> Result<(), ControlError> {
        let (id, snapshot) = {
            let mut inner = self.inner.write();
            let ItemState::Attached { id, view, .. } = &mut inner.state else {
                return Ok(());
            };
            *view = ViewHandle::Bound(row.clone());
            let id = *id;
            inner
                .data
                .properties
                .insert(INDEX_PROPERTY.to_string(), index.to_string());
            (id, inner.data.clone())
        };
        write_row(row.as_ref(), id, &snapshot, keys)
    }

    fn owner(&self) -> Option<Arc<dyn ItemOwner>> {
        match &self.inner.read().state {
            ItemState::Attached { owner, .. } => owner.upgrade(),
            _ => None,
        }
    }

    /// Apply `edit` to the fields, then mirror the change through `write`
    /// onto the native row if one can be reached.
    fn mutate<T, E, W>(&self, edit: E, write: W) -> Result<(), ItemError>
    where
        E: FnOnce(&mut RowData) -> T,
        W: FnOnce(&dyn NativeRow, T) -> Result<(), ControlError>,
    {
        let (target, value) = {
            let mut inner = self.inner.write();
            if matches!(inner.state, ItemState::Invalidated) {
                return Err(ItemError::Invalidated);
            }
            let value = edit(&mut inner.data);
            (write_target(&inner.state), value)
        };

        if let Some((row, _)) = self.resolve(target) {
            if let Err(e) = write(row.as_ref(), value) {
                log_write_failure(&e);
            }
        }
        Ok(())
    }

    /// Turn a write target into a row, fetching and binding it lazily.
    fn resolve(&self, target: WriteTarget) -> Option<(RowHandle, ItemId)> {
        match target {
            WriteTarget::Nowhere => None,
            WriteTarget::Row(row, id) => Some((row, id)),
            WriteTarget::Lookup(owner, id) => {
                let row = owner.row_for(self)?;
                let mut inner = self.inner.write();
                match &mut inner.state {
                    ItemState::Attached {
                        id: current,
                        view: view @ ViewHandle::Detached,
                        ..
                    } if *current == id => {
                        *view = ViewHandle::Bound(row.clone());
                    }
                    _ => return None,
                }
                Some((row, id))
            }
        }
    }
}

static_assertions::assert_impl_all!(ManagedItem: Send, Sync);

fn write_target(state: &ItemState) -> WriteTarget {
    match state {
        ItemState::Attached { id, owner, view } => match view {
            ViewHandle::Bound(row) => WriteTarget::Row(row.clone(), *id),
            ViewHandle::Detached => match owner.upgrade() {
                Some(owner) => WriteTarget::Lookup(owner, *id),
                None => WriteTarget::Nowhere,
            },
            ViewHandle::Suspended => WriteTarget::Nowhere,
        },
        _ => WriteTarget::Nowhere,
    }
}

fn stamped(data: &RowData, id: ItemId) -> RowData {
    let mut data = data.clone();
    data.properties
        .insert(ID_PROPERTY.to_string(), id.to_string());
    data
}

fn log_write_failure(error: &ControlError) {
    tracing::warn!(target: targets::ITEM, %error, "native row write failed");
}
