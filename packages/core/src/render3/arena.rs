//! View Arena
//!
//! The upstream expresses the cyclic view/container graph through object
//! references; here every LView and LContainer lives in a slab owned by the
//! runtime and relationships are generational indices. A freed slot bumps
//! its generation so stale back-references (declaration views, parents) are
//! detected on use instead of resurrecting a recycled slot.
//!
//! TViews are shapes shared across instances and are never freed.

use crate::render3::interfaces::container::LContainer;
use crate::render3::interfaces::view::{LView, TView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TViewId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LViewId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LContainerId {
    index: u32,
    generation: u32,
}

struct Entry<T> {
    generation: u32,
    item: Option<T>,
}

#[derive(Default)]
pub struct ViewArena {
    tviews: Vec<TView>,
    views: Vec<Entry<LView>>,
    containers: Vec<Entry<LContainer>>,
    free_views: Vec<u32>,
    free_containers: Vec<u32>,
    next_view_uid: u64,
}

impl ViewArena {
    pub fn new() -> Self {
        ViewArena::default()
    }

    // ---- TViews -----------------------------------------------------------

    pub fn next_tview_id(&self) -> TViewId {
        TViewId(self.tviews.len() as u32)
    }

    pub fn insert_tview(&mut self, tview: TView) -> TViewId {
        let id = TViewId(self.tviews.len() as u32);
        debug_assert_eq!(tview.id, id, "TView allocated with a foreign id");
        self.tviews.push(tview);
        id
    }

    pub fn tview(&self, id: TViewId) -> &TView {
        &self.tviews[id.0 as usize]
    }

    pub fn tview_mut(&mut self, id: TViewId) -> &mut TView {
        &mut self.tviews[id.0 as usize]
    }

    // ---- LViews -----------------------------------------------------------

    /// Monotonic per-instance id stamped into the LView header.
    pub fn next_view_uid(&mut self) -> u64 {
        self.next_view_uid += 1;
        self.next_view_uid
    }

    pub fn insert_view(&mut self, view: LView) -> LViewId {
        if let Some(index) = self.free_views.pop() {
            let entry = &mut self.views[index as usize];
            entry.item = Some(view);
            LViewId {
                index,
                generation: entry.generation,
            }
        } else {
            self.views.push(Entry {
                generation: 0,
                item: Some(view),
            });
            LViewId {
                index: (self.views.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    pub fn is_live_view(&self, id: LViewId) -> bool {
        self.views
            .get(id.index as usize)
            .map(|e| e.generation == id.generation && e.item.is_some())
            .unwrap_or(false)
    }

    pub fn try_view(&self, id: LViewId) -> Option<&LView> {
        let entry = self.views.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.item.as_ref()
    }

    pub fn view(&self, id: LViewId) -> &LView {
        self.try_view(id).expect("stale LView reference")
    }

    pub fn view_mut(&mut self, id: LViewId) -> &mut LView {
        let entry = &mut self.views[id.index as usize];
        assert_eq!(entry.generation, id.generation, "stale LView reference");
        entry.item.as_mut().expect("stale LView reference")
    }

    /// Borrows an instance buffer together with its shape table.
    pub fn view_and_tview_mut(&mut self, id: LViewId) -> (&mut LView, &mut TView) {
        let entry = &mut self.views[id.index as usize];
        assert_eq!(entry.generation, id.generation, "stale LView reference");
        let view = entry.item.as_mut().expect("stale LView reference");
        let tview = &mut self.tviews[view.tview.0 as usize];
        (view, tview)
    }

    /// Frees the slot and invalidates every outstanding id for it.
    pub fn remove_view(&mut self, id: LViewId) -> Option<LView> {
        let entry = self.views.get_mut(id.index as usize)?;
        if entry.generation != id.generation || entry.item.is_none() {
            return None;
        }
        let view = entry.item.take();
        entry.generation = entry.generation.wrapping_add(1);
        self.free_views.push(id.index);
        view
    }

    // ---- LContainers ------------------------------------------------------

    pub fn insert_container(&mut self, container: LContainer) -> LContainerId {
        if let Some(index) = self.free_containers.pop() {
            let entry = &mut self.containers[index as usize];
            entry.item = Some(container);
            LContainerId {
                index,
                generation: entry.generation,
            }
        } else {
            self.containers.push(Entry {
                generation: 0,
                item: Some(container),
            });
            LContainerId {
                index: (self.containers.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    pub fn try_container(&self, id: LContainerId) -> Option<&LContainer> {
        let entry = self.containers.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.item.as_ref()
    }

    pub fn container(&self, id: LContainerId) -> &LContainer {
        self.try_container(id).expect("stale LContainer reference")
    }

    pub fn container_mut(&mut self, id: LContainerId) -> &mut LContainer {
        let entry = &mut self.containers[id.index as usize];
        assert_eq!(entry.generation, id.generation, "stale LContainer reference");
        entry.item.as_mut().expect("stale LContainer reference")
    }

    pub fn remove_container(&mut self, id: LContainerId) -> Option<LContainer> {
        let entry = self.containers.get_mut(id.index as usize)?;
        if entry.generation != id.generation || entry.item.is_none() {
            return None;
        }
        let container = entry.item.take();
        entry.generation = entry.generation.wrapping_add(1);
        self.free_containers.push(id.index);
        container
    }
}
