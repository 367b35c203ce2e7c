//! Presentation hooks driven by the game loop.
//!
//! A [`View`] is anything that reacts to the simulation without being part of
//! it: meshes following an entity, audio, camera rigs, HUD state. Views are
//! driven on two clocks:
//!
//! - [`update`](View::update) once per fixed logic tick, after the systems;
//! - [`draw`](View::draw) once per rendered frame, with the interpolation
//!   factor between the previous and the current tick.
//!
//! Entity views belong to one entity and are destroyed with it. Auxiliary
//! views are keyed by a [`ViewKey`] and live until removed.
//!
//! Views run in ascending [`depth`](View::depth). Equal depths keep
//! registration order, entity views before auxiliary views.

use std::collections::HashMap;
use std::collections::HashSet;

use glam::Vec2;
use lantern_ecs::entity::EntityId;
use lantern_ecs::handle::{Handle, HandleAllocator};
use lantern_ecs::registry::EntityRegistry;
use lantern_ecs::store::ComponentStore;
use tracing::{debug, warn};

use crate::state::SimulationState;

// ---------------------------------------------------------------------------
// Frame context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Input sampled by the host since the last frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashSet<String>,
    /// Pointer movement since the last frame, in pixels.
    pub look_delta: Vec2,
}

impl InputState {
    pub fn press(&mut self, key: impl Into<String>) {
        self.pressed.insert(key.into());
    }

    pub fn release(&mut self, key: &str) {
        self.pressed.remove(key);
    }

    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed.contains(key)
    }
}

/// Per-frame data the host owns and views read.
#[derive(Debug, Clone, Default)]
pub struct FrameContext {
    pub viewport: Viewport,
    /// Milliseconds since the simulation started.
    pub time_ms: f64,
    pub input: InputState,
}

/// What a view may touch while it runs.
///
/// Views mutate the simulation through `state`; anything structural
/// (destroying entities) should be queued as a command.
pub struct ViewContext<'a> {
    pub state: &'a mut SimulationState,
    pub entities: &'a EntityRegistry,
    pub frame: &'a FrameContext,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Presentation hook. Every method has a no-op default.
pub trait View {
    fn depth(&self) -> i32 {
        0
    }

    /// Render with `lerp` in `[0, 1)` between the previous and current tick.
    fn draw(&mut self, _ctx: &mut ViewContext<'_>, _lerp: f32) {}

    /// Fixed-step game logic.
    fn update(&mut self, _ctx: &mut ViewContext<'_>) {}

    /// Release presentation resources. Called once, on removal.
    fn cleanup(&mut self, _ctx: &mut ViewContext<'_>) {}

    /// The viewport changed.
    fn camera_update(&mut self, _ctx: &mut ViewContext<'_>) {}
}

// ---------------------------------------------------------------------------
// ViewSync
// ---------------------------------------------------------------------------

/// Marker for [`ViewKey`].
pub enum AuxiliaryView {}

pub type ViewKey = Handle<AuxiliaryView>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Entity(EntityId),
    Auxiliary(ViewKey),
}

/// Owns every view and drives them in depth order.
pub struct ViewSync {
    entity_views: ComponentStore<Box<dyn View>>,
    auxiliary_views: HashMap<ViewKey, Box<dyn View>>,
    auxiliary_order: Vec<ViewKey>,
    keys: HandleAllocator<AuxiliaryView>,
    sorted: Vec<Slot>,
    needs_sort: bool,
}

impl Default for ViewSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSync {
    pub fn new() -> Self {
        Self {
            entity_views: ComponentStore::new("entity_view"),
            auxiliary_views: HashMap::new(),
            auxiliary_order: Vec::new(),
            keys: HandleAllocator::new(),
            sorted: Vec::new(),
            needs_sort: false,
        }
    }

    /// Attach `view` to `entity`, replacing any view it already had. A
    /// replaced view is dropped without cleanup.
    pub fn add_entity_view(&mut self, entity: EntityId, view: Box<dyn View>) {
        if self.entity_views.contains(entity) {
            warn!(entity = %entity, "replacing entity view without cleanup");
        }
        self.entity_views.insert(entity, view);
        self.needs_sort = true;
    }

    pub fn add_auxiliary_view(&mut self, view: Box<dyn View>) -> ViewKey {
        let key = self.keys.next();
        self.auxiliary_views.insert(key, view);
        self.auxiliary_order.push(key);
        self.needs_sort = true;
        key
    }

    pub fn has_entity_view(&self, entity: EntityId) -> bool {
        self.entity_views.contains(entity)
    }

    pub fn has_auxiliary_view(&self, key: ViewKey) -> bool {
        self.auxiliary_views.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entity_views.len() + self.auxiliary_views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-sort before the next pass, e.g. after a view changed its depth.
    pub fn trigger_sort(&mut self) {
        self.needs_sort = true;
    }

    /// Clean up and remove the entity's view. Returns whether one existed.
    pub fn destroy_entity_view(&mut self, ctx: &mut ViewContext<'_>, entity: EntityId) -> bool {
        let Some(mut view) = self.entity_views.remove(entity) else {
            return false;
        };
        view.cleanup(ctx);
        self.needs_sort = true;
        debug!(entity = %entity, "entity view destroyed");
        true
    }

    /// Clean up and remove an auxiliary view. Returns whether it existed.
    pub fn destroy_auxiliary_view(&mut self, ctx: &mut ViewContext<'_>, key: ViewKey) -> bool {
        let Some(mut view) = self.auxiliary_views.remove(&key) else {
            return false;
        };
        self.auxiliary_order.retain(|k| *k != key);
        view.cleanup(ctx);
        self.needs_sort = true;
        true
    }

    pub fn draw(&mut self, ctx: &mut ViewContext<'_>, lerp: f32) {
        self.for_each_sorted(|view| view.draw(ctx, lerp));
    }

    pub fn update(&mut self, ctx: &mut ViewContext<'_>) {
        self.for_each_sorted(|view| view.update(ctx));
    }

    pub fn camera_update(&mut self, ctx: &mut ViewContext<'_>) {
        self.for_each_sorted(|view| view.camera_update(ctx));
    }

    /// Clean up every view, then remove them all.
    pub fn cleanup(&mut self, ctx: &mut ViewContext<'_>) {
        self.for_each_sorted(|view| view.cleanup(ctx));
        self.entity_views.clear();
        self.auxiliary_views.clear();
        self.auxiliary_order.clear();
        self.sorted.clear();
        self.needs_sort = false;
    }

    fn sort_if_needed(&mut self) {
        if !self.needs_sort {
            return;
        }
        let mut slots: Vec<(i32, Slot)> = self
            .entity_views
            .iter()
            .map(|(entity, view)| (view.depth(), Slot::Entity(entity)))
            .collect();
        slots.extend(self.auxiliary_order.iter().filter_map(|key| {
            self.auxiliary_views
                .get(key)
                .map(|view| (view.depth(), Slot::Auxiliary(*key)))
        }));
        slots.sort_by_key(|(depth, _)| *depth);
        self.sorted = slots.into_iter().map(|(_, slot)| slot).collect();
        self.needs_sort = false;
    }

    fn for_each_sorted(&mut self, mut visit: impl FnMut(&mut dyn View)) {
        self.sort_if_needed();
        for i in 0..self.sorted.len() {
            let view = match self.sorted[i] {
                Slot::Entity(entity) => self.entity_views.get_mut(entity).ok(),
                Slot::Auxiliary(key) => self.auxiliary_views.get_mut(&key),
            };
            if let Some(view) = view {
                visit(view.as_mut());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        depth: i32,
        log: Log,
    }

    impl View for Probe {
        fn depth(&self) -> i32 {
            self.depth
        }

        fn draw(&mut self, _ctx: &mut ViewContext<'_>, lerp: f32) {
            self.log.borrow_mut().push(format!("draw:{}:{lerp}", self.name));
        }

        fn update(&mut self, _ctx: &mut ViewContext<'_>) {
            self.log.borrow_mut().push(format!("update:{}", self.name));
        }

        fn cleanup(&mut self, _ctx: &mut ViewContext<'_>) {
            self.log.borrow_mut().push(format!("cleanup:{}", self.name));
        }
    }

    fn probe(name: &'static str, depth: i32, log: &Log) -> Box<dyn View> {
        Box::new(Probe {
            name,
            depth,
            log: Rc::clone(log),
        })
    }

    struct Harness {
        state: SimulationState,
        entities: EntityRegistry,
        frame: FrameContext,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: SimulationState::default(),
                entities: EntityRegistry::new(),
                frame: FrameContext::default(),
            }
        }

        fn ctx(&mut self) -> ViewContext<'_> {
            ViewContext {
                state: &mut self.state,
                entities: &self.entities,
                frame: &self.frame,
            }
        }
    }

    #[test]
    fn views_run_by_depth_then_registration() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut views = ViewSync::new();
        let a = h.entities.create();
        let b = h.entities.create();

        views.add_auxiliary_view(probe("hud", 10, &log));
        views.add_entity_view(a, probe("a", 0, &log));
        views.add_auxiliary_view(probe("audio", 0, &log));
        views.add_entity_view(b, probe("b", -1, &log));

        views.update(&mut h.ctx());
        assert_eq!(
            *log.borrow(),
            vec!["update:b", "update:a", "update:audio", "update:hud"]
        );
    }

    #[test]
    fn draw_passes_lerp() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut views = ViewSync::new();
        views.add_auxiliary_view(probe("x", 0, &log));
        views.draw(&mut h.ctx(), 0.25);
        assert_eq!(*log.borrow(), vec!["draw:x:0.25"]);
    }

    #[test]
    fn destroying_views_runs_cleanup_once() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut views = ViewSync::new();
        let e = h.entities.create();
        views.add_entity_view(e, probe("e", 0, &log));
        let key = views.add_auxiliary_view(probe("aux", 0, &log));

        assert!(views.destroy_entity_view(&mut h.ctx(), e));
        assert!(!views.destroy_entity_view(&mut h.ctx(), e));
        assert!(views.destroy_auxiliary_view(&mut h.ctx(), key));
        assert!(!views.destroy_auxiliary_view(&mut h.ctx(), key));

        views.update(&mut h.ctx());
        assert_eq!(*log.borrow(), vec!["cleanup:e", "cleanup:aux"]);
        assert!(views.is_empty());
    }

    #[test]
    fn cleanup_runs_every_view_and_empties() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut views = ViewSync::new();
        let e = h.entities.create();
        views.add_entity_view(e, probe("e", 0, &log));
        views.add_auxiliary_view(probe("aux", 0, &log));

        views.cleanup(&mut h.ctx());
        views.update(&mut h.ctx());

        assert_eq!(*log.borrow(), vec!["cleanup:e", "cleanup:aux"]);
        assert!(views.is_empty());
    }

    #[test]
    fn viewport_aspect_handles_zero_height() {
        assert_eq!(Viewport { width: 10, height: 0 }.aspect(), 1.0);
        assert_eq!(Viewport { width: 16, height: 8 }.aspect(), 2.0);
    }

    #[test]
    fn input_press_and_release() {
        let mut input = InputState::default();
        input.press("KeyE");
        assert!(input.is_pressed("KeyE"));
        input.release("KeyE");
        assert!(!input.is_pressed("KeyE"));
    }
}
