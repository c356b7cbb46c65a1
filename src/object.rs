//! Game objects and their deferred lifecycle.
//!
//! Objects are created through [`Commands::instantiate`] (or the engine helpers) and
//! wait in a pending list until the next pre-phase, where they are started in creation
//! order and moved into the live list. Every frame each live object is ticked, then
//! post-ticked. Destroying an object only flags it and queues its id; the post-phase
//! removes it from the live list once the frame is over, so the list is never mutated
//! while it is being iterated.
//!
//! # Key types
//!
//! - [`GameObject`] is the trait game code implements; every hook defaults to a no-op
//! - [`ObjectContext`] is what a hook receives: its own id and lifetime, the
//!   [`Commands`] queue and the [`Stage`]
//! - [`ObjectRegistry`] owns the live list and runs the phases

use std::{collections::HashSet, fmt};

use crate::scene::{Scene, Stage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[allow(unused_variables)]
pub trait GameObject: 'static {
    /// Runs once in the pre-phase of the frame the object becomes live.
    fn on_start(&mut self, ctx: &mut ObjectContext<'_>) {}

    fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {}

    /// Runs after [`on_tick`](Self::on_tick) and the built-in lifetime countdown,
    /// including in the frame the object gets destroyed.
    fn on_post_tick(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {}
}

/// Relative slack applied when a lifetime runs out, so a budget that is an exact
/// multiple of the frame time does not pick up an extra frame from f32 rounding.
const LIFE_TIME_TOLERANCE: f32 = 1e-5;

/// Built-in lifetime budget.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lifecycle {
    /// Seconds the object lives for; zero or less means forever.
    pub life_time: f32,
    pub life_time_timer: f32,
}

impl Lifecycle {
    pub fn with_life_time(seconds: f32) -> Self {
        Self {
            life_time: seconds,
            life_time_timer: seconds,
        }
    }

    /// Counts the timer down by `dt`. Returns true when the budget just ran out.
    fn count_down(&mut self, dt: f32) -> bool {
        if self.life_time <= 0.0 {
            return false;
        }
        self.life_time_timer -= dt;
        self.life_time_timer <= self.life_time * LIFE_TIME_TOLERANCE
    }
}

struct Entry {
    id: ObjectId,
    lifecycle: Lifecycle,
    object: Box<dyn GameObject>,
}

/// Deferred structural changes to the object lists.
///
/// This is the handle game code uses to create objects and queue destruction; it
/// never touches the live list directly.
#[derive(Default)]
pub struct Commands {
    next_id: u64,
    pending: Vec<Entry>,
    destroy_queue: Vec<ObjectId>,
    pending_destroy: HashSet<ObjectId>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("pending", &self.pending.iter().map(|e| e.id).collect::<Vec<_>>())
            .field("destroy_queue", &self.destroy_queue)
            .finish()
    }
}

impl Commands {
    /// Queues `object` for the next pre-phase.
    pub fn instantiate(&mut self, object: impl GameObject) -> ObjectId {
        self.instantiate_boxed(Box::new(object))
    }

    /// Queues `object` with a lifetime budget of `seconds`; zero or less means forever.
    ///
    /// The countdown starts with the object's first tick.
    pub fn instantiate_with_life_time(&mut self, object: impl GameObject, seconds: f32) -> ObjectId {
        self.push(Box::new(object), Lifecycle::with_life_time(seconds))
    }

    pub fn instantiate_boxed(&mut self, object: Box<dyn GameObject>) -> ObjectId {
        self.push(object, Lifecycle::default())
    }

    fn push(&mut self, object: Box<dyn GameObject>, lifecycle: Lifecycle) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.pending.push(Entry {
            id,
            lifecycle,
            object,
        });
        id
    }

    /// Flags `id` for removal at the end of the frame. Repeated calls are no-ops.
    ///
    /// An object destroyed before its pre-phase is never started.
    pub fn destroy(&mut self, id: ObjectId) {
        if self.pending_destroy.insert(id) {
            self.destroy_queue.push(id);
        }
    }

    pub fn is_pending_destroy(&self, id: ObjectId) -> bool {
        self.pending_destroy.contains(&id)
    }

    pub fn is_pending_instantiation(&self, id: ObjectId) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn destroy_queue_len(&self) -> usize {
        self.destroy_queue.len()
    }
}

/// Everything a lifecycle hook can reach.
pub struct ObjectContext<'a> {
    id: ObjectId,
    lifecycle: &'a mut Lifecycle,
    commands: &'a mut Commands,
    stage: &'a mut Stage,
}

impl<'a> ObjectContext<'a> {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Flags this object for removal at the end of the frame.
    pub fn destroy(&mut self) {
        self.commands.destroy(self.id);
    }

    pub fn destroy_object(&mut self, id: ObjectId) {
        self.commands.destroy(id);
    }

    pub fn is_pending_destroy(&self) -> bool {
        self.commands.is_pending_destroy(self.id)
    }

    pub fn instantiate(&mut self, object: impl GameObject) -> ObjectId {
        self.commands.instantiate(object)
    }

    pub fn instantiate_with_life_time(&mut self, object: impl GameObject, seconds: f32) -> ObjectId {
        self.commands.instantiate_with_life_time(object, seconds)
    }

    /// Sets the lifetime budget and restarts its timer.
    pub fn set_life_time(&mut self, seconds: f32) {
        *self.lifecycle = Lifecycle::with_life_time(seconds);
    }

    pub fn life_time(&self) -> f32 {
        self.lifecycle.life_time
    }

    pub fn remaining_life_time(&self) -> f32 {
        self.lifecycle.life_time_timer
    }

    pub fn commands(&mut self) -> &mut Commands {
        &mut *self.commands
    }

    pub fn stage(&self) -> &Stage {
        &*self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut *self.stage
    }

    pub fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.stage.scene
    }
}

#[derive(Default)]
pub struct ObjectRegistry {
    live: Vec<Entry>,
    commands: Commands,
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("live", &self.live_ids())
            .field("commands", &self.commands)
            .finish()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&mut self) -> &mut Commands {
        &mut self.commands
    }

    pub fn instantiate(&mut self, object: impl GameObject) -> ObjectId {
        self.commands.instantiate(object)
    }

    pub fn instantiate_with_life_time(&mut self, object: impl GameObject, seconds: f32) -> ObjectId {
        self.commands.instantiate_with_life_time(object, seconds)
    }

    pub fn destroy(&mut self, id: ObjectId) {
        self.commands.destroy(id);
    }

    /// Starts every pending object in creation order and makes it live.
    ///
    /// Objects instantiated from an `on_start` hook join the end of the queue and are
    /// started in the same pre-phase. Objects already flagged for destruction are
    /// dropped without being started.
    pub fn pre_loop(&mut self, stage: &mut Stage) {
        while !self.commands.pending.is_empty() {
            let mut entry = self.commands.pending.remove(0);
            if self.commands.pending_destroy.remove(&entry.id) {
                self.commands.destroy_queue.retain(|queued| *queued != entry.id);
                log::debug!("Object {} was destroyed before it started", entry.id);
                continue;
            }
            let Entry {
                id,
                lifecycle,
                object,
            } = &mut entry;
            let mut ctx = ObjectContext {
                id: *id,
                lifecycle,
                commands: &mut self.commands,
                stage: &mut *stage,
            };
            object.on_start(&mut ctx);
            self.live.push(entry);
        }
    }

    /// Ticks every live object, counting lifetimes down between tick and post-tick.
    pub fn tick(&mut self, stage: &mut Stage, dt: f32) {
        let Self { live, commands } = self;
        for entry in live.iter_mut() {
            let Entry {
                id,
                lifecycle,
                object,
            } = entry;
            let mut ctx = ObjectContext {
                id: *id,
                lifecycle,
                commands: &mut *commands,
                stage: &mut *stage,
            };
            object.on_tick(&mut ctx, dt);
            if !ctx.is_pending_destroy() && ctx.lifecycle.count_down(dt) {
                log::debug!("Object {} ran out of life time", ctx.id);
                ctx.destroy();
            }
            object.on_post_tick(&mut ctx, dt);
        }
    }

    /// Removes every object queued for destruction this frame.
    pub fn post_loop(&mut self) {
        let queue = std::mem::take(&mut self.commands.destroy_queue);
        for id in queue {
            self.commands.pending_destroy.remove(&id);
            if let Some(index) = self.live.iter().position(|e| e.id == id) {
                self.live.remove(index);
            } else if let Some(index) = self.commands.pending.iter().position(|e| e.id == id) {
                self.commands.pending.remove(index);
            } else {
                log::warn!("Object {} was destroyed but is not known to the engine", id);
            }
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.live.iter().any(|e| e.id == id)
    }

    pub fn is_pending_destroy(&self, id: ObjectId) -> bool {
        self.commands.is_pending_destroy(id)
    }

    pub fn is_pending_instantiation(&self, id: ObjectId) -> bool {
        self.commands.is_pending_instantiation(id)
    }

    pub fn live_ids(&self) -> Vec<ObjectId> {
        self.live.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drops every live and pending object.
    pub fn clear(&mut self) {
        self.live.clear();
        self.commands = Commands {
            next_id: self.commands.next_id,
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
            }
        }
    }

    impl GameObject for Recorder {
        fn on_start(&mut self, _: &mut ObjectContext<'_>) {
            self.log.borrow_mut().push(format!("{} start", self.name));
        }

        fn on_tick(&mut self, _: &mut ObjectContext<'_>, _: f32) {
            self.log.borrow_mut().push(format!("{} tick", self.name));
        }

        fn on_post_tick(&mut self, ctx: &mut ObjectContext<'_>, _: f32) {
            let suffix = if ctx.is_pending_destroy() { " (dying)" } else { "" };
            self.log
                .borrow_mut()
                .push(format!("{} post{}", self.name, suffix));
        }
    }

    fn frame(registry: &mut ObjectRegistry, stage: &mut Stage, dt: f32) {
        registry.pre_loop(stage);
        registry.tick(stage, dt);
        registry.post_loop();
    }

    #[test]
    fn pending_objects_start_in_creation_order_then_tick() {
        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        registry.instantiate(Recorder::new("a", &log));
        registry.instantiate(Recorder::new("b", &log));

        frame(&mut registry, &mut stage, 0.1);

        assert_eq!(
            *log.borrow(),
            vec!["a start", "b start", "a tick", "a post", "b tick", "b post"]
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn lifetime_runs_out_after_ceil_budget_ticks() {
        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        let id = registry.instantiate_with_life_time(Recorder::new("t", &log), 2.5);

        for _ in 0..3 {
            assert!(!registry.is_pending_destroy(id));
            frame(&mut registry, &mut stage, 1.0);
        }
        assert!(!registry.contains(id));
        let ticks = log.borrow().iter().filter(|l| *l == "t tick").count();
        assert_eq!(ticks, 3);
        assert_eq!(log.borrow().last().unwrap(), "t post (dying)");

        frame(&mut registry, &mut stage, 1.0);
        let ticks = log.borrow().iter().filter(|l| *l == "t tick").count();
        assert_eq!(ticks, 3);
    }

    #[test]
    fn destroy_twice_queues_once() {
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        let id = registry.instantiate(Recorder::new("x", &Log::default()));
        registry.pre_loop(&mut stage);

        registry.destroy(id);
        registry.destroy(id);
        assert_eq!(registry.commands().destroy_queue_len(), 1);
        assert!(registry.is_pending_destroy(id));

        registry.post_loop();
        assert!(!registry.contains(id));
        assert!(!registry.is_pending_destroy(id));
    }

    #[test]
    fn destroying_before_start_cancels_instantiation() {
        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        let id = registry.instantiate(Recorder::new("ghost", &log));
        registry.destroy(id);

        registry.pre_loop(&mut stage);
        assert!(!registry.contains(id));
        assert!(!registry.is_pending_instantiation(id));
        assert!(!registry.is_pending_destroy(id));
        assert_eq!(registry.commands().destroy_queue_len(), 0);

        registry.tick(&mut stage, 1.0);
        registry.post_loop();
        assert!(log.borrow().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn cancelled_instantiation_leaves_siblings_alone() {
        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        let ghost = registry.instantiate(Recorder::new("ghost", &log));
        let kept = registry.instantiate(Recorder::new("kept", &log));
        registry.destroy(ghost);

        frame(&mut registry, &mut stage, 1.0);
        assert_eq!(registry.live_ids(), vec![kept]);
        assert_eq!(*log.borrow(), vec!["kept start", "kept tick", "kept post"]);
    }

    #[test]
    fn fractional_frame_times_do_not_add_a_tick() {
        for (life_time, dt, expected) in [(0.3, 0.1, 3), (1.0, 1.0 / 60.0, 60), (0.5, 1.0 / 30.0, 15)] {
            let log = Log::default();
            let mut registry = ObjectRegistry::new();
            let mut stage = Stage::default();
            let id = registry.instantiate_with_life_time(Recorder::new("t", &log), life_time);

            let mut frames = 0;
            while registry.contains(id) || frames == 0 {
                frame(&mut registry, &mut stage, dt);
                frames += 1;
                assert!(frames <= expected, "{life_time}/{dt} outlived its budget");
            }
            let ticks = log.borrow().iter().filter(|l| *l == "t tick").count();
            assert_eq!(ticks, expected, "{life_time}/{dt}");
        }
    }

    #[test]
    fn budget_just_above_a_whole_number_of_frames_takes_one_more() {
        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        let id = registry.instantiate_with_life_time(Recorder::new("t", &log), 0.31);

        for _ in 0..3 {
            frame(&mut registry, &mut stage, 0.1);
        }
        assert!(registry.contains(id));
        frame(&mut registry, &mut stage, 0.1);
        assert!(!registry.contains(id));
    }

    #[test]
    fn spawns_from_start_hooks_start_in_the_same_pre_phase() {
        struct Spawner(Log);
        impl GameObject for Spawner {
            fn on_start(&mut self, ctx: &mut ObjectContext<'_>) {
                ctx.instantiate(Recorder::new("child", &self.0));
            }
        }

        let log = Log::default();
        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        registry.instantiate(Spawner(log.clone()));
        registry.pre_loop(&mut stage);

        assert_eq!(registry.len(), 2);
        assert_eq!(*log.borrow(), vec!["child start"]);
    }

    #[test]
    fn objects_can_reach_the_scene() {
        struct Mover;
        impl GameObject for Mover {
            fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {
                ctx.scene_mut().camera.transform.position.x += dt;
            }
        }

        let mut registry = ObjectRegistry::new();
        let mut stage = Stage::default();
        registry.instantiate(Mover);
        frame(&mut registry, &mut stage, 0.5);
        frame(&mut registry, &mut stage, 0.5);
        assert_eq!(stage.camera().transform.position.x, 1.0);
    }

    #[test]
    fn clear_keeps_ids_unique() {
        let mut registry = ObjectRegistry::new();
        let first = registry.instantiate(Recorder::new("a", &Log::default()));
        registry.clear();
        let second = registry.instantiate(Recorder::new("b", &Log::default()));
        assert_ne!(first, second);
    }
}
