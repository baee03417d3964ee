use std::sync::mpsc::{self, Receiver};
use std::time::Instant;
use tracing::trace;

use crate::actions::{self, Action};
use crate::cache::Cache;
use crate::effects::{self, Effect, Runtime};
use crate::store::Store;

pub struct State {
    pub store: Store,
    pub cache: Cache,
    runtime: Runtime,
    inbox: Receiver<Action>,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
    /// Persist key of the last change seen by the save debouncer.
    observed: (u64, u64),
}

impl State {
    /// `build` receives the sending half of the inbox that workers post to.
    pub fn new(store: Store, build: impl FnOnce(mpsc::Sender<Action>) -> Runtime) -> Self {
        let (tx, inbox) = mpsc::channel();
        let observed = store.persist_key();
        Self {
            store,
            cache: Cache::new(),
            runtime: build(tx),
            inbox,
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
            observed,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        while !self.action_queue.is_empty() {
            let actions = std::mem::take(&mut self.action_queue);
            for action in actions {
                let mut effects = actions::update(&mut self.store, action);
                self.effect_queue.append(&mut effects);
            }
        }
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            if let Some(action) = effects::run(&mut self.runtime, effect) {
                self.action_queue.push(action);
            }
        }
    }

    /// Move results posted by workers onto the action queue.
    pub fn poll_inbox(&mut self) {
        while let Ok(action) = self.inbox.try_recv() {
            trace!(?action, "worker result");
            self.action_queue.push(action);
        }
    }

    /// Restart the save timer after a change and queue a save once it
    /// has been quiet long enough.
    pub fn tick(&mut self, now: Instant) {
        let key = self.store.persist_key();
        if key != self.observed {
            self.observed = key;
            if self.store.persistence_ready {
                self.store.save_debounce.touch(now);
            }
        }
        if self.store.save_debounce.fire(now) {
            self.dispatch(Action::SaveNow);
        }
    }

    /// One frame worth of work: worker results, queued actions, the save
    /// timer and the resulting effects.
    pub fn pump(&mut self, now: Instant) {
        self.poll_inbox();
        self.flush_actions();
        self.tick(now);
        self.flush_actions();
        self.flush_effects();
        self.flush_actions();
    }
}
