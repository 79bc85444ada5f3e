//! Structural invariants under random event sequences.

use std::time::Duration;

use orion_chat::chat::{PassThrough, SessionState};
use orion_chat::{ChatConfig, ConnectionId, Controller, Effect, LiveSet, ServerEvent};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Connect,
    RequestMatch(usize),
    Send(usize),
    Skip(usize),
    Leave(usize),
    Disconnect(usize),
    /// Transport drops the socket without the core hearing about it yet.
    Vanish(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Connect),
        4 => any::<usize>().prop_map(Op::RequestMatch),
        2 => any::<usize>().prop_map(Op::Send),
        2 => any::<usize>().prop_map(Op::Skip),
        1 => any::<usize>().prop_map(Op::Leave),
        1 => any::<usize>().prop_map(Op::Disconnect),
        1 => any::<usize>().prop_map(Op::Vanish),
    ]
}

struct World {
    registry: LiveSet,
    controller: Controller<LiveSet>,
    ids: Vec<ConnectionId>,
}

impl World {
    fn new() -> Self {
        let registry = LiveSet::new();
        let config = ChatConfig::new().with_rate_limit(3, Duration::from_secs(5));
        let controller = Controller::new(registry.clone(), config).with_sanitizer(PassThrough);
        Self {
            registry,
            controller,
            ids: Vec::new(),
        }
    }

    fn pick(&self, index: usize) -> Option<ConnectionId> {
        (!self.ids.is_empty()).then(|| self.ids[index % self.ids.len()])
    }

    fn apply(&mut self, op: &Op) -> Vec<Effect> {
        match *op {
            Op::Connect => {
                let id = ConnectionId::generate();
                self.registry.insert(id);
                self.ids.push(id);
                self.controller.connect(id)
            }
            Op::RequestMatch(i) => self.with(i, |c, id| c.request_match(id)),
            Op::Send(i) => self.with(i, |c, id| c.send_message(id, &json!("hi"))),
            Op::Skip(i) => self.with(i, |c, id| c.skip(id)),
            Op::Leave(i) => self.with(i, |c, id| c.leave(id)),
            Op::Disconnect(i) => {
                let Some(id) = self.pick(i) else {
                    return Vec::new();
                };
                self.registry.remove(id);
                self.controller.disconnect(id)
            }
            Op::Vanish(i) => {
                if let Some(id) = self.pick(i) {
                    self.registry.remove(id);
                }
                Vec::new()
            }
        }
    }

    fn with(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Controller<LiveSet>, ConnectionId) -> Vec<Effect>,
    ) -> Vec<Effect> {
        match self.pick(index) {
            Some(id) => f(&mut self.controller, id),
            None => Vec::new(),
        }
    }
}

proptest! {
    #[test]
    fn pool_and_pairs_stay_consistent(ops in proptest::collection::vec(op(), 1..200)) {
        let mut world = World::new();

        for op in &ops {
            let effects = world.apply(op);
            let engine = world.controller.engine();

            prop_assert!(engine.is_consistent(), "inconsistent after {:?}", op);

            for (id, partner) in engine.pairs().iter() {
                prop_assert_ne!(id, partner);
                prop_assert_eq!(engine.partner_of(partner), Some(id));
                prop_assert!(!engine.pool().contains(id));
            }

            // Each notification names a distinct recipient-event pair,
            // except message echoes which differ by `self`.
            let mut seen = Vec::new();
            for effect in &effects {
                if let Effect::Notify { to, event } = effect {
                    prop_assert!(!seen.contains(&(to, event)), "duplicate {:?} to {}", event, to);
                    seen.push((to, event));
                }
            }
        }
    }

    #[test]
    fn nobody_is_matched_with_themselves(extra in 0usize..5) {
        let mut world = World::new();
        world.apply(&Op::Connect);
        let id = world.ids[0];

        for _ in 0..=extra {
            world.apply(&Op::RequestMatch(0));
            world.apply(&Op::Skip(0));
        }

        prop_assert_eq!(world.controller.partner_of(id), None);
        prop_assert_eq!(world.controller.state(id), Some(SessionState::Waiting));
    }

    #[test]
    fn partner_disconnect_is_reported_once(messages in 0usize..5) {
        let mut world = World::new();
        world.apply(&Op::Connect);
        world.apply(&Op::Connect);
        world.apply(&Op::RequestMatch(0));
        world.apply(&Op::RequestMatch(1));
        for _ in 0..messages {
            world.apply(&Op::Send(0));
        }

        let (a, b) = (world.ids[0], world.ids[1]);
        let mut effects = world.apply(&Op::Disconnect(0));
        effects.extend(world.apply(&Op::Disconnect(0)));

        let reports = effects
            .iter()
            .filter(|e| **e == Effect::notify(b, ServerEvent::PartnerDisconnected))
            .count();
        prop_assert_eq!(reports, 1);
        prop_assert_eq!(world.controller.partner_of(b), None);
        prop_assert_eq!(world.controller.state(a), None);
    }
}
