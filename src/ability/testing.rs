//! Scripted abilities for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{
    Ability, AbilityDescription, ActivationContext, Activation, DestroyContext, Element,
    InstanceLimit, UpdateContext, UpdateResult,
};
use crate::error::AbilityError;
use crate::game::collision::Collision;
use crate::geometry::Collider;

/// Does nothing and never ends.
#[derive(Default)]
pub(crate) struct Inert;

impl Ability for Inert {
    fn activate(&mut self, _ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        true
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        Ok(UpdateResult::Continue)
    }
}

/// Shared call counters.
#[derive(Clone, Default)]
pub(crate) struct Probe {
    pub activations: Arc<AtomicUsize>,
    pub updates: Arc<AtomicUsize>,
    pub destroys: Arc<AtomicUsize>,
    pub collisions: Arc<AtomicUsize>,
    pub reloads: Arc<AtomicUsize>,
}

impl Probe {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Script {
    Continue,
    RemoveAfter(u32),
    Fail,
    Panic,
    Decline,
}

/// What a collision callback writes, if anything.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Response {
    pub remove_self: Option<bool>,
    pub remove_other: Option<bool>,
}

pub(crate) struct Scripted {
    probe: Probe,
    script: Script,
    colliders: Vec<Collider>,
    response: Response,
    ticks: u32,
}

impl Ability for Scripted {
    fn activate(&mut self, _ctx: &mut ActivationContext<'_>, _method: Activation) -> bool {
        if matches!(self.script, Script::Decline) {
            return false;
        }
        Probe::bump(&self.probe.activations);
        true
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<UpdateResult, AbilityError> {
        Probe::bump(&self.probe.updates);
        self.ticks += 1;
        match self.script {
            Script::Continue | Script::Decline => Ok(UpdateResult::Continue),
            Script::RemoveAfter(n) if self.ticks >= n => Ok(UpdateResult::Remove),
            Script::RemoveAfter(_) => Ok(UpdateResult::Continue),
            Script::Fail => Err(AbilityError::Custom("scripted failure".into())),
            Script::Panic => panic!("scripted panic"),
        }
    }

    fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    fn on_collision(&mut self, collision: &mut Collision<'_>) {
        Probe::bump(&self.probe.collisions);
        if let Some(value) = self.response.remove_self {
            collision.set_remove_self(value);
        }
        if let Some(value) = self.response.remove_other {
            collision.set_remove_other(value);
        }
    }

    fn on_destroy(&mut self, _ctx: &mut DestroyContext<'_>) {
        Probe::bump(&self.probe.destroys);
    }

    fn on_config_reload(&mut self, _attributes: &crate::config::AbilityAttributes) {
        Probe::bump(&self.probe.reloads);
    }
}

/// Builder for scripted descriptions.
pub(crate) struct ScriptedSpec {
    pub name: &'static str,
    pub script: Script,
    pub limit: InstanceLimit,
    pub colliders: Vec<Collider>,
    pub response: Response,
    pub activations: Vec<Activation>,
}

impl ScriptedSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            script: Script::Continue,
            limit: InstanceLimit::One,
            colliders: Vec::new(),
            response: Response::default(),
            activations: vec![Activation::Attack],
        }
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    pub fn limit(mut self, limit: InstanceLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    pub fn response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }

    pub fn activations(mut self, activations: &[Activation]) -> Self {
        self.activations = activations.to_vec();
        self
    }

    pub fn build(self, probe: &Probe) -> Arc<AbilityDescription> {
        let probe = probe.clone();
        let script = self.script;
        let colliders = self.colliders;
        let response = self.response;
        AbilityDescription::builder(self.name, move || {
            Box::new(Scripted {
                probe: probe.clone(),
                script,
                colliders: colliders.clone(),
                response,
                ticks: 0,
            })
        })
        .element(Element::Air)
        .activation(&self.activations)
        .limit(self.limit)
        .build()
        .unwrap()
    }

    pub fn build_sequence(self, probe: &Probe) -> Arc<AbilityDescription> {
        let probe = probe.clone();
        let script = self.script;
        AbilityDescription::builder(self.name, move || {
            Box::new(Scripted {
                probe: probe.clone(),
                script,
                colliders: Vec::new(),
                response: Response::default(),
                ticks: 0,
            })
        })
        .element(Element::Air)
        .limit(self.limit)
        .build_sequence()
        .unwrap()
    }
}
