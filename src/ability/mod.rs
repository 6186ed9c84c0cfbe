//! Abilities
//!
//! Definitions (`description`), the behavior trait and instance wrapper
//! (`instance`), the borrowed contexts abilities run with (`context`) and
//! the per-tick removal conditions (`policy`).

pub mod context;
pub mod description;
pub mod instance;
pub mod policy;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ActivationContext, DestroyContext, EntityCommand, HitFilter, UpdateContext};
pub use description::{
    AbilityDescription, AbilityFactory, AbilityKey, AbilityRegistry, Activation, DescriptionBuilder,
    Element, InstanceLimit,
};
pub use instance::{Ability, AbilityInstance, InstanceId, UpdateResult};
pub use policy::{Condition, PolicyConfig, Predicate, RemovalPolicy};
