//! The match simulation: who is lit, who is hurt, who won.
//!
//! Everything here is synchronous and deterministic. A [`Match`] owns the
//! actors and the level for one game, and [`Match::tick`] runs one fixed
//! pass over them:
//!
//! ```text
//! visibility ─▶ resources ─▶ shadow form ─▶ objectives ─▶ clock
//!     │             │                           │            │
//!     └─ exposure   └─ Dead? ──▶ win check ◀── Escaped?   time-out
//! ```
//!
//! The session layer decides *when* to tick and what to tell observers; this
//! crate only decides *what happens*.
//!
//! # Key types
//!
//! - [`LightSource`] / [`Occluder`]: the two collaborator capabilities
//! - [`VisibilityChecker`]: light + obstruction → [`Exposure`]
//! - [`Health`], [`Battery`], [`Flashlight`], [`ChargeSession`]: resources
//! - [`ShadowFormController`]: the dive/emerge state machine
//! - [`WinDeterminer`]: Shadow statuses → [`Verdict`]
//! - [`Match`]: the per-tick pass tying it together

mod actor;
mod battery;
mod charging;
mod config;
mod error;
mod game;
mod health;
mod level;
mod light;
mod objectives;
mod occlusion;
mod shadow_form;
mod visibility;
mod win;

pub use actor::{DiveInput, GameActor, GuardianKit, ShadowKit};
pub use battery::{Battery, Flashlight};
pub use charging::{ChargeProgress, ChargeSession, ChargingStation};
pub use config::{
    ChargingConfig, FlashlightConfig, HealthConfig, LampConfig, LevelConfig,
    MatchConfig, MovementProfile, RegenTrigger, ShadowFormConfig,
};
pub use error::ActionError;
pub use game::{Match, TickReport};
pub use health::{Health, HealthChange};
pub use level::Level;
pub use light::{Lamp, LightSource, SphereLight, SpotLight};
pub use objectives::{KeyZone, TriggerZone};
pub use occlusion::{Aabb, BlockingGeometry, Occluder};
pub use shadow_form::{FormEvent, ShadowFormController};
pub use visibility::{Exposure, ExposureEdge, ExposureTracker, VisibilityChecker};
pub use win::{Verdict, WinDeterminer};
