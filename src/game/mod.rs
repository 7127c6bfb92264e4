//! Core game state and turn machinery

pub mod dragon_attack;
pub mod effects;
pub mod logger;
pub mod phase;
pub mod resolver;
pub mod roll;
pub mod sequencer;
pub mod snapshot;
pub mod state;
pub mod view;

pub use dragon_attack::{
    determine_targets, resolve_dragon_attack, DragonAttackInput, DragonPhaseOutcome, DragonRoll,
    DragonTarget,
};
pub use effects::EffectManager;
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::{Phase, Step, TurnStructure};
pub use resolver::{
    resolve_action, resolve_city_turn, resolve_maneuver, resolve_reinforce, resolve_retreat,
    ActionInput, ActionKind, ActionOutcome, ManeuverInput, ManeuverOutcome, PromotionPair, SpellCast,
};
pub use roll::{
    resolve_roll, validate_roll, IdAssignment, PendingRoll, RollContext, RollOutcome, RolledFace,
    SaiChoice,
};
pub use sequencer::{PhaseSignal, SignalOutcome, TurnSequencer};
pub use snapshot::GameSnapshot;
pub use state::GameState;
pub use view::GameStateView;
