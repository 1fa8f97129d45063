pub mod behavior;
pub mod behaviors;
pub mod decision_maker;

pub use behavior::{
    Behavior, BehaviorId, Decide, GET_READY, MOVE, MoveBehavior, MoveControl, NONE, NoneBehavior,
    move_ready,
};
pub use behaviors::{BehaviorError, Behaviors, BehaviorsBuilder};
pub use decision_maker::{DecisionMaker, DecisionPolicy};
