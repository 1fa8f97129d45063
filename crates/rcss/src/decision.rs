use magma_core::decision::{BehaviorError, Behaviors, DecisionMaker, DecisionPolicy, GET_READY};

use crate::behaviors::{self, BEAM, CREATE, INIT};
use crate::model::RcssAgentModel;

/// Walks the simulator handshake (`create`, `init`, `beam`), then keeps the
/// agent in `get_ready`.
#[derive(Debug, Default)]
pub struct RcssPolicy;

impl RcssPolicy {
    pub fn new() -> Self {
        Self
    }
}

/// A registered behavior that has not finished yet.
fn pending(behaviors: &Behaviors<RcssAgentModel>, name: &str) -> bool {
    behaviors
        .id(name)
        .is_some_and(|id| !behaviors.is_finished(id))
}

impl DecisionPolicy<RcssAgentModel> for RcssPolicy {
    fn decide_next(&mut self, _model: &RcssAgentModel, behaviors: &Behaviors<RcssAgentModel>) -> String {
        [CREATE, INIT, BEAM]
            .into_iter()
            .find(|name| pending(behaviors, name))
            .unwrap_or(GET_READY)
            .to_owned()
    }
}

/// Behavior set and policy wired together for `model`.
pub fn decision_maker(model: &RcssAgentModel) -> Result<DecisionMaker<RcssAgentModel>, BehaviorError> {
    Ok(DecisionMaker::new(behaviors::behaviors(model)?, RcssPolicy::new()))
}
