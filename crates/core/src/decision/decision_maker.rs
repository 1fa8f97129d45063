use super::behavior::BehaviorId;
use super::behaviors::Behaviors;

/// Selects the desired top-level behavior by name, once per cycle.
pub trait DecisionPolicy<M>: Send {
    fn decide_next(&mut self, model: &M, behaviors: &Behaviors<M>) -> String;
}

impl<M, F> DecisionPolicy<M> for F
where
    F: FnMut(&M, &Behaviors<M>) -> String + Send,
{
    fn decide_next(&mut self, model: &M, behaviors: &Behaviors<M>) -> String {
        self(model, behaviors)
    }
}

/// Drives the behavior registry from a policy: one decision and one perform per cycle.
pub struct DecisionMaker<M> {
    behaviors: Behaviors<M>,
    policy: Box<dyn DecisionPolicy<M>>,
    current: BehaviorId,
    desired: BehaviorId,
    decisions: u64,
}

impl<M> DecisionMaker<M> {
    pub fn new(behaviors: Behaviors<M>, policy: impl DecisionPolicy<M> + 'static) -> Self {
        let none = behaviors.none();
        Self {
            behaviors,
            policy: Box::new(policy),
            current: none,
            desired: none,
            decisions: 0,
        }
    }

    /// Run one decision cycle and return the active behavior chain.
    ///
    /// An unknown behavior name falls back to the inert behavior. The switch to
    /// the desired behavior only succeeds once the current one has finished;
    /// until then the current behavior is performed with the stop flag set.
    pub fn decide(&mut self, model: &mut M) -> Vec<BehaviorId> {
        let name = self.policy.decide_next(model, &self.behaviors);
        let desired = match self.behaviors.id(&name) {
            Some(id) => id,
            None => {
                tracing::warn!(behavior = %name, "unknown behavior requested, falling back to none");
                self.behaviors.none()
            }
        };
        self.desired = desired;

        let mut stop = false;
        if desired != self.current {
            let next = self.behaviors.switch_from(desired, self.current, model);
            if next != self.current {
                tracing::debug!(
                    from = %self.behaviors.name(self.current),
                    to = %self.behaviors.name(next),
                    "behavior switched"
                );
                self.current = next;
            } else {
                stop = true;
            }
        }

        self.behaviors.perform(self.current, model, stop);
        self.decisions += 1;
        self.behaviors.chain(self.current)
    }

    /// Hard stop of the current behavior; the inert behavior takes over.
    pub fn abort(&mut self) {
        self.behaviors.abort(self.current);
        self.current = self.behaviors.none();
        self.desired = self.current;
    }

    pub fn current(&self) -> BehaviorId {
        self.current
    }

    pub fn desired(&self) -> BehaviorId {
        self.desired
    }

    pub fn current_name(&self) -> &str {
        self.behaviors.name(self.current)
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn chain_names(&self) -> Vec<String> {
        self.behaviors.chain_names(self.current)
    }

    pub fn behaviors(&self) -> &Behaviors<M> {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut Behaviors<M> {
        &mut self.behaviors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::behavior::{Behavior, NONE};

    struct Counter {
        name: &'static str,
        steps: u32,
        done: u32,
    }

    impl Behavior<Vec<String>> for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn perform(&mut self, model: &mut Vec<String>, stop: bool) {
            self.done += 1;
            model.push(format!("{}{}", self.name, if stop { "!" } else { "" }));
        }

        fn is_finished(&self) -> bool {
            self.done >= self.steps
        }

        fn init(&mut self) {
            self.done = 0;
        }
    }

    fn registry() -> Behaviors<Vec<String>> {
        let mut b = Behaviors::builder();
        b.leaf(Counter {
            name: "walk",
            steps: 2,
            done: 0,
        })
        .unwrap();
        b.leaf(Counter {
            name: "kick",
            steps: 1,
            done: 0,
        })
        .unwrap();
        b.build()
    }

    #[test]
    fn unknown_name_falls_back_to_none() {
        let mut dm = DecisionMaker::new(registry(), |_: &Vec<String>, _: &Behaviors<Vec<String>>| {
            "fly".to_string()
        });
        let mut log = Vec::new();

        let chain = dm.decide(&mut log);
        assert_eq!(chain, vec![dm.behaviors().none()]);
        assert_eq!(dm.current_name(), NONE);
        assert_eq!(dm.desired(), dm.behaviors().none());
        assert_eq!(dm.decisions(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn switch_waits_for_current_behavior() {
        let mut wants = vec!["kick", "kick", "kick", "walk"].into_iter();
        let policy = move |_: &Vec<String>, _: &Behaviors<Vec<String>>| {
            wants.next().unwrap_or("walk").to_string()
        };
        let mut dm = DecisionMaker::new(registry(), policy);
        let mut log = Vec::new();

        dm.decide(&mut log); // none -> kick
        dm.decide(&mut log); // kick finished, stays current
        dm.decide(&mut log);
        dm.decide(&mut log); // kick finished -> walk
        dm.decide(&mut log); // walk
        assert_eq!(dm.current_name(), "walk");
        assert_eq!(log, vec!["kick", "kick", "kick", "walk", "walk"]);
        assert_eq!(dm.decisions(), 5);
    }

    #[test]
    fn running_behavior_gets_stop_step_when_switch_fails() {
        let mut wants = vec!["walk", "kick", "kick"].into_iter();
        let policy = move |_: &Vec<String>, _: &Behaviors<Vec<String>>| {
            wants.next().unwrap_or("kick").to_string()
        };
        let mut dm = DecisionMaker::new(registry(), policy);
        let mut log = Vec::new();

        dm.decide(&mut log); // walk step 1
        dm.decide(&mut log); // walk not finished: stop step
        dm.decide(&mut log); // walk finished -> kick
        assert_eq!(log, vec!["walk", "walk!", "kick"]);
        assert_eq!(dm.chain_names(), vec!["kick"]);
    }

    #[test]
    fn abort_returns_to_none() {
        let policy = |_: &Vec<String>, _: &Behaviors<Vec<String>>| "walk".to_string();
        let mut dm = DecisionMaker::new(registry(), policy);
        let mut log = Vec::new();
        dm.decide(&mut log);
        assert_eq!(dm.current_name(), "walk");

        dm.abort();
        assert_eq!(dm.current_name(), NONE);
        dm.decide(&mut log);
        assert_eq!(dm.current_name(), "walk");
    }
}
