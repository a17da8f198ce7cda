//! Admission policies.
//!
//! A policy is a pure function of the incoming object and of the request
//! metadata. The API server may retry a webhook call at any time, hence
//! policies must not have side effects and must always produce the same
//! decision given the same input.

mod namespace_annotator;

pub use namespace_annotator::NamespaceAnnotator;

use k8s_openapi::api::core::v1::Pod;

use crate::admission::review::AdmissionRequest;

/// The outcome of a policy evaluation
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyDecision {
    /// The object is admitted as it is
    AllowUnmodified,
    /// The object is admitted once it has been rewritten to the given state
    AllowMutated(Box<Pod>),
    /// The object is rejected
    Deny {
        message: String,
        code: Option<u16>,
    },
}

impl PolicyDecision {
    pub fn deny(message: impl Into<String>) -> Self {
        PolicyDecision::Deny {
            message: message.into(),
            code: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, PolicyDecision::Deny { .. })
    }
}

pub trait AdmissionPolicy: Send + Sync {
    /// Name used when logging the decisions taken by the policy
    fn name(&self) -> &str;

    fn evaluate(&self, pod: &Pod, request: &AdmissionRequest) -> PolicyDecision;
}

/// Evaluates a list of policies in order.
///
/// Every policy sees the object as left by the policies evaluated before
/// it. The first rejection stops the evaluation.
pub struct PolicyChain {
    policies: Vec<Box<dyn AdmissionPolicy>>,
}

impl PolicyChain {
    pub fn new(policies: Vec<Box<dyn AdmissionPolicy>>) -> Self {
        PolicyChain { policies }
    }

    /// Names of the policies, in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.policies.iter().map(|policy| policy.name()).collect()
    }
}

impl AdmissionPolicy for PolicyChain {
    fn name(&self) -> &str {
        "policy-chain"
    }

    fn evaluate(&self, pod: &Pod, request: &AdmissionRequest) -> PolicyDecision {
        let mut current: Option<Box<Pod>> = None;

        for policy in &self.policies {
            let input = current.as_deref().unwrap_or(pod);
            match policy.evaluate(input, request) {
                PolicyDecision::AllowUnmodified => {}
                PolicyDecision::AllowMutated(mutated) => current = Some(mutated),
                deny @ PolicyDecision::Deny { .. } => {
                    tracing::debug!(policy = policy.name(), "policy rejected the request");
                    return deny;
                }
            }
        }

        match current {
            Some(mutated) => PolicyDecision::AllowMutated(mutated),
            None => PolicyDecision::AllowUnmodified,
        }
    }
}
