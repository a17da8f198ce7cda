//! The admission decision pipeline.
//!
//! Every review goes through four stages: the body is decoded, the policy
//! takes a decision, the decision is turned into a JSON Patch and finally
//! everything is wrapped into the review returned to the API server.
//! Stages are synchronous and share no state between requests.

pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod patch;
pub mod policy;
pub mod review;

use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use errors::Result;
use patch::PatchStrategy;
use policy::{AdmissionPolicy, PolicyDecision};
use review::{AdmissionReviewRequest, AdmissionReviewResponse};

/// The only kind of object this webhook is registered for
pub const REGISTERED_KIND: &str = "Pod";

pub struct AdmissionPipeline {
    registered_kind: String,
    policy: Box<dyn AdmissionPolicy>,
    patch_strategy: PatchStrategy,
}

impl AdmissionPipeline {
    pub fn new(policy: Box<dyn AdmissionPolicy>, patch_strategy: PatchStrategy) -> Self {
        AdmissionPipeline {
            registered_kind: REGISTERED_KIND.to_owned(),
            policy,
            patch_strategy,
        }
    }

    pub fn patch_strategy(&self) -> PatchStrategy {
        self.patch_strategy
    }

    /// Run the whole pipeline against the raw body of a review
    pub fn review(&self, body: &[u8]) -> Result<AdmissionReviewResponse> {
        let (review, pod) = self.decode(body)?;
        self.decide(&review, &pod)
    }

    pub fn decode(&self, body: &[u8]) -> Result<(AdmissionReviewRequest, Pod)> {
        decoder::decode(body, &self.registered_kind)
    }

    /// Evaluate the policy against an already decoded review and build the
    /// response for it
    pub fn decide(
        &self,
        review: &AdmissionReviewRequest,
        pod: &Pod,
    ) -> Result<AdmissionReviewResponse> {
        let decision = self.policy.evaluate(pod, &review.request);
        debug!(
            policy = self.policy.name(),
            allowed = decision.is_allowed(),
            "policy evaluated"
        );

        let patch = match &decision {
            PolicyDecision::AllowMutated(mutated) => {
                Some(patch::build_patch(pod, mutated, self.patch_strategy)?)
            }
            _ => None,
        };

        encoder::encode(review, &decision, patch)
    }
}
