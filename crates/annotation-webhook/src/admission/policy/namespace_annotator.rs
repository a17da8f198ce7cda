use k8s_openapi::api::core::v1::Pod;

use super::{AdmissionPolicy, PolicyDecision};
use crate::admission::review::AdmissionRequest;

/// Sets a fixed annotation on every object created inside of a given
/// namespace. Objects living in other namespaces are left untouched.
#[derive(Clone, Debug)]
pub struct NamespaceAnnotator {
    namespace: String,
    key: String,
    value: String,
}

impl NamespaceAnnotator {
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        NamespaceAnnotator {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    // Pods created without an explicit namespace carry it only inside of the
    // admission request
    fn in_scope(&self, pod: &Pod, request: &AdmissionRequest) -> bool {
        pod.metadata
            .namespace
            .as_deref()
            .or(request.namespace.as_deref())
            == Some(self.namespace.as_str())
    }
}

impl AdmissionPolicy for NamespaceAnnotator {
    fn name(&self) -> &str {
        "namespace-annotator"
    }

    fn evaluate(&self, pod: &Pod, request: &AdmissionRequest) -> PolicyDecision {
        if !self.in_scope(pod, request) {
            return PolicyDecision::AllowUnmodified;
        }

        let mut mutated = pod.clone();
        mutated
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(self.key.clone(), self.value.clone());

        PolicyDecision::AllowMutated(Box::new(mutated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn policy() -> NamespaceAnnotator {
        NamespaceAnnotator::new("default", "my-annotation", "added-by-webhook")
    }

    fn pod(namespace: Option<&str>, annotations: Option<BTreeMap<String, String>>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("p1".to_owned()),
                namespace: namespace.map(str::to_owned),
                annotations,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn expect_mutated(decision: PolicyDecision) -> Pod {
        match decision {
            PolicyDecision::AllowMutated(pod) => *pod,
            other => panic!("expected a mutation, got {other:?}"),
        }
    }

    #[test]
    fn creates_missing_annotations() {
        let decision = policy().evaluate(&pod(Some("default"), None), &AdmissionRequest::default());
        let mutated = expect_mutated(decision);

        assert_eq!(
            mutated.metadata.annotations,
            Some(BTreeMap::from([(
                "my-annotation".to_owned(),
                "added-by-webhook".to_owned()
            )]))
        );
        assert_eq!(mutated.metadata.name.as_deref(), Some("p1"));
    }

    #[test]
    fn keeps_existing_annotations() {
        let original = pod(
            Some("default"),
            Some(BTreeMap::from([("x".to_owned(), "y".to_owned())])),
        );
        let mutated = expect_mutated(policy().evaluate(&original, &AdmissionRequest::default()));

        assert_eq!(
            mutated.metadata.annotations,
            Some(BTreeMap::from([
                ("my-annotation".to_owned(), "added-by-webhook".to_owned()),
                ("x".to_owned(), "y".to_owned()),
            ]))
        );
    }

    #[test]
    fn overwrites_stale_value() {
        let original = pod(
            Some("default"),
            Some(BTreeMap::from([(
                "my-annotation".to_owned(),
                "something-else".to_owned(),
            )])),
        );
        let mutated = expect_mutated(policy().evaluate(&original, &AdmissionRequest::default()));

        assert_eq!(
            mutated
                .metadata
                .annotations
                .unwrap()
                .get("my-annotation")
                .map(String::as_str),
            Some("added-by-webhook")
        );
    }

    #[rstest]
    #[case::other_namespace(Some("other"), None)]
    #[case::kube_system(Some("kube-system"), Some("default"))]
    #[case::no_namespace_at_all(None, None)]
    fn out_of_scope(#[case] pod_namespace: Option<&str>, #[case] request_namespace: Option<&str>) {
        let request = AdmissionRequest {
            namespace: request_namespace.map(str::to_owned),
            ..Default::default()
        };
        let original = pod(
            pod_namespace,
            Some(BTreeMap::from([("x".to_owned(), "y".to_owned())])),
        );

        assert_eq!(
            policy().evaluate(&original, &request),
            PolicyDecision::AllowUnmodified
        );
    }

    #[test]
    fn namespace_taken_from_request() {
        let request = AdmissionRequest {
            namespace: Some("default".to_owned()),
            ..Default::default()
        };

        let mutated = expect_mutated(policy().evaluate(&pod(None, None), &request));
        assert!(mutated
            .metadata
            .annotations
            .unwrap()
            .contains_key("my-annotation"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let original = pod(Some("default"), None);
        let request = AdmissionRequest::default();

        assert_eq!(
            policy().evaluate(&original, &request),
            policy().evaluate(&original, &request)
        );
    }
}
