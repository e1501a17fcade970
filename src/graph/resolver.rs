//! Relationship inference.
//!
//! Every relationship kind has its own matcher: a pure function from the full
//! resource collection to the edges of that kind. `infer_all_edges` runs all of
//! them and concatenates the results in `MATCHERS` order.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::graph::{
    effective_namespace, format_labels, labels_contain, Connector, Edge, Ingress, IngressBackend,
    Labels, Resource, ResourceId, ResourceKind, Sentinel,
};

pub type Matcher = fn(&[Resource], &InferenceOptions) -> Vec<Edge>;

/// All matchers, in output order.
pub const MATCHERS: [(&str, Matcher); 11] = [
    ("deployment_to_replica_set", deployment_to_replica_set),
    ("replica_set_to_pod", replica_set_to_pod),
    ("pod_to_config_map", pod_to_config_map),
    ("pod_to_secret", pod_to_secret),
    ("service_to_pod", service_to_pod),
    ("ingress_to_service", ingress_to_service),
    ("pod_disruption_budget_to_pod", pod_disruption_budget_to_pod),
    ("horizontal_pod_autoscaler_to_deployment", horizontal_pod_autoscaler_to_deployment),
    ("cron_job_to_job", cron_job_to_job),
    ("job_to_pod", job_to_pod),
    ("stateful_set_to_pod", stateful_set_to_pod),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Only link resources that live in the same namespace.
    pub namespace_scoped: bool,
    /// Let a selector without match-labels select every candidate.
    pub empty_selector_matches_all: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self { namespace_scoped: true, empty_selector_matches_all: false }
    }
}

impl InferenceOptions {
    fn same_scope(&self, a: &str, b: &str) -> bool {
        !self.namespace_scoped || effective_namespace(a) == effective_namespace(b)
    }

    fn selects(&self, source: &Resource, selector: &Labels, target: &Resource) -> bool {
        if selector.is_empty() && !self.empty_selector_matches_all {
            return false;
        }
        self.same_scope(source.namespace(), target.namespace())
            && labels_contain(target.labels(), selector)
    }
}

/// Run every matcher over `resources` and return the combined edge list.
///
/// Exact duplicates (which appear when a manifest and a template describe the
/// same object) are dropped, keeping the first occurrence.
#[must_use]
pub fn infer_all_edges(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    let batches: Vec<Vec<Edge>> = MATCHERS
        .par_iter()
        .map(|(name, matcher)| {
            let edges = matcher(resources, options);
            tracing::debug!(matcher = *name, edges = edges.len(), "matcher finished");
            edges
        })
        .collect();

    let mut seen: HashSet<Edge> = HashSet::new();
    batches.into_iter().flatten().filter(|e| seen.insert(e.clone())).collect()
}

fn of_kind(resources: &[Resource], kind: ResourceKind) -> impl Iterator<Item = &Resource> {
    resources.iter().filter(move |r| r.kind() == kind)
}

// Edges from every resource that `selector_of` accepts to the `target` resources its selector picks.
fn selector_edges(
    resources: &[Resource],
    options: &InferenceOptions,
    selector_of: fn(&Resource) -> Option<&Labels>,
    target: ResourceKind,
    connector: Connector,
) -> Vec<Edge> {
    let mut edges = Vec::new();
    for source in resources {
        let Some(selector) = selector_of(source) else { continue };
        let label = format_labels(selector);
        for candidate in of_kind(resources, target) {
            if options.selects(source, selector, candidate) {
                edges.push(Edge::new(source.id(), candidate.id(), connector, label.clone()));
            }
        }
    }
    edges
}

#[must_use]
pub fn deployment_to_replica_set(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    selector_edges(
        resources,
        options,
        |r| match r {
            Resource::Deployment(d) => Some(&d.spec.selector.match_labels),
            _ => None,
        },
        ResourceKind::ReplicaSet,
        Connector::Down,
    )
}

#[must_use]
pub fn replica_set_to_pod(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    selector_edges(
        resources,
        options,
        |r| match r {
            Resource::ReplicaSet(rs) => Some(&rs.spec.selector.match_labels),
            _ => None,
        },
        ResourceKind::Pod,
        Connector::Down,
    )
}

#[must_use]
pub fn stateful_set_to_pod(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    selector_edges(
        resources,
        options,
        |r| match r {
            Resource::StatefulSet(s) => Some(&s.spec.selector.match_labels),
            _ => None,
        },
        ResourceKind::Pod,
        Connector::Down,
    )
}

#[must_use]
pub fn service_to_pod(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    selector_edges(
        resources,
        options,
        |r| match r {
            Resource::Service(s) => Some(&s.spec.selector),
            _ => None,
        },
        ResourceKind::Pod,
        Connector::Right,
    )
}

/// Like the other selector matchers, but a budget that protects no Pod points at `(No Target Pod)`.
#[must_use]
pub fn pod_disruption_budget_to_pod(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    let mut edges = Vec::new();
    for source in resources {
        let Resource::PodDisruptionBudget(pdb) = source else { continue };
        let selector = &pdb.spec.selector.match_labels;
        let label = format_labels(selector);
        let before = edges.len();
        for pod in of_kind(resources, ResourceKind::Pod) {
            if options.selects(source, selector, pod) {
                edges.push(Edge::new(source.id(), pod.id(), Connector::Left, label.clone()));
            }
        }
        if edges.len() == before {
            edges.push(Edge::unmatched(source.id(), Sentinel::NoTargetPod, Connector::Left, label));
        }
    }
    edges
}

/// Links an autoscaler to the Deployment named by its `scaleTargetRef`.
///
/// Only Deployments are considered, whatever `scaleTargetRef.kind` says.
/// Matched edges are labelled with the kind of the resource they reach; the
/// `(No Target Deployment)` edge keeps the declared kind.
#[must_use]
pub fn horizontal_pod_autoscaler_to_deployment(
    resources: &[Resource],
    options: &InferenceOptions,
) -> Vec<Edge> {
    let target_label = |kind: &str, name: &str| {
        format!(".spec.scaleTargetRef.kind: {kind}\n.spec.scaleTargetRef.name: {name}")
    };
    let mut edges = Vec::new();
    for source in resources {
        let Resource::HorizontalPodAutoscaler(hpa) = source else { continue };
        let target_ref = &hpa.spec.scale_target_ref;
        let before = edges.len();
        for deployment in of_kind(resources, ResourceKind::Deployment) {
            if deployment.name() == target_ref.name
                && options.same_scope(source.namespace(), deployment.namespace())
            {
                let label = target_label(deployment.kind().as_str(), deployment.name());
                edges.push(Edge::new(source.id(), deployment.id(), Connector::Left, label));
            }
        }
        if edges.len() == before {
            edges.push(Edge::unmatched(
                source.id(),
                Sentinel::NoTargetDeployment,
                Connector::Left,
                target_label(target_ref.kind.as_str(), target_ref.name.as_str()),
            ));
        }
    }
    edges
}

#[must_use]
pub fn cron_job_to_job(resources: &[Resource], _options: &InferenceOptions) -> Vec<Edge> {
    of_kind(resources, ResourceKind::CronJob)
        .map(|r| {
            let to = ResourceId::new(r.namespace(), ResourceKind::Job, r.name());
            Edge::new(r.id(), to, Connector::Down, String::new())
        })
        .collect()
}

#[must_use]
pub fn job_to_pod(resources: &[Resource], _options: &InferenceOptions) -> Vec<Edge> {
    of_kind(resources, ResourceKind::Job)
        .map(|r| {
            let to = ResourceId::new(r.namespace(), ResourceKind::Pod, r.name());
            Edge::new(r.id(), to, Connector::Down, String::new())
        })
        .collect()
}

#[must_use]
pub fn pod_to_config_map(resources: &[Resource], _options: &InferenceOptions) -> Vec<Edge> {
    let mut edges = Vec::new();
    for source in resources {
        let Resource::Pod(pod) = source else { continue };
        let mut link = |name: &str, label: &str| {
            let to = ResourceId::new(source.namespace(), ResourceKind::ConfigMap, name);
            edges.push(Edge::new(source.id(), to, Connector::Down, label.to_string()));
        };
        for volume in &pod.spec.volumes {
            if let Some(cm) = &volume.config_map {
                link(&cm.name, ".spec.volume.configMap");
            }
            let Some(projected) = &volume.projected else { continue };
            for cm in projected.sources.iter().filter_map(|s| s.config_map.as_ref()) {
                link(&cm.name, ".spec.volume.projected.sources.configMap");
            }
        }
    }
    edges
}

#[must_use]
pub fn pod_to_secret(resources: &[Resource], _options: &InferenceOptions) -> Vec<Edge> {
    let mut edges = Vec::new();
    for source in resources {
        let Resource::Pod(pod) = source else { continue };
        let mut link = |name: &str, label: &str| {
            let to = ResourceId::new(source.namespace(), ResourceKind::Secret, name);
            edges.push(Edge::new(source.id(), to, Connector::Down, label.to_string()));
        };
        for volume in &pod.spec.volumes {
            if let Some(secret) = &volume.secret {
                link(&secret.secret_name, ".spec.volume.secret");
            }
            let Some(projected) = &volume.projected else { continue };
            for secret in projected.sources.iter().filter_map(|s| s.secret.as_ref()) {
                link(&secret.name, ".spec.volume.projected.sources.secret");
            }
        }
    }
    edges
}

// Default backend first, then rule paths in manifest order, each with the field path it came from.
fn ingress_backends(ingress: &Ingress) -> Vec<(&'static str, &IngressBackend)> {
    let mut out = Vec::new();
    if let Some(backend) = &ingress.spec.default_backend {
        let prefix = match backend.schema {
            crate::graph::BackendSchema::Legacy => ".spec.backend",
            crate::graph::BackendSchema::Service => ".spec.defaultBackend",
        };
        out.push((prefix, backend));
    }
    for rule in &ingress.spec.rules {
        let Some(http) = &rule.http else { continue };
        for path in &http.paths {
            out.push((".spec.rules.http.paths.backend", &path.backend));
        }
    }
    out
}

/// Resolves each ingress backend against the Services of the referenced name.
///
/// Every Service whose declared ports include the backend port gets an edge.
/// A backend that resolves to no Service yields exactly one
/// `(No backend Service)` edge carrying the backend's label.
#[must_use]
pub fn ingress_to_service(resources: &[Resource], options: &InferenceOptions) -> Vec<Edge> {
    let mut edges = Vec::new();
    for source in resources {
        let Resource::Ingress(ingress) = source else { continue };
        for (prefix, backend) in ingress_backends(ingress) {
            let Some(service_ref) = &backend.service else {
                tracing::debug!(ingress = %source.id(), "skipping non-service backend");
                continue;
            };
            let (name_field, port_field) = backend.field_names();
            let label = format!(
                "{prefix}.{name_field}: {}\n{prefix}.{port_field}: {}",
                service_ref.name, service_ref.port
            );
            let before = edges.len();
            for candidate in of_kind(resources, ResourceKind::Service) {
                let Resource::Service(service) = candidate else { continue };
                if candidate.name() != service_ref.name
                    || !options.same_scope(source.namespace(), candidate.namespace())
                {
                    continue;
                }
                if service.spec.ports.iter().any(|p| service_ref.port.matches(p)) {
                    edges.push(Edge::new(source.id(), candidate.id(), Connector::Right, label.clone()));
                }
            }
            if edges.len() == before {
                edges.push(Edge::unmatched(
                    source.id(),
                    Sentinel::NoBackendService,
                    Connector::Right,
                    label,
                ));
            }
        }
    }
    edges
}
