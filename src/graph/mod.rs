//! Resource model and diagram for the crate.
//!
//! This module defines the typed Kubernetes resources the engine reasons about
//! (`Resource` and its per-kind structs), the identifiers used as diagram keys
//! (`ResourceId`), and the diagram itself (`Element`, `Edge`, `Diagram`).
//!
//! The resource structs double as the serde decoding targets for manifests:
//! they only declare the fields relationship inference needs and ignore the
//! rest. You typically obtain resources from `crate::parser::ManifestParser`
//! and turn them into a diagram with `Diagram::build`.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub mod resolver;

pub use resolver::{infer_all_edges, InferenceOptions};

/// Label map. Ordered so that formatted labels are stable across runs.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    ReplicaSet,
    Deployment,
    StatefulSet,
    Job,
    CronJob,
    Service,
    Ingress,
    ConfigMap,
    Secret,
    HorizontalPodAutoscaler,
    PodDisruptionBudget,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::Pod,
        ResourceKind::ReplicaSet,
        ResourceKind::Deployment,
        ResourceKind::StatefulSet,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::Service,
        ResourceKind::Ingress,
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
        ResourceKind::HorizontalPodAutoscaler,
        ResourceKind::PodDisruptionBudget,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::ReplicaSet => "ReplicaSet",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::Job => "Job",
            ResourceKind::CronJob => "CronJob",
            ResourceKind::Service => "Service",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::HorizontalPodAutoscaler => "HorizontalPodAutoscaler",
            ResourceKind::PodDisruptionBudget => "PodDisruptionBudget",
        }
    }

    /// Look up a manifest `kind` value. Kinds the engine has no matcher for return `None`.
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic diagram key of a resource: `<namespace>_<Kind>_<name>`.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Build the identifier for a `(namespace, kind, name)` triple.
    ///
    /// An empty namespace means `default`; hyphens in the name become underscores.
    #[must_use]
    pub fn new(namespace: &str, kind: ResourceKind, name: &str) -> Self {
        let namespace = effective_namespace(namespace);
        Self(format!("{namespace}_{kind}_{}", name.replace('-', "_")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[must_use]
pub fn effective_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        "default"
    } else {
        namespace
    }
}

/// True when every `(key, value)` of `subset` is present in `superset`.
///
/// An empty subset is contained in every label set.
#[must_use]
pub fn labels_contain(superset: &Labels, subset: &Labels) -> bool {
    subset.iter().all(|(k, v)| superset.get(k) == Some(v))
}

/// Render labels as `key : value` lines in key order.
#[must_use]
pub fn format_labels(labels: &Labels) -> String {
    labels.iter().map(|(k, v)| format!("{k} : {v}")).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, deserialize_with = "nullable_labels")]
    pub labels: Labels,
}

/// Metadata of embedded templates, where `name` is usually absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    #[serde(default, deserialize_with = "nullable_labels")]
    pub labels: Labels,
}

// `labels:` with no value decodes as null in YAML
fn nullable_labels<'de, D>(deserializer: D) -> Result<Labels, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Labels>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, deserialize_with = "nullable_labels")]
    pub match_labels: Labels,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    #[serde(default)]
    pub metadata: TemplateMeta,
    #[serde(default)]
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub name: String,
    pub config_map: Option<LocalObjectReference>,
    pub secret: Option<SecretVolumeSource>,
    pub projected: Option<ProjectedVolumeSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    #[serde(default)]
    pub secret_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedVolumeSource {
    #[serde(default)]
    pub sources: Vec<VolumeProjection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProjection {
    pub config_map: Option<LocalObjectReference>,
    pub secret: Option<LocalObjectReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
}

/// Spec shared by the selector-driven workloads (Deployment, ReplicaSet, StatefulSet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub selector: LabelSelector,
    #[serde(default)]
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulSet {
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: JobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplateSpec {
    #[serde(default)]
    pub metadata: TemplateMeta,
    #[serde(default)]
    pub spec: JobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobSpec {
    #[serde(default)]
    pub job_template: JobTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJob {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CronJobSpec,
}

/// A port reference that is either a number or a symbolic port name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    Number(i32),
    Name(String),
}

impl PortRef {
    /// Whether this reference selects `port`.
    #[must_use]
    pub fn matches(&self, port: &ServicePort) -> bool {
        match self {
            PortRef::Number(n) => port.port == *n,
            PortRef::Name(name) => port.name.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRef::Number(n) => write!(f, "{n}"),
            PortRef::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub name: Option<String>,
    pub port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default, deserialize_with = "nullable_labels")]
    pub selector: Labels,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ServiceSpec,
}

/// Which manifest schema an ingress backend was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendSchema {
    /// `extensions/v1beta1`: `serviceName` / `servicePort`.
    Legacy,
    /// `networking.k8s.io/v1`: `service.name` / `service.port`.
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBackend {
    pub name: String,
    pub port: PortRef,
}

/// Ingress backend normalized over both schemas.
///
/// `service` is `None` for resource backends, which never point at a Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIngressBackend")]
pub struct IngressBackend {
    pub service: Option<ServiceBackend>,
    pub schema: BackendSchema,
}

impl IngressBackend {
    /// Field names of the service name and port under this backend's schema.
    #[must_use]
    pub fn field_names(&self) -> (&'static str, &'static str) {
        match self.schema {
            BackendSchema::Legacy => ("serviceName", "servicePort"),
            BackendSchema::Service => ("service.name", "service.port"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngressBackend {
    service_name: Option<String>,
    service_port: Option<PortRef>,
    service: Option<RawServiceBackend>,
}

#[derive(Deserialize)]
struct RawServiceBackend {
    name: String,
    port: Option<RawServiceBackendPort>,
}

#[derive(Deserialize)]
struct RawServiceBackendPort {
    name: Option<String>,
    number: Option<i32>,
}

impl TryFrom<RawIngressBackend> for IngressBackend {
    type Error = String;

    fn try_from(raw: RawIngressBackend) -> Result<Self, Self::Error> {
        if let Some(svc) = raw.service {
            let port = match svc.port {
                Some(RawServiceBackendPort { number: Some(n), .. }) => PortRef::Number(n),
                Some(RawServiceBackendPort { name: Some(s), .. }) => PortRef::Name(s),
                _ => return Err(format!("backend service {} has no port", svc.name)),
            };
            return Ok(Self {
                service: Some(ServiceBackend { name: svc.name, port }),
                schema: BackendSchema::Service,
            });
        }
        match (raw.service_name, raw.service_port) {
            (Some(name), Some(port)) => Ok(Self {
                service: Some(ServiceBackend { name, port }),
                schema: BackendSchema::Legacy,
            }),
            (Some(name), None) => Err(format!("backend service {name} has no servicePort")),
            (None, _) => Ok(Self { service: None, schema: BackendSchema::Service }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpIngressPath {
    pub path: Option<String>,
    pub backend: IngressBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpIngressRuleValue {
    #[serde(default)]
    pub paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub host: Option<String>,
    pub http: Option<HttpIngressRuleValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(alias = "backend")]
    pub default_backend: Option<IngressBackend>,
    #[serde(default)]
    pub rules: Vec<IngressRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IngressSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossVersionObjectReference {
    #[serde(default)]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalPodAutoscalerSpec {
    pub scale_target_ref: CrossVersionObjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizontalPodAutoscaler {
    pub metadata: ObjectMeta,
    pub spec: HorizontalPodAutoscalerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodDisruptionBudgetSpec {
    pub selector: LabelSelector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodDisruptionBudget {
    pub metadata: ObjectMeta,
    pub spec: PodDisruptionBudgetSpec,
}

/// A decoded Kubernetes resource. Synthetic resources produced from templates
/// use the same variants as manifests written by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Pod(Pod),
    ReplicaSet(ReplicaSet),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    Job(Job),
    CronJob(CronJob),
    Service(Service),
    Ingress(Ingress),
    ConfigMap(ConfigMap),
    Secret(Secret),
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
    PodDisruptionBudget(PodDisruptionBudget),
}

impl Resource {
    #[must_use]
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Resource::Pod(r) => &r.metadata,
            Resource::ReplicaSet(r) => &r.metadata,
            Resource::Deployment(r) => &r.metadata,
            Resource::StatefulSet(r) => &r.metadata,
            Resource::Job(r) => &r.metadata,
            Resource::CronJob(r) => &r.metadata,
            Resource::Service(r) => &r.metadata,
            Resource::Ingress(r) => &r.metadata,
            Resource::ConfigMap(r) => &r.metadata,
            Resource::Secret(r) => &r.metadata,
            Resource::HorizontalPodAutoscaler(r) => &r.metadata,
            Resource::PodDisruptionBudget(r) => &r.metadata,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Pod(_) => ResourceKind::Pod,
            Resource::ReplicaSet(_) => ResourceKind::ReplicaSet,
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::StatefulSet(_) => ResourceKind::StatefulSet,
            Resource::Job(_) => ResourceKind::Job,
            Resource::CronJob(_) => ResourceKind::CronJob,
            Resource::Service(_) => ResourceKind::Service,
            Resource::Ingress(_) => ResourceKind::Ingress,
            Resource::ConfigMap(_) => ResourceKind::ConfigMap,
            Resource::Secret(_) => ResourceKind::Secret,
            Resource::HorizontalPodAutoscaler(_) => ResourceKind::HorizontalPodAutoscaler,
            Resource::PodDisruptionBudget(_) => ResourceKind::PodDisruptionBudget,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.metadata().namespace
    }

    #[must_use]
    pub fn labels(&self) -> &Labels {
        &self.metadata().labels
    }

    #[must_use]
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace(), self.kind(), self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    Down,
    Right,
    Left,
}

/// Placeholder target for a reference that resolved to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentinel {
    NoTargetPod,
    NoTargetDeployment,
    NoBackendService,
}

impl Sentinel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::NoTargetPod => "(No Target Pod)",
            Sentinel::NoTargetDeployment => "(No Target Deployment)",
            Sentinel::NoBackendService => "(No backend Service)",
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTarget {
    Resource(ResourceId),
    Unmatched(Sentinel),
}

impl EdgeTarget {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            EdgeTarget::Resource(id) => id.as_str(),
            EdgeTarget::Unmatched(s) => s.as_str(),
        }
    }

    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        matches!(self, EdgeTarget::Unmatched(_))
    }
}

impl fmt::Display for EdgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: ResourceId,
    pub to: EdgeTarget,
    pub connector: Connector,
    pub label: String,
}

impl Edge {
    #[must_use]
    pub fn new(from: ResourceId, to: ResourceId, connector: Connector, label: String) -> Self {
        Self { from, to: EdgeTarget::Resource(to), connector, label }
    }

    #[must_use]
    pub fn unmatched(from: ResourceId, sentinel: Sentinel, connector: Connector, label: String) -> Self {
        Self { from, to: EdgeTarget::Unmatched(sentinel), connector, label }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
}

impl Element {
    #[must_use]
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            id: resource.id(),
            kind: resource.kind(),
            name: resource.name().to_string(),
            namespace: effective_namespace(resource.namespace()).to_string(),
        }
    }

    /// Box text: kind and name on two lines.
    #[must_use]
    pub fn description(&self) -> String {
        format!("kind: {}\nname: {}", self.kind, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiagramMetadata {
    pub resource_count: usize,
    pub unmatched_count: usize,
}

/// Elements plus inferred edges, ready for rendering.
///
/// Elements are unique by id and sorted by id. Edge endpoints are not
/// guaranteed to have an element: sentinels never do, and a reference to a
/// resource that was not part of the input (a ConfigMap defined elsewhere,
/// say) still produces an edge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Diagram {
    pub elements: Vec<Element>,
    pub edges: Vec<Edge>,
    pub metadata: DiagramMetadata,
}

impl Diagram {
    /// Build the diagram for `resources`: one element per distinct id, edges from the inference engine.
    #[must_use]
    pub fn build(resources: &[Resource], options: &InferenceOptions) -> Self {
        let mut seen: HashSet<ResourceId> = HashSet::with_capacity(resources.len());
        let mut elements: Vec<Element> = resources
            .iter()
            .filter(|r| seen.insert(r.id()))
            .map(Element::from_resource)
            .collect();
        elements.sort_by(|a, b| a.id.cmp(&b.id));

        let edges = infer_all_edges(resources, options);
        let unmatched_count = edges.iter().filter(|e| e.to.is_unmatched()).count();
        tracing::debug!(
            elements = elements.len(),
            edges = edges.len(),
            unmatched = unmatched_count,
            "built diagram"
        );
        Self {
            elements,
            edges,
            metadata: DiagramMetadata { resource_count: resources.len(), unmatched_count },
        }
    }

    #[must_use]
    pub fn element(&self, id: &ResourceId) -> Option<&Element> {
        self.elements.binary_search_by(|e| e.id.cmp(id)).ok().map(|i| &self.elements[i])
    }

    /// Save the diagram as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or writing the file fails.
    pub fn save_json(&self, path: &std::path::Path) -> Result<(), crate::errors::KumlError> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load a diagram previously written with `save_json`.
    ///
    /// # Errors
    /// Returns an error if reading or deserializing fails.
    pub fn load_json(path: &std::path::Path) -> Result<Self, crate::errors::KumlError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
