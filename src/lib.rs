//! kuml: Kubernetes manifest visualizer
//!
//! Read Kubernetes YAML manifests, infer the relationships between the
//! resources they describe, and render the result as a PlantUML diagram.
//!
//! # Relationships
//! - Deployment → ReplicaSet, ReplicaSet → Pod, StatefulSet → Pod, Service → Pod
//!   and PodDisruptionBudget → Pod by label selector
//! - CronJob → Job and Job → Pod by owner name
//! - Pod → ConfigMap and Pod → Secret through volumes (including projected volumes)
//! - HorizontalPodAutoscaler → Deployment through `scaleTargetRef`
//! - Ingress → Service through backends, with port resolution
//!
//! Workload templates are expanded into the ReplicaSets, Jobs and Pods they
//! would create, so a lone Deployment manifest still draws its full chain.
//!
//! # Quickstart (Library)
//! ```no_run
//! use kuml::graph::{Diagram, InferenceOptions};
//! use kuml::parser::{load_resources, LoadOptions};
//! use kuml::visualization::PlantUmlGenerator;
//!
//! let resources = load_resources(&["manifests/".into()], LoadOptions::default())
//!     .expect("decode manifests");
//! let diagram = Diagram::build(&resources, &InferenceOptions::default());
//! print!("{}", PlantUmlGenerator::new().generate(&diagram));
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! kuml render manifests/ --show-link-label > diagram.puml
//! kuml query unmatched manifests/ --format json
//! ```
pub mod app;
pub mod cli;
pub mod errors;
pub mod graph;
pub mod parser;
pub mod query;
pub mod utils;
pub mod visualization;
