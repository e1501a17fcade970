//! Manifest decoding.
//!
//! Files are split into YAML documents, each document's `kind` is peeked, and
//! supported kinds are decoded into typed `Resource`s. Workloads are then
//! expanded with the synthetic objects their templates imply (a Deployment
//! brings a ReplicaSet, which brings a Pod), so that the inference engine can
//! treat template-derived and hand-written resources the same way.
use crate::errors::{DecodeError, KumlError};
use crate::graph::{
    Job, ObjectMeta, Pod, PodTemplateSpec, ReplicaSet, Resource, ResourceKind, TemplateMeta,
};
use rayon::prelude::*;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Result of decoding one YAML document.
#[derive(Debug)]
pub enum Decoded {
    Resource(Resource),
    /// The document has no `kind`, or a kind no relationship involves.
    Unsupported { kind: Option<String> },
    /// Blank or comment-only document.
    Empty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Descend into subdirectories of directory arguments.
    pub recursive: bool,
    /// Bypass `.gitignore`/`.ignore` rules.
    pub no_ignore: bool,
    /// Skip documents that fail to decode instead of aborting.
    pub lenient: bool,
}

#[derive(Debug)]
pub struct ManifestParser {
    separator: Regex,
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser {
    #[must_use]
    pub fn new() -> Self {
        // `---` on its own line, optionally followed by a comment
        let separator = Regex::new(r"(?m)^---[ \t]*(?:#.*?)?\r?$").unwrap();
        Self { separator }
    }

    /// Split a file into its non-empty documents.
    #[must_use]
    pub fn split_documents<'a>(&self, content: &'a str) -> Vec<&'a str> {
        self.separator.split(content).filter(|doc| !is_blank_document(doc)).collect()
    }

    /// Decode a single document.
    ///
    /// # Errors
    /// Returns `DecodeError` if the document is not valid YAML, is not a mapping,
    /// or is a supported kind missing a field relationship inference relies on
    /// (a workload or budget without `selector`, an autoscaler without
    /// `scaleTargetRef`, an object without `metadata.name`, ...).
    pub fn decode_document(&self, doc: &str) -> Result<Decoded, DecodeError> {
        if is_blank_document(doc) {
            return Ok(Decoded::Empty);
        }
        let value: serde_yaml::Value = serde_yaml::from_str(doc)?;
        if value.is_null() {
            return Ok(Decoded::Empty);
        }
        if !value.is_mapping() {
            return Err(DecodeError::NotAMapping);
        }
        let Some(kind_str) = value.get("kind").and_then(serde_yaml::Value::as_str) else {
            return Ok(Decoded::Unsupported { kind: None });
        };
        let Some(kind) = ResourceKind::parse(kind_str) else {
            return Ok(Decoded::Unsupported { kind: Some(kind_str.to_string()) });
        };

        let resource = match kind {
            ResourceKind::Pod => Resource::Pod(typed(kind, value)?),
            ResourceKind::ReplicaSet => Resource::ReplicaSet(typed(kind, value)?),
            ResourceKind::Deployment => Resource::Deployment(typed(kind, value)?),
            ResourceKind::StatefulSet => Resource::StatefulSet(typed(kind, value)?),
            ResourceKind::Job => Resource::Job(typed(kind, value)?),
            ResourceKind::CronJob => Resource::CronJob(typed(kind, value)?),
            ResourceKind::Service => Resource::Service(typed(kind, value)?),
            ResourceKind::Ingress => Resource::Ingress(typed(kind, value)?),
            ResourceKind::ConfigMap => Resource::ConfigMap(typed(kind, value)?),
            ResourceKind::Secret => Resource::Secret(typed(kind, value)?),
            ResourceKind::HorizontalPodAutoscaler => {
                Resource::HorizontalPodAutoscaler(typed(kind, value)?)
            }
            ResourceKind::PodDisruptionBudget => Resource::PodDisruptionBudget(typed(kind, value)?),
        };
        Ok(Decoded::Resource(resource))
    }

    /// Decode every document of a file and expand synthetic resources.
    ///
    /// Document indices in errors are 1-based.
    ///
    /// # Errors
    /// Returns `KumlError::Decode` for the first document that fails to decode,
    /// unless `lenient` is set, in which case failing documents are logged and skipped.
    pub fn parse_file(
        &self,
        content: &str,
        path: &Path,
        lenient: bool,
    ) -> Result<Vec<Resource>, KumlError> {
        let mut out = Vec::new();
        for (i, doc) in self.split_documents(content).into_iter().enumerate() {
            let index = i + 1;
            match self.decode_document(doc) {
                Ok(Decoded::Resource(resource)) => out.extend(expand(resource)),
                Ok(Decoded::Unsupported { kind }) => {
                    tracing::debug!(file = %path.display(), index, ?kind, "skipping unsupported document");
                }
                Ok(Decoded::Empty) => {}
                Err(source) if lenient => {
                    tracing::warn!(file = %path.display(), index, "skipping document: {source}");
                }
                Err(source) => {
                    return Err(KumlError::Decode { file: path.to_path_buf(), index, source });
                }
            }
        }
        Ok(out)
    }
}

fn is_blank_document(doc: &str) -> bool {
    doc.lines().all(|l| {
        let t = l.trim();
        t.is_empty() || t.starts_with('#') || t == "..."
    })
}

fn typed<T: DeserializeOwned>(kind: ResourceKind, value: serde_yaml::Value) -> Result<T, DecodeError> {
    serde_yaml::from_value(value)
        .map_err(|source| DecodeError::Invalid { kind: kind.to_string(), source })
}

/// Return `resource` followed by the synthetic resources its templates imply, depth first.
#[must_use]
pub fn expand(resource: Resource) -> Vec<Resource> {
    let mut out = Vec::new();
    push_expanded(resource, &mut out);
    out
}

fn push_expanded(resource: Resource, out: &mut Vec<Resource>) {
    let children = synthetic_children(&resource);
    out.push(resource);
    for child in children {
        push_expanded(child, out);
    }
}

fn owned_meta(owner: &ObjectMeta, template: &TemplateMeta) -> ObjectMeta {
    ObjectMeta {
        name: owner.name.clone(),
        namespace: owner.namespace.clone(),
        labels: template.labels.clone(),
    }
}

fn template_pod(owner: &ObjectMeta, template: &PodTemplateSpec) -> Resource {
    Resource::Pod(Pod { metadata: owned_meta(owner, &template.metadata), spec: template.spec.clone() })
}

fn synthetic_children(resource: &Resource) -> Vec<Resource> {
    match resource {
        Resource::Deployment(d) => vec![Resource::ReplicaSet(ReplicaSet {
            metadata: owned_meta(&d.metadata, &d.spec.template.metadata),
            spec: d.spec.clone(),
        })],
        Resource::ReplicaSet(rs) => vec![template_pod(&rs.metadata, &rs.spec.template)],
        Resource::StatefulSet(s) => vec![template_pod(&s.metadata, &s.spec.template)],
        Resource::Job(j) => vec![template_pod(&j.metadata, &j.spec.template)],
        Resource::CronJob(c) => {
            let template = &c.spec.job_template;
            vec![Resource::Job(Job {
                metadata: owned_meta(&c.metadata, &template.metadata),
                spec: template.spec.clone(),
            })]
        }
        _ => Vec::new(),
    }
}

/// Read and decode every manifest reachable from `paths`.
///
/// Explicit file arguments are always read; directories contribute their
/// `.yaml`/`.yml` files (see `utils::file_walker`). Files are decoded in
/// parallel and their resources concatenated in path order.
///
/// # Errors
/// Returns an error if a path cannot be read, if a directory argument yields no
/// manifest files, or if a document fails to decode (unless `options.lenient`).
pub fn load_resources(paths: &[PathBuf], options: LoadOptions) -> Result<Vec<Resource>, KumlError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = crate::utils::file_walker::manifest_files(
                path,
                options.recursive,
                options.no_ignore,
            );
            if found.is_empty() {
                return Err(KumlError::NoInput(path.clone()));
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    tracing::info!(files = files.len(), "loading manifests");

    let parser = ManifestParser::new();
    let parsed: Result<Vec<Vec<Resource>>, KumlError> = files
        .par_iter()
        .map(|file| {
            let content = std::fs::read_to_string(file)?;
            parser.parse_file(&content, file, options.lenient)
        })
        .collect();
    let resources: Vec<Resource> = parsed?.into_iter().flatten().collect();
    tracing::info!(resources = resources.len(), "decoded resources");
    Ok(resources)
}
