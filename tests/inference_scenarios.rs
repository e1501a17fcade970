use kuml::graph::{Diagram, Edge, EdgeTarget, InferenceOptions, Sentinel};
use kuml::parser::ManifestParser;
use std::path::Path;

fn diagram(yaml: &str) -> Diagram {
    diagram_with(yaml, &InferenceOptions::default())
}

fn diagram_with(yaml: &str, opts: &InferenceOptions) -> Diagram {
    let resources = ManifestParser::new()
        .parse_file(yaml, Path::new("manifest.yaml"), false)
        .expect("decode manifests");
    Diagram::build(&resources, opts)
}

fn edge<'a>(d: &'a Diagram, from: &str, to: &str) -> Option<&'a Edge> {
    d.edges.iter().find(|e| e.from.as_str() == from && e.to.as_str() == to)
}

fn sentinel_edges(d: &Diagram, sentinel: Sentinel) -> Vec<&Edge> {
    d.edges.iter().filter(|e| e.to == EdgeTarget::Unmatched(sentinel)).collect()
}

const SCENARIO_A: &str = r"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: default
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
---
apiVersion: apps/v1
kind: ReplicaSet
metadata:
  name: web
  labels:
    app: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
---
apiVersion: v1
kind: Pod
metadata:
  name: web
  labels:
    app: web
";

// Scenario A: deployment, replica set and pod chained by `app: web`
#[test]
fn deployment_chain_is_linked_by_selector() {
    let d = diagram(SCENARIO_A);
    let d2rs = edge(&d, "default_Deployment_web", "default_ReplicaSet_web").expect("deployment edge");
    assert_eq!(d2rs.label, "app : web");
    let rs2pod = edge(&d, "default_ReplicaSet_web", "default_Pod_web").expect("replica set edge");
    assert_eq!(rs2pod.label, "app : web");

    // Template-derived and hand-written objects share identifiers: one element, one edge each
    let ids: Vec<&str> = d.elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["default_Deployment_web", "default_Pod_web", "default_ReplicaSet_web"]);
    assert_eq!(d.edges.len(), 2);
}

// Scenario B
#[test]
fn pdb_without_pods_points_at_sentinel() {
    let d = diagram(
        r"
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: guard
spec:
  minAvailable: 1
  selector:
    matchLabels:
      app: none-such
---
kind: Pod
metadata:
  name: other
  labels:
    app: web
",
    );
    let edges = sentinel_edges(&d, Sentinel::NoTargetPod);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].from.as_str(), "default_PodDisruptionBudget_guard");
    assert_eq!(d.metadata.unmatched_count, 1);
}

// Scenario C
#[test]
fn pod_volumes_link_direct_and_projected_config_maps() {
    let d = diagram(
        r"
kind: Pod
metadata:
  name: app
spec:
  volumes:
    - name: direct
      configMap:
        name: cfg1
    - name: bundle
      projected:
        sources:
          - configMap:
              name: cfg2
",
    );
    let direct = edge(&d, "default_Pod_app", "default_ConfigMap_cfg1").expect("direct volume");
    let projected = edge(&d, "default_Pod_app", "default_ConfigMap_cfg2").expect("projected volume");
    assert_ne!(direct.label, projected.label);
    // Neither ConfigMap was declared; the edges still exist without elements
    assert!(d.elements.iter().all(|e| !e.id.as_str().contains("ConfigMap")));
}

const HPA: &str = r"
apiVersion: autoscaling/v1
kind: HorizontalPodAutoscaler
metadata:
  name: web-hpa
spec:
  scaleTargetRef:
    apiVersion: apps/v1
    kind: Deployment
    name: web
  maxReplicas: 5
";

// Scenario D
#[test]
fn hpa_links_to_deployment_or_reports_missing_target() {
    let with_target = format!(
        "{HPA}---\nkind: Deployment\nmetadata:\n  name: web\nspec:\n  selector:\n    matchLabels:\n      app: web\n"
    );
    let d = diagram(&with_target);
    let e = edge(&d, "default_HorizontalPodAutoscaler_web_hpa", "default_Deployment_web").expect("hpa edge");
    assert!(e.label.contains("web"));
    assert!(sentinel_edges(&d, Sentinel::NoTargetDeployment).is_empty());

    let d = diagram(HPA);
    assert_eq!(sentinel_edges(&d, Sentinel::NoTargetDeployment).len(), 1);
}

fn ingress_with_service_port(port: u16) -> String {
    format!(
        r"
apiVersion: extensions/v1beta1
kind: Ingress
metadata:
  name: ing
spec:
  backend:
    serviceName: svc
    servicePort: 80
---
kind: Service
metadata:
  name: svc
spec:
  ports:
    - port: {port}
"
    )
}

// Scenario E
#[test]
fn ingress_default_backend_requires_matching_port() {
    let d = diagram(&ingress_with_service_port(80));
    assert!(edge(&d, "default_Ingress_ing", "default_Service_svc").is_some());
    assert!(sentinel_edges(&d, Sentinel::NoBackendService).is_empty());

    let d = diagram(&ingress_with_service_port(8080));
    assert!(edge(&d, "default_Ingress_ing", "default_Service_svc").is_none());
    let unmatched = sentinel_edges(&d, Sentinel::NoBackendService);
    assert_eq!(unmatched.len(), 1);
    assert!(unmatched[0].label.contains(".spec.backend.serviceName: svc"));
}

#[test]
fn ingress_v1_rules_resolve_named_ports() {
    let d = diagram(
        r"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: shop
  namespace: web
spec:
  rules:
    - host: shop.example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: front
                port:
                  name: http
          - path: /api
            pathType: Prefix
            backend:
              service:
                name: api
                port:
                  number: 9000
---
kind: Service
metadata:
  name: front
  namespace: web
spec:
  ports:
    - name: http
      port: 80
---
kind: Service
metadata:
  name: unrelated
  namespace: web
spec:
  ports:
    - port: 9000
",
    );
    let front = edge(&d, "web_Ingress_shop", "web_Service_front").expect("named port resolves");
    assert!(front.label.contains(".spec.rules.http.paths.backend.service.name: front"));
    // `api` is not declared: one sentinel for that backend, even though another Service has port 9000
    let unmatched = sentinel_edges(&d, Sentinel::NoBackendService);
    assert_eq!(unmatched.len(), 1);
    assert!(unmatched[0].label.contains("service.port: 9000"));
}

#[test]
fn cron_job_chain_reaches_pod_and_its_secrets() {
    let d = diagram(
        r"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: nightly-backup
  namespace: ops
spec:
  schedule: '0 3 * * *'
  jobTemplate:
    spec:
      template:
        spec:
          volumes:
            - name: creds
              secret:
                secretName: backup-creds
",
    );
    assert!(edge(&d, "ops_CronJob_nightly_backup", "ops_Job_nightly_backup").is_some());
    assert!(edge(&d, "ops_Job_nightly_backup", "ops_Pod_nightly_backup").is_some());
    let secret = edge(&d, "ops_Pod_nightly_backup", "ops_Secret_backup_creds").expect("secret edge");
    assert_eq!(secret.label, ".spec.volume.secret");
}

#[test]
fn selectors_stay_inside_their_namespace_by_default() {
    let yaml = r"
kind: Service
metadata:
  name: web
  namespace: prod
spec:
  selector:
    app: web
---
kind: Pod
metadata:
  name: web
  namespace: staging
  labels:
    app: web
";
    assert!(diagram(yaml).edges.is_empty());
    let global = InferenceOptions { namespace_scoped: false, ..Default::default() };
    assert!(edge(&diagram_with(yaml, &global), "prod_Service_web", "staging_Pod_web").is_some());
}

#[test]
fn inference_is_idempotent() {
    let resources = ManifestParser::new()
        .parse_file(SCENARIO_A, Path::new("a.yaml"), false)
        .expect("decode");
    let opts = InferenceOptions::default();
    let first = kuml::graph::infer_all_edges(&resources, &opts);
    let second = kuml::graph::infer_all_edges(&resources, &opts);
    assert_eq!(first, second);
}
