use crate::graph::{Connector, Diagram, EdgeTarget, Element, ResourceKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

#[derive(Debug, Clone, Default)]
pub struct PlantUmlOptions {
    /// Print edge labels (selectors, field paths) next to connectors.
    pub show_link_labels: bool,
    /// Group elements into one `package` per namespace.
    pub namespaces: bool,
    pub title: Option<String>,
}

#[derive(Debug, Default)]
pub struct PlantUmlGenerator;

impl PlantUmlGenerator {
    #[must_use]
    pub fn new() -> Self { Self {} }

    /// Generate PlantUML with default options.
    #[must_use]
    pub fn generate(&self, diagram: &Diagram) -> String {
        self.generate_with_options(diagram, &PlantUmlOptions::default())
    }

    /// Generate PlantUML: one `rectangle` per element in id order, then one connector per edge.
    #[must_use]
    pub fn generate_with_options(&self, diagram: &Diagram, opts: &PlantUmlOptions) -> String {
        let mut s = String::from("@startuml\n");
        if let Some(title) = &opts.title {
            let _ = writeln!(s, "title {title}");
        }

        if opts.namespaces {
            for (namespace, elements) in by_namespace(&diagram.elements) {
                let _ = writeln!(s, "package \"{}\" {{", escape_label(namespace));
                for el in elements {
                    s.push_str("  ");
                    write_element(&mut s, el);
                }
                s.push_str("}\n");
            }
        } else {
            for el in &diagram.elements {
                write_element(&mut s, el);
            }
        }

        for edge in &diagram.edges {
            let arrow = match edge.connector {
                Connector::Down => "-DOWN->",
                Connector::Right => "-RIGHT->",
                Connector::Left => "-LEFT->",
            };
            let _ = write!(s, "{} {arrow} {}", edge.from, edge.to);
            if opts.show_link_labels && !edge.label.is_empty() {
                let _ = write!(s, " : \"{}\"", escape_label(&edge.label));
            }
            s.push('\n');
        }

        s.push_str("@enduml\n");
        s
    }
}

fn write_element(out: &mut String, el: &Element) {
    let _ = writeln!(out, "rectangle \"{}\" as {}", escape_label(&el.description()), el.id);
}

fn by_namespace(elements: &[Element]) -> BTreeMap<&str, Vec<&Element>> {
    let mut groups: BTreeMap<&str, Vec<&Element>> = BTreeMap::new();
    for el in elements {
        groups.entry(el.namespace.as_str()).or_default().push(el);
    }
    groups
}

// Escape for a double-quoted label; newlines become the literal `\n` both PlantUML and DOT understand.
fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotTheme { Light, Dark }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDir { LR, TB }

#[derive(Debug, Clone, Copy)]
pub struct DotOptions {
    /// One cluster per namespace.
    pub clusters: bool,
    pub theme: DotTheme,
    pub rankdir: RankDir,
    pub show_link_labels: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self { clusters: false, theme: DotTheme::Light, rankdir: RankDir::TB, show_link_labels: true }
    }
}

#[derive(Debug, Default)]
pub struct DotGenerator;

impl DotGenerator {
    #[must_use]
    pub fn new() -> Self { Self {} }

    /// Generate DOT with default options.
    #[must_use]
    pub fn generate_dot(&self, diagram: &Diagram) -> String {
        self.generate_dot_with_options(diagram, DotOptions::default())
    }

    /// Generate DOT with the given `opts`.
    #[must_use]
    pub fn generate_dot_with_options(&self, diagram: &Diagram, opts: DotOptions) -> String {
        let mut s = String::new();
        s.push_str("digraph Kuml\n{");
        s.push('\n');
        let rank = match opts.rankdir { RankDir::LR => "LR", RankDir::TB => "TB" };
        let _ = write!(
            s,
            "  rankdir={rank};\n  graph [fontname=Helvetica] ;\n  node [shape=box, fontsize=10, style=\"filled,rounded\"] ;\n  edge [fontname=Helvetica, fontsize=9];\n"
        );

        if opts.clusters {
            for (namespace, elements) in by_namespace(&diagram.elements) {
                let _ = write!(
                    s,
                    "  subgraph \"cluster_{}\" {{\n    label=\"{}\";\n    color=lightgrey;\n",
                    sanitize_id(namespace),
                    escape_label(namespace)
                );
                for el in elements {
                    s.push_str("  ");
                    write_dot_node(&mut s, el, opts.theme);
                }
                s.push_str("  }\n");
            }
        } else {
            for el in &diagram.elements {
                write_dot_node(&mut s, el, opts.theme);
            }
        }

        // Sentinels are plain text nodes, declared once each
        let sentinels: BTreeSet<_> = diagram
            .edges
            .iter()
            .filter_map(|e| match &e.to { EdgeTarget::Unmatched(sn) => Some(*sn), EdgeTarget::Resource(_) => None })
            .collect();
        for sentinel in sentinels {
            let _ = writeln!(s, "  \"{sentinel}\" [shape=plaintext, style=\"\", fontcolor=\"#b22222\"];");
        }

        for edge in &diagram.edges {
            let style = if edge.to.is_unmatched() { "dashed" } else { "solid" };
            let _ = write!(s, "  \"{}\" -> \"{}\" [style=\"{style}\"", edge.from, edge.to);
            if opts.show_link_labels && !edge.label.is_empty() {
                let _ = write!(s, ", label=\"{}\"", escape_label(&edge.label));
            }
            s.push_str("];\n");
        }

        s.push_str("}\n");
        s
    }
}

fn write_dot_node(out: &mut String, el: &Element, theme: DotTheme) {
    let (fill, shape) = style_for_kind_with_theme(el.kind, theme);
    let _ = writeln!(
        out,
        "  \"{}\" [label=\"{}\", fillcolor=\"{fill}\", shape=\"{shape}\"];",
        el.id,
        escape_label(&el.description())
    );
}

fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn style_for_kind_with_theme(kind: ResourceKind, theme: DotTheme) -> (&'static str, &'static str) {
    use ResourceKind as K;
    match (theme, kind) {
        (DotTheme::Light, K::Deployment | K::StatefulSet | K::CronJob) => ("#e0f3ff", "component"),
        (DotTheme::Light, K::ReplicaSet | K::Job) => ("#f0e0ff", "box3d"),
        (DotTheme::Light, K::Pod) => ("#e8ffe0", "box"),
        (DotTheme::Light, K::Service | K::Ingress) => ("#fff4e0", "hexagon"),
        (DotTheme::Light, K::ConfigMap | K::Secret) => ("#ffffe0", "note"),
        (DotTheme::Light, K::HorizontalPodAutoscaler | K::PodDisruptionBudget) => ("#ffe0f0", "octagon"),

        (DotTheme::Dark, K::Deployment | K::StatefulSet | K::CronJob) => ("#124559", "component"),
        (DotTheme::Dark, K::ReplicaSet | K::Job) => ("#3c2a5a", "box3d"),
        (DotTheme::Dark, K::Pod) => ("#0b6e4f", "box"),
        (DotTheme::Dark, K::Service | K::Ingress) => ("#7a4c00", "hexagon"),
        (DotTheme::Dark, K::ConfigMap | K::Secret) => ("#6b6b00", "note"),
        (DotTheme::Dark, K::HorizontalPodAutoscaler | K::PodDisruptionBudget) => ("#6a1e44", "octagon"),
    }
}
