#![forbid(unsafe_code)]

use alm_core::{NodeId, NodeType, RevisionId, Tree};
use alm_storage::{AddNodeRequest, DataModel, RelationalStore, StoreError, UpdateNodeRequest};
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct TreeView {
    revision: Option<RevisionId>,
    roots: Vec<NodeView>,
}

#[derive(Debug, Serialize)]
struct NodeView {
    id: NodeId,
    parent: Option<NodeId>,
    #[serde(rename = "type")]
    node_type: NodeType,
    name: String,
    revision: RevisionId,
    children: Vec<NodeView>,
}

fn node_view(tree: &Tree, id: NodeId) -> Option<NodeView> {
    let item = tree.get(id)?;
    Some(NodeView {
        id,
        parent: item.parent(),
        node_type: item.node_type(),
        name: item.name().to_string(),
        revision: item.revision(),
        children: item
            .children()
            .iter()
            .filter_map(|child| node_view(tree, *child))
            .collect(),
    })
}

pub fn login<S: RelationalStore>(
    model: &mut DataModel<S>,
    credentials: &Credentials,
) -> Result<(), StoreError> {
    model.login(&credentials.user, &credentials.password)?;
    Ok(())
}

pub fn init<S: RelationalStore>(model: &DataModel<S>, out: &mut impl Write) -> anyhow::Result<()> {
    let revision = model.current_revision()?;
    match revision {
        Some(revision) => writeln!(out, "store ready at revision {revision}")?,
        None => writeln!(out, "store ready (no revisions yet)")?,
    }
    Ok(())
}

pub fn print_tree<S: RelationalStore>(
    model: &mut DataModel<S>,
    revision: Option<RevisionId>,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    model.load(revision)?;
    let tree = model.tree();

    if json {
        let view = TreeView {
            revision: model.revision(),
            roots: tree
                .roots()
                .iter()
                .filter_map(|id| node_view(tree, *id))
                .collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    match model.revision() {
        Some(revision) => writeln!(out, "revision {revision}")?,
        None => writeln!(out, "empty store")?,
    }
    for (depth, item) in tree.walk() {
        writeln!(
            out,
            "{:indent$}{} [{}] {}",
            "",
            item.id(),
            item.node_type(),
            item.name(),
            indent = depth * 2
        )?;
    }
    Ok(())
}

pub fn add<S: RelationalStore>(
    model: &mut DataModel<S>,
    credentials: &Credentials,
    request: AddNodeRequest,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    login(model, credentials)?;
    model.load(None)?;
    let item = model.add_node(request)?;
    writeln!(out, "added node {} at revision {}", item.id(), item.revision())?;
    Ok(())
}

pub fn update<S: RelationalStore>(
    model: &mut DataModel<S>,
    credentials: &Credentials,
    id: NodeId,
    request: UpdateNodeRequest,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    login(model, credentials)?;
    model.load(None)?;
    if model.update_node(id, request)? {
        let revision = model.revision().map(|r| r.to_string()).unwrap_or_default();
        writeln!(out, "updated node {id} at revision {revision}")?;
    } else {
        writeln!(out, "node {id} unchanged")?;
    }
    Ok(())
}

pub fn revisions<S: RelationalStore>(
    model: &DataModel<S>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match model.current_revision()? {
        Some(revision) => writeln!(out, "{revision}")?,
        None => writeln!(out, "0")?,
    }
    Ok(())
}

pub fn comment<S: RelationalStore>(
    model: &mut DataModel<S>,
    credentials: &Credentials,
    id: NodeId,
    text: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    login(model, credentials)?;
    model.load(None)?;
    let (revision, comment) = model.add_comment(id, text)?;
    writeln!(out, "added comment {comment} to node {id} at revision {revision}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alm_storage::StoreConfig;

    fn admin() -> Credentials {
        Credentials {
            user: "admin".to_string(),
            password: "admin".to_string(),
        }
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[test]
    fn add_then_print_tree() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut model = DataModel::open(dir.path(), &StoreConfig::default()).expect("open");

        let mut out = Vec::new();
        add(
            &mut model,
            &admin(),
            AddNodeRequest {
                parent: None,
                node_type: NodeType::Project,
                name: "P1".to_string(),
                description: String::new(),
            },
            &mut out,
        )
        .expect("add project");
        add(
            &mut model,
            &admin(),
            AddNodeRequest {
                parent: Some(NodeId::new(1)),
                node_type: NodeType::Requirement,
                name: "R1".to_string(),
                description: String::new(),
            },
            &mut out,
        )
        .expect("add requirement");
        assert_eq!(
            output(out),
            "added node 1 at revision 1\nadded node 2 at revision 2\n"
        );

        let mut out = Vec::new();
        print_tree(&mut model, None, false, &mut out).expect("print");
        assert_eq!(
            output(out),
            "revision 2\n1 [Project] P1\n  2 [Requirement] R1\n"
        );

        let mut out = Vec::new();
        print_tree(&mut model, Some(RevisionId::FIRST), true, &mut out).expect("print json");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["revision"], 1);
        assert_eq!(value["roots"][0]["name"], "P1");
        assert_eq!(value["roots"][0]["type"], "Project");
        assert_eq!(value["roots"][0]["children"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn wrong_password_is_rejected_before_writing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut model = DataModel::open(dir.path(), &StoreConfig::default()).expect("open");
        let credentials = Credentials {
            user: "admin".to_string(),
            password: "nope".to_string(),
        };

        let mut out = Vec::new();
        let err = comment(&mut model, &credentials, NodeId::new(1), "hi", &mut out)
            .expect_err("bad password");
        let store_err = err.downcast_ref::<StoreError>().expect("store error");
        assert_eq!(store_err.code(), "AUTHENTICATION_FAILED");

        let mut out = Vec::new();
        revisions(&model, &mut out).expect("revisions");
        assert_eq!(output(out), "0\n");
    }
}
