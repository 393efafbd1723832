//! In-memory editor host backed by a JSON scene description.
//!
//! The top-level scene is always loaded. Named documents can be opened as nested
//! contexts; each open instantiates fresh entities and each close despawns them, so
//! references into a closed document go stale exactly like they would in an editor
//! that reloads its stages.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::host::{ContextHost, EntityTree, SelectionHost};
use crate::app::notify::{ChangeFeed, ChangeNotifier, SelectionChange};
use crate::app::path;
use crate::domain::errors::NavigationError;
use crate::domain::model::EntityPath;

const INSPECTOR_NAME: &str = "Selection History";

/// Reference to a scene entity. Never reused once despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node of a scene or document description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<NodeSpec>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// Scene file: the top-level hierarchy plus documents openable as nested contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: NodeSpec,
    #[serde(default)]
    pub documents: BTreeMap<String, NodeSpec>,
}

impl SceneFile {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("invalid scene description")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file at {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("in {}", path.display()))
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    context: Option<String>,
}

#[derive(Debug, Clone)]
struct OpenContext {
    source: String,
    root: EntityId,
}

/// Editor host with a single selection and a stack of open documents.
#[derive(Debug)]
pub struct SceneHost {
    nodes: HashMap<EntityId, Node>,
    next_id: u64,
    scene_root: EntityId,
    inspector: EntityId,
    documents: BTreeMap<String, NodeSpec>,
    contexts: Vec<OpenContext>,
    selection: Option<EntityId>,
    notifier: ChangeNotifier<SelectionChange<EntityId, String>>,
}

impl SceneHost {
    pub fn new(file: SceneFile) -> Self {
        let mut host = Self {
            nodes: HashMap::new(),
            next_id: 0,
            scene_root: EntityId(0),
            inspector: EntityId(0),
            documents: file.documents,
            contexts: Vec::new(),
            selection: None,
            notifier: ChangeNotifier::new(),
        };
        host.scene_root = host.spawn(&file.scene, None, None);
        host.inspector = host.spawn(&NodeSpec::leaf(INSPECTOR_NAME), None, None);
        host
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(SceneFile::load(path)?))
    }

    /// Resolve a `/`-separated path against the innermost context root.
    pub fn find(&self, path: &str) -> Option<EntityId> {
        let Ok(entity_path) = path.parse::<EntityPath>();
        path::resolve(self, &self.current_root(), &entity_path).ok()
    }

    /// Path of `entity` relative to the root of its own context.
    pub fn path_to(&self, entity: EntityId) -> EntityPath {
        let root = self.context_root_for(&entity);
        path::path_of(self, Some(&entity), root.as_ref())
    }

    /// Open documents, outermost first.
    pub fn open_contexts(&self) -> impl Iterator<Item = &str> {
        self.contexts.iter().map(|context| context.source.as_str())
    }

    /// Close and reopen the innermost document, invalidating every reference into it.
    pub fn reload_context(&mut self) -> Result<bool, NavigationError> {
        let Some(source) = self.current_context() else {
            return Ok(false);
        };
        self.close_context();
        self.open_context(&source)?;
        Ok(true)
    }

    fn spawn(
        &mut self,
        spec: &NodeSpec,
        parent: Option<EntityId>,
        context: Option<&str>,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                name: spec.name.clone(),
                parent,
                children: Vec::new(),
                context: context.map(str::to_owned),
            },
        );

        let children: Vec<EntityId> = spec
            .children
            .iter()
            .map(|child| self.spawn(child, Some(id), context))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    fn despawn(&mut self, id: EntityId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.despawn(child);
            }
        }
    }
}

impl EntityTree for SceneHost {
    type Entity = EntityId;

    fn parent_of(&self, entity: &EntityId) -> Option<EntityId> {
        self.nodes.get(entity).and_then(|node| node.parent)
    }

    fn name_of(&self, entity: &EntityId) -> String {
        self.nodes
            .get(entity)
            .map(|node| node.name.clone())
            .unwrap_or_default()
    }

    fn child_named(&self, entity: &EntityId, name: &str) -> Option<EntityId> {
        let node = self.nodes.get(entity)?;
        node.children
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).is_some_and(|c| c.name == name))
    }

    fn is_live(&self, entity: &EntityId) -> bool {
        self.nodes.contains_key(entity)
    }
}

impl SelectionHost for SceneHost {
    fn current_selection(&self) -> Option<EntityId> {
        self.selection
    }

    fn set_current_selection(&mut self, entity: Option<EntityId>) {
        if self.selection == entity {
            return;
        }
        self.selection = entity;
        let change = SelectionChange::capture(&*self, entity.as_ref());
        self.notifier.notify(change);
    }

    fn subscribe_selection_changed(&mut self) -> ChangeFeed<SelectionChange<EntityId, String>> {
        self.notifier.subscribe()
    }

    fn history_inspector(&self) -> Option<EntityId> {
        Some(self.inspector)
    }
}

impl ContextHost for SceneHost {
    type Source = String;

    fn current_context(&self) -> Option<String> {
        self.contexts.last().map(|context| context.source.clone())
    }

    fn can_open(&self, source: &String) -> bool {
        self.documents.contains_key(source)
    }

    fn open_context(&mut self, source: &String) -> Result<EntityId, NavigationError> {
        let spec = self
            .documents
            .get(source)
            .cloned()
            .ok_or_else(|| NavigationError::ContextUnopenable {
                source_name: source.clone(),
            })?;
        let root = self.spawn(&spec, None, Some(source));
        self.contexts.push(OpenContext {
            source: source.clone(),
            root,
        });
        tracing::debug!(source = %source, root = %root, "context opened");
        Ok(root)
    }

    fn close_context(&mut self) -> bool {
        let Some(context) = self.contexts.pop() else {
            return false;
        };
        self.despawn(context.root);
        tracing::debug!(source = %context.source, "context closed");

        if self.selection.is_some_and(|selected| !self.is_live(&selected)) {
            self.set_current_selection(None);
        }
        true
    }

    fn context_of(&self, entity: &EntityId) -> Option<String> {
        self.nodes.get(entity).and_then(|node| node.context.clone())
    }

    fn context_root_for(&self, entity: &EntityId) -> Option<EntityId> {
        if !self.is_live(entity) {
            return None;
        }
        let mut cursor = *entity;
        while let Some(parent) = self.parent_of(&cursor) {
            cursor = parent;
        }
        Some(cursor)
    }

    fn current_root(&self) -> EntityId {
        self.contexts
            .last()
            .map(|context| context.root)
            .unwrap_or(self.scene_root)
    }
}
