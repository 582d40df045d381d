use metanode_core::prelude::*;
use metanode_core::{AttributeType, HostError, METACLASS_ATTR_PREFIX, METADATA_ATTR};
use metanode_test_utils::{init_test_tracing, Command, MemoryScene, SceneNode};
use pretty_assertions::assert_eq;

type Value = MetaValue<SceneNode>;

fn dict(entries: Vec<(&str, Value)>) -> Value {
    Value::Dict(entries.into_iter().map(|(k, v)| (Key::from(k), v)).collect())
}

fn controller(scene: &MemoryScene, node: SceneNode) -> MetadataController<'_, MemoryScene> {
    MetadataController::new(scene, node, Binding::Handles, true)
}

fn scenario_data() -> Value {
    Value::List(vec![
        Value::from("x"),
        dict(vec![("a", Value::Int(1))]),
        Value::Tuple(vec![Value::from("y"), Value::from("z")]),
    ])
}

#[test]
fn test_set_then_get() {
    init_test_tracing();
    let scene = MemoryScene::new();
    let node = scene.create_node("node1");
    let ctl = controller(&scene, node);

    ctl.set_metadata("myMetaClass", scenario_data(), false).unwrap();

    assert_eq!(ctl.get_metadata(Some("myMetaClass")).unwrap(), scenario_data());
    assert!(ctl.is_meta_node());
    assert!(ctl.has_metaclass("myMetaClass"));
    assert_eq!(scene.attribute_type(node, METADATA_ATTR), Some(AttributeType::String));
    assert_eq!(
        scene.attribute_type(node, "pyMetaClass_myMetaClass"),
        Some(AttributeType::Short)
    );
    assert_eq!(
        scene.attribute_value(node, METADATA_ATTR).unwrap(),
        "{'myMetaClass': ['x', {'a': 1}, ('y', 'z')]}"
    );
}

#[test]
fn test_clean_node_reads_empty() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));

    assert!(!ctl.is_meta_node());
    assert_eq!(ctl.get_metadata(None).unwrap(), Value::empty_dict());
    assert_eq!(ctl.get_metadata(Some("anything")).unwrap(), Value::empty_dict());
    assert_eq!(ctl.get_metaclasses().unwrap(), Vec::<String>::new());
}

#[test]
fn test_classes_are_isolated() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));

    ctl.set_metadata("A", Value::from("a data"), false).unwrap();
    ctl.set_metadata("B", dict(vec![("b", Value::Bool(true))]), false).unwrap();

    assert_eq!(ctl.get_metadata(Some("A")).unwrap(), Value::from("a data"));
    assert_eq!(
        ctl.get_metadata(Some("B")).unwrap(),
        dict(vec![("b", Value::Bool(true))])
    );
    assert_eq!(
        ctl.get_metadata(None).unwrap(),
        dict(vec![
            ("A", Value::from("a data")),
            ("B", dict(vec![("b", Value::Bool(true))])),
        ])
    );
    assert_eq!(ctl.get_metaclasses().unwrap(), vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn test_absent_class_is_indistinguishable_from_empty() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("A", Value::empty_dict(), false).unwrap();

    assert_eq!(ctl.get_metadata(Some("A")).unwrap(), Value::empty_dict());
    assert_eq!(ctl.get_metadata(Some("Missing")).unwrap(), Value::empty_dict());
}

#[test]
fn test_invalid_class_name_leaves_node_clean() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);

    let err = ctl.set_metadata("bad name!", Value::Int(1), false).unwrap_err();
    assert!(matches!(err, MetadataError::InvalidClassName(ref s) if s == "bad name!"));
    assert!(!ctl.is_meta_node());
    assert_eq!(scene.list_attributes(&node).unwrap(), Vec::<String>::new());

    let err = ctl.set_metadata("bad name!", Value::Int(1), true).unwrap_err();
    assert!(matches!(err, MetadataError::InvalidClassName(_)));
    assert!(scene.command_log().is_empty());
}

#[test]
fn test_set_all_validates_every_key_first() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);

    let mut data = MetaDict::new();
    data.insert(Key::from("good"), Value::Int(1));
    data.insert(Key::from("not good"), Value::Int(2));
    assert!(matches!(
        ctl.set_all_metadata(data),
        Err(MetadataError::InvalidClassName(_))
    ));

    let mut data = MetaDict::new();
    data.insert(Key::Int(3), Value::Int(1));
    assert!(matches!(
        ctl.set_all_metadata(data),
        Err(MetadataError::InvalidClassName(ref s)) if s == "3"
    ));

    assert_eq!(scene.list_attributes(&node).unwrap(), Vec::<String>::new());
}

#[test]
fn test_set_all_keeps_stale_markers() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("A", Value::Int(1), false).unwrap();

    let mut data = MetaDict::new();
    data.insert(Key::from("B"), Value::Int(2));
    ctl.set_all_metadata(data).unwrap();

    assert_eq!(ctl.get_metadata(None).unwrap(), dict(vec![("B", Value::Int(2))]));
    assert_eq!(ctl.get_metaclasses().unwrap(), vec!["A".to_string(), "B".to_string()]);
    assert!(ctl.has_metaclass("A"));
}

#[test]
fn test_replace_overwrites_other_classes() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    ctl.set_metadata("B", Value::Int(2), true).unwrap();

    assert_eq!(ctl.get_metadata(None).unwrap(), dict(vec![("B", Value::Int(2))]));
    assert_eq!(ctl.get_metadata(Some("A")).unwrap(), Value::empty_dict());
}

#[test]
fn test_update_merges_into_dict() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("c", dict(vec![("k", Value::Int(1)), ("keep", Value::from("v"))]), false)
        .unwrap();

    let mut update = MetaDict::new();
    update.insert(Key::from("k"), Value::Int(2));
    update.insert(Key::from("new"), Value::None);
    ctl.update_metadata("c", update).unwrap();

    assert_eq!(
        ctl.get_metadata(Some("c")).unwrap(),
        dict(vec![
            ("k", Value::Int(2)),
            ("keep", Value::from("v")),
            ("new", Value::None),
        ])
    );
}

#[test]
fn test_update_on_missing_class_creates_it() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));

    let mut update = MetaDict::new();
    update.insert(Key::from("k"), Value::Int(1));
    ctl.update_metadata("fresh", update).unwrap();

    assert_eq!(ctl.get_metadata(Some("fresh")).unwrap(), dict(vec![("k", Value::Int(1))]));
    assert!(ctl.has_metaclass("fresh"));
}

#[test]
fn test_update_requires_dict() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("c", Value::from("not-a-dict"), false).unwrap();

    let mut update = MetaDict::new();
    update.insert(Key::from("k"), Value::Int(1));
    let err = ctl.update_metadata("c", update).unwrap_err();

    assert!(matches!(
        err,
        MetadataError::NotADict { ref class_name, found: "str", .. } if class_name == "c"
    ));
    assert_eq!(ctl.get_metadata(Some("c")).unwrap(), Value::from("not-a-dict"));
}

#[test]
fn test_remove_is_idempotent() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    ctl.set_metadata("B", Value::Int(2), false).unwrap();

    assert!(ctl.remove_metadata(None).unwrap());
    assert!(!ctl.is_meta_node());
    assert_eq!(scene.list_attributes(&node).unwrap(), Vec::<String>::new());

    scene.clear_log();
    assert!(ctl.remove_metadata(None).unwrap());
    assert!(scene.command_log().is_empty());
}

#[test]
fn test_remove_one_class_keeps_others() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    ctl.set_metadata("B", Value::Int(2), false).unwrap();

    assert!(ctl.remove_metadata(Some("A")).unwrap());

    assert!(ctl.is_meta_node());
    assert!(!ctl.has_metaclass("A"));
    assert_eq!(ctl.get_metadata(None).unwrap(), dict(vec![("B", Value::Int(2))]));
}

#[test]
fn test_removing_last_class_cleans_node() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();

    assert!(ctl.remove_metadata(Some("A")).unwrap());

    assert!(!ctl.is_meta_node());
    assert_eq!(scene.list_attributes(&node).unwrap(), Vec::<String>::new());
}

#[test]
fn test_removing_unknown_class_is_harmless() {
    let scene = MemoryScene::new();
    let ctl = controller(&scene, scene.create_node("n"));
    ctl.set_metadata("A", Value::Int(1), false).unwrap();

    assert!(ctl.remove_metadata(Some("Other")).unwrap());
    assert_eq!(ctl.get_metadata(None).unwrap(), dict(vec![("A", Value::Int(1))]));
}

#[test]
fn test_locked_blob_blocks_removal() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    ctl.set_metadata("B", Value::Int(2), false).unwrap();
    let before = ctl.get_metadata(None).unwrap();
    scene.set_locked(node, METADATA_ATTR, true).unwrap();

    assert!(!ctl.remove_metadata(None).unwrap());
    assert!(!ctl.remove_metadata(Some("A")).unwrap());

    assert_eq!(ctl.get_metadata(None).unwrap(), before);
    assert!(ctl.has_metaclass("A"));
    assert!(ctl.has_metaclass("B"));
}

#[test]
fn test_locked_marker_blocks_its_class_only() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    ctl.set_metadata("B", Value::Int(2), false).unwrap();
    scene
        .set_locked(node, &format!("{METACLASS_ATTR_PREFIX}A"), true)
        .unwrap();
    let attrs_before = scene.list_attributes(&node).unwrap();
    let data_before = ctl.get_metadata(None).unwrap();

    assert!(!ctl.remove_metadata(Some("A")).unwrap());
    assert_eq!(scene.list_attributes(&node).unwrap(), attrs_before);
    assert_eq!(ctl.get_metadata(None).unwrap(), data_before);

    // a full removal must not leave a half-removed node behind
    assert!(!ctl.remove_metadata(None).unwrap());
    assert_eq!(scene.list_attributes(&node).unwrap(), attrs_before);

    assert!(ctl.remove_metadata(Some("B")).unwrap());
    assert!(!ctl.has_metaclass("B"));
}

#[test]
fn test_cascade_blocked_by_locked_stale_marker() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("B", Value::Int(2), false).unwrap();
    let mut data = MetaDict::new();
    data.insert(Key::from("A"), Value::Int(1));
    ctl.set_all_metadata(data).unwrap();
    scene
        .set_locked(node, &format!("{METACLASS_ATTR_PREFIX}B"), true)
        .unwrap();
    let attrs_before = scene.list_attributes(&node).unwrap();
    let blob_before = scene.attribute_value(node, METADATA_ATTR);

    // removing A would empty the blob, and the stale B marker cannot go
    assert!(!ctl.remove_metadata(Some("A")).unwrap());

    assert_eq!(scene.list_attributes(&node).unwrap(), attrs_before);
    assert_eq!(scene.attribute_value(node, METADATA_ATTR), blob_before);
    assert!(ctl.has_metaclass("A"));
    assert_eq!(ctl.get_metadata(None).unwrap(), dict(vec![("A", Value::Int(1))]));
}

#[test]
fn test_unparseable_blob_blocks_class_removal() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    scene.plant_string(node, METADATA_ATTR, "{'A': 1");
    let attrs_before = scene.list_attributes(&node).unwrap();
    scene.clear_log();

    assert!(matches!(
        ctl.remove_metadata(Some("A")),
        Err(MetadataError::Decode(_))
    ));

    assert_eq!(scene.list_attributes(&node).unwrap(), attrs_before);
    assert!(ctl.has_metaclass("A"));
    assert!(scene.command_log().is_empty());
}

#[test]
fn test_locked_blob_refuses_writes() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);
    ctl.set_metadata("A", Value::Int(1), false).unwrap();
    scene.set_locked(node, METADATA_ATTR, true).unwrap();

    let err = ctl.set_metadata("A", Value::Int(2), false).unwrap_err();
    assert!(matches!(err, MetadataError::Host(HostError::AttributeLocked { .. })));
    assert_eq!(ctl.get_metadata(Some("A")).unwrap(), Value::Int(1));
}

#[test]
fn test_undoable_flag_selects_write_path() {
    let scene = MemoryScene::new();
    let a = scene.create_node("a");
    let b = scene.create_node("b");

    MetadataController::new(&scene, a, Binding::Handles, true)
        .set_metadata("A", Value::Int(1), false)
        .unwrap();
    MetadataController::new(&scene, b, Binding::Handles, false)
        .set_metadata("A", Value::Int(1), false)
        .unwrap();

    let log = scene.command_log();
    let paths = |node: SceneNode| -> Vec<(Command, WritePath)> {
        log.iter()
            .filter(|r| r.node == node)
            .map(|r| (r.command, r.path))
            .collect()
    };
    assert_eq!(
        paths(a),
        vec![
            (Command::AddAttribute, WritePath::Undoable),
            (Command::AddAttribute, WritePath::Undoable),
            (Command::SetString, WritePath::Undoable),
        ]
    );
    assert_eq!(
        paths(b),
        vec![
            (Command::AddAttribute, WritePath::Direct),
            (Command::AddAttribute, WritePath::Direct),
            (Command::SetString, WritePath::Direct),
        ]
    );
    assert_eq!(
        scene.attribute_value(a, METADATA_ATTR),
        scene.attribute_value(b, METADATA_ATTR)
    );

    scene.clear_log();
    for (node, undoable) in [(a, true), (b, false)] {
        assert!(MetadataController::new(&scene, node, Binding::Handles, undoable)
            .remove_metadata(None)
            .unwrap());
    }
    let removals: Vec<(SceneNode, Command, WritePath)> = scene
        .command_log()
        .iter()
        .map(|r| (r.node, r.command, r.path))
        .collect();
    assert_eq!(
        removals,
        vec![
            (a, Command::DeleteAttribute, WritePath::Undoable),
            (a, Command::DeleteAttribute, WritePath::Undoable),
            (b, Command::DeleteAttribute, WritePath::Direct),
            (b, Command::DeleteAttribute, WritePath::Direct),
        ]
    );
}

#[test]
fn test_malformed_blobs_are_reported() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    let ctl = controller(&scene, node);

    scene.plant_string(node, METADATA_ATTR, "{'A': [1, 2");
    assert!(matches!(ctl.get_metadata(None), Err(MetadataError::Decode(_))));

    scene.plant_string(node, METADATA_ATTR, "[1, 2]");
    assert!(matches!(
        ctl.get_metadata(None),
        Err(MetadataError::MalformedBlob { found: "list" })
    ));
}

#[test]
fn test_empty_blob_reads_as_empty_mapping() {
    let scene = MemoryScene::new();
    let node = scene.create_node("n");
    scene.plant_string(node, METADATA_ATTR, "");
    let ctl = controller(&scene, node);

    assert!(ctl.is_meta_node());
    assert_eq!(ctl.get_metadata(None).unwrap(), Value::empty_dict());
}

#[test]
fn test_from_node_resolves_every_flavor() {
    let scene = MemoryScene::new();
    let node = scene.create_node("target");
    controller(&scene, node)
        .set_metadata("A", Value::Int(1), false)
        .unwrap();

    let refs: Vec<NodeRef<SceneNode>> = vec![
        NodeRef::Raw(node),
        NodeRef::Live(LiveNode::new(node, "target")),
        NodeRef::from("target"),
    ];
    for node_ref in &refs {
        let ctl = MetadataController::from_node(&scene, node_ref, Binding::Handles, true).unwrap();
        assert_eq!(ctl.get_metadata(Some("A")).unwrap(), Value::Int(1));
    }

    assert!(matches!(
        MetadataController::from_node(&scene, &NodeRef::from("ghost"), Binding::Handles, true),
        Err(MetadataError::Host(HostError::NodeNotFound(_)))
    ));
}

#[test]
fn test_live_node_survives_handle_loss_by_name() {
    let scene = MemoryScene::new();
    let old = scene.create_node("ctl");
    scene.delete_node(old);
    let new = scene.create_node("ctl");
    controller(&scene, new)
        .set_metadata("A", Value::Int(1), false)
        .unwrap();

    let live = NodeRef::Live(LiveNode::new(old, "ctl"));
    let ctl = MetadataController::from_node(&scene, &live, Binding::Handles, true).unwrap();
    assert_eq!(ctl.node(), &new);

    assert!(matches!(
        MetadataController::from_node(&scene, &NodeRef::Raw(old), Binding::Handles, true),
        Err(MetadataError::Host(HostError::StaleHandle(_)))
    ));
}
