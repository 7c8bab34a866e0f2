//! End-to-end builds through files on disk

use std::path::Path;

use approx::assert_abs_diff_eq;
use articulate_core::{
    Broadcast, BuildContext, BuildError, CatalogueCase, ExportConfig, ImportOptions, JointSpec,
    JointType, LinkKind, Mesh, ParentRef, PartId, TreeError, WORLD_LINK, load_obj,
    read_description,
};
use glam::DVec3;

fn context(root: &Path) -> BuildContext {
    BuildContext::create(ExportConfig::with_output_root(root), Some("7")).unwrap()
}

fn boxed(name: &str, min: [f64; 3], max: [f64; 3]) -> Mesh {
    Mesh::cuboid(name, DVec3::from_array(min), DVec3::from_array(max))
}

fn assert_vec_eq(actual: DVec3, expected: DVec3) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = 1e-9);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = 1e-9);
    assert_abs_diff_eq!(actual.z, expected.z, epsilon = 1e-9);
}

#[test]
fn test_scenario_revolute_door() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());

    let body = boxed("body", [0.0, 0.0, 0.0], [1.0, 0.6, 0.9]);
    let door = boxed("door", [0.0, -0.05, 0.0], [1.0, 0.0, 0.9]);
    let a = ctx
        .register(
            vec![body.clone()],
            "body",
            Broadcast::One(Some(ParentRef::World)),
            Broadcast::One(Some(JointSpec::fixed("base"))),
        )
        .unwrap();
    let hinge = JointSpec::builder("door_hinge")
        .revolute()
        .axis_xyz(0.0, 1.0, 0.0)
        .limits_range(0.0, 1.5708)
        .origin_shift(DVec3::new(0.0, 0.0, -0.5))
        .build()
        .unwrap();
    let b = ctx
        .register(
            vec![door.clone()],
            "door",
            Broadcast::One(Some(ParentRef::Part(a[0]))),
            Broadcast::One(Some(hinge)),
        )
        .unwrap();
    assert_eq!((a[0], b[0]), (PartId(0), PartId(1)));

    let report = ctx.finalize(&Mesh::join("whole", [&body, &door])).unwrap();
    let origin_a = report.parts[&PartId(0)].origin;
    let origin_b = report.parts[&PartId(1)].origin;
    assert_vec_eq(origin_a, DVec3::new(0.5, 0.3, 0.45));
    assert_vec_eq(origin_b, DVec3::new(0.5, -0.025, 0.45));

    let graph = read_description(&report.description_path, &ImportOptions::default()).unwrap();
    let mut links: Vec<&str> = graph.links().iter().map(|l| l.name.as_str()).collect();
    links.sort();
    assert_eq!(links, vec!["0", "1", "abstract_0_1", "world"]);
    assert_eq!(graph.joint_count(), 3);

    let base = graph.joint("base").unwrap();
    assert_eq!((base.parent_link.as_str(), base.child_link.as_str()), (WORLD_LINK, "0"));
    assert_eq!(base.joint_type, JointType::Fixed);
    assert_vec_eq(base.translation(), origin_a);

    let hinge = graph.joint("door_hinge").unwrap();
    assert_eq!(hinge.joint_type, JointType::Revolute);
    assert_eq!(hinge.child_link, "abstract_0_1");
    assert_vec_eq(hinge.translation(), origin_b - origin_a + DVec3::new(0.0, 0.0, -0.5));
    assert_eq!(hinge.axis, Some(DVec3::Y));
    let limits = hinge.limits.unwrap();
    assert_eq!((limits.lower, limits.upper), (0.0, 1.5708));
    assert_eq!((limits.effort, limits.velocity), (2000.0, 2.0));

    let undo = graph.parent_joint("1").unwrap();
    assert_eq!(undo.joint_type, JointType::Fixed);
    assert_eq!(undo.parent_link, "abstract_0_1");
    assert_vec_eq(undo.translation(), DVec3::new(0.0, 0.0, 0.5));

    assert!(graph.validate().is_ok());
    assert_vec_eq(graph.world_translation("1").unwrap(), origin_b);
}

#[test]
fn test_scenario_sequential_fixed_parts() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());

    let meshes: Vec<Mesh> = (0..3)
        .map(|i| {
            let x = i as f64;
            boxed("shelf", [x, 0.0, 0.0], [x + 0.5, 1.0, 0.1])
        })
        .collect();
    let mut ids = Vec::new();
    for (i, mesh) in meshes.iter().enumerate() {
        ids.extend(
            ctx.register(
                vec![mesh.clone()],
                "shelf",
                Broadcast::One(Some(ParentRef::World)),
                Broadcast::One(Some(JointSpec::fixed(format!("shelf_fixed_{}", i)))),
            )
            .unwrap(),
        );
    }
    assert_eq!(ids, vec![PartId(0), PartId(1), PartId(2)]);

    let report = ctx.finalize(&Mesh::join("whole", &meshes)).unwrap();
    let graph = &report.graph;
    assert_eq!(graph.joint_count(), 3);
    for (i, joint) in graph.joints().iter().enumerate() {
        assert_eq!(joint.joint_type, JointType::Fixed);
        assert_eq!(joint.parent_link, WORLD_LINK);
        assert_eq!(joint.child_link, i.to_string());
        assert_eq!(joint.name, format!("shelf_fixed_{}", i));
    }
}

#[test]
fn test_unparented_part_fixed_at_its_origin() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let lamp = boxed("lamp", [1.0, 2.0, 3.0], [2.0, 3.0, 5.0]);

    ctx.register(vec![lamp.clone()], "lamp", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    let report = ctx.finalize(&lamp).unwrap();

    let joint = report.graph.parent_joint("0").unwrap();
    assert_eq!(joint.parent_link, WORLD_LINK);
    assert_eq!(joint.joint_type, JointType::Fixed);
    assert_vec_eq(joint.translation(), DVec3::new(1.5, 2.5, 4.0));
    assert_vec_eq(joint.translation(), report.parts[&PartId(0)].origin);
}

#[test]
fn test_compound_joint_written_with_parallel_slide() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let base = boxed("base", [0.0, 0.0, 0.0], [1.0, 1.0, 0.2]);
    let knob = boxed("knob", [0.4, 0.4, 0.2], [0.6, 0.6, 0.3]);

    let ids = ctx
        .register(vec![base.clone()], "base", Broadcast::One(Some(ParentRef::World)), Broadcast::One(None))
        .unwrap();
    let spec = JointSpec::builder("knob_turn")
        .continuous_prismatic()
        .axis_xyz(0.0, 0.0, 1.0)
        .axis_1(DVec3::Z)
        .limits_1_range(-0.01, 0.0)
        .build()
        .unwrap();
    ctx.register(
        vec![knob.clone()],
        "knob",
        Broadcast::One(Some(ParentRef::Part(ids[0]))),
        Broadcast::One(Some(spec)),
    )
    .unwrap();

    let report = ctx.finalize(&Mesh::join("whole", [&base, &knob])).unwrap();
    let graph = read_description(&report.description_path, &ImportOptions::default()).unwrap();

    assert_eq!(graph.link("abstract_0_1").unwrap().kind, LinkKind::Abstract);
    let between = graph.joints_between("0", "1");
    assert_eq!(between.len(), 1);
    let slide = between[0];
    assert_eq!(slide.joint_type, JointType::Prismatic);
    assert!(slide.name.starts_with("joint_prismatic_"));
    assert!(slide.secondary);
    assert_eq!(slide.limits.unwrap().lower, -0.01);
    assert_eq!(graph.joint("knob_turn").unwrap().joint_type, JointType::Continuous);
    assert!(graph.validate().is_ok());
}

#[test]
fn test_unknown_parent_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let handle = boxed("handle", [0.0, 0.0, 0.0], [0.1, 0.1, 0.4]);

    ctx.register(
        vec![handle.clone()],
        "handle",
        Broadcast::One(Some(ParentRef::Part(PartId(42)))),
        Broadcast::One(Some(JointSpec::fixed("handle_fixed"))),
    )
    .unwrap();
    let report = ctx.finalize(&handle).unwrap();

    let graph = &report.graph;
    assert!(graph.validate().is_ok());
    assert!(!graph.link("42").unwrap().has_geometry());
    assert_eq!(graph.parent_joint("42").unwrap().parent_link, WORLD_LINK);
    assert_eq!(graph.parent_joint("0").unwrap().parent_link, "42");
}

#[test]
fn test_cyclic_parents_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let a = boxed("a", [0.0; 3], [1.0; 3]);
    let b = boxed("b", [1.0; 3], [2.0; 3]);

    let ids = ctx
        .register(vec![a.clone()], "a", Broadcast::One(Some(ParentRef::World)), Broadcast::One(None))
        .unwrap();
    let child = ctx
        .register(vec![b.clone()], "b", Broadcast::One(Some(ParentRef::Part(ids[0]))), Broadcast::One(None))
        .unwrap();
    ctx.add_joint(Some(ParentRef::Part(child[0])), ids[0], None).unwrap();

    let result = ctx.finalize(&Mesh::join("whole", [&a, &b]));
    assert!(matches!(result, Err(BuildError::Tree(TreeError::CyclicParent(_)))));
    ctx.abort().unwrap();
    assert!(!dir.path().join("7").exists());
    // No catalogue case points at the removed files
    assert!(!dir.path().join("data_infos_7.json").exists());
}

#[test]
fn test_aborted_build_keeps_earlier_cases() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let mesh = boxed("part", [0.0; 3], [1.0; 3]);

    ctx.register(vec![mesh.clone()], "part", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    ctx.finalize(&mesh).unwrap();

    ctx.register(vec![mesh.clone()], "part", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    ctx.abort().unwrap();

    let content = std::fs::read_to_string(dir.path().join("data_infos_7.json")).unwrap();
    let cases: Vec<CatalogueCase> = serde_json::from_str(&content).unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].id, "7");
    assert!(Path::new(&cases[0].part[0].file_obj_path).exists());
}

#[test]
fn test_state_cleared_after_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let mesh = boxed("part", [0.0; 3], [1.0; 3]);

    ctx.register(vec![mesh.clone()], "part", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    let first = ctx.finalize(&mesh).unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.next_id(), PartId(0));
    assert_ne!(ctx.build_id(), "7");

    let other = boxed("other", [2.0; 3], [5.0; 3]);
    let ids = ctx
        .register(vec![other.clone()], "part", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    assert_eq!(ids, vec![PartId(0)]);
    let second = ctx.finalize(&other).unwrap();

    // The first build's part file is untouched by the second build
    assert_ne!(first.description_path, second.description_path);
    let kept = load_obj(dir.path().join("7/objs/0.obj")).unwrap().bounding_box().unwrap();
    assert_abs_diff_eq!(kept.size().x, 1.0, epsilon = 1e-9);

    let content = std::fs::read_to_string(dir.path().join("data_infos_7.json")).unwrap();
    let cases: Vec<CatalogueCase> = serde_json::from_str(&content).unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[1].id, second.build_id);
}

#[test]
fn test_output_layout_and_catalogue() {
    let root = tempfile::tempdir().unwrap();
    let output_root = root.path().join("DishwasherFactory");
    let mut ctx = BuildContext::create(ExportConfig::with_output_root(&output_root), Some("3")).unwrap();
    assert_eq!(ctx.object_name(), "Dishwasher");

    let body = boxed("body", [0.0; 3], [0.6, 0.6, 0.85]);
    let racks = vec![
        boxed("rack", [0.05, 0.05, 0.1], [0.55, 0.55, 0.2]),
        boxed("rack", [0.05, 0.05, 0.4], [0.55, 0.55, 0.5]),
    ];
    let ids = ctx
        .register(vec![body.clone()], "body", Broadcast::One(Some(ParentRef::World)), Broadcast::One(None))
        .unwrap();
    let slide = JointSpec::builder("rack_slide")
        .prismatic()
        .axis_xyz(0.0, -1.0, 0.0)
        .limits_range(0.0, 0.5)
        .build()
        .unwrap();
    ctx.register(
        racks.clone(),
        "rack",
        Broadcast::One(Some(ParentRef::Part(ids[0]))),
        Broadcast::One(Some(slide)),
    )
    .unwrap();

    let whole = Mesh::join("whole", std::iter::once(&body).chain(&racks));
    let report = ctx.finalize(&whole).unwrap();

    let build_dir = output_root.join("3");
    assert_eq!(report.description_path, build_dir.join("scene.urdf"));
    for file in ["0.obj", "1.obj", "2.obj", "whole.obj"] {
        assert!(build_dir.join("objs").join(file).exists(), "missing {}", file);
    }
    assert!(report.graph.joint("rack_slide_0").is_some());
    assert!(report.graph.joint("rack_slide_1").is_some());

    // Part files are centered on their own boxes and keep their size
    let rack = load_obj(build_dir.join("objs/2.obj")).unwrap().bounding_box().unwrap();
    assert_vec_eq(rack.center(), DVec3::ZERO);
    assert_abs_diff_eq!(rack.size().x, 0.5, epsilon = 1e-9);

    // Whole mesh is normalized to the unit extent
    let whole = load_obj(&report.whole_path).unwrap().bounding_box().unwrap();
    assert_vec_eq(whole.center(), DVec3::ZERO);
    assert_abs_diff_eq!(whole.longest_side(), 1.0, epsilon = 1e-9);

    let content = std::fs::read_to_string(output_root.join("data_infos_3.json")).unwrap();
    let cases: Vec<CatalogueCase> = serde_json::from_str(&content).unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].id, "3");
    assert_eq!(cases[0].obj_name, "Dishwasher");
    let names: Vec<&str> = cases[0].part.iter().map(|p| p.part_name.as_str()).collect();
    assert_eq!(names, vec!["body_part", "rack_part", "rack_part"]);
    assert_eq!(cases[0].part[2].file_name, "2.obj");
}

#[test]
fn test_relative_mesh_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        absolute_mesh_paths: false,
        ..ExportConfig::with_output_root(dir.path())
    };
    let mut ctx = BuildContext::create(config, None).unwrap();
    assert!(ctx.build_id().starts_with("random_"));
    let mesh = boxed("part", [0.0; 3], [1.0; 3]);

    ctx.register(vec![mesh.clone()], "part", Broadcast::One(None), Broadcast::One(None))
        .unwrap();
    let report = ctx.finalize(&mesh).unwrap();

    let content = std::fs::read_to_string(&report.description_path).unwrap();
    assert!(content.contains(r#"<mesh filename="objs/0.obj"/>"#));
    let options = ImportOptions {
        require_meshes: true,
        ..Default::default()
    };
    assert!(read_description(&report.description_path, &options).is_ok());
}
