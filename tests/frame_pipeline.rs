// End-to-end checks of the frame planner through the public API. No GPU needed.

use npr_viewer::engine::frame::{Pass, PassKind};
use npr_viewer::engine::obj::parse_obj;
use npr_viewer::engine::{ImportOptions, OutlineMode, Primitive, ShadingMode, ViewerState};

const FRAME_MS: f64 = 1234.0;

fn gooch_cube_with_hull() -> ViewerState {
    let mut state = ViewerState::new();
    state.set_mesh(Primitive::Cube.build(1.6));
    state.set_shading_mode(ShadingMode::Gooch);
    state.set_gooch_cool([0.2, 0.4, 0.8]);
    state.set_gooch_warm([1.0, 0.8, 0.4]);
    state.set_outline_mode(OutlineMode::ObjectHull);
    state.set_outline_thickness(2.0);
    state
}

fn shaded_pass(state: &ViewerState) -> Pass {
    let plan = state.plan_frame(FRAME_MS, 1280, 720).expect("mesh loaded");
    plan.viewports[0]
        .find(PassKind::Shaded)
        .cloned()
        .expect("shaded pass present")
}

#[test]
fn object_hull_runs_outline_then_main_pass_only() {
    let state = gooch_cube_with_hull();
    let plan = state.plan_frame(FRAME_MS, 1280, 720).unwrap();

    assert_eq!(plan.kinds(), vec![vec![PassKind::Clear, PassKind::OutlineHull, PassKind::Shaded]]);
    assert!(!plan.needs_geometry_buffer());

    match shaded_pass(&state) {
        Pass::Shaded { shading, wireframe, .. } => {
            assert_eq!(shading.mode, ShadingMode::Gooch);
            assert_eq!(shading.gooch.cool, [0.2, 0.4, 0.8]);
            assert_eq!(shading.gooch.warm, [1.0, 0.8, 0.4]);
            assert_eq!(wireframe, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn screen_normal_adds_geometry_and_composite_without_touching_main_pass() {
    let mut state = gooch_cube_with_hull();
    let before = shaded_pass(&state);

    state.set_outline_mode(OutlineMode::ScreenNormal);
    let plan = state.plan_frame(FRAME_MS, 1280, 720).unwrap();

    assert_eq!(
        plan.kinds(),
        vec![vec![
            PassKind::GeometryBuffer,
            PassKind::Clear,
            PassKind::Shaded,
            PassKind::EdgeComposite,
        ]]
    );
    assert!(plan.needs_geometry_buffer());
    assert_eq!(shaded_pass(&state), before);
}

#[test]
fn compare_mode_plans_two_synchronized_viewports() {
    let mut state = gooch_cube_with_hull();
    state.set_compare(true);
    let plan = state.plan_frame(FRAME_MS, 1280, 720).unwrap();

    assert_eq!(plan.viewports.len(), 2);
    assert_eq!(plan.viewports[0].viewport.width + plan.viewports[1].viewport.width, 1280);
    for vp in &plan.viewports {
        assert_eq!(vp.kinds(), vec![PassKind::Clear, PassKind::OutlineHull, PassKind::Shaded]);
    }

    let modes: Vec<ShadingMode> = plan
        .viewports
        .iter()
        .filter_map(|vp| match vp.find(PassKind::Shaded) {
            Some(Pass::Shaded { shading, .. }) => Some(shading.mode),
            _ => None,
        })
        .collect();
    assert_eq!(modes, vec![ShadingMode::Lambert, ShadingMode::Gooch]);
}

#[test]
fn nothing_is_planned_before_a_mesh_arrives() {
    let state = ViewerState::new();
    assert!(state.plan_frame(FRAME_MS, 1280, 720).is_none());
}

#[test]
fn set_mesh_replaces_rather_than_accumulates() {
    let mut state = ViewerState::new();
    state.set_mesh(Primitive::Sphere.build(1.6));
    state.set_mesh(Primitive::SmoothCube.build(1.6));
    let mesh = state.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 12);
}

#[test]
fn failed_import_leaves_current_mesh_in_place() {
    let mut state = ViewerState::new();
    state.set_mesh(Primitive::Cube.build(1.6));

    let bad = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\nf 1 2 3\n";
    if let Ok(mesh) = parse_obj(bad, &ImportOptions::default()) {
        state.set_mesh(mesh);
    }
    assert_eq!(state.mesh().unwrap().vertex_count(), 24);
}
