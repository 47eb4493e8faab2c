use mvz::{
    data_structures::model::{Corner, MeshBuilder, ModelFile, ParsedShape, Shape, VERTEX_STRIDE},
    resources::mesh::upload_model,
};

use crate::common::{fake_gl::Kind, test_utils::fake};

mod common;

fn triangle(builder: &mut MeshBuilder, material: i32) {
    for position in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        builder.add(material, position, [0.5, 0.5], [0.0, 0.0, 1.0]);
    }
}

fn shape(name: &str, materials: &[i32]) -> Shape {
    let mut builder = MeshBuilder::default();
    for &material in materials {
        triangle(&mut builder, material);
    }
    Shape {
        name: name.to_string(),
        meshes: builder.finish(),
    }
}

#[test]
fn triangles_of_one_material_form_one_mesh() {
    let mut builder = MeshBuilder::default();
    for _ in 0..5 {
        triangle(&mut builder, 0);
    }

    let meshes = builder.finish();

    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].num_vertices, 15);
    assert_eq!(meshes[0].vertices.len(), 15 * 8);
    assert_eq!(meshes[0].byte_len(), 15 * VERTEX_STRIDE);
}

#[test]
fn meshes_follow_first_seen_material_order() {
    let mut builder = MeshBuilder::default();
    triangle(&mut builder, 0);
    triangle(&mut builder, 1);
    triangle(&mut builder, 0);

    let meshes = builder.finish();

    let summary: Vec<_> = meshes.iter().map(|m| (m.material_id, m.num_vertices)).collect();
    assert_eq!(summary, vec![(0, 6), (1, 3)]);
}

#[test]
fn vertices_are_interleaved() {
    let mut builder = MeshBuilder::default();
    builder.add(-1, [1.0, 2.0, 3.0], [4.0, 5.0], [6.0, 7.0, 8.0]);

    let meshes = builder.finish();

    assert_eq!(meshes[0].vertices, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert!(!meshes[0].has_material());
}

#[test]
fn parsed_shapes_are_grouped_by_material() {
    let corner = |material_id| Corner {
        material_id,
        position: [0.0; 3],
        uv: [0.0; 2],
        normal: [0.0; 3],
    };
    let parsed = ParsedShape {
        name: "Mixed".to_string(),
        corners: [2, 2, 2, 7, 7, 7].into_iter().map(corner).collect(),
    };

    let shape = Shape::from(parsed);

    assert_eq!(shape.meshes.len(), 2);
    assert_eq!(shape.meshes[1].material_id, 7);
}

#[test]
fn shape_lookup_is_exact_and_case_sensitive() {
    let file = ModelFile::new(vec![shape("Suzanne", &[0]), shape("Ground", &[0])]);

    let names: Vec<_> = file.shapes().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Ground", "Suzanne"]);

    assert_eq!(file.find_shape("Ground"), Some(0));
    assert_eq!(file.find_shape("Suzanne"), Some(1));
    assert_eq!(file.find_shape("ground"), None);
    assert_eq!(file.find_shape("Suz"), None);
    assert_eq!(file.find_shape(""), None);
}

#[test]
fn duplicate_names_resolve_to_the_first_parsed_shape() {
    let file = ModelFile::new(vec![
        shape("Rock", &[0]),
        shape("Bush", &[0]),
        shape("Rock", &[0, 1]),
    ]);

    let index = file.find_shape("Rock").unwrap();

    assert_eq!(index, 1);
    assert_eq!(file.shape(index).unwrap().meshes.len(), 1);
}

#[test]
fn upload_creates_one_sized_buffer_per_mesh() {
    let (fake, gl) = fake();
    let file = ModelFile::new(vec![shape("A", &[0, 1, 0]), shape("B", &[3])]);

    let mut model = upload_model(&*gl, &file).unwrap();

    assert_eq!(model.buffer_count(), 3);
    assert_eq!(fake.live_count(Kind::Buffer), 3);
    let a = &model.shapes[0].meshes;
    assert_eq!(a[0].num_vertices, 6);
    assert_eq!(fake.buffer_size(a[0].buffer), Some(6 * VERTEX_STRIDE));
    assert_eq!(fake.buffer_size(a[1].buffer), Some(3 * VERTEX_STRIDE));

    model.release(&*gl).unwrap();
    assert_eq!(fake.live_total(), 0);
    assert_eq!(model.buffer_count(), 0);
}

#[test]
fn failed_upload_at_any_mesh_leaks_no_buffer() {
    let file = ModelFile::new(vec![shape("A", &[0, 1]), shape("B", &[0]), shape("C", &[0, 1])]);
    assert_eq!(file.mesh_count(), 5);

    for call in ["gen_buffer", "bind_buffer", "buffer_data"] {
        for n in 1..=file.mesh_count() {
            let (fake, gl) = fake();
            fake.fail_nth_call(call, n, glow::OUT_OF_MEMORY);

            assert!(upload_model(&*gl, &file).is_err(), "{call} #{n}");
            assert_eq!(fake.live_total(), 0, "{call} #{n}");
            assert_eq!(fake.double_frees(), 0, "{call} #{n}");
        }
    }
}
