use cgmath::*;

/// Node-local transform kept decomposed so it can be edited or animated
/// without re-decomposing a matrix.
#[derive(Debug, Clone)]
pub struct NodeTransform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl NodeTransform {
    pub fn matrix(&self) -> Matrix4<f32> {
        let translation_mat = Matrix4::from_translation(self.position);
        let rotation_mat: Matrix4<f32> = self.rotation.into();
        let scale_mat = Matrix4::from_nonuniform_scale(self.scale[0], self.scale[1], self.scale[2]);
        translation_mat * rotation_mat * scale_mat
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Nodes and scenes refer to each other by index, mirroring the document.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f32> {
        self.min + (self.max - self.min) * 0.5
    }

    pub fn diagonal(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    fn expand(&mut self, point: Point3<f32>) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    /// Grows this box to cover `other` as well.
    pub fn union(&mut self, other: &Aabb) {
        self.expand(other.min);
        self.expand(other.max);
    }
}

/// The document hierarchy, flattened. Meshes themselves live in the binding
/// table; `mesh_bounds` carries their object-space boxes for camera framing.
#[derive(Debug, Clone)]
pub struct SceneModel {
    pub default_scene: Option<usize>,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub mesh_bounds: Vec<Option<Aabb>>,
}

impl SceneModel {
    /// The scene the document marks as default. A document that marks none
    /// draws nothing.
    pub fn default_scene(&self) -> Option<&Scene> {
        self.default_scene.and_then(|index| self.scenes.get(index))
    }
}

/// Walks a scene depth-first with an explicit stack, calling `visit` with
/// each node index and its world transform. Hierarchy depth is bounded by
/// the heap, not the call stack.
pub fn visit_scene<F>(model: &SceneModel, scene: &Scene, mut visit: F)
where
    F: FnMut(usize, Matrix4<f32>),
{
    let mut stack: Vec<(usize, Matrix4<f32>)> = Vec::with_capacity(scene.nodes.len());
    for &root in &scene.nodes {
        stack.push((root, Matrix4::identity()));
    }
    while let Some((index, parent)) = stack.pop() {
        let node = &model.nodes[index];
        let world = parent * node.transform.matrix();
        visit(index, world);
        for &child in &node.children {
            stack.push((child, world));
        }
    }
}

/// World-space box around everything the scene draws, for framing the
/// default camera. `None` when no visited node carries mesh bounds.
pub fn scene_bounds(model: &SceneModel, scene: &Scene) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;
    visit_scene(model, scene, |index, world| {
        let mesh = match model.nodes[index].mesh {
            Some(mesh) => mesh,
            None => return,
        };
        let local = match model.mesh_bounds.get(mesh).copied().flatten() {
            Some(local) => local,
            None => return,
        };
        for corner in local.corners() {
            let point = world.transform_point(corner);
            match bounds.as_mut() {
                Some(bounds) => bounds.expand(point),
                None => {
                    bounds = Some(Aabb {
                        min: point,
                        max: point,
                    })
                }
            }
        }
    });
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Point3<f32>, expected: [f32; 3]) {
        let delta = actual - Point3::new(expected[0], expected[1], expected[2]);
        assert!(
            delta.magnitude() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    fn group(children: Vec<usize>) -> Node {
        Node {
            name: None,
            transform: NodeTransform::default(),
            children,
            mesh: None,
        }
    }

    fn model(nodes: Vec<Node>, roots: Vec<usize>, mesh_bounds: Vec<Option<Aabb>>) -> SceneModel {
        SceneModel {
            default_scene: Some(0),
            scenes: vec![Scene {
                name: None,
                nodes: roots,
            }],
            nodes,
            mesh_bounds,
        }
    }

    fn unit_box() -> Aabb {
        Aabb {
            min: Point3::new(0.0, 0.0, 0.0),
            max: Point3::new(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_union_covers_both_boxes() {
        let mut bounds = unit_box();
        bounds.union(&Aabb {
            min: Point3::new(-2.0, 0.5, 0.0),
            max: Point3::new(0.5, 3.0, 1.0),
        });
        assert_close(bounds.min, [-2.0, 0.0, 0.0]);
        assert_close(bounds.max, [1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_trs_order_is_scale_rotation_translation() {
        let transform = NodeTransform {
            position: Vector3::new(0.0, 0.0, 3.0),
            rotation: Quaternion::from_angle_z(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let point = transform.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_close(point, [0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_visit_composes_parent_then_child() {
        let mut parent = group(vec![1]);
        parent.transform.position = Vector3::new(1.0, 0.0, 0.0);
        let mut child = group(vec![]);
        child.transform.scale = Vector3::new(2.0, 2.0, 2.0);
        child.mesh = Some(0);
        let model = model(vec![parent, child], vec![0], vec![Some(unit_box())]);

        let mut worlds = Vec::new();
        visit_scene(&model, &model.scenes[0], |index, world| {
            worlds.push((index, world));
        });
        assert_eq!(worlds.len(), 2);
        let &(index, world) = worlds.iter().find(|(index, _)| *index == 1).unwrap();
        assert_eq!(index, 1);
        assert_close(world.transform_point(Point3::new(1.0, 1.0, 1.0)), [3.0, 2.0, 2.0]);
    }

    #[test]
    fn test_visit_tolerates_pure_group_scenes() {
        let model = model(vec![group(vec![]), group(vec![])], vec![0, 1], vec![]);
        let mut visited = 0;
        let mut with_mesh = 0;
        visit_scene(&model, &model.scenes[0], |index, _| {
            visited += 1;
            if model.nodes[index].mesh.is_some() {
                with_mesh += 1;
            }
        });
        assert_eq!(visited, 2);
        assert_eq!(with_mesh, 0);
    }

    #[test]
    fn test_visit_survives_deep_hierarchies() {
        let depth = 100_000;
        let mut nodes = Vec::with_capacity(depth);
        for index in 0..depth {
            let children = if index + 1 < depth {
                vec![index + 1]
            } else {
                vec![]
            };
            nodes.push(group(children));
        }
        let model = model(nodes, vec![0], vec![]);
        let mut visited = 0usize;
        visit_scene(&model, &model.scenes[0], |_, _| visited += 1);
        assert_eq!(visited, depth);
    }

    #[test]
    fn test_scene_bounds_unions_transformed_meshes() {
        let mut near = group(vec![]);
        near.mesh = Some(0);
        let mut far = group(vec![]);
        far.mesh = Some(0);
        far.transform.position = Vector3::new(10.0, 0.0, 0.0);
        let model = model(vec![near, far], vec![0, 1], vec![Some(unit_box())]);

        let bounds = scene_bounds(&model, &model.scenes[0]).unwrap();
        assert_close(bounds.min, [0.0, 0.0, 0.0]);
        assert_close(bounds.max, [11.0, 1.0, 1.0]);
    }

    #[test]
    fn test_scene_bounds_missing_for_meshless_scene() {
        let model = model(vec![group(vec![])], vec![0], vec![]);
        assert!(scene_bounds(&model, &model.scenes[0]).is_none());
    }

    #[test]
    fn test_unmarked_default_scene_selects_nothing() {
        let mut model = model(vec![group(vec![])], vec![0], vec![]);
        assert!(model.default_scene().is_some());
        model.default_scene = None;
        assert!(model.default_scene().is_none());
    }
}
