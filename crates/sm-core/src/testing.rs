//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::DVec3;
use parking_lot::Mutex;
use sm_cad::{BoundingBox, CadError, CadResult, GeometryKernel, Solid};
use uuid::Uuid;

/// Kernel reading four numbers `volume sx sy sz` from each file
///
/// Records every load so tests can check which files were touched and that
/// every handle was released.
#[derive(Default)]
pub struct StubKernel {
    solids: Mutex<HashMap<Uuid, (f64, DVec3)>>,
    loaded: Mutex<Vec<PathBuf>>,
}

impl StubKernel {
    /// Handles not yet released
    pub fn live(&self) -> usize {
        self.solids.lock().len()
    }

    /// Number of load calls so far
    pub fn loads(&self) -> usize {
        self.loaded.lock().len()
    }

    /// Paths passed to the loaders, in call order
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loaded.lock().clone()
    }

    fn load(&self, path: &Path) -> CadResult<Solid> {
        self.loaded.lock().push(path.to_path_buf());

        let text = std::fs::read_to_string(path)
            .map_err(|e| CadError::FileIo(format!("{}: {e}", path.display())))?;
        let values: Vec<f64> = text
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| CadError::StepImport(format!("{}: {e}", path.display())))?;
        let &[volume, x, y, z] = values.as_slice() else {
            return Err(CadError::StepImport(format!(
                "{}: expected 4 values",
                path.display()
            )));
        };

        let solid = Solid::new(Uuid::new_v4());
        self.solids
            .lock()
            .insert(solid.id, (volume, DVec3::new(x, y, z)));
        Ok(solid)
    }

    fn get(&self, solid: &Solid) -> CadResult<(f64, DVec3)> {
        self.solids
            .lock()
            .get(&solid.id)
            .copied()
            .ok_or(CadError::SolidNotFound(solid.id))
    }
}

impl GeometryKernel for StubKernel {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn load_mesh(&self, path: &Path) -> CadResult<Solid> {
        self.load(path)
    }

    fn load_brep(&self, path: &Path, _verbose: bool) -> CadResult<Solid> {
        self.load(path)
    }

    fn volume(&self, solid: &Solid) -> CadResult<f64> {
        let (volume, _) = self.get(solid)?;
        if !volume.is_finite() {
            return Err(CadError::Geometry("volume is not finite".into()));
        }
        Ok(volume)
    }

    fn bounding_box(&self, solid: &Solid) -> CadResult<BoundingBox> {
        let (_, size) = self.get(solid)?;
        Ok(BoundingBox::new(DVec3::ZERO, size))
    }

    fn face_count(&self, solid: &Solid) -> CadResult<usize> {
        self.get(solid).map(|_| 6)
    }

    fn shell_count(&self, solid: &Solid) -> CadResult<usize> {
        self.get(solid).map(|_| 1)
    }

    fn release(&self, solid: &Solid) {
        self.solids.lock().remove(&solid.id);
    }
}

/// Write a stub part file
pub fn write_part(path: &Path, volume: f64, size: [f64; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(
        path,
        format!("{} {} {} {}", volume, size[0], size[1], size[2]),
    )
    .unwrap();
}

/// Write a closed box mesh with its minimum corner at the origin
pub fn write_box_stl(path: &Path, size: [f32; 3]) {
    let [x, y, z] = size;
    let quads: [[[f32; 3]; 4]; 6] = [
        [[0., 0., 0.], [0., y, 0.], [x, y, 0.], [x, 0., 0.]],
        [[0., 0., z], [x, 0., z], [x, y, z], [0., y, z]],
        [[0., 0., 0.], [x, 0., 0.], [x, 0., z], [0., 0., z]],
        [[0., y, 0.], [0., y, z], [x, y, z], [x, y, 0.]],
        [[0., 0., 0.], [0., 0., z], [0., y, z], [0., y, 0.]],
        [[x, 0., 0.], [x, y, 0.], [x, y, z], [x, 0., z]],
    ];
    let triangles: Vec<stl_io::Triangle> = quads
        .iter()
        .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
        .map(|tri| stl_io::Triangle {
            normal: stl_io::Normal::new([0.0, 0.0, 0.0]),
            vertices: tri.map(stl_io::Vertex::new),
        })
        .collect();

    let mut file = std::fs::File::create(path).unwrap();
    stl_io::write_stl(&mut file, triangles.iter()).unwrap();
}

/// Write an axis-aligned box solid as a STEP file
#[cfg(feature = "truck")]
pub fn write_box_step(path: &Path, origin: [f64; 3], size: [f64; 3]) {
    use truck_modeling::{Point3, Vector3, builder};
    use truck_stepio::out::{CompleteStepDisplay, StepModel};

    let vertex = builder::vertex(Point3::new(origin[0], origin[1], origin[2]));
    let edge = builder::tsweep(&vertex, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    let solid: truck_modeling::Solid = builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2]));

    let compressed = solid.compress();
    let model = StepModel::from(&compressed);
    let step = CompleteStepDisplay::new(model, Default::default());
    std::fs::write(path, step.to_string()).unwrap();
}
