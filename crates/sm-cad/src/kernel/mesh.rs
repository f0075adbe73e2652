//! Triangle mesh bodies and STL loading

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::DVec3;

use super::{BoundingBox, CadError, CadResult};

/// A solid body reduced to oriented triangles plus its topology counts
#[derive(Debug, Clone, Default)]
pub struct MeshBody {
    /// Triangles with outward (counter-clockwise) winding
    pub triangles: Vec<[DVec3; 3]>,
    /// Number of topological faces
    pub face_count: usize,
    /// Number of topological shells
    pub shell_count: usize,
    /// Faces that could not be tessellated (B-rep only)
    pub failed_faces: usize,
}

impl MeshBody {
    /// Check that every face made it into the triangle set
    fn ensure_complete(&self) -> CadResult<()> {
        if self.failed_faces > 0 {
            return Err(CadError::Geometry(format!(
                "{} of {} faces could not be tessellated",
                self.failed_faces, self.face_count
            )));
        }
        Ok(())
    }

    /// Enclosed volume via the divergence theorem
    ///
    /// Sums the signed volumes of the tetrahedra spanned by the origin and each
    /// triangle. The sign depends on winding, so the magnitude is returned.
    pub fn volume(&self) -> CadResult<f64> {
        self.ensure_complete()?;
        let signed: f64 = self
            .triangles
            .iter()
            .map(|[a, b, c]| a.dot(b.cross(*c)) / 6.0)
            .sum();
        if !signed.is_finite() {
            return Err(CadError::Geometry(format!(
                "volume is not finite ({signed})"
            )));
        }
        Ok(signed.abs())
    }

    /// Bounding box over all triangle vertices
    pub fn bounding_box(&self) -> CadResult<BoundingBox> {
        self.ensure_complete()?;
        let bbox = BoundingBox::from_points(self.triangles.iter().flatten().copied())
            .ok_or_else(|| CadError::Geometry("solid has no vertices".into()))?;
        if !bbox.min.is_finite() || !bbox.max.is_finite() {
            return Err(CadError::Geometry(
                "bounding box has non-finite coordinates".into(),
            ));
        }
        Ok(bbox)
    }
}

/// Load an STL file into a mesh body
///
/// Every triangle counts as one face. Shells are the connected components of
/// triangles sharing a vertex. With `strict_manifold` set, a mesh that is not
/// closed and manifold is rejected as a geometry error.
pub fn load_stl(path: &Path, strict_manifold: bool) -> CadResult<MeshBody> {
    let file = File::open(path).map_err(|e| CadError::FileIo(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);

    let mesh = stl_io::read_stl(&mut reader)
        .map_err(|e| CadError::MeshImport(format!("{}: {e}", path.display())))?;

    if mesh.faces.is_empty() {
        return Err(CadError::EmptySolid(format!(
            "{} contains no triangles",
            path.display()
        )));
    }

    if let Err(e) = mesh.validate() {
        if strict_manifold {
            return Err(CadError::Geometry(format!(
                "{} is not a closed manifold: {e}",
                path.display()
            )));
        }
        tracing::warn!("{} is not a closed manifold: {}", path.display(), e);
    }

    let to_dvec = |i: usize| {
        let v = &mesh.vertices[i];
        DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64)
    };

    let triangles: Vec<[DVec3; 3]> = mesh
        .faces
        .iter()
        .map(|face| {
            [
                to_dvec(face.vertices[0]),
                to_dvec(face.vertices[1]),
                to_dvec(face.vertices[2]),
            ]
        })
        .collect();

    let faces: Vec<[usize; 3]> = mesh.faces.iter().map(|f| f.vertices).collect();
    let shell_count = count_components(mesh.vertices.len(), &faces);

    Ok(MeshBody {
        face_count: triangles.len(),
        triangles,
        shell_count,
        failed_faces: 0,
    })
}

/// Count connected components of triangles linked through shared vertices
fn count_components(vertex_count: usize, faces: &[[usize; 3]]) -> usize {
    let mut parent: Vec<usize> = (0..vertex_count).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for face in faces {
        let root = find(&mut parent, face[0]);
        for &v in &face[1..] {
            let other = find(&mut parent, v);
            if other != root {
                parent[other] = root;
            }
        }
    }

    let mut roots: Vec<usize> = faces
        .iter()
        .map(|face| find(&mut parent, face[0]))
        .collect();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Twelve outward-facing triangles of an axis-aligned box
    pub(crate) fn box_triangles(min: [f32; 3], max: [f32; 3]) -> Vec<stl_io::Triangle> {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let quads: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, -1.0], [[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]]),
            ([0.0, 0.0, 1.0], [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]]),
            ([0.0, -1.0, 0.0], [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]]),
            ([0.0, 1.0, 0.0], [[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]]),
            ([-1.0, 0.0, 0.0], [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]]),
            ([1.0, 0.0, 0.0], [[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]]),
        ];

        let mut triangles = Vec::new();
        for (normal, [a, b, c, d]) in quads {
            for tri in [[a, b, c], [a, c, d]] {
                triangles.push(stl_io::Triangle {
                    normal: stl_io::Normal::new(normal),
                    vertices: tri.map(stl_io::Vertex::new),
                });
            }
        }
        triangles
    }

    pub(crate) fn write_stl(path: &Path, triangles: &[stl_io::Triangle]) {
        let mut file = File::create(path).unwrap();
        stl_io::write_stl(&mut file, triangles.iter()).unwrap();
    }

    #[test]
    fn test_load_stl_unit_cube() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        write_stl(&path, &box_triangles([0.0; 3], [1.0; 3]));

        let body = load_stl(&path, true).unwrap();
        assert_eq!(body.face_count, 12);
        assert_eq!(body.shell_count, 1);
        assert_relative_eq!(body.volume().unwrap(), 1.0, epsilon = 1e-9);

        let bbox = body.bounding_box().unwrap();
        assert_eq!(bbox.size(), DVec3::ONE);
    }

    #[test]
    fn test_load_stl_box_volume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.stl");
        write_stl(&path, &box_triangles([-1.0, 2.0, 0.0], [3.0, 4.0, 0.5]));

        let body = load_stl(&path, false).unwrap();
        assert_relative_eq!(body.volume().unwrap(), 4.0, epsilon = 1e-6);
        let bbox = body.bounding_box().unwrap();
        assert_eq!(bbox.min, DVec3::new(-1.0, 2.0, 0.0));
        assert_eq!(bbox.max, DVec3::new(3.0, 4.0, 0.5));
    }

    #[test]
    fn test_load_stl_two_shells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.stl");
        let mut triangles = box_triangles([0.0; 3], [1.0; 3]);
        triangles.extend(box_triangles([5.0; 3], [6.0; 3]));
        write_stl(&path, &triangles);

        let body = load_stl(&path, false).unwrap();
        assert_eq!(body.face_count, 24);
        assert_eq!(body.shell_count, 2);
        assert_relative_eq!(body.volume().unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_load_stl_open_mesh_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("open.stl");
        let mut triangles = box_triangles([0.0; 3], [1.0; 3]);
        triangles.truncate(10);
        write_stl(&path, &triangles);

        assert!(matches!(load_stl(&path, true), Err(CadError::Geometry(_))));
        assert!(load_stl(&path, false).is_ok());
    }

    #[test]
    fn test_load_stl_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.stl");
        std::fs::write(&path, b"not an stl file at all").unwrap();

        let err = load_stl(&path, false).unwrap_err();
        assert_eq!(err.kind(), super::super::CadErrorKind::Load);
    }

    #[test]
    fn test_load_stl_missing_file() {
        let err = load_stl(Path::new("/nonexistent/part.stl"), false).unwrap_err();
        assert!(matches!(err, CadError::FileIo(_)));
    }

    #[test]
    fn test_failed_faces_make_volume_fail() {
        let body = MeshBody {
            triangles: vec![[DVec3::ZERO, DVec3::X, DVec3::Y]],
            face_count: 2,
            shell_count: 1,
            failed_faces: 1,
        };
        assert!(matches!(body.volume(), Err(CadError::Geometry(_))));
        assert!(matches!(body.bounding_box(), Err(CadError::Geometry(_))));
    }

    #[test]
    fn test_count_components() {
        assert_eq!(count_components(6, &[[0, 1, 2], [3, 4, 5]]), 2);
        assert_eq!(count_components(4, &[[0, 1, 2], [2, 3, 0]]), 1);
    }
}
