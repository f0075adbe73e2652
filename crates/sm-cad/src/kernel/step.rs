//! STEP loading through truck-stepio
//!
//! Every shell in the file is converted into truck topology and tessellated;
//! the oriented face meshes are flattened into a single [`MeshBody`].

use std::path::Path;

use glam::DVec3;
use ruststep::parser::parse;
use truck_meshalgo::prelude::*;
use truck_stepio::r#in::Table;

use super::mesh::MeshBody;
use super::{CadError, CadResult};

/// Tessellation tolerance used for the first, coarse pass
const COARSE_TOLERANCE: f64 = 0.01;

/// Load and tessellate a STEP file
///
/// `tessellation_ratio` scales the coarse bounding-box diameter into the
/// tolerance of the final pass.
pub fn load_step(path: &Path, tessellation_ratio: f64, verbose: bool) -> CadResult<MeshBody> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CadError::FileIo(format!("{}: {e}", path.display())))?;

    let exchange = parse(&raw)
        .map_err(|e| CadError::StepImport(format!("{}: {e}", path.display())))?;
    let section = exchange.data.first().ok_or_else(|| {
        CadError::StepImport(format!("{} has no data sections", path.display()))
    })?;
    let table = Table::from_data_section(section);

    let mut shell_entries: Vec<_> = table.shell.iter().collect();
    shell_entries.sort_by_key(|(id, _)| *id);

    if shell_entries.is_empty() {
        return Err(CadError::EmptySolid(format!(
            "{} contains no shells",
            path.display()
        )));
    }

    let mut body = MeshBody {
        shell_count: shell_entries.len(),
        ..MeshBody::default()
    };

    for (shell_id, shell_holder) in shell_entries {
        let compressed = table.to_compressed_shell(shell_holder).map_err(|e| {
            CadError::StepImport(format!(
                "{}: failed to convert shell #{shell_id} into topology: {e}",
                path.display()
            ))
        })?;

        // Two passes: the coarse mesh sizes the tolerance so that very large
        // and very small parts get comparable relative accuracy.
        let coarse = compressed.robust_triangulation(COARSE_TOLERANCE).to_polygon();
        let mut tol = coarse.bounding_box().diameter() * tessellation_ratio;
        if !tol.is_normal() {
            tol = COARSE_TOLERANCE;
        }

        let poly_shell = compressed.robust_triangulation(tol);
        body.face_count += poly_shell.faces.len();

        for face in &poly_shell.faces {
            let Some(surface) = face.surface.as_ref() else {
                body.failed_faces += 1;
                continue;
            };
            let mesh = match face.orientation {
                true => surface.clone(),
                false => surface.inverse(),
            };
            append_triangles(&mesh, &mut body.triangles);
        }

        if verbose {
            tracing::info!(
                "{}: shell #{} tessellated ({} faces, tolerance {:.4})",
                path.display(),
                shell_id,
                poly_shell.faces.len(),
                tol
            );
        }
    }

    Ok(body)
}

/// Fan-triangulate every polygon of a face mesh
fn append_triangles(mesh: &PolygonMesh, out: &mut Vec<[DVec3; 3]>) {
    let positions = mesh.positions();
    let point = |i: usize| {
        let p = positions[i];
        DVec3::new(p[0], p[1], p[2])
    };

    for polygon in mesh.faces().face_iter() {
        if polygon.len() < 3 {
            continue;
        }
        let anchor = point(polygon[0].pos);
        for pair in polygon[1..].windows(2) {
            out.push([anchor, point(pair[0].pos), point(pair[1].pos)]);
        }
    }
}
