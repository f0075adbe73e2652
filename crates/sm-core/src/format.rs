//! Input format detection

use std::path::Path;

/// Shape file format, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeFormat {
    /// Tessellated triangle mesh (STL)
    Mesh,
    /// Boundary representation (STEP)
    BRep,
    Unknown,
}

impl ShapeFormat {
    /// Detect format from file path
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("stl") => ShapeFormat::Mesh,
            Some("step") | Some("stp") => ShapeFormat::BRep,
            _ => ShapeFormat::Unknown,
        }
    }

    /// Get format name
    pub fn name(&self) -> &'static str {
        match self {
            ShapeFormat::Mesh => "STL",
            ShapeFormat::BRep => "STEP",
            ShapeFormat::Unknown => "Unknown",
        }
    }
}
