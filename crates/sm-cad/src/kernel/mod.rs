//! Geometry kernel abstraction and backends

mod mesh;
#[cfg(feature = "truck")]
mod step;
mod traits;
#[cfg(feature = "truck")]
mod truck;

pub use mesh::{MeshBody, load_stl};
pub use traits::*;
#[cfg(feature = "truck")]
pub use truck::{KernelOptions, TruckKernel};

/// Get the default geometry kernel based on available features
pub fn default_kernel() -> Box<dyn GeometryKernel> {
    #[cfg(feature = "truck")]
    {
        Box::new(TruckKernel::new())
    }

    #[cfg(not(feature = "truck"))]
    {
        Box::new(NullKernel)
    }
}
