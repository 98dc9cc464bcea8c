use proj::{Proj, Transform};

use crate::errors::Result;

/// A geometry tagged with the crs its coordinates are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsGeometry<G> {
    crs: String,
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: impl Into<String>, geometry: G) -> Self {
        Self {
            crs: crs.into(),
            geometry,
        }
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_geometry(self) -> G {
        self.geometry
    }
}

impl<G: Transform<f64, Output = G> + Clone> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &str) -> Result<Self> {
        if self.crs.ne(crs) {
            let proj = Proj::new_known_crs(&self.crs, crs, None)?;
            self.geometry.transform(&proj)?;
            self.crs = crs.to_string();
        }
        Ok(self)
    }

    /// Clones if crs is the same.
    pub fn projected_geometry(&self, crs: &str) -> Result<G> {
        if self.crs.ne(crs) {
            let proj = Proj::new_known_crs(&self.crs, crs, None)?;
            Ok(self.geometry.transformed(&proj)?)
        } else {
            Ok(self.geometry.clone())
        }
    }
}
