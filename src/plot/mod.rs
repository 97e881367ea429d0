pub mod axis;
pub mod dotplot;
pub mod line;
pub mod palette;
pub mod raster;
pub mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const PNG_SCALE: f32 = 3.0;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to plot for {0}")]
    NoData(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("svg error: {0}")]
    Svg(#[from] usvg::Error),
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("png encoding failed: {0}")]
    Png(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotFiles {
    pub svg: PathBuf,
    pub png: PathBuf,
}

/// Writes `<dir>/<stem>.svg` and its PNG rendering.
pub fn write_plot(svg: &str, dir: &Path, stem: &str) -> Result<PlotFiles, PlotError> {
    fs::create_dir_all(dir)?;
    let svg_path = dir.join(format!("{stem}.svg"));
    let png_path = dir.join(format!("{stem}.png"));
    fs::write(&svg_path, svg)?;
    let png = raster::svg_to_png(svg, PNG_SCALE)?;
    fs::write(&png_path, png)?;
    Ok(PlotFiles {
        svg: svg_path,
        png: png_path,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/mod.rs"]
mod tests;
