use core::fmt::Debug;
use std::{fs, path::Path};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};

use crate::chart::ChartSpec;

/// A drawing backend that turns assembled chart instructions into a file.
#[typetag::serde(tag = "type")]
pub trait Surface: Debug + DynClone + Send + Sync {
    /// Name of the surface, for identification in logs
    fn name(&self) -> &'static str;
    /// Draws one chart and writes it to `chart.output`, replacing any
    /// existing file.
    ///
    /// Arguments:
    /// * `chart` - Bars, categories, axis range and title of one comparison
    fn draw(&self, chart: &ChartSpec) -> Result<()>;
}
clone_trait_object!(Surface);

/// Creates the parent directory of `output` if needed.
pub fn ensure_parent_dir(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).wrap_err_with(|| format!("Create plot dir {parent:?}"))?;
    }
    Ok(())
}
