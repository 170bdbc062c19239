//! BIDS path templates for converted series.
//!
//! A key identifies one output file family; series mapping to the same
//! key become successive runs of that family.

use ppmi_model::category::{AnatSuffix, Datatype};

use crate::protocol::{AcqDims, Plane};

/// Run-number placeholder in rendered templates.
pub const PATTERN_ITEM: &str = "{item:02}";

/// One BIDS output template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BidsKey {
    datatype: Datatype,
    stem: String,
}

impl BidsKey {
    fn new(datatype: Datatype, stem: String) -> Self {
        Self { datatype, stem }
    }

    /// Anatomical key. `acq` (e.g. neuromelanin) and plane/dims are
    /// mutually exclusive; the evaluator never requests both.
    pub fn anat(
        suffix: AnatSuffix,
        plane: Option<Plane>,
        dims: Option<AcqDims>,
        acq: Option<&str>,
    ) -> Self {
        let stem = match (acq, plane, dims) {
            (Some(acq), _, _) => format!(
                "sub-{{subject}}_{{session}}_acq-{acq}_run-{PATTERN_ITEM}_{suffix}"
            ),
            (None, Some(plane), Some(dims)) => format!(
                "sub-{{subject}}_{{session}}_acq-{}{}_run-{PATTERN_ITEM}_{suffix}",
                plane.tag(),
                dims.tag()
            ),
            (None, _, _) => {
                format!("sub-{{subject}}_{{session}}_run-{PATTERN_ITEM}_{suffix}")
            }
        };
        Self::new(Datatype::Anat, stem)
    }

    /// Diffusion key with optional acquisition and phase-encoding tags.
    pub fn dwi(acq: Option<&str>, dir: Option<&str>) -> Self {
        let acq_tag = acq.map(|acq| format!("_acq-{acq}")).unwrap_or_default();
        let dir_tag = dir.map(|dir| format!("_dir-{dir}")).unwrap_or_default();
        let stem =
            format!("sub-{{subject}}_{{session}}{acq_tag}{dir_tag}_run-{PATTERN_ITEM}_dwi");
        Self::new(Datatype::Dwi, stem)
    }

    /// The unrendered template, with subject/session/run placeholders.
    pub fn template(&self) -> String {
        format!("sub-{{subject}}/{{session}}/{}/{}", self.datatype, self.stem)
    }

    /// Renders a concrete relative path (without extension).
    /// `session` includes the `ses-` prefix; `item` is 1-based.
    pub fn render(&self, subject: &str, session: &str, item: usize) -> String {
        self.template()
            .replace("{subject}", subject)
            .replace("{session}", session)
            .replace(PATTERN_ITEM, &format!("{item:02}"))
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Output extension for every key.
    pub fn extension(&self) -> &'static str {
        "nii.gz"
    }
}
